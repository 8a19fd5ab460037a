//! Batch persistence: JSON-array files of prompts and responses.
//!
//! Writes are whole-file overwrites of a pretty-printed array. Reads
//! reconstruct every record, then compare the first record's version tag
//! against the running configuration; drift is logged as a warning and
//! loading proceeds, since analysis code tolerates minor schema changes
//! across experiment versions.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ProbeError, Result};
use crate::prompt::PromptWrapper;
use crate::response::Response;

/// Mint ids for any prompt that does not have one yet. Called once per
/// batch, right before it is written.
pub fn assign_ids(prompts: &mut [PromptWrapper]) {
    for prompt in prompts.iter_mut() {
        if prompt.id.is_none() {
            prompt.assign_id(Uuid::new_v4().to_string());
        }
    }
}

pub fn write_prompts(prompts: &[PromptWrapper], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let values = prompts
        .iter()
        .map(PromptWrapper::to_value)
        .collect::<Result<Vec<Value>>>()?;
    write_array(&values, path)?;
    info!("{} prompts written to {}", prompts.len(), path.display());
    Ok(())
}

pub fn write_responses(responses: &[Response], path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let values = responses
        .iter()
        .map(Response::to_value)
        .collect::<Result<Vec<Value>>>()?;
    write_array(&values, path)?;
    info!("{} responses written to {}", responses.len(), path.display());
    Ok(())
}

/// Load a prompt batch. An empty array is valid; the version check is
/// skipped since there is no record to take the tag from.
pub fn read_prompts(path: impl AsRef<Path>, expected_version: &str) -> Result<Vec<PromptWrapper>> {
    let path = path.as_ref();
    let prompts: Vec<PromptWrapper> = read_array(path)?;
    match prompts.first() {
        Some(first) => check_version(&first.version, expected_version, path),
        None => debug!("{} holds no prompts, version check skipped", path.display()),
    }
    Ok(prompts)
}

/// Load a response batch; the version tag lives on the wrapped prompt.
pub fn read_responses(path: impl AsRef<Path>, expected_version: &str) -> Result<Vec<Response>> {
    let path = path.as_ref();
    let responses: Vec<Response> = read_array(path)?;
    match responses.first() {
        Some(first) => check_version(&first.wrapped_prompt.version, expected_version, path),
        None => debug!("{} holds no responses, version check skipped", path.display()),
    }
    Ok(responses)
}

fn write_array(values: &[Value], path: &Path) -> Result<()> {
    let body = serde_json::to_string_pretty(values)?;
    fs::write(path, body)?;
    Ok(())
}

fn read_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let body = fs::read_to_string(path)?;
    serde_json::from_str(&body).map_err(|err| ProbeError::MalformedData {
        message: format!("{}: {}", path.display(), err),
    })
}

fn check_version(found: &str, expected: &str, path: &Path) {
    if found != expected {
        warn!(
            "version mismatch in {}: records are v{}, running configuration expects v{}",
            path.display(),
            found,
            expected
        );
    }
}
