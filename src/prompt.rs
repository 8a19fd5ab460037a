//! PromptWrapper: an immutable description of one fully-configured prompt
//! variant, with versioned (de)serialization.
//!
//! The wire format is stable; older shapes are tolerated through serde
//! aliases and defaults rather than ad hoc lookups, so new legacy shims
//! stay additive.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::dilemma::{self, DilemmaDescriptor};
use crate::error::{ProbeError, Result};
use crate::output_structure::OutputStructure;

fn default_true() -> bool {
    true
}

/// One fully-specified experiment cell: the prompt texts to send, the
/// catalog keys it instantiates, and the output structure it asks for.
///
/// Constructed by prompt-generation logic without an id; the store assigns
/// one before the record is first written. Read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptWrapper {
    /// Identity assigned at persistence time. v1.5 records wrote this key
    /// as "id"; "_id" wins when reading.
    #[serde(rename = "_id", alias = "id", default)]
    pub id: Option<String>,
    /// One text segment per conversational turn.
    pub prompts: Vec<String>,
    pub dilemma_identifier: String,
    /// Records predating v1.6 wrote "framework_identifier".
    #[serde(alias = "framework_identifier")]
    pub ethical_framework_identifier: String,
    pub base_prompt_identifier: String,
    /// Absent on records predating the flag; those prompts always embedded
    /// the structure description, hence the true default.
    #[serde(default = "default_true")]
    pub prompt_has_output_structure_description: bool,
    #[serde(default = "default_true")]
    pub prompt_has_output_structure_json_schema: bool,
    pub output_structure: OutputStructure,
    /// Tag of the generating configuration.
    pub version: String,
}

impl PromptWrapper {
    /// One-shot identity assignment, performed by the store right before
    /// the record is first serialized.
    pub fn assign_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Look up this prompt's dilemma in the registry.
    pub fn resolve_dilemma(&self) -> Result<DilemmaDescriptor> {
        dilemma::resolve(&self.dilemma_identifier)
    }

    /// Wire representation. A prompt without an assigned id has never been
    /// through the store and must not be serialized.
    pub fn to_value(&self) -> Result<Value> {
        if self.id.is_none() {
            return Err(ProbeError::Precondition {
                message: format!(
                    "prompt for dilemma '{}' has no assigned id",
                    self.dilemma_identifier
                ),
            });
        }
        Ok(serde_json::to_value(self)?)
    }

    fn to_object(&self) -> Result<Map<String, Value>> {
        match self.to_value()? {
            Value::Object(obj) => Ok(obj),
            other => Err(ProbeError::Serialization {
                message: format!("prompt serialized to non-object value: {other}"),
            }),
        }
    }

    /// Wire representation enriched for tabular analysis: the output
    /// structure is replaced by its analysis variant and the resolved
    /// dilemma's descriptor is embedded.
    pub fn analysis_value(&self) -> Result<Value> {
        let mut obj = self.to_object()?;
        obj.insert(
            "output_structure".to_string(),
            self.output_structure.analysis_value(),
        );
        obj.insert(
            "dilemma".to_string(),
            serde_json::to_value(self.resolve_dilemma()?)?,
        );
        Ok(Value::Object(obj))
    }
}
