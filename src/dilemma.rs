//! Process-wide dilemma registry.
//!
//! Dilemma content lives in external catalogs; the core only ever resolves
//! identifier strings to descriptors. Catalog loaders populate the registry
//! at startup via [`register`].

use std::collections::HashMap;
use std::sync::RwLock;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{ProbeError, Result};

/// What the core needs to know about a dilemma: its category and whether
/// its framing inverts the natural action polarity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DilemmaDescriptor {
    pub identifier: String,
    pub context_identifier: String,
    /// Whether this dilemma participates in polarity normalization at all.
    pub is_polarity_invertible: bool,
    /// Whether the framing swaps "taking the action" and YES.
    pub action_is_inverted: bool,
}

static DILEMMA_REGISTRY: Lazy<RwLock<HashMap<String, DilemmaDescriptor>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Register a dilemma descriptor, replacing any previous entry with the
/// same identifier.
pub fn register(descriptor: DilemmaDescriptor) {
    let mut registry = DILEMMA_REGISTRY
        .write()
        .expect("dilemma registry lock poisoned");
    registry.insert(descriptor.identifier.clone(), descriptor);
}

/// Look up a dilemma by identifier.
pub fn resolve(identifier: &str) -> Result<DilemmaDescriptor> {
    let registry = DILEMMA_REGISTRY
        .read()
        .expect("dilemma registry lock poisoned");
    registry
        .get(identifier)
        .cloned()
        .ok_or_else(|| ProbeError::NotFound {
            message: format!("unknown dilemma identifier '{identifier}'"),
        })
}
