//! dilemma-probe: data model for an empirical study of how LLMs answer
//! structured ethical-dilemma prompts.
//!
//! The crate covers the prompt/response records and their derived
//! computations: output-field ordering and JSON-schema generation
//! ([`output_structure`]), versioned prompt serialization ([`prompt`]),
//! inversion-aware decision normalization ([`response`]), assembly of model
//! output into records ([`exchange`]), and batch persistence ([`store`]).
//! Sending prompts to vendor APIs is a collaborator's job; the boundary it
//! hands results across is [`exchange::assemble_response`].

pub mod config;
pub mod dilemma;
pub mod error;
pub mod exchange;
pub mod output_structure;
pub mod prompt;
pub mod response;
pub mod store;

// Load env from a simple, standardized location resolution.
// This uses dotenvy::dotenv().ok() which loads .env if present and silently ignores if missing.
pub fn load_env() {
    let _ = dotenvy::dotenv();
}
