//! Output structure for structured-output prompts: which answer fields the
//! model is asked to emit, in what order, and the JSON schema derived from
//! that description.
//!
//! Everything derived here is a pure function of the three stored fields;
//! nothing is cached between calls.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::{ProbeError, Result};

/// One named field the model is asked to produce.
///
/// Declaration order is the canonical order; wire values are the
/// SCREAMING_SNAKE_CASE names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutputComponentType {
    Decision,
    NormativeEthicalTheoryExplanation,
    DecisionReason,
}

impl OutputComponentType {
    /// All members, in canonical order.
    pub const ALL: [OutputComponentType; 3] = [
        OutputComponentType::Decision,
        OutputComponentType::NormativeEthicalTheoryExplanation,
        OutputComponentType::DecisionReason,
    ];

    /// Lower-cased wire name, used as the schema property key and as the
    /// field name in parsed responses.
    pub fn field_key(&self) -> &'static str {
        match self {
            OutputComponentType::Decision => "decision",
            OutputComponentType::NormativeEthicalTheoryExplanation => {
                "normative_ethical_theory_explanation"
            }
            OutputComponentType::DecisionReason => "decision_reason",
        }
    }
}

/// The closed set of decisions a model can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionOption {
    Yes,
    No,
    Undecided,
}

impl DecisionOption {
    pub const ALL: [DecisionOption; 3] = [
        DecisionOption::Yes,
        DecisionOption::No,
        DecisionOption::Undecided,
    ];

    /// Wire value, as it appears in schema enums and persisted records.
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionOption::Yes => "YES",
            DecisionOption::No => "NO",
            DecisionOption::Undecided => "UNDECIDED",
        }
    }

    /// Lower-cased suffix for flattened analysis keys.
    fn key(&self) -> &'static str {
        match self {
            DecisionOption::Yes => "yes",
            DecisionOption::No => "no",
            DecisionOption::Undecided => "undecided",
        }
    }
}

/// Where free-text justification sits relative to the structured decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnstructuredTextPosition {
    BeforeDecision,
    AfterDecision,
    NoUnstructuredDecisionText,
}

/// Describes which answer fields a prompt expects back and in what order.
///
/// Immutable after construction. `sorted_output_components` is the actual
/// order the model is asked to emit fields in, which may differ from the
/// canonical enumeration order. Neither sequence contains duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputStructure {
    pub sorted_output_components: Vec<OutputComponentType>,
    pub sorted_decision_options: Vec<DecisionOption>,
    /// True when the very first model turn is deliberately left free-text,
    /// with a structured turn following.
    pub first_unstructured_output: bool,
}

impl OutputStructure {
    /// The configured components re-ordered into canonical enumeration
    /// order. Invariant to the stored order.
    pub fn default_order_output_components(&self) -> Vec<OutputComponentType> {
        OutputComponentType::ALL
            .into_iter()
            .filter(|component| self.has_output_component(*component))
            .collect()
    }

    /// A decision is accompanied by free text either via a dedicated reason
    /// field or because the first turn is free-text.
    pub fn has_unstructured_decision_text(&self) -> bool {
        self.has_output_component(OutputComponentType::DecisionReason)
            || self.first_unstructured_output
    }

    /// Free first-turn text necessarily precedes any structured decision.
    /// Otherwise the reason field counts as "before" when it appears at a
    /// smaller index than the decision field.
    pub fn has_unstructured_decision_text_before_decision(&self) -> bool {
        if self.first_unstructured_output {
            return true;
        }
        let reason = self.output_component_index(OutputComponentType::DecisionReason);
        let decision = self.output_component_index(OutputComponentType::Decision);
        match (reason, decision) {
            (Some(reason), Some(decision)) => reason < decision,
            // A configured reason with no decision field has nothing to
            // come after.
            (Some(_), None) => true,
            (None, _) => false,
        }
    }

    pub fn has_unstructured_decision_text_after_decision(&self) -> bool {
        self.has_unstructured_decision_text()
            && !self.has_unstructured_decision_text_before_decision()
    }

    /// Tri-state classification of the two predicates above; the variants
    /// are mutually exclusive by construction.
    pub fn unstructured_decision_text_position(&self) -> UnstructuredTextPosition {
        if self.has_unstructured_decision_text_before_decision() {
            UnstructuredTextPosition::BeforeDecision
        } else if self.has_unstructured_decision_text_after_decision() {
            UnstructuredTextPosition::AfterDecision
        } else {
            UnstructuredTextPosition::NoUnstructuredDecisionText
        }
    }

    /// Position of `option` within the configured option order.
    pub fn decision_option_index(&self, option: DecisionOption) -> Result<usize> {
        self.sorted_decision_options
            .iter()
            .position(|candidate| *candidate == option)
            .ok_or_else(|| ProbeError::NotFound {
                message: format!("decision option {} is not configured", option.as_str()),
            })
    }

    pub fn has_output_component(&self, component: OutputComponentType) -> bool {
        self.sorted_output_components.contains(&component)
    }

    /// Position of `component`, or None when it is not configured. Absence
    /// is an expected case, not an error.
    pub fn output_component_index(&self, component: OutputComponentType) -> Option<usize> {
        self.sorted_output_components
            .iter()
            .position(|candidate| *candidate == component)
    }

    /// Structured-output schema for this configuration, in the shape
    /// OpenAI-compatible APIs accept: one string property per configured
    /// component in configured order, all required, no extra properties.
    /// The decision property is constrained to the configured option values.
    pub fn json_schema(&self) -> Value {
        let mut properties = Map::new();
        for component in &self.sorted_output_components {
            let component_schema = match component {
                OutputComponentType::Decision => json!({
                    "type": "string",
                    "description": "The decision options",
                    "enum": self
                        .sorted_decision_options
                        .iter()
                        .map(DecisionOption::as_str)
                        .collect::<Vec<_>>(),
                }),
                other => json!({
                    "type": "string",
                    "description": format!("The {} content", other.field_key()),
                }),
            };
            properties.insert(component.field_key().to_string(), component_schema);
        }

        json!({
            "type": "object",
            "properties": properties,
            "additionalProperties": false,
            "required": self
                .sorted_output_components
                .iter()
                .map(|component| component.field_key())
                .collect::<Vec<_>>(),
        })
    }

    /// The stored fields plus every derived fact, flattened with
    /// per-component and per-option key names for tabular analysis.
    /// Indexes of absent members serialize as null.
    pub fn analysis_value(&self) -> Value {
        let mut res = json!({
            "sorted_output_components": self.sorted_output_components,
            "sorted_decision_options": self.sorted_decision_options,
            "first_unstructured_output": self.first_unstructured_output,
            "has_unstructured_decision_text": self.has_unstructured_decision_text(),
            "has_unstructured_decision_text_before_decision":
                self.has_unstructured_decision_text_before_decision(),
            "has_unstructured_decision_text_after_decision":
                self.has_unstructured_decision_text_after_decision(),
            "unstructured_decision_text_position": self.unstructured_decision_text_position(),
            "default_order_output_components": self.default_order_output_components(),
        });

        if let Some(obj) = res.as_object_mut() {
            for component in OutputComponentType::ALL {
                obj.insert(
                    format!("has_{}", component.field_key()),
                    json!(self.has_output_component(component)),
                );
                obj.insert(
                    format!("output_component_index_{}", component.field_key()),
                    json!(self.output_component_index(component)),
                );
            }
            for option in DecisionOption::ALL {
                let index = self
                    .sorted_decision_options
                    .iter()
                    .position(|candidate| *candidate == option);
                obj.insert(format!("decision_option_index_{}", option.key()), json!(index));
            }
        }

        res
    }
}
