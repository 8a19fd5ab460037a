//! Response: the recorded outcome of executing a prompt against a model,
//! including the inversion-aware normalized decision.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::{ProbeError, Result};
use crate::output_structure::DecisionOption;
use crate::prompt::PromptWrapper;

/// Role of one transcript message. Prompts go out as system turns, model
/// output comes back as assistant turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmRole {
    System,
    Assistant,
}

/// The studied model backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LlmName {
    #[serde(rename = "gpt-4o")]
    Gpt4o,
    #[serde(rename = "deepseek-chat")]
    Deepseek,
    #[serde(rename = "mistral-small-latest")]
    MistralSmall,
}

/// One role-tagged message of the conversation transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: LlmRole,
    pub content: String,
}

/// The outcome of one model run. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub wrapped_prompt: PromptWrapper,
    /// The decision exactly as the model reported it; see
    /// [`Response::normalized_decision`] for the polarity-corrected view.
    pub decision: DecisionOption,
    pub llm_identifier: LlmName,
    /// Full transcript, alternating system and assistant turns.
    pub unparsed_messages: Vec<LlmMessage>,
    /// The final turn's structured fields, keyed by schema property name.
    #[serde(default)]
    pub parsed_response: Map<String, Value>,
    /// Token accounting arrived in v1.5; absent (not zero) on older records.
    #[serde(default)]
    pub prompt_tokens: Option<u64>,
    #[serde(default)]
    pub completion_tokens: Option<u64>,
}

impl Response {
    /// Transcript filtered to one role, order preserved.
    pub fn messages_by_role(&self, role: LlmRole) -> Vec<&LlmMessage> {
        self.unparsed_messages
            .iter()
            .filter(|message| message.role == role)
            .collect()
    }

    /// The decision corrected for dilemmas whose action polarity is
    /// inverted, so decisions are comparable across dilemma framings.
    ///
    /// Resolved against the dilemma registry on every call; this is a
    /// derived view, never stored state.
    pub fn normalized_decision(&self) -> Result<DecisionOption> {
        let dilemma = self.wrapped_prompt.resolve_dilemma()?;
        if !dilemma.is_polarity_invertible {
            return Ok(self.decision);
        }
        // Polarity correction is meaningless for a non-answer.
        if self.decision == DecisionOption::Undecided {
            return Ok(DecisionOption::Undecided);
        }
        if dilemma.action_is_inverted {
            return Ok(match self.decision {
                DecisionOption::Yes => DecisionOption::No,
                DecisionOption::No => DecisionOption::Yes,
                DecisionOption::Undecided => DecisionOption::Undecided,
            });
        }
        Ok(self.decision)
    }

    /// Wire representation. The nested prompt's id precondition applies
    /// here too.
    pub fn to_value(&self) -> Result<Value> {
        if self.wrapped_prompt.id.is_none() {
            return Err(ProbeError::Precondition {
                message: format!(
                    "response for dilemma '{}' wraps a prompt with no assigned id",
                    self.wrapped_prompt.dilemma_identifier
                ),
            });
        }
        Ok(serde_json::to_value(self)?)
    }

    /// Wire representation enriched for tabular analysis: the wrapped
    /// prompt's analysis variant plus the normalized decision.
    pub fn analysis_value(&self) -> Result<Value> {
        let mut obj = match self.to_value()? {
            Value::Object(obj) => obj,
            other => {
                return Err(ProbeError::Serialization {
                    message: format!("response serialized to non-object value: {other}"),
                });
            }
        };
        obj.insert(
            "wrapped_prompt".to_string(),
            self.wrapped_prompt.analysis_value()?,
        );
        obj.insert(
            "normalized_decision".to_string(),
            json!(self.normalized_decision()?),
        );
        Ok(Value::Object(obj))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dilemma::{self, DilemmaDescriptor};
    use crate::output_structure::{OutputComponentType, OutputStructure};

    fn response_for(dilemma_identifier: &str, decision: DecisionOption) -> Response {
        let mut prompt = PromptWrapper {
            id: None,
            prompts: vec!["Decide.".to_string()],
            dilemma_identifier: dilemma_identifier.to_string(),
            ethical_framework_identifier: "deontology".to_string(),
            base_prompt_identifier: "base_prompt_1".to_string(),
            prompt_has_output_structure_description: true,
            prompt_has_output_structure_json_schema: true,
            output_structure: OutputStructure {
                sorted_output_components: vec![OutputComponentType::Decision],
                sorted_decision_options: vec![
                    DecisionOption::Yes,
                    DecisionOption::No,
                    DecisionOption::Undecided,
                ],
                first_unstructured_output: false,
            },
            version: "1.7".to_string(),
        };
        prompt.assign_id(format!("{dilemma_identifier}-response"));

        Response {
            wrapped_prompt: prompt,
            decision,
            llm_identifier: LlmName::Gpt4o,
            unparsed_messages: vec![
                LlmMessage {
                    role: LlmRole::System,
                    content: "Decide.".to_string(),
                },
                LlmMessage {
                    role: LlmRole::Assistant,
                    content: "{\"decision\": \"YES\"}".to_string(),
                },
            ],
            parsed_response: Map::new(),
            prompt_tokens: Some(42),
            completion_tokens: Some(7),
        }
    }

    fn register_dilemma(identifier: &str, invertible: bool, inverted: bool) {
        dilemma::register(DilemmaDescriptor {
            identifier: identifier.to_string(),
            context_identifier: "surveillance".to_string(),
            is_polarity_invertible: invertible,
            action_is_inverted: inverted,
        });
    }

    #[test]
    fn non_invertible_dilemma_passes_decision_through() {
        register_dilemma("response_test_plain", false, false);
        for decision in DecisionOption::ALL {
            let response = response_for("response_test_plain", decision);
            assert_eq!(response.normalized_decision().unwrap(), decision);
        }
    }

    #[test]
    fn inverted_action_swaps_yes_and_no() {
        register_dilemma("response_test_inverted", true, true);
        let cases = [
            (DecisionOption::Yes, DecisionOption::No),
            (DecisionOption::No, DecisionOption::Yes),
            (DecisionOption::Undecided, DecisionOption::Undecided),
        ];
        for (raw, expected) in cases {
            let response = response_for("response_test_inverted", raw);
            assert_eq!(response.normalized_decision().unwrap(), expected);
        }
    }

    #[test]
    fn invertible_but_not_inverted_passes_through() {
        register_dilemma("response_test_upright", true, false);
        for decision in DecisionOption::ALL {
            let response = response_for("response_test_upright", decision);
            assert_eq!(response.normalized_decision().unwrap(), decision);
        }
    }

    #[test]
    fn unknown_dilemma_surfaces_not_found() {
        let response = response_for("response_test_unregistered", DecisionOption::Yes);
        assert!(matches!(
            response.normalized_decision(),
            Err(ProbeError::NotFound { .. })
        ));
    }

    #[test]
    fn messages_by_role_preserves_order() {
        register_dilemma("response_test_roles", false, false);
        let response = response_for("response_test_roles", DecisionOption::Yes);
        let system = response.messages_by_role(LlmRole::System);
        let assistant = response.messages_by_role(LlmRole::Assistant);
        assert_eq!(system.len(), 1);
        assert_eq!(assistant.len(), 1);
        assert_eq!(system[0].content, "Decide.");
    }

    #[test]
    fn analysis_value_adds_normalized_decision() {
        register_dilemma("response_test_analysis", true, true);
        let response = response_for("response_test_analysis", DecisionOption::Yes);
        let analysis = response.analysis_value().unwrap();
        assert_eq!(analysis["decision"], "YES");
        assert_eq!(analysis["normalized_decision"], "NO");
        assert_eq!(
            analysis["wrapped_prompt"]["dilemma"]["context_identifier"],
            "surveillance"
        );
        assert_eq!(
            analysis["wrapped_prompt"]["output_structure"]["has_decision"],
            json!(true)
        );
    }
}
