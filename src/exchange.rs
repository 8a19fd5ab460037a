//! Boundary with the model-calling collaborator.
//!
//! The collaborator sends the prompt turns to a backend and hands back the
//! raw assistant texts plus token counts; this module turns that material
//! into a [`Response`]. Failures here are expected outcomes of talking to a
//! model, so they get their own error type instead of being folded into the
//! crate's data-integrity errors.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::output_structure::{DecisionOption, OutputComponentType, OutputStructure};
use crate::prompt::PromptWrapper;
use crate::response::{LlmMessage, LlmName, LlmRole, Response};

/// Prompts never exceed five turns.
pub const MAX_TURNS: usize = 5;

/// Failures assembling a response at the collaborator boundary.
#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("prompt has {turns} turns, the maximum is {MAX_TURNS}")]
    TooManyTurns { turns: usize },

    #[error("{prompts} prompt turns but {replies} assistant replies")]
    TurnCountMismatch { prompts: usize, replies: usize },

    #[error("assistant reply for turn {turn} is empty")]
    EmptyAssistantText { turn: usize },

    #[error("final assistant turn is not a JSON object: {message}")]
    UnparsableFinalTurn { message: String },

    #[error("final assistant turn has no decision field")]
    MissingDecision,

    #[error("unrecognized decision value {value}")]
    UnknownDecision { value: String },
}

/// Whether the structured-output constraint applies to the given zero-based
/// turn. When the first turn is deliberately free-text the schema is only
/// attached to the second turn, where the model is asked to restate its
/// answer in structured form.
pub fn schema_constrained_turn(structure: &OutputStructure, turn_index: usize) -> bool {
    !structure.first_unstructured_output || turn_index == 1
}

/// Build a [`Response`] from the assistant texts a backend returned for
/// each prompt turn. The final turn must parse as a JSON object carrying a
/// known decision value.
pub fn assemble_response(
    wrapped_prompt: PromptWrapper,
    assistant_texts: &[String],
    llm_identifier: LlmName,
    prompt_tokens: Option<u64>,
    completion_tokens: Option<u64>,
) -> Result<Response, ExchangeError> {
    let turns = wrapped_prompt.prompts.len();
    if turns > MAX_TURNS {
        return Err(ExchangeError::TooManyTurns { turns });
    }
    if assistant_texts.len() != turns {
        return Err(ExchangeError::TurnCountMismatch {
            prompts: turns,
            replies: assistant_texts.len(),
        });
    }

    let mut unparsed_messages = Vec::with_capacity(turns * 2);
    for (turn, (prompt, reply)) in wrapped_prompt.prompts.iter().zip(assistant_texts).enumerate() {
        if reply.trim().is_empty() {
            return Err(ExchangeError::EmptyAssistantText { turn });
        }
        unparsed_messages.push(LlmMessage {
            role: LlmRole::System,
            content: prompt.clone(),
        });
        unparsed_messages.push(LlmMessage {
            role: LlmRole::Assistant,
            content: reply.clone(),
        });
    }

    let final_turn = match assistant_texts.last() {
        Some(text) => text,
        None => return Err(ExchangeError::MissingDecision),
    };
    let parsed_response = parse_final_turn(final_turn)?;

    let decision_value = parsed_response
        .get(OutputComponentType::Decision.field_key())
        .ok_or(ExchangeError::MissingDecision)?;
    let decision: DecisionOption = serde_json::from_value(decision_value.clone())
        .map_err(|_| ExchangeError::UnknownDecision {
            value: decision_value.to_string(),
        })?;

    Ok(Response {
        wrapped_prompt,
        decision,
        llm_identifier,
        unparsed_messages,
        parsed_response,
        prompt_tokens,
        completion_tokens,
    })
}

fn parse_final_turn(text: &str) -> Result<Map<String, Value>, ExchangeError> {
    let value: Value =
        serde_json::from_str(text).map_err(|err| ExchangeError::UnparsableFinalTurn {
            message: err.to_string(),
        })?;
    match value {
        Value::Object(obj) => Ok(obj),
        other => Err(ExchangeError::UnparsableFinalTurn {
            message: format!("expected an object, got {other}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt_with_turns(turns: usize, first_unstructured: bool) -> PromptWrapper {
        PromptWrapper {
            id: None,
            prompts: (0..turns).map(|i| format!("turn {i}")).collect(),
            dilemma_identifier: "exchange_test_dilemma".to_string(),
            ethical_framework_identifier: "virtue_ethics".to_string(),
            base_prompt_identifier: "base_prompt_1".to_string(),
            prompt_has_output_structure_description: true,
            prompt_has_output_structure_json_schema: true,
            output_structure: OutputStructure {
                sorted_output_components: vec![
                    OutputComponentType::Decision,
                    OutputComponentType::DecisionReason,
                ],
                sorted_decision_options: vec![
                    DecisionOption::Yes,
                    DecisionOption::No,
                    DecisionOption::Undecided,
                ],
                first_unstructured_output: first_unstructured,
            },
            version: "1.7".to_string(),
        }
    }

    #[test]
    fn assembles_transcript_and_parsed_fields() {
        let prompt = prompt_with_turns(2, true);
        let replies = vec![
            "I would pull the lever because...".to_string(),
            "{\"decision\": \"NO\", \"decision_reason\": \"harm minimization\"}".to_string(),
        ];
        let response =
            assemble_response(prompt, &replies, LlmName::Deepseek, Some(100), Some(20)).unwrap();

        assert_eq!(response.decision, DecisionOption::No);
        assert_eq!(response.unparsed_messages.len(), 4);
        assert_eq!(response.unparsed_messages[0].role, LlmRole::System);
        assert_eq!(response.unparsed_messages[1].role, LlmRole::Assistant);
        assert_eq!(
            response.parsed_response["decision_reason"],
            "harm minimization"
        );
        assert_eq!(response.prompt_tokens, Some(100));
    }

    #[test]
    fn too_many_turns_is_rejected() {
        let prompt = prompt_with_turns(6, false);
        let replies = vec!["{}".to_string(); 6];
        assert!(matches!(
            assemble_response(prompt, &replies, LlmName::Gpt4o, None, None),
            Err(ExchangeError::TooManyTurns { turns: 6 })
        ));
    }

    #[test]
    fn reply_count_must_match_turn_count() {
        let prompt = prompt_with_turns(2, false);
        let replies = vec!["{\"decision\": \"YES\"}".to_string()];
        assert!(matches!(
            assemble_response(prompt, &replies, LlmName::Gpt4o, None, None),
            Err(ExchangeError::TurnCountMismatch {
                prompts: 2,
                replies: 1
            })
        ));
    }

    #[test]
    fn empty_assistant_reply_is_rejected() {
        let prompt = prompt_with_turns(1, false);
        let replies = vec!["   ".to_string()];
        assert!(matches!(
            assemble_response(prompt, &replies, LlmName::MistralSmall, None, None),
            Err(ExchangeError::EmptyAssistantText { turn: 0 })
        ));
    }

    #[test]
    fn final_turn_must_be_a_json_object() {
        let prompt = prompt_with_turns(1, false);
        let replies = vec!["not json at all".to_string()];
        assert!(matches!(
            assemble_response(prompt, &replies, LlmName::Gpt4o, None, None),
            Err(ExchangeError::UnparsableFinalTurn { .. })
        ));
    }

    #[test]
    fn missing_and_unknown_decisions_are_distinct() {
        let prompt = prompt_with_turns(1, false);
        let no_decision = vec!["{\"decision_reason\": \"because\"}".to_string()];
        assert!(matches!(
            assemble_response(prompt.clone(), &no_decision, LlmName::Gpt4o, None, None),
            Err(ExchangeError::MissingDecision)
        ));

        let bad_decision = vec!["{\"decision\": \"MAYBE\"}".to_string()];
        assert!(matches!(
            assemble_response(prompt, &bad_decision, LlmName::Gpt4o, None, None),
            Err(ExchangeError::UnknownDecision { .. })
        ));
    }

    #[test]
    fn schema_constraint_skips_only_the_free_first_turn() {
        let structured = prompt_with_turns(2, false).output_structure;
        assert!(schema_constrained_turn(&structured, 0));
        assert!(schema_constrained_turn(&structured, 1));

        let free_first = prompt_with_turns(2, true).output_structure;
        assert!(!schema_constrained_turn(&free_first, 0));
        assert!(schema_constrained_turn(&free_first, 1));
        assert!(!schema_constrained_turn(&free_first, 2));
    }
}
