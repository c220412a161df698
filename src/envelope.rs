// ✉️ Envelope - Pull evaluable text out of varied record shapes
//
// Upstream producers disagree on where the text lives inside a record.
// Selection is an ordered list of strategies tried in sequence, first
// match wins; supporting a new shape means appending a strategy.

use crate::matcher::{TicketId, TicketMatcher};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("no usable input text found in record")]
    MissingInputText,
}

// ============================================================================
// OUTPUT SIDE
// ============================================================================

/// Named fields checked, in order, for a string payload.
const OUTPUT_TEXT_FIELDS: &[&str] = &["response", "answer", "result", "output", "text", "message"];

type Strategy = fn(&Value) -> Option<String>;

fn direct_content(outputs: &Value) -> Option<String> {
    outputs
        .get("content")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn named_text_field(outputs: &Value) -> Option<String> {
    OUTPUT_TEXT_FIELDS.iter().find_map(|field| {
        outputs
            .get(field)
            .and_then(Value::as_str)
            .map(str::to_string)
    })
}

fn nested_text_field(outputs: &Value) -> Option<String> {
    outputs.as_object()?.values().find_map(|nested| {
        nested
            .get("text")
            .and_then(Value::as_str)
            .map(str::to_string)
    })
}

fn stringified_record(outputs: &Value) -> Option<String> {
    if outputs.is_null() {
        return None;
    }
    Some(match outputs.as_str() {
        Some(text) => text.to_string(),
        None => outputs.to_string(),
    })
}

const OUTPUT_STRATEGIES: &[Strategy] = &[
    direct_content,
    named_text_field,
    nested_text_field,
    stringified_record,
];

/// Select the most plausible text payload from an output record.
///
/// Returns None only for a null record; anything else degrades to a
/// stringified representation as a last resort.
pub fn select_output_text(outputs: &Value) -> Option<String> {
    OUTPUT_STRATEGIES
        .iter()
        .find_map(|strategy| strategy(outputs))
}

/// Extract ticket references from AI output text.
///
/// Output text always goes through the plain matcher; no structured
/// parse is ever attempted on it.
pub fn extract_output_references(output_text: &str, matcher: &TicketMatcher) -> Vec<TicketId> {
    matcher.find_all(output_text)
}

// ============================================================================
// INPUT SIDE
// ============================================================================

/// Ground-truth text from a record's inputs.
///
/// Recognized shapes, first match wins:
/// - `inputs.messages[0].content` (chat-style dataset rows)
/// - `inputs` as a bare string
/// - a direct `inputs.content` field
///
/// A record with no usable input text is a caller-visible error at this
/// boundary; the pipeline entry maps it to an untruthful verdict.
pub fn select_input_text(inputs: &Value) -> Result<String, EnvelopeError> {
    if let Some(content) = inputs
        .get("messages")
        .and_then(Value::as_array)
        .and_then(|messages| messages.first())
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
    {
        return Ok(content.to_string());
    }

    if let Some(text) = inputs.as_str() {
        return Ok(text.to_string());
    }

    if let Some(content) = inputs.get("content").and_then(Value::as_str) {
        return Ok(content.to_string());
    }

    Err(EnvelopeError::MissingInputText)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_output_direct_content_wins() {
        let outputs = json!({
            "content": "see BUG-123",
            "response": "ignored",
        });

        assert_eq!(select_output_text(&outputs).as_deref(), Some("see BUG-123"));
    }

    #[test]
    fn test_output_named_field_precedence() {
        let outputs = json!({ "result": "CSMVP-643 resolved" });
        assert_eq!(
            select_output_text(&outputs).as_deref(),
            Some("CSMVP-643 resolved")
        );

        // "response" outranks "message"
        let outputs = json!({ "message": "second", "response": "first" });
        assert_eq!(select_output_text(&outputs).as_deref(), Some("first"));
    }

    #[test]
    fn test_output_nested_text_field() {
        let outputs = json!({ "message": { "text": "nested BUG-123" } });

        assert_eq!(
            select_output_text(&outputs).as_deref(),
            Some("nested BUG-123")
        );
    }

    #[test]
    fn test_output_stringified_last_resort() {
        let outputs = json!({ "unknown_shape": { "deeply": ["BUG-123"] } });

        let text = select_output_text(&outputs).unwrap();
        assert!(text.contains("BUG-123"));

        // Bare strings come back verbatim, not JSON-quoted
        let outputs = json!("plain BUG-123");
        assert_eq!(select_output_text(&outputs).as_deref(), Some("plain BUG-123"));

        assert_eq!(select_output_text(&Value::Null), None);
    }

    #[test]
    fn test_input_chat_message_shape() {
        let inputs = json!({
            "messages": [
                { "content": "tickets: BUG-123" },
                { "content": "second message is ignored" },
            ]
        });

        assert_eq!(select_input_text(&inputs).unwrap(), "tickets: BUG-123");
    }

    #[test]
    fn test_input_bare_string_and_content_shapes() {
        assert_eq!(
            select_input_text(&json!("raw input text")).unwrap(),
            "raw input text"
        );
        assert_eq!(
            select_input_text(&json!({ "content": "direct content" })).unwrap(),
            "direct content"
        );
    }

    #[test]
    fn test_input_missing_text_is_an_error() {
        assert_eq!(
            select_input_text(&json!({ "messages": [] })),
            Err(EnvelopeError::MissingInputText)
        );
        assert_eq!(
            select_input_text(&json!({ "unrelated": 42 })),
            Err(EnvelopeError::MissingInputText)
        );
        assert_eq!(
            select_input_text(&Value::Null),
            Err(EnvelopeError::MissingInputText)
        );
    }

    #[test]
    fn test_extract_output_references_plain_only() {
        let matcher = TicketMatcher::new();

        // Even XML-shaped output is treated as plain text
        let refs = extract_output_references(
            "<rss><item><title>[AB-1] x</title></item></rss> and CD-2",
            &matcher,
        );

        assert_eq!(refs, vec![TicketId::from("AB-1"), TicketId::from("CD-2")]);
    }
}
