//! Request and error payloads of the question endpoint

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Body of `POST /questions`
///
/// Counts are kept as raw JSON numbers and rendered verbatim into the prompt;
/// no range checks are applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub topic: String,
    #[serde(alias = "numberOfQuestions")]
    pub number_questions: Number,
    pub difficulty: String,
    #[serde(alias = "numSilly")]
    pub num_silly: Number,
    /// Questions already served this game, to avoid repeats
    #[serde(default, alias = "existingQuestions")]
    pub existing_questions: Vec<Value>,
}

// === Error Response ===

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                error_type: error_type.into(),
                message: message.into(),
            },
        }
    }

    /// Malformed request body
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new("invalid_request_error", message)
    }

    /// Bedrock refused or could not be reached
    pub fn api_error(message: impl Into<String>) -> Self {
        Self::new("api_error", message)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new("rate_limit_error", message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_snake_case() {
        let request: GenerationRequest = serde_json::from_value(json!({
            "topic": "Animals",
            "number_questions": 5,
            "difficulty": "easy",
            "num_silly": 1,
            "existing_questions": [{"question": "Q?", "answers": ["a"], "correctAnswer": "a"}]
        }))
        .unwrap();
        assert_eq!(request.topic, "Animals");
        assert_eq!(request.number_questions.as_u64(), Some(5));
        assert_eq!(request.existing_questions.len(), 1);
    }

    #[test]
    fn test_deserialize_camel_case_aliases() {
        let request: GenerationRequest = serde_json::from_value(json!({
            "topic": "Space",
            "numberOfQuestions": 3,
            "difficulty": "hard",
            "numSilly": 0
        }))
        .unwrap();
        assert_eq!(request.num_silly.as_u64(), Some(0));
        assert!(request.existing_questions.is_empty());
    }

    #[test]
    fn test_out_of_range_values_accepted() {
        let request: GenerationRequest = serde_json::from_value(json!({
            "topic": "",
            "number_questions": -2,
            "difficulty": "impossible",
            "num_silly": 99
        }))
        .unwrap();
        assert_eq!(request.number_questions.to_string(), "-2");
    }

    #[test]
    fn test_missing_topic_rejected() {
        let result: Result<GenerationRequest, _> = serde_json::from_value(json!({
            "number_questions": 5,
            "difficulty": "easy",
            "num_silly": 1
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_error_response_shape() {
        let value = serde_json::to_value(ErrorResponse::api_error("boom")).unwrap();
        assert_eq!(value, json!({"error": {"type": "api_error", "message": "boom"}}));
    }
}
