//! Bedrock error enhancement
//!
//! Turns Bedrock error responses into messages a trivia player's operator can act on.

use serde_json::Value;

/// Structured information about a Bedrock API error
#[derive(Debug, Clone)]
pub struct BedrockErrorInfo {
    /// Error type, from `x-amzn-ErrorType` or the exception header
    pub error_type: String,
    /// Readable message for the caller
    pub user_message: String,
    /// Message as sent by Bedrock (for logging)
    pub original_message: String,
}

/// Strip the `:http://...` suffix Bedrock appends to `x-amzn-ErrorType`
pub fn normalize_error_type(raw: &str) -> &str {
    raw.split(':').next().unwrap_or(raw).trim()
}

/// Enhance a Bedrock error
///
/// # Arguments
/// * `error_type` - `x-amzn-ErrorType` header or `:exception-type` frame header
/// * `body` - response or frame payload, usually `{"message": "..."}`
pub fn enhance_bedrock_error(error_type: Option<&str>, body: &str) -> BedrockErrorInfo {
    let original_message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("Message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string());

    let error_type = error_type
        .map(normalize_error_type)
        .filter(|t| !t.is_empty())
        .unwrap_or("UnknownError")
        .to_string();

    let user_message = match error_type.as_str() {
        "AccessDeniedException" | "UnrecognizedClientException" => format!(
            "Bedrock rejected the credentials: {}",
            original_message
        ),
        "ThrottlingException" | "throttlingException" => {
            "Too many requests to Bedrock. Please wait a moment before retrying.".to_string()
        }
        "ServiceQuotaExceededException" => {
            "Bedrock service quota exceeded for this account.".to_string()
        }
        "ModelNotReadyException" | "ModelTimeoutException" | "modelTimeoutException" => {
            "The model is not ready or timed out. Please try again later.".to_string()
        }
        "ServiceUnavailableException" | "InternalServerException" | "internalServerException" => {
            "Bedrock is temporarily unavailable. Please try again later.".to_string()
        }
        "ValidationException" | "validationException" => {
            format!("Invalid model request: {}", original_message)
        }
        "ResourceNotFoundException" => format!("Model not found: {}", original_message),
        "UnknownError" => original_message.clone(),
        other => format!("{} ({})", original_message, other),
    };

    BedrockErrorInfo {
        error_type,
        user_message,
        original_message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_error_type() {
        assert_eq!(
            normalize_error_type("ValidationException:http://internal.amazon.com/coral/com.amazon.bedrock/"),
            "ValidationException"
        );
        assert_eq!(normalize_error_type("ThrottlingException"), "ThrottlingException");
    }

    #[test]
    fn test_validation_error() {
        let info = enhance_bedrock_error(
            Some("ValidationException"),
            r#"{"message":"max_tokens: range: 1..4096"}"#,
        );
        assert_eq!(info.error_type, "ValidationException");
        assert_eq!(info.original_message, "max_tokens: range: 1..4096");
        assert_eq!(info.user_message, "Invalid model request: max_tokens: range: 1..4096");
    }

    #[test]
    fn test_throttling_error() {
        let info = enhance_bedrock_error(Some("ThrottlingException"), r#"{"message":"slow down"}"#);
        assert!(info.user_message.starts_with("Too many requests"));
    }

    #[test]
    fn test_unknown_type_keeps_message() {
        let info = enhance_bedrock_error(None, "plain text body");
        assert_eq!(info.error_type, "UnknownError");
        assert_eq!(info.user_message, "plain text body");
    }

    #[test]
    fn test_unlisted_type_appended() {
        let info = enhance_bedrock_error(Some("NewException"), r#"{"Message":"boom"}"#);
        assert_eq!(info.user_message, "boom (NewException)");
    }
}
