//! `InvokeModelWithResponseStream` request body
//!
//! Anthropic Messages format as accepted by Bedrock

use serde::{Deserialize, Serialize};

/// One conversation turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Invocation body sent as the HTTP request payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvokeBody {
    pub anthropic_version: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub system: String,
    pub messages: Vec<Message>,
}

impl InvokeBody {
    /// Single user turn with an empty system prompt
    pub fn single_turn(
        anthropic_version: impl Into<String>,
        max_tokens: u32,
        temperature: f64,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            anthropic_version: anthropic_version.into(),
            max_tokens,
            temperature,
            system: String::new(),
            messages: vec![Message::user(prompt)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_turn_wire_shape() {
        let body = InvokeBody::single_turn("bedrock-2023-05-31", 2048, 0.9, "hi");
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            json!({
                "anthropic_version": "bedrock-2023-05-31",
                "max_tokens": 2048,
                "temperature": 0.9,
                "system": "",
                "messages": [{"role": "user", "content": "hi"}]
            })
        );
    }
}
