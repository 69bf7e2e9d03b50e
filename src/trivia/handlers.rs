//! Question service handlers

use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::Instrument;
use uuid::Uuid;

use crate::bedrock::provider::{ModelInvoker, UpstreamError};

use super::middleware::AppState;
use super::relay::QuestionRelay;
use super::sink;
use super::types::{ErrorResponse, GenerationRequest};

/// POST /questions
///
/// Streams generated questions as `text/plain`. Invocation failures are
/// answered with a JSON error; failures after streaming starts cut the body off.
pub async fn post_questions(
    State(state): State<AppState>,
    payload: Result<Json<GenerationRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::warn!("Rejected question request: {}", rejection.body_text());
            return (
                rejection.status(),
                Json(ErrorResponse::invalid_request(rejection.body_text())),
            )
                .into_response();
        }
    };

    let span = tracing::info_span!("generate_questions", request_id = %Uuid::new_v4());
    start_relay(state.provider.clone(), request)
        .instrument(span)
        .await
}

/// Open the model stream and hand the rest of the relay to a background task
async fn start_relay<I: ModelInvoker>(invoker: Arc<I>, request: GenerationRequest) -> Response {
    tracing::info!(
        topic = %request.topic,
        number_questions = %request.number_questions,
        difficulty = %request.difficulty,
        num_silly = %request.num_silly,
        existing_questions = request.existing_questions.len(),
        "Received question generation request"
    );

    let mut relay = QuestionRelay::new(invoker);
    let mut source = match relay.open(&request).await {
        Ok(source) => source,
        Err(e) => return invocation_error_response(&e),
    };

    let (mut output, body) = sink::channel();
    tokio::spawn(
        async move {
            if let Err(e) = relay.forward(&mut source, &mut output).await {
                output.abort(&e).await;
            }
        }
        .in_current_span(),
    );

    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(body),
    )
        .into_response()
}

/// Map an invocation failure to a status and JSON error
fn invocation_error_response(error: &anyhow::Error) -> Response {
    let message = format!("{:#}", error);
    let (status, body) = match error.downcast_ref::<UpstreamError>() {
        Some(upstream) if upstream.status == 429 => (
            StatusCode::TOO_MANY_REQUESTS,
            ErrorResponse::rate_limit(upstream.info.user_message.clone()),
        ),
        Some(upstream) => (
            StatusCode::BAD_GATEWAY,
            ErrorResponse::api_error(upstream.info.user_message.clone()),
        ),
        None => (StatusCode::BAD_GATEWAY, ErrorResponse::api_error(message)),
    };

    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bedrock::errors::enhance_bedrock_error;
    use crate::trivia::relay::tests::{ScriptedSource, StubInvoker, animals_request, delta};

    #[tokio::test]
    async fn test_streams_relayed_text() {
        let invoker = StubInvoker::new(Ok(ScriptedSource::new(vec![
            delta("["),
            delta("{...}"),
            delta("]"),
        ])));
        let response = start_relay(invoker, animals_request()).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"[{...}]");
    }

    #[tokio::test]
    async fn test_mid_stream_failure_truncates_body() {
        let invoker = StubInvoker::new(Ok(ScriptedSource::new(vec![
            delta("["),
            Err(anyhow::anyhow!("upstream reset")),
        ])));
        let response = start_relay(invoker, animals_request()).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_invocation_failure_is_bad_gateway() {
        let invoker = StubInvoker::new(Err(anyhow::anyhow!("connection refused")));
        let response = start_relay(invoker, animals_request()).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["error"]["type"], "api_error");
        assert!(value["error"]["message"].as_str().unwrap().contains("connection refused"));
    }

    #[test]
    fn test_throttled_upstream_maps_to_429() {
        let error = anyhow::Error::new(UpstreamError {
            status: 429,
            info: enhance_bedrock_error(Some("ThrottlingException"), r#"{"message":"slow"}"#),
        });
        let response = invocation_error_response(&error);
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_rejected_upstream_maps_to_502() {
        let error = anyhow::Error::new(UpstreamError {
            status: 403,
            info: enhance_bedrock_error(Some("AccessDeniedException"), r#"{"message":"no"}"#),
        });
        let response = invocation_error_response(&error);
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
