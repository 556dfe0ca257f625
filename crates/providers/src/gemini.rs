use std::time::Duration;

use {
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
    tracing::{debug, trace, warn},
};

use crate::{
    error::{InvokeError, Result},
    provider::LlmProvider,
};

pub struct GeminiProvider {
    api_key: Secret<String>,
    model: String,
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(api_key: Secret<String>, model: String, base_url: String, timeout: Duration) -> Self {
        Self {
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            client: crate::shared_http_client().clone(),
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Pull `candidates[0].content.parts[0].text` out of a `generateContent`
/// response body.
pub fn extract_reply(body: &str) -> Result<String> {
    let resp: GenerateResponse =
        serde_json::from_str(body).map_err(|e| InvokeError::malformed(e.to_string()))?;
    resp.candidates
        .into_iter()
        .next()
        .ok_or_else(|| InvokeError::malformed("no candidates"))?
        .content
        .ok_or_else(|| InvokeError::malformed("candidate has no content"))?
        .parts
        .into_iter()
        .next()
        .ok_or_else(|| InvokeError::malformed("content has no parts"))?
        .text
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| InvokeError::malformed("part has no text"))
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn id(&self) -> &str {
        &self.model
    }

    async fn generate_reply(&self, prompt: &str) -> Result<String> {
        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: prompt }],
            }],
        };

        debug!(model = %self.model, prompt_len = prompt.len(), "gemini generate request");

        // The key travels as a query parameter, so the URL is never logged.
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let http_resp = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.expose_secret())])
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| InvokeError::transport(e, self.timeout))?;

        let status = http_resp.status();
        let text = http_resp
            .text()
            .await
            .map_err(|e| InvokeError::transport(e, self.timeout))?;

        if !status.is_success() {
            warn!(status = %status, body = %text, "gemini API error");
            return Err(InvokeError::Status { status, body: text });
        }

        trace!(response = %text, "gemini raw response");
        extract_reply(&text)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Json, Router,
        extract::{Path, Query},
        http::StatusCode,
        response::IntoResponse,
        routing::post,
    };

    use super::*;

    #[derive(Debug, Clone)]
    struct Captured {
        model_action: String,
        key: Option<String>,
        body: serde_json::Value,
    }

    type Calls = Arc<Mutex<Vec<Captured>>>;

    async fn start_mock(
        status: StatusCode,
        response: &'static str,
        delay: Duration,
    ) -> (String, Calls) {
        let calls: Calls = Arc::new(Mutex::new(Vec::new()));
        let captured = calls.clone();

        let app = Router::new().route(
            "/v1beta/models/{model_action}",
            post(
                move |Path(model_action): Path<String>,
                      Query(query): Query<std::collections::HashMap<String, String>>,
                      Json(body): Json<serde_json::Value>| {
                    let captured = captured.clone();
                    async move {
                        captured.lock().unwrap().push(Captured {
                            model_action,
                            key: query.get("key").cloned(),
                            body,
                        });
                        tokio::time::sleep(delay).await;
                        (
                            status,
                            [("content-type", "application/json")],
                            response,
                        )
                            .into_response()
                    }
                },
            ),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}"), calls)
    }

    fn provider(base_url: &str, timeout: Duration) -> GeminiProvider {
        GeminiProvider::new(
            Secret::new("test-key".to_string()),
            "gemini-2.0-flash".to_string(),
            base_url.to_string(),
            timeout,
        )
    }

    const OK_BODY: &str =
        r#"{"candidates":[{"content":{"parts":[{"text":"Hello there!"}],"role":"model"}}]}"#;

    #[tokio::test]
    async fn returns_first_candidate_text() {
        let (base, calls) = start_mock(StatusCode::OK, OK_BODY, Duration::ZERO).await;
        let reply = provider(&base, Duration::from_secs(5))
            .generate_reply("hi bot")
            .await
            .unwrap();
        assert_eq!(reply, "Hello there!");

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].model_action, "gemini-2.0-flash:generateContent");
        assert_eq!(calls[0].key.as_deref(), Some("test-key"));
        assert_eq!(
            calls[0].body,
            serde_json::json!({"contents": [{"parts": [{"text": "hi bot"}]}]})
        );
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let (base, _) = start_mock(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"message":"quota"}}"#,
            Duration::ZERO,
        )
        .await;
        let err = provider(&base, Duration::from_secs(5))
            .generate_reply("hi")
            .await
            .unwrap_err();
        assert!(
            matches!(err, InvokeError::Status { status, .. } if status == StatusCode::TOO_MANY_REQUESTS)
        );
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let (base, _) = start_mock(StatusCode::OK, OK_BODY, Duration::from_secs(2)).await;
        let err = provider(&base, Duration::from_millis(100))
            .generate_reply("hi")
            .await
            .unwrap_err();
        assert!(matches!(err, InvokeError::Timeout { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn malformed_body_is_an_error() {
        let (base, _) = start_mock(StatusCode::OK, "not json", Duration::ZERO).await;
        let err = provider(&base, Duration::from_secs(5))
            .generate_reply("hi")
            .await
            .unwrap_err();
        assert!(matches!(err, InvokeError::MalformedResponse { .. }));
    }

    #[test]
    fn extract_reply_requires_every_level() {
        assert!(extract_reply(r#"{"candidates":[]}"#).is_err());
        assert!(extract_reply(r#"{}"#).is_err());
        assert!(extract_reply(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).is_err());
        assert!(extract_reply(r#"{"candidates":[{"content":{"parts":[]}}]}"#).is_err());
        assert!(extract_reply(r#"{"candidates":[{"content":{"parts":[{"inlineData":{}}]}}]}"#).is_err());
        assert!(extract_reply(r#"{"candidates":[{"content":{"parts":[{"text":""}]}}]}"#).is_err());
        assert!(extract_reply(r#"{"candidates":[{"content":{"parts":[{"text":" \n"}]}}]}"#).is_err());
        assert_eq!(
            extract_reply(r#"{"candidates":[{"content":{"parts":[{"text":"a"},{"text":"b"}]}}]}"#)
                .unwrap(),
            "a"
        );
    }
}
