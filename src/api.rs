//! HTTP surface for the webhook bridge.
//!
//! - `POST /notion-webhook` – Run the pipeline for `{"query": string, "page_id": string}`.
//!   Responds `{"status": "Query Processed", "result": ...}` when files matched, or
//!   `{"status": "No files found"}` when the search came back empty. Missing fields default to
//!   empty strings.
//! - `GET /metrics` – Pipeline counters.
//!
//! Any pipeline failure becomes a 500 with a generic body; details only go to the log.

use crate::pipeline::{PipelineApi, PipelineError, PipelineOutcome, SearchQuery};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

const STATUS_PROCESSED: &str = "Query Processed";
const STATUS_NO_FILES: &str = "No files found";

/// Build the HTTP router exposing the webhook endpoint.
pub fn create_router<S>(pipeline: Arc<S>) -> Router
where
    S: PipelineApi + 'static,
{
    Router::new()
        .route("/notion-webhook", post(handle_webhook::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .with_state(pipeline)
}

/// Request body for `POST /notion-webhook`.
#[derive(Debug, Default, Deserialize)]
struct WebhookRequest {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    page_id: Option<String>,
}

impl WebhookRequest {
    fn into_search_query(self) -> SearchQuery {
        if self.query.is_none() {
            tracing::warn!("Webhook body has no query; searching for an empty string");
        }
        if self.page_id.is_none() {
            tracing::warn!("Webhook body has no page_id; the record update will target an empty id");
        }
        SearchQuery {
            query: self.query.unwrap_or_default(),
            page_id: self.page_id.unwrap_or_default(),
        }
    }
}

/// Success body returned by the webhook endpoint.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct WebhookResponse {
    /// `"Query Processed"` or `"No files found"`.
    pub status: &'static str,
    /// Model answer; absent when no files matched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

impl From<PipelineOutcome> for WebhookResponse {
    fn from(outcome: PipelineOutcome) -> Self {
        match outcome {
            PipelineOutcome::NoFiles => Self {
                status: STATUS_NO_FILES,
                result: None,
            },
            PipelineOutcome::Answered { result, .. } => Self {
                status: STATUS_PROCESSED,
                result: Some(result),
            },
        }
    }
}

/// Run the pipeline for one webhook call inside a request-scoped span.
async fn handle_webhook<S>(
    State(pipeline): State<Arc<S>>,
    Json(request): Json<WebhookRequest>,
) -> Result<Json<WebhookResponse>, AppError>
where
    S: PipelineApi,
{
    let span = tracing::info_span!("webhook", request_id = %Uuid::new_v4());
    async move {
        let query = request.into_search_query();
        tracing::info!(query = %query.query, page_id = %query.page_id, "Webhook received");
        let outcome = pipeline.run(query).await?;
        if let PipelineOutcome::Answered { files, .. } = &outcome {
            tracing::info!(files, "Webhook processed");
        } else {
            tracing::info!("Webhook processed without matches");
        }
        Ok(Json(WebhookResponse::from(outcome)))
    }
    .instrument(span)
    .await
}

/// Return the pipeline counters.
async fn get_metrics<S>(State(pipeline): State<Arc<S>>) -> impl IntoResponse
where
    S: PipelineApi,
{
    Json(pipeline.metrics_snapshot())
}

struct AppError(PipelineError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "Webhook failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "status": "Error", "error": "Internal Server Error" })),
        )
            .into_response()
    }
}

impl From<PipelineError> for AppError {
    fn from(inner: PipelineError) -> Self {
        Self(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::create_router;
    use crate::metrics::MetricsSnapshot;
    use crate::notes::NotesError;
    use crate::pipeline::{PipelineApi, PipelineError, PipelineOutcome, SearchQuery};
    use async_trait::async_trait;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Method, Request, StatusCode},
    };
    use reqwest::StatusCode as UpstreamStatus;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tokio::sync::Mutex;
    use tower::ServiceExt;

    #[derive(Clone)]
    struct StubPipeline {
        calls: Arc<Mutex<Vec<SearchQuery>>>,
        outcome: Option<PipelineOutcome>,
    }

    impl StubPipeline {
        fn new(outcome: Option<PipelineOutcome>) -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                outcome,
            }
        }

        async fn recorded_calls(&self) -> Vec<SearchQuery> {
            self.calls.lock().await.clone()
        }
    }

    #[async_trait]
    impl PipelineApi for StubPipeline {
        async fn run(&self, request: SearchQuery) -> Result<PipelineOutcome, PipelineError> {
            self.calls.lock().await.push(request);
            self.outcome.clone().ok_or_else(|| {
                PipelineError::Notes(NotesError::UnexpectedStatus {
                    status: UpstreamStatus::NOT_FOUND,
                    body: "object_not_found: secret page detail".into(),
                })
            })
        }

        fn metrics_snapshot(&self) -> MetricsSnapshot {
            MetricsSnapshot {
                requests_received: 4,
                requests_without_matches: 1,
                files_extracted: 6,
                answers_written: 3,
            }
        }
    }

    async fn post_webhook(app: Router, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/notion-webhook")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request"),
            )
            .await
            .expect("router response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json = serde_json::from_slice(&bytes).expect("json body");
        (status, json)
    }

    #[tokio::test]
    async fn processed_query_returns_answer() {
        let pipeline = Arc::new(StubPipeline::new(Some(PipelineOutcome::Answered {
            result: "Three contracts expire in May.".into(),
            files: 2,
        })));
        let app = create_router(pipeline.clone());

        let (status, body) = post_webhook(
            app,
            json!({ "query": "Which contracts expire soon?", "page_id": "page-42" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({ "status": "Query Processed", "result": "Three contracts expire in May." })
        );
        let calls = pipeline.recorded_calls().await;
        assert_eq!(
            calls,
            vec![SearchQuery {
                query: "Which contracts expire soon?".into(),
                page_id: "page-42".into(),
            }]
        );
    }

    #[tokio::test]
    async fn empty_search_reports_no_files() {
        let pipeline = Arc::new(StubPipeline::new(Some(PipelineOutcome::NoFiles)));
        let app = create_router(pipeline);

        let (status, body) =
            post_webhook(app, json!({ "query": "nothing", "page_id": "page-1" })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "No files found" }));
    }

    #[tokio::test]
    async fn missing_fields_default_to_empty_strings() {
        let pipeline = Arc::new(StubPipeline::new(Some(PipelineOutcome::NoFiles)));
        let app = create_router(pipeline.clone());

        let (status, _) = post_webhook(app, json!({ "query": "budget" })).await;
        assert_eq!(status, StatusCode::OK);

        let app = create_router(pipeline.clone());
        let (status, _) = post_webhook(app, json!({})).await;
        assert_eq!(status, StatusCode::OK);

        let calls = pipeline.recorded_calls().await;
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].query, "budget");
        assert_eq!(calls[0].page_id, "");
        assert_eq!(calls[1], SearchQuery::default());
    }

    #[tokio::test]
    async fn pipeline_failure_is_a_generic_server_error() {
        let pipeline = Arc::new(StubPipeline::new(None));
        let app = create_router(pipeline);

        let (status, body) =
            post_webhook(app, json!({ "query": "budget", "page_id": "page-9" })).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            json!({ "status": "Error", "error": "Internal Server Error" })
        );
        assert!(!body.to_string().contains("secret"));
    }

    #[tokio::test]
    async fn metrics_route_returns_snapshot() {
        let app = create_router(Arc::new(StubPipeline::new(None)));
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri("/metrics")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(json["requests_received"], 4);
        assert_eq!(json["answers_written"], 3);
    }
}
