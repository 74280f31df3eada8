//! HTTP trigger for generation runs.
//!
//! `POST /webhook` accepts push events from GitLab or GitHub. A push to the
//! configured default branch submits a run to the [`GenerationWorker`] and
//! returns at once; the response never reflects how the run turns out.
//!
//! ```text
//! curl -X POST http://localhost:8080/webhook \
//!   -H 'Content-Type: application/json' \
//!   -H 'X-Gitlab-Event: Push Hook' \
//!   -d '{"ref":"refs/heads/main"}'
//! ```

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use log::{debug, error, info};
use serde_json::Value;

use crate::worker::{GenerationWorker, SubmitOutcome, Trigger};

pub const GITLAB_EVENT_HEADER: &str = "x-gitlab-event";
pub const GITHUB_EVENT_HEADER: &str = "x-github-event";

/// Shared state for the webhook handlers.
#[derive(Clone)]
pub struct AppState {
    pub default_branch: Arc<str>,
    pub worker: GenerationWorker,
}

impl AppState {
    pub fn new(default_branch: &str, worker: GenerationWorker) -> Self {
        Self {
            default_branch: Arc::from(default_branch),
            worker,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(webhook))
        .route("/health", get(health))
        .with_state(state)
}

/// True when the request carries a non-empty GitLab or GitHub event header.
pub fn is_git_event(headers: &HeaderMap) -> bool {
    [GITLAB_EVENT_HEADER, GITHUB_EVENT_HEADER].iter().any(|name| {
        headers
            .get(*name)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| !value.trim().is_empty())
    })
}

/// The `ref` field of a JSON object payload.
pub fn extract_ref(payload: &[u8]) -> Option<String> {
    match serde_json::from_slice::<Value>(payload).ok()? {
        Value::Object(map) => map.get("ref")?.as_str().map(str::to_string),
        _ => None,
    }
}

/// Accepts `refs/heads/<default>` or the bare `<default>`.
pub fn is_allowed_branch(reference: Option<&str>, default_branch: &str) -> bool {
    match reference {
        Some(reference) if !reference.is_empty() => {
            reference == default_branch
                || reference.strip_prefix("refs/heads/") == Some(default_branch)
        }
        _ => false,
    }
}

async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    if !is_git_event(&headers) {
        debug!("Ignoring request without a git event header");
        return (StatusCode::ACCEPTED, "Ignored\n".to_string());
    }

    let reference = extract_ref(&body);
    if !is_allowed_branch(reference.as_deref(), &state.default_branch) {
        let shown = reference.as_deref().unwrap_or("<none>");
        debug!("Ignoring push to {}", shown);
        return (StatusCode::ACCEPTED, format!("Branch {} ignored\n", shown));
    }

    let trigger = Trigger::new(format!(
        "push to {}",
        reference.as_deref().unwrap_or(&state.default_branch)
    ));
    match state.worker.submit(trigger) {
        Ok(SubmitOutcome::Queued) => info!("Generation run queued"),
        Ok(SubmitOutcome::Coalesced) => info!("Generation run already pending"),
        Err(e) => {
            error!("Cannot queue generation run: {}", e);
            return (StatusCode::SERVICE_UNAVAILABLE, "Unavailable\n".to_string());
        }
    }
    (StatusCode::OK, "OK\n".to_string())
}

async fn health() -> &'static str {
    "OK\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::{RunReport, RunState};
    use crate::worker::RunJob;
    use axum::body::Body;
    use axum::http::{HeaderValue, Request};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;
    use tower::ServiceExt;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(*value));
        }
        map
    }

    fn counting_app() -> (Router, Arc<AtomicU64>) {
        let runs = Arc::new(AtomicU64::new(0));
        let counter = runs.clone();
        let job: RunJob = Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(RunReport {
                branches: Vec::new(),
                final_state: RunState::Done,
            })
        });
        let (worker, _handle) = GenerationWorker::spawn(job, None);
        (router(AppState::new("main", worker)), runs)
    }

    async fn post_webhook(app: Router, event: Option<(&str, &str)>, body: &str) -> (StatusCode, String) {
        let mut request = Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "application/json");
        if let Some((name, value)) = event {
            request = request.header(name, value);
        }
        let response = app
            .oneshot(request.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn test_is_git_event() {
        assert!(is_git_event(&headers(&[("x-gitlab-event", "Push Hook")])));
        assert!(is_git_event(&headers(&[("x-github-event", "push")])));
        assert!(!is_git_event(&headers(&[("x-gitlab-event", "")])));
        assert!(!is_git_event(&headers(&[("content-type", "application/json")])));
    }

    #[test]
    fn test_extract_ref() {
        assert_eq!(
            extract_ref(br#"{"ref":"refs/heads/main"}"#),
            Some("refs/heads/main".to_string())
        );
        assert_eq!(extract_ref(br#"{"before":"abc"}"#), None);
        assert_eq!(extract_ref(br#"{"ref":42}"#), None);
        assert_eq!(extract_ref(br#"["refs/heads/main"]"#), None);
        assert_eq!(extract_ref(b"not json"), None);
        assert_eq!(extract_ref(b""), None);
    }

    #[test]
    fn test_is_allowed_branch() {
        assert!(is_allowed_branch(Some("refs/heads/main"), "main"));
        assert!(is_allowed_branch(Some("main"), "main"));
        assert!(!is_allowed_branch(Some("refs/heads/develop"), "main"));
        assert!(!is_allowed_branch(Some("refs/tags/main"), "main"));
        assert!(!is_allowed_branch(Some(""), "main"));
        assert!(!is_allowed_branch(None, "main"));
    }

    #[tokio::test]
    async fn test_non_git_request_is_ignored() {
        let (app, runs) = counting_app();
        let (status, body) = post_webhook(app, None, r#"{"ref":"refs/heads/main"}"#).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body, "Ignored\n");
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_other_branch_is_ignored() {
        let (app, runs) = counting_app();
        let (status, body) = post_webhook(
            app,
            Some(("X-Gitlab-Event", "Push Hook")),
            r#"{"ref":"refs/heads/develop"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body, "Branch refs/heads/develop ignored\n");
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_push_to_default_branch_starts_run() {
        let (app, runs) = counting_app();
        let (status, body) = post_webhook(
            app,
            Some(("X-GitHub-Event", "push")),
            r#"{"ref":"refs/heads/main"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK\n");

        for _ in 0..100 {
            if runs.load(Ordering::SeqCst) == 1 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("run was not executed");
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = counting_app();
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
