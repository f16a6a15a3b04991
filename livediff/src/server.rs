// Copyright 2026 The Livediff Project
// SPDX-License-Identifier: Apache-2.0

// HTTP surface
//
// Responsibilities:
// - `/` renders the configured diff through the orchestrator
// - `/health` liveness probe, no dependencies
// - 404 uniform error page for everything else
// - Audit middleware around every route, panic catcher inside it

use std::any::Any;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{Method, Uri};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;

use crate::audit::{audit_middleware, AuditSink};
use crate::config::DiffExecution;
use crate::differ::DiffComputer;
use crate::error::{ErrorResponder, ServeError};
use crate::orchestrator::{DiffOrchestrator, DiffRequest};

// ---------------------------------------------------------------------------
// Shared application state
// ---------------------------------------------------------------------------

/// Shared state injected into axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<DiffOrchestrator>,
    /// Fixed at startup. Handlers only ever read it.
    pub request: Arc<DiffRequest>,
    pub responder: ErrorResponder,
}

/// Everything the router needs, injected by the caller.
pub struct AppDeps {
    pub computer: Arc<dyn DiffComputer>,
    pub request: DiffRequest,
    pub execution: DiffExecution,
    pub audit: Arc<dyn AuditSink>,
    /// Attach an allow-all CORS layer.
    pub cors: bool,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET / -> the rendered diff, buffered or streamed.
pub async fn index(State(state): State<AppState>) -> Response {
    tracing::debug!("index route accessed");
    match state.orchestrator.render(&state.request).await {
        Ok(plan) => plan.into_response(),
        Err(e) => state.responder.respond(e),
    }
}

/// GET /health -> 200 {"status":"ok"}
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Fallback for unknown paths and unsupported methods.
pub async fn not_found(State(state): State<AppState>, method: Method, uri: Uri) -> Response {
    state.responder.respond(ServeError::RouteNotFound {
        method: method.to_string(),
        path: uri.path().to_string(),
    })
}

// ---------------------------------------------------------------------------
// Router construction
// ---------------------------------------------------------------------------

/// Build the axum router with the diff page, health probe and fallback.
///
/// Layering, outermost first: audit, CORS (optional), panic catcher,
/// routes. The audit layer therefore sees every request, preflights
/// included, and the final status and headers of every response,
/// including 500s produced from a panic.
pub fn build_router(deps: AppDeps) -> Router {
    let responder = ErrorResponder::new(deps.audit.clone());
    let state = AppState {
        orchestrator: Arc::new(DiffOrchestrator::new(deps.computer, deps.execution)),
        request: Arc::new(deps.request),
        responder: responder.clone(),
    };

    let on_panic = move |payload: Box<dyn Any + Send + 'static>| {
        responder.respond(ServeError::from_panic(payload))
    };

    let mut router = Router::new()
        .route("/", get(index).fallback(not_found))
        .route("/health", get(health).fallback(not_found))
        .fallback(not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(on_panic));

    if deps.cors {
        router = router.layer(CorsLayer::permissive());
    }

    router.layer(axum::middleware::from_fn_with_state(
        deps.audit,
        audit_middleware,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{MemoryAuditSink, Phase};
    use crate::differ::{DiffComputeError, DiffResult, FileInfo};
    use crate::error::ErrorKind;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt; // for oneshot

    // -----------------------------------------------------------------------
    // Mock collaborator
    // -----------------------------------------------------------------------

    struct StaticDiffer(&'static str);

    impl DiffComputer for StaticDiffer {
        fn compute(&self, file1: &str, file2: &str) -> Result<DiffResult, DiffComputeError> {
            Ok(DiffResult {
                file1_info: FileInfo::named(file1),
                file2_info: FileInfo::named(file2),
                diff_html: self.0.to_string(),
            })
        }
    }

    fn deps(request: DiffRequest, audit: Arc<MemoryAuditSink>) -> AppDeps {
        AppDeps {
            computer: Arc::new(StaticDiffer("<tr>diff</tr>")),
            request,
            execution: DiffExecution::Inline,
            audit,
            cors: false,
        }
    }

    fn configured() -> DiffRequest {
        DiffRequest::new(Some("a.txt".into()), Some("b.txt".into()))
    }

    fn get_request(path: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_string(resp: Response) -> String {
        let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    // -----------------------------------------------------------------------
    // Routes
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn index_renders_diff() {
        let sink = Arc::new(MemoryAuditSink::new());
        let app = build_router(deps(configured(), sink));

        let resp = app.oneshot(get_request("/")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(body_string(resp).await.contains("<tr>diff</tr>"));
    }

    #[tokio::test]
    async fn health_ignores_configuration() {
        let sink = Arc::new(MemoryAuditSink::new());
        let app = build_router(deps(DiffRequest::default(), sink));

        let resp = app.oneshot(get_request("/health")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_string(resp).await, r#"{"status":"ok"}"#);
    }

    #[tokio::test]
    async fn unknown_path_returns_404_page() {
        let sink = Arc::new(MemoryAuditSink::new());
        let app = build_router(deps(configured(), sink.clone()));

        let resp = app.oneshot(get_request("/nonexistent")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(body_string(resp).await.contains("Page not found"));

        let errors = sink.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::RouteNotFound);
        assert_eq!(errors[0].detail, "no route for GET /nonexistent");
    }

    #[tokio::test]
    async fn wrong_method_on_known_path_returns_404_page() {
        let sink = Arc::new(MemoryAuditSink::new());
        let app = build_router(deps(configured(), sink));

        let req = Request::builder()
            .method("POST")
            .uri("/")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    // -----------------------------------------------------------------------
    // Middleware stack
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn every_route_is_audited() {
        let sink = Arc::new(MemoryAuditSink::new());
        let app = build_router(deps(configured(), sink.clone()));

        for path in ["/", "/health", "/missing"] {
            let _ = app.clone().oneshot(get_request(path)).await.unwrap();
        }

        let records = sink.requests();
        assert_eq!(records.len(), 6);
        let statuses: Vec<Option<u16>> = records
            .iter()
            .filter(|r| r.phase == Phase::Outbound)
            .map(|r| r.status)
            .collect();
        assert_eq!(statuses, vec![Some(200), Some(200), Some(404)]);
    }

    #[tokio::test]
    async fn panic_in_handler_becomes_500_page() {
        async fn boom() -> &'static str {
            panic!("handler exploded at src/server.rs:1");
        }

        let sink = Arc::new(MemoryAuditSink::new());
        let responder = ErrorResponder::new(sink.clone());
        let on_panic = move |payload: Box<dyn Any + Send + 'static>| {
            responder.respond(ServeError::from_panic(payload))
        };
        let app = Router::new()
            .route("/boom", get(boom))
            .layer(CatchPanicLayer::custom(on_panic));

        let resp = app.oneshot(get_request("/boom")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_string(resp).await;
        assert!(body.contains("Internal server error"));
        assert!(!body.contains("src/server.rs"));

        let errors = sink.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::Unclassified);
        assert!(errors[0].detail.contains("handler exploded"));
    }

    #[tokio::test]
    async fn cors_layer_added_when_enabled() {
        let sink = Arc::new(MemoryAuditSink::new());
        let mut d = deps(configured(), sink);
        d.cors = true;
        let app = build_router(d);

        let req = Request::builder()
            .method("GET")
            .uri("/health")
            .header("origin", "http://example.com")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn cors_preflight_is_audited() {
        let sink = Arc::new(MemoryAuditSink::new());
        let mut d = deps(configured(), sink.clone());
        d.cors = true;
        let app = build_router(d);

        let req = Request::builder()
            .method("OPTIONS")
            .uri("/health")
            .header("origin", "http://example.com")
            .header("access-control-request-method", "GET")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let records = sink.requests();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].phase, Phase::Inbound);
        assert_eq!(records[0].method, "OPTIONS");
        assert_eq!(records[1].phase, Phase::Outbound);
        assert_eq!(records[1].status, Some(200));
        assert!(records[1]
            .headers
            .iter()
            .any(|(name, value)| name == "access-control-allow-origin" && value == "*"));
        assert!(sink.errors().is_empty());
    }
}
