// Copyright 2026 The Livediff Project
// SPDX-License-Identifier: Apache-2.0

// Diff orchestration
//
// Validates the configured paths, runs the diff collaborator, classifies
// its failures and picks buffered or streamed delivery by body length.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use axum::http::header::{self, HeaderName};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use crate::config::DiffExecution;
use crate::differ::{DiffComputeError, DiffComputer, DiffResult};
use crate::error::ServeError;
use crate::page::render_index;
use crate::stream::{diff_len, should_stream, FragmentStream};

/// Response header naming the delivery mode that was chosen.
pub const DELIVERY_HEADER: HeaderName = HeaderName::from_static("x-livediff-delivery");

// ---------------------------------------------------------------------------
// DiffRequest
// ---------------------------------------------------------------------------

/// The two paths to compare, fixed at startup and shared read-only by
/// every request. Empty strings count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffRequest {
    file1: Option<String>,
    file2: Option<String>,
}

impl DiffRequest {
    pub fn new(file1: Option<String>, file2: Option<String>) -> Self {
        let keep = |p: Option<String>| p.filter(|p| !p.is_empty());
        Self {
            file1: keep(file1),
            file2: keep(file2),
        }
    }

    pub fn file1(&self) -> Option<&str> {
        self.file1.as_deref()
    }

    pub fn file2(&self) -> Option<&str> {
        self.file2.as_deref()
    }

    pub fn is_complete(&self) -> bool {
        self.file1.is_some() && self.file2.is_some()
    }

    /// Both paths, or a `Configuration` error naming the missing ones.
    pub fn paths(&self) -> Result<(&str, &str), ServeError> {
        match (self.file1(), self.file2()) {
            (Some(a), Some(b)) => Ok((a, b)),
            (a, b) => {
                let mut missing = Vec::new();
                if a.is_none() {
                    missing.push("file1");
                }
                if b.is_none() {
                    missing.push("file2");
                }
                Err(ServeError::Configuration { missing })
            }
        }
    }
}

// ---------------------------------------------------------------------------
// DeliveryPlan
// ---------------------------------------------------------------------------

/// How the `/` response body will be delivered.
#[derive(Debug)]
pub enum DeliveryPlan {
    /// The complete rendered document.
    Buffered(String),
    /// Lazily produced fragments.
    Streamed(FragmentStream),
}

impl DeliveryPlan {
    /// Pick the delivery mode for a finished diff.
    pub fn for_result(result: DiffResult) -> Self {
        if should_stream(diff_len(&result.diff_html)) {
            DeliveryPlan::Streamed(FragmentStream::new(result))
        } else {
            DeliveryPlan::Buffered(render_index(&result))
        }
    }

    pub fn is_streamed(&self) -> bool {
        matches!(self, DeliveryPlan::Streamed(_))
    }
}

impl IntoResponse for DeliveryPlan {
    fn into_response(self) -> Response {
        match self {
            DeliveryPlan::Buffered(document) => {
                (StatusCode::OK, [(DELIVERY_HEADER, "buffered")], Html(document)).into_response()
            }
            DeliveryPlan::Streamed(fragments) => (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/html; charset=utf-8"),
                    (DELIVERY_HEADER, "streamed"),
                ],
                fragments.into_body(),
            )
                .into_response(),
        }
    }
}

// ---------------------------------------------------------------------------
// DiffOrchestrator
// ---------------------------------------------------------------------------

pub struct DiffOrchestrator {
    computer: Arc<dyn DiffComputer>,
    execution: DiffExecution,
}

impl DiffOrchestrator {
    pub fn new(computer: Arc<dyn DiffComputer>, execution: DiffExecution) -> Self {
        Self {
            computer,
            execution,
        }
    }

    /// Produce the delivery plan for `request`.
    ///
    /// The collaborator is not called unless both paths are set. A failed
    /// computation never exposes a partial result.
    pub async fn render(&self, request: &DiffRequest) -> Result<DeliveryPlan, ServeError> {
        tracing::debug!(file1 = ?request.file1(), file2 = ?request.file2(), "diff requested");

        let (file1, file2) = request.paths()?;
        let result = self.compute(file1, file2).await?;

        let len = diff_len(&result.diff_html);
        tracing::debug!(
            file1_info = ?result.file1_info,
            file2_info = ?result.file2_info,
            diff_html_len = len,
            "diff generated"
        );

        let plan = DeliveryPlan::for_result(result);
        if plan.is_streamed() {
            tracing::debug!(diff_html_len = len, "large diff, streaming response");
        }
        Ok(plan)
    }

    async fn compute(&self, file1: &str, file2: &str) -> Result<DiffResult, ServeError> {
        let outcome = match self.execution {
            DiffExecution::Inline => {
                let computer = self.computer.as_ref();
                catch_unwind(AssertUnwindSafe(|| computer.compute(file1, file2)))
                    .map_err(ServeError::diff_panicked)?
            }
            DiffExecution::Blocking => {
                let computer = self.computer.clone();
                let (file1, file2) = (file1.to_string(), file2.to_string());
                // Classify on the worker thread, where the panic hook left the site.
                let joined = tokio::task::spawn_blocking(move || {
                    catch_unwind(AssertUnwindSafe(|| computer.compute(&file1, &file2)))
                        .map_err(ServeError::diff_panicked)
                })
                .await;
                match joined {
                    Ok(outcome) => outcome?,
                    Err(e) if e.is_panic() => return Err(ServeError::diff_panicked(e.into_panic())),
                    Err(e) => {
                        return Err(ServeError::Unclassified {
                            detail: format!("diff task did not complete: {e}"),
                        })
                    }
                }
            }
        };

        outcome.map_err(|e: DiffComputeError| ServeError::diff_failed(&e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::differ::FileInfo;
    use crate::error::install_panic_hook;
    use crate::stream::{Fragment, STREAM_THRESHOLD};
    use std::sync::atomic::{AtomicUsize, Ordering};

    // -----------------------------------------------------------------------
    // Mock collaborators
    // -----------------------------------------------------------------------

    /// Returns a fixed body and counts calls.
    struct FixedDiffer {
        body: String,
        calls: AtomicUsize,
    }

    impl FixedDiffer {
        fn new(body: String) -> Self {
            Self {
                body,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl DiffComputer for FixedDiffer {
        fn compute(&self, file1: &str, file2: &str) -> Result<DiffResult, DiffComputeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(DiffResult {
                file1_info: FileInfo::named(file1),
                file2_info: FileInfo::named(file2),
                diff_html: self.body.clone(),
            })
        }
    }

    struct FailingDiffer;

    impl DiffComputer for FailingDiffer {
        fn compute(&self, file1: &str, _file2: &str) -> Result<DiffResult, DiffComputeError> {
            Err(DiffComputeError::Read {
                path: file1.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            })
        }
    }

    struct PanickingDiffer;

    impl DiffComputer for PanickingDiffer {
        fn compute(&self, _file1: &str, _file2: &str) -> Result<DiffResult, DiffComputeError> {
            panic!("differ exploded");
        }
    }

    fn full_request() -> DiffRequest {
        DiffRequest::new(Some("a.txt".into()), Some("b.txt".into()))
    }

    fn orchestrator(computer: Arc<dyn DiffComputer>, execution: DiffExecution) -> DiffOrchestrator {
        DiffOrchestrator::new(computer, execution)
    }

    // -----------------------------------------------------------------------
    // DiffRequest
    // -----------------------------------------------------------------------

    #[test]
    fn empty_paths_count_as_unset() {
        let req = DiffRequest::new(Some(String::new()), Some("b.txt".into()));
        assert_eq!(req.file1(), None);
        assert!(!req.is_complete());
    }

    #[test]
    fn paths_names_every_missing_side() {
        let err = DiffRequest::new(None, None).paths().unwrap_err();
        assert_eq!(err.detail(), "missing file path(s): file1, file2");

        let err = DiffRequest::new(Some("a".into()), None).paths().unwrap_err();
        assert_eq!(err.detail(), "missing file path(s): file2");
    }

    // -----------------------------------------------------------------------
    // Configuration errors skip the collaborator
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn missing_path_never_calls_collaborator() {
        let differ = Arc::new(FixedDiffer::new("x".into()));
        let orch = orchestrator(differ.clone(), DiffExecution::Blocking);

        let req = DiffRequest::new(Some("a.txt".into()), None);
        let err = orch.render(&req).await.unwrap_err();

        assert!(matches!(err, ServeError::Configuration { .. }));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(differ.calls.load(Ordering::SeqCst), 0);
    }

    // -----------------------------------------------------------------------
    // Delivery selection
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn small_diff_is_buffered_verbatim() {
        let body = "<tr><td>small diff</td></tr>".to_string();
        let differ = Arc::new(FixedDiffer::new(body.clone()));
        let orch = orchestrator(differ.clone(), DiffExecution::Inline);

        match orch.render(&full_request()).await.unwrap() {
            DeliveryPlan::Buffered(doc) => assert!(doc.contains(&body)),
            DeliveryPlan::Streamed(_) => panic!("expected buffered delivery"),
        }
        assert_eq!(differ.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn threshold_length_is_still_buffered() {
        let differ = Arc::new(FixedDiffer::new("x".repeat(STREAM_THRESHOLD)));
        let orch = orchestrator(differ, DiffExecution::Blocking);

        let plan = orch.render(&full_request()).await.unwrap();
        assert!(!plan.is_streamed());
    }

    #[tokio::test]
    async fn one_past_threshold_is_streamed() {
        let body = "x".repeat(STREAM_THRESHOLD + 1);
        let differ = Arc::new(FixedDiffer::new(body.clone()));
        let orch = orchestrator(differ, DiffExecution::Blocking);

        let DeliveryPlan::Streamed(stream) = orch.render(&full_request()).await.unwrap() else {
            panic!("expected streamed delivery");
        };
        let rebuilt: String = stream
            .filter_map(|f| match f {
                Fragment::BodySlice { text, .. } => Some(text),
                _ => None,
            })
            .collect();
        assert!(rebuilt == body);
    }

    // -----------------------------------------------------------------------
    // Collaborator failures
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn collaborator_error_becomes_diff_computation_error() {
        for execution in [DiffExecution::Inline, DiffExecution::Blocking] {
            let orch = orchestrator(Arc::new(FailingDiffer), execution);
            let err = orch.render(&full_request()).await.unwrap_err();

            assert!(matches!(err, ServeError::DiffComputation { .. }), "{err:?}");
            assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(
                err.public_message(),
                "Error comparing files: cannot read a.txt: denied"
            );
            assert!(err.detail().contains("caused by: denied"));
        }
    }

    #[tokio::test]
    async fn collaborator_panic_is_classified_not_propagated() {
        for execution in [DiffExecution::Inline, DiffExecution::Blocking] {
            let orch = orchestrator(Arc::new(PanickingDiffer), execution);
            let err = orch.render(&full_request()).await.unwrap_err();

            assert!(matches!(err, ServeError::DiffComputation { .. }), "{err:?}");
            assert!(err.public_message().contains("differ exploded"));
        }
    }

    #[tokio::test]
    async fn collaborator_panic_detail_names_the_panic_site() {
        install_panic_hook();

        for execution in [DiffExecution::Inline, DiffExecution::Blocking] {
            let orch = orchestrator(Arc::new(PanickingDiffer), execution);
            let err = orch.render(&full_request()).await.unwrap_err();

            let detail = err.detail();
            assert!(detail.contains("panic in diff computation: differ exploded"));
            assert!(detail.contains("\n  at "), "{detail}");
            assert!(detail.contains("src/orchestrator.rs:"), "{detail}");
            assert!(!err.public_message().contains("src/orchestrator.rs"));
        }
    }

    // -----------------------------------------------------------------------
    // Responses
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn plan_responses_are_tagged_with_delivery_mode() {
        let small = DeliveryPlan::Buffered("<p>hi</p>".into()).into_response();
        assert_eq!(small.status(), StatusCode::OK);
        assert_eq!(small.headers()[DELIVERY_HEADER], "buffered");
        assert_eq!(small.headers()[header::CONTENT_TYPE], "text/html; charset=utf-8");

        let result = DiffResult {
            file1_info: FileInfo::named("a"),
            file2_info: FileInfo::named("b"),
            diff_html: "y".repeat(STREAM_THRESHOLD + 10),
        };
        let big = DeliveryPlan::for_result(result).into_response();
        assert_eq!(big.status(), StatusCode::OK);
        assert_eq!(big.headers()[DELIVERY_HEADER], "streamed");
        assert!(big.headers().get(header::CONTENT_LENGTH).is_none());
    }
}
