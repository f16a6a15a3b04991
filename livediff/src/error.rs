// Copyright 2026 The Livediff Project
// SPDX-License-Identifier: Apache-2.0

// Error classification and the uniform error page
//
// Every request that does not succeed ends in exactly one ServeError
// variant. The variant fixes the status code and the public message; the
// full diagnostic detail only ever goes to the audit sink.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::error::Error as StdError;
use std::sync::Arc;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use serde::Serialize;

use crate::audit::{record_entry, AuditEntry, AuditSink};
use crate::page::render_error;

/// Longest public message we will echo back to a client.
const MAX_PUBLIC_MESSAGE: usize = 300;

pub const CONFIGURATION_MESSAGE: &str = "File paths not configured";
pub const NOT_FOUND_MESSAGE: &str = "Page not found";
pub const INTERNAL_MESSAGE: &str = "Internal server error";

// ---------------------------------------------------------------------------
// Taxonomy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    DiffComputation,
    RouteNotFound,
    Unclassified,
}

/// Classified outcome of a failed request.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    /// One or both file paths are unset or empty.
    #[error("File paths not configured")]
    Configuration { missing: Vec<&'static str> },

    /// The diff collaborator failed. `summary` is safe to show; `detail`
    /// holds the full source chain.
    #[error("Error comparing files: {summary}")]
    DiffComputation { summary: String, detail: String },

    #[error("Page not found")]
    RouteNotFound { method: String, path: String },

    /// Anything else, including a panic in the handler stack.
    #[error("Internal server error")]
    Unclassified { detail: String },
}

impl ServeError {
    /// Wrap a collaborator error, keeping its message but not its chain.
    pub fn diff_failed(err: &(dyn StdError + 'static)) -> Self {
        ServeError::DiffComputation {
            summary: sanitize_message(&err.to_string()),
            detail: error_chain(err),
        }
    }

    /// A panic inside the collaborator is still a diff failure.
    pub fn diff_panicked(payload: Box<dyn Any + Send + 'static>) -> Self {
        let message = panic_message(&*payload);
        ServeError::DiffComputation {
            summary: sanitize_message(&format!("diff computation panicked: {message}")),
            detail: with_panic_site(format!("panic in diff computation: {message}")),
        }
    }

    /// Classify a caught panic payload.
    pub fn from_panic(payload: Box<dyn Any + Send + 'static>) -> Self {
        ServeError::Unclassified {
            detail: with_panic_site(format!("panic: {}", panic_message(&*payload))),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ServeError::Configuration { .. } => ErrorKind::Configuration,
            ServeError::DiffComputation { .. } => ErrorKind::DiffComputation,
            ServeError::RouteNotFound { .. } => ErrorKind::RouteNotFound,
            ServeError::Unclassified { .. } => ErrorKind::Unclassified,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ServeError::Configuration { .. } => StatusCode::BAD_REQUEST,
            ServeError::DiffComputation { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ServeError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            ServeError::Unclassified { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text rendered into the error page.
    pub fn public_message(&self) -> String {
        self.to_string()
    }

    /// Everything an operator needs. Never sent to the client.
    pub fn detail(&self) -> String {
        match self {
            ServeError::Configuration { missing } => {
                format!("missing file path(s): {}", missing.join(", "))
            }
            ServeError::DiffComputation { detail, .. } => detail.clone(),
            ServeError::RouteNotFound { method, path } => format!("no route for {method} {path}"),
            ServeError::Unclassified { detail } => detail.clone(),
        }
    }

    pub fn to_record(&self) -> ErrorRecord {
        ErrorRecord {
            kind: self.kind(),
            status: self.status().as_u16(),
            message: self.public_message(),
            detail: self.detail(),
        }
    }
}

impl IntoResponse for ServeError {
    fn into_response(self) -> Response {
        let status = self.status();
        let page = render_error(status, &self.public_message());
        let mut response = (status, Html(page)).into_response();
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        response
    }
}

// ---------------------------------------------------------------------------
// ErrorRecord
// ---------------------------------------------------------------------------

/// A classified failure as written to the audit sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    pub kind: ErrorKind,
    pub status: u16,
    pub message: String,
    pub detail: String,
}

// ---------------------------------------------------------------------------
// ErrorResponder
// ---------------------------------------------------------------------------

/// Records a classified failure and renders its error page.
#[derive(Clone)]
pub struct ErrorResponder {
    sink: Arc<dyn AuditSink>,
}

impl ErrorResponder {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    pub fn respond(&self, err: ServeError) -> Response {
        record_entry(self.sink.as_ref(), AuditEntry::Error(err.to_record()));
        err.into_response()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// First line of a message, trimmed and length-capped.
pub fn sanitize_message(message: &str) -> String {
    let first = message.lines().next().unwrap_or("").trim();
    if first.chars().count() <= MAX_PUBLIC_MESSAGE {
        return first.to_string();
    }
    let mut cut: String = first.chars().take(MAX_PUBLIC_MESSAGE).collect();
    cut.push('…');
    cut
}

/// The error and every `source()` below it, one per line.
pub fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut out = format!("{err}");
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(&format!("\n  caused by: {cause}"));
        source = cause.source();
    }
    out.push_str(&format!("\n  debug: {err:?}"));
    out
}

// ---------------------------------------------------------------------------
// Panic reporting
// ---------------------------------------------------------------------------

thread_local! {
    /// Location and backtrace of the latest panic on this thread, left by
    /// the hook for whichever catch site classifies it.
    static LAST_PANIC_SITE: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Replace the default panic hook with one that reports through `tracing`.
///
/// Each panic is logged at error level with its location and a captured
/// backtrace. The same text is kept per thread so that `from_panic` and
/// `diff_panicked` can put it into the `ErrorRecord` detail.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown location".to_string());
        let backtrace = Backtrace::force_capture();

        tracing::error!(
            location = %location,
            backtrace = %backtrace,
            "panic: {}",
            panic_message(info.payload())
        );

        LAST_PANIC_SITE.with(|site| {
            *site.borrow_mut() = Some(format!("at {location}\n{backtrace}"));
        });
    }));
}

fn with_panic_site(mut detail: String) -> String {
    if let Some(site) = LAST_PANIC_SITE.with(|site| site.borrow_mut().take()) {
        detail.push_str("\n  ");
        detail.push_str(&site);
    }
    detail
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
