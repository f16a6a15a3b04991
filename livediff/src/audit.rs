// Copyright 2026 The Livediff Project
// SPDX-License-Identifier: Apache-2.0

// Request lifecycle audit
//
// Responsibilities:
// - Record one inbound entry before every route runs
// - Record one outbound entry after it responds, with the status
// - Carry classified failures from the error responder
// - Never fail a request because the sink failed

use std::sync::{Arc, Mutex};

use axum::extract::{Request, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::Response;
use serde::Serialize;
use uuid::Uuid;

use crate::error::ErrorRecord;

/// Header values replaced before they reach the audit log.
const REDACTED_HEADERS: &[&str] = &["authorization", "proxy-authorization", "cookie", "set-cookie"];

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Inbound,
    Outbound,
}

/// Snapshot of request (or response) metadata at one phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRecord {
    /// Shared by the inbound and outbound record of one request.
    pub request_id: String,
    pub phase: Phase,
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Outbound only.
    pub status: Option<u16>,
}

impl AuditRecord {
    pub fn inbound(request_id: &str, method: &Method, uri: &Uri, headers: &HeaderMap) -> Self {
        Self {
            request_id: request_id.to_string(),
            phase: Phase::Inbound,
            method: method.to_string(),
            url: uri.to_string(),
            headers: snapshot_headers(headers),
            status: None,
        }
    }

    pub fn outbound(
        request_id: &str,
        method: &Method,
        uri: &Uri,
        status: StatusCode,
        headers: &HeaderMap,
    ) -> Self {
        Self {
            request_id: request_id.to_string(),
            phase: Phase::Outbound,
            method: method.to_string(),
            url: uri.to_string(),
            headers: snapshot_headers(headers),
            status: Some(status.as_u16()),
        }
    }
}

/// Anything appended to the audit sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "entry", rename_all = "lowercase")]
pub enum AuditEntry {
    Request(AuditRecord),
    /// Error severity.
    Error(ErrorRecord),
}

/// Copy header names and values; sensitive values are masked and
/// non-UTF-8 values are replaced.
pub fn snapshot_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let name = name.as_str().to_string();
            let value = if REDACTED_HEADERS.contains(&name.as_str()) {
                "[redacted]".to_string()
            } else {
                value.to_str().unwrap_or("[non-utf8]").to_string()
            };
            (name, value)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Trait: AuditSink
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("failed to encode audit entry: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("audit sink unavailable: {0}")]
    Unavailable(String),
}

/// Append-only destination for audit entries.
///
/// One call appends one whole entry; implementations must not interleave
/// partial entries from concurrent requests.
pub trait AuditSink: Send + Sync {
    fn append(&self, entry: AuditEntry) -> Result<(), AuditError>;
}

/// Append and swallow any failure with a warning.
pub fn record_entry(sink: &dyn AuditSink, entry: AuditEntry) {
    if let Err(e) = sink.append(entry) {
        tracing::warn!(error = %e, "audit append failed");
    }
}

/// Writes every entry as one structured `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn append(&self, entry: AuditEntry) -> Result<(), AuditError> {
        match entry {
            AuditEntry::Request(record) => {
                let headers = serde_json::to_string(&record.headers)?;
                tracing::debug!(
                    request_id = %record.request_id,
                    phase = ?record.phase,
                    method = %record.method,
                    url = %record.url,
                    status = record.status,
                    headers = %headers,
                    "http audit"
                );
            }
            AuditEntry::Error(record) => {
                tracing::error!(
                    kind = ?record.kind,
                    status = record.status,
                    message = %record.message,
                    detail = %record.detail,
                    "request failed"
                );
            }
        }
        Ok(())
    }
}

/// Keeps entries in memory, in append order.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn requests(&self) -> Vec<AuditRecord> {
        self.entries()
            .into_iter()
            .filter_map(|e| match e {
                AuditEntry::Request(r) => Some(r),
                AuditEntry::Error(_) => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<ErrorRecord> {
        self.entries()
            .into_iter()
            .filter_map(|e| match e {
                AuditEntry::Error(r) => Some(r),
                AuditEntry::Request(_) => None,
            })
            .collect()
    }
}

impl AuditSink for MemoryAuditSink {
    fn append(&self, entry: AuditEntry) -> Result<(), AuditError> {
        self.entries
            .lock()
            .map_err(|e| AuditError::Unavailable(e.to_string()))?
            .push(entry);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Middleware
// ---------------------------------------------------------------------------

/// Wraps every route: inbound record, run the route, outbound record.
///
/// Observes only. The request and the response pass through untouched.
pub async fn audit_middleware(
    State(sink): State<Arc<dyn AuditSink>>,
    request: Request,
    next: Next,
) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let method = request.method().clone();
    let uri = request.uri().clone();

    record_entry(
        sink.as_ref(),
        AuditEntry::Request(AuditRecord::inbound(
            &request_id,
            &method,
            &uri,
            request.headers(),
        )),
    );

    let response = next.run(request).await;

    record_entry(
        sink.as_ref(),
        AuditEntry::Request(AuditRecord::outbound(
            &request_id,
            &method,
            &uri,
            response.status(),
            response.headers(),
        )),
    );

    response
}
