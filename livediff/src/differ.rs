// Copyright 2026 The Livediff Project
// SPDX-License-Identifier: Apache-2.0

// Diff computation collaborator
//
// The server never diffs anything itself. It calls a `DiffComputer`, which
// turns two file paths into file metadata plus an HTML body. `FileDiffer`
// is the line-based implementation wired in by the binary.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use similar::{ChangeTag, TextDiff};

// ---------------------------------------------------------------------------
// Domain types
// ---------------------------------------------------------------------------

/// Descriptive metadata about one side of the comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    pub path: String,
    pub size: u64,
    pub line_count: usize,
    pub modified: Option<DateTime<Utc>>,
}

impl FileInfo {
    /// Metadata for a path that was not read from disk (tests, fixtures).
    pub fn named(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            size: 0,
            line_count: 0,
            modified: None,
        }
    }
}

/// Output of one diff computation. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffResult {
    pub file1_info: FileInfo,
    pub file2_info: FileInfo,
    pub diff_html: String,
}

/// Failures reported by a `DiffComputer`.
#[derive(Debug, thiserror::Error)]
pub enum DiffComputeError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("{path} is not valid UTF-8 text")]
    NotText {
        path: String,
        source: std::string::FromUtf8Error,
    },
}

// ---------------------------------------------------------------------------
// Trait: DiffComputer (dependency injection point)
// ---------------------------------------------------------------------------

/// Computes the rendered comparison of two files.
///
/// Synchronous on purpose: it may block on file I/O for as long as the
/// files take to read and diff. The orchestrator decides which thread that
/// happens on.
pub trait DiffComputer: Send + Sync {
    fn compute(&self, file1: &str, file2: &str) -> Result<DiffResult, DiffComputeError>;
}

// ---------------------------------------------------------------------------
// FileDiffer
// ---------------------------------------------------------------------------

/// Line diff of two UTF-8 files rendered as an HTML table.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileDiffer;

impl DiffComputer for FileDiffer {
    fn compute(&self, file1: &str, file2: &str) -> Result<DiffResult, DiffComputeError> {
        let (file1_info, old) = read_text(file1)?;
        let (file2_info, new) = read_text(file2)?;

        Ok(DiffResult {
            file1_info,
            file2_info,
            diff_html: render_line_diff(&old, &new),
        })
    }
}

fn read_text(path: &str) -> Result<(FileInfo, String), DiffComputeError> {
    let read_err = |source| DiffComputeError::Read {
        path: path.to_string(),
        source,
    };

    let metadata = std::fs::metadata(Path::new(path)).map_err(read_err)?;
    let bytes = std::fs::read(path).map_err(read_err)?;
    let text = String::from_utf8(bytes).map_err(|source| DiffComputeError::NotText {
        path: path.to_string(),
        source,
    })?;

    let info = FileInfo {
        path: path.to_string(),
        size: metadata.len(),
        line_count: text.lines().count(),
        modified: metadata.modified().ok().map(DateTime::<Utc>::from),
    };
    Ok((info, text))
}

/// Render a line diff as `<table class="diff-table">`, one row per line.
pub fn render_line_diff(old: &str, new: &str) -> String {
    let diff = TextDiff::from_lines(old, new);
    let mut html = String::with_capacity(old.len() + new.len() + 64);
    html.push_str("<table class=\"diff-table\"><tbody>\n");

    for change in diff.iter_all_changes() {
        let (class, marker) = match change.tag() {
            ChangeTag::Equal => ("diff-equal", " "),
            ChangeTag::Delete => ("diff-delete", "-"),
            ChangeTag::Insert => ("diff-insert", "+"),
        };
        let old_num = change.old_index().map(|i| (i + 1).to_string()).unwrap_or_default();
        let new_num = change.new_index().map(|i| (i + 1).to_string()).unwrap_or_default();
        let line = change.value().trim_end_matches(['\n', '\r']);

        html.push_str(&format!(
            "<tr class=\"{class}\"><td class=\"line-num\">{old_num}</td>\
             <td class=\"line-num\">{new_num}</td><td class=\"marker\">{marker}</td>\
             <td class=\"line\"><pre>{}</pre></td></tr>\n",
            html_escape::encode_text(line)
        ));
    }

    html.push_str("</tbody></table>");
    html
}
