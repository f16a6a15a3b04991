// Copyright 2026 The Livediff Project
// SPDX-License-Identifier: Apache-2.0

// Stream types
//
// Fragment representation and the fixed size constants that decide when
// and how a diff body is split.

use bytes::Bytes;

use crate::page::{WRAPPER_CLOSE, WRAPPER_OPEN};

/// Diff bodies longer than this many characters are streamed.
pub const STREAM_THRESHOLD: usize = 1_000_000;

/// Characters per `BodySlice` fragment.
pub const CHUNK_SIZE: usize = 100_000;

/// Length of a diff body, in characters.
///
/// Slicing is done on character boundaries so a fragment never splits a
/// multi-byte UTF-8 sequence.
pub fn diff_len(diff_html: &str) -> usize {
    diff_html.chars().count()
}

/// Whether a body of `len` characters must be streamed.
pub fn should_stream(len: usize) -> bool {
    len > STREAM_THRESHOLD
}

// ---------------------------------------------------------------------------
// Fragments
// ---------------------------------------------------------------------------

/// One ordered piece of a streamed HTML response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Document head and file info panel. Never contains the diff body.
    Header(String),
    /// `<div class="diff-content" id="diff-view">`
    WrapperOpen,
    /// A slice of the diff body starting at character `offset`.
    BodySlice { offset: usize, text: String },
    /// Closes the wrapper div.
    WrapperClose,
    /// Closing document markup.
    Footer(String),
}

impl Fragment {
    pub fn as_str(&self) -> &str {
        match self {
            Fragment::Header(s) | Fragment::Footer(s) => s,
            Fragment::WrapperOpen => WRAPPER_OPEN,
            Fragment::BodySlice { text, .. } => text,
            Fragment::WrapperClose => WRAPPER_CLOSE,
        }
    }

    pub fn into_bytes(self) -> Bytes {
        match self {
            Fragment::Header(s) | Fragment::Footer(s) => Bytes::from(s),
            Fragment::BodySlice { text, .. } => Bytes::from(text),
            Fragment::WrapperOpen => Bytes::from_static(WRAPPER_OPEN.as_bytes()),
            Fragment::WrapperClose => Bytes::from_static(WRAPPER_CLOSE.as_bytes()),
        }
    }

    pub fn is_body(&self) -> bool {
        matches!(self, Fragment::BodySlice { .. })
    }
}
