// Copyright 2026 The Livediff Project
// SPDX-License-Identifier: Apache-2.0

// Chunked delivery of oversized diffs
//
// Responsibilities:
// - Decide when a diff body is large enough to stream
// - Split the body into fixed-size character slices
// - Keep the HTML wrapper intact around the slices
// - Hand the transport a lazy, single-pass body

mod streamer;
mod types;

pub use streamer::FragmentStream;
pub use types::{diff_len, should_stream, Fragment, CHUNK_SIZE, STREAM_THRESHOLD};
