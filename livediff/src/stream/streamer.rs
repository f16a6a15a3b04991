// Chunked streamer
//
// Turns an oversized DiffResult into Header, WrapperOpen, N BodySlices,
// WrapperClose, Footer. Fragments are produced on demand; nothing past the
// current slice is copied until the consumer asks for it.

use std::convert::Infallible;

use axum::body::Body;
use bytes::Bytes;

use super::types::{Fragment, CHUNK_SIZE};
use crate::differ::DiffResult;
use crate::page::{render_footer, render_header};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Header,
    WrapperOpen,
    Body { byte_offset: usize, char_offset: usize },
    Footer,
    Done,
}

/// Single-pass fragment sequence over one diff result.
///
/// Not `Clone` and not restartable: each fragment is yielded exactly once.
/// Dropping the stream part-way (a client disconnect) just stops
/// production.
#[derive(Debug)]
pub struct FragmentStream {
    result: DiffResult,
    stage: Stage,
    slices: usize,
}

impl FragmentStream {
    pub fn new(result: DiffResult) -> Self {
        Self {
            result,
            stage: Stage::Header,
            slices: 0,
        }
    }

    /// Adapt into a response body the transport pulls one fragment at a time.
    pub fn into_body(self) -> Body {
        let frames = futures_util::stream::iter(
            self.map(|fragment| Ok::<Bytes, Infallible>(fragment.into_bytes())),
        );
        Body::from_stream(frames)
    }

    fn next_slice(&mut self, byte_offset: usize, char_offset: usize) -> Option<Fragment> {
        let rest = &self.result.diff_html[byte_offset..];
        if rest.is_empty() {
            return None;
        }

        let mut end = rest.len();
        let mut taken = 0;
        for (idx, _) in rest.char_indices() {
            if taken == CHUNK_SIZE {
                end = idx;
                break;
            }
            taken += 1;
        }

        self.stage = Stage::Body {
            byte_offset: byte_offset + end,
            char_offset: char_offset + taken,
        };
        self.slices += 1;
        Some(Fragment::BodySlice {
            offset: char_offset,
            text: rest[..end].to_string(),
        })
    }
}

impl Iterator for FragmentStream {
    type Item = Fragment;

    fn next(&mut self) -> Option<Fragment> {
        match self.stage {
            Stage::Header => {
                self.stage = Stage::WrapperOpen;
                Some(Fragment::Header(render_header(
                    &self.result.file1_info,
                    &self.result.file2_info,
                )))
            }
            Stage::WrapperOpen => {
                self.stage = Stage::Body {
                    byte_offset: 0,
                    char_offset: 0,
                };
                Some(Fragment::WrapperOpen)
            }
            Stage::Body {
                byte_offset,
                char_offset,
            } => match self.next_slice(byte_offset, char_offset) {
                Some(slice) => Some(slice),
                None => {
                    self.stage = Stage::Footer;
                    Some(Fragment::WrapperClose)
                }
            },
            Stage::Footer => {
                self.stage = Stage::Done;
                tracing::debug!(slices = self.slices, "diff stream complete");
                Some(Fragment::Footer(render_footer()))
            }
            Stage::Done => None,
        }
    }
}
