use std::num::NonZeroUsize;

use crate::application::ports::TextSplitter;
use crate::domain::{Chunk, Document};

/// Cuts text into consecutive runs of at most `chunk_size` characters, with
/// no overlap. Cuts always fall on `char` boundaries.
pub struct FixedSizeSplitter {
    chunk_size: NonZeroUsize,
}

impl FixedSizeSplitter {
    pub fn new(chunk_size: NonZeroUsize) -> Self {
        Self { chunk_size }
    }

    pub fn chunk_size(&self) -> NonZeroUsize {
        self.chunk_size
    }

    pub fn split_text(&self, source: &str, text: &str) -> Vec<Chunk> {
        let size = self.chunk_size.get();
        let mut chunks = Vec::with_capacity(text.len().div_ceil(size));

        let mut start_byte = 0;
        let mut offset = 0;
        let mut chars_in_chunk = 0;

        for (byte_idx, _) in text.char_indices() {
            if chars_in_chunk == size {
                chunks.push(Chunk::new(
                    text[start_byte..byte_idx].to_string(),
                    source,
                    chunks.len(),
                    offset,
                ));
                start_byte = byte_idx;
                offset += chars_in_chunk;
                chars_in_chunk = 0;
            }
            chars_in_chunk += 1;
        }

        if chars_in_chunk > 0 {
            chunks.push(Chunk::new(
                text[start_byte..].to_string(),
                source,
                chunks.len(),
                offset,
            ));
        }

        chunks
    }
}

impl TextSplitter for FixedSizeSplitter {
    fn split(&self, document: &Document) -> Vec<Chunk> {
        self.split_text(&document.source, &document.text)
    }
}
