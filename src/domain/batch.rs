use std::num::NonZeroUsize;

use super::Chunk;

/// Ordered group of chunks submitted to the index in one call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Batch<'a> {
    pub index: usize,
    pub chunks: &'a [Chunk],
}

impl<'a> Batch<'a> {
    /// Groups `chunks` into batches of `size`; only the last batch may be shorter.
    pub fn partition(chunks: &'a [Chunk], size: NonZeroUsize) -> impl Iterator<Item = Batch<'a>> {
        chunks
            .chunks(size.get())
            .enumerate()
            .map(|(index, chunks)| Batch { index, chunks })
    }

    pub fn count(chunk_count: usize, size: NonZeroUsize) -> usize {
        chunk_count.div_ceil(size.get())
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn texts(&self) -> Vec<&'a str> {
        self.chunks.iter().map(|c| c.text.as_str()).collect()
    }
}
