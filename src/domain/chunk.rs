use std::fmt;

use uuid::Uuid;

/// A contiguous, non-overlapping slice of a source document.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub id: ChunkId,
    pub text: String,
    pub source: String,
    pub index: usize,
    pub offset: usize,
}

/// Identity of an indexed chunk.
///
/// Derived from the source and the chunk position, so indexing the same
/// source twice addresses the same entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkId(Uuid);

impl ChunkId {
    pub fn derive(source: &str, index: usize) -> Self {
        Self(Uuid::new_v5(
            &Uuid::NAMESPACE_URL,
            format!("{}#{}", source, index).as_bytes(),
        ))
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Chunk {
    pub fn new(text: String, source: impl Into<String>, index: usize, offset: usize) -> Self {
        let source = source.into();
        Self {
            id: ChunkId::derive(&source, index),
            text,
            source,
            index,
            offset,
        }
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}
