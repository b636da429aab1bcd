use crate::domain::{Chunk, Document};

pub trait TextSplitter: Send + Sync {
    fn split(&self, document: &Document) -> Vec<Chunk>;
}
