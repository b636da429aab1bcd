/// Parameters for creating the vector index. Similarity is always cosine.
#[derive(Debug, Clone)]
pub struct CollectionConfig {
    pub vector_dimensions: u64,
}

impl CollectionConfig {
    pub fn new(vector_dimensions: u64) -> Self {
        Self { vector_dimensions }
    }
}
