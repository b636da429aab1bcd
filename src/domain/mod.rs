mod batch;
mod chunk;
mod document;
mod embedding;
mod object_location;
mod tenant;

pub use batch::Batch;
pub use chunk::{Chunk, ChunkId};
pub use document::Document;
pub use embedding::Embedding;
pub use object_location::ObjectLocation;
pub use tenant::{TenantId, TenantIdError, TenantRecord};
