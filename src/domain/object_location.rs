use std::fmt;
use std::path::{Component, Path};

/// Bucket and key of a stored object, as carried by an object-created event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Whether the bucket is one plain path segment: no separators, not `.`
    /// or `..`, not absolute. Only such buckets may be mapped onto a directory.
    pub fn has_plain_bucket(&self) -> bool {
        let mut components = Path::new(&self.bucket).components();
        !self.bucket.contains('/')
            && matches!(
                (components.next(), components.next()),
                (Some(Component::Normal(_)), None)
            )
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}
