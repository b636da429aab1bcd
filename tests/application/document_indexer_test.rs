use std::path::Path;
use std::sync::Arc;

use kinabalu::application::ports::ObjectSourceError;
use kinabalu::application::services::{DocumentIndexer, IndexerError, IngestionError};
use kinabalu::domain::ObjectLocation;
use kinabalu::infrastructure::storage::LocalObjectSource;

use crate::helpers::mocks::{LetterEmbedder, RecordingVectorStore, ingestion_service};

struct Fixture {
    _root: tempfile::TempDir,
    buckets: std::path::PathBuf,
    downloads: std::path::PathBuf,
    store: Arc<RecordingVectorStore>,
    indexer: DocumentIndexer,
}

fn fixture() -> Fixture {
    let root = tempfile::tempdir().unwrap();
    let buckets = root.path().join("buckets");
    let downloads = root.path().join("downloads");
    std::fs::create_dir_all(buckets.join("docs")).unwrap();

    let store = Arc::new(RecordingVectorStore::default());
    let ingestion = Arc::new(ingestion_service(
        Arc::new(LetterEmbedder::default()),
        store.clone(),
        1000,
        10,
    ));
    let source = Arc::new(LocalObjectSource::new(buckets.clone()).unwrap());
    let indexer = DocumentIndexer::new(source, ingestion, downloads.clone());

    Fixture {
        _root: root,
        buckets,
        downloads,
        store,
        indexer,
    }
}

fn put_object(buckets: &Path, bucket: &str, key: &str, data: &[u8]) {
    let path = buckets.join(bucket).join(key);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, data).unwrap();
}

#[tokio::test]
async fn given_uploaded_object_when_indexing_then_downloads_and_ingests() {
    let fx = fixture();
    put_object(&fx.buckets, "docs", "reports/q1.txt", "b".repeat(2500).as_bytes());

    let indexed = fx
        .indexer
        .index_object(&ObjectLocation::new("docs", "reports/q1.txt"))
        .await
        .unwrap();

    assert_eq!(indexed.local_path, fx.downloads.join("reports/q1.txt"));
    assert_eq!(std::fs::read(&indexed.local_path).unwrap().len(), 2500);
    assert_eq!(indexed.summary.source, "s3://docs/reports/q1.txt");
    assert_eq!(indexed.summary.chunk_count, 3);
    assert_eq!(indexed.summary.batch_count, 1);
    assert_eq!(fx.store.upsert_sizes(), vec![3]);
}

#[tokio::test]
async fn given_missing_object_when_indexing_then_returns_not_found() {
    let fx = fixture();

    let result = fx
        .indexer
        .index_object(&ObjectLocation::new("docs", "absent.txt"))
        .await;

    assert!(matches!(
        result,
        Err(IndexerError::Download(ObjectSourceError::NotFound(_)))
    ));
}

#[tokio::test]
async fn given_traversal_key_when_indexing_then_rejects_before_download() {
    let fx = fixture();

    for key in ["../escape.txt", "/etc/passwd", "a//b.txt", ""] {
        let result = fx.indexer.index_object(&ObjectLocation::new("docs", key)).await;
        assert!(
            matches!(result, Err(IndexerError::InvalidKey(_))),
            "key {key:?} should be rejected"
        );
    }
    assert!(!fx.downloads.exists());
}

#[tokio::test]
async fn given_traversal_bucket_when_indexing_then_rejects_before_download() {
    let fx = fixture();
    let secret_dir = fx._root.path().join("secret");
    std::fs::create_dir_all(&secret_dir).unwrap();
    std::fs::write(secret_dir.join("passwd.txt"), "root:x:0:0").unwrap();
    let absolute = secret_dir.display().to_string();

    for bucket in [absolute.as_str(), "..", ".", "docs/..", "../secret", "docs/", ""] {
        let result = fx
            .indexer
            .index_object(&ObjectLocation::new(bucket, "passwd.txt"))
            .await;
        assert!(
            matches!(result, Err(IndexerError::InvalidBucket(_))),
            "bucket {bucket:?} should be rejected"
        );
    }
    assert!(!fx.downloads.exists());
    assert!(fx.store.upsert_sizes().is_empty());
}

#[tokio::test]
async fn given_binary_object_when_indexing_then_returns_invalid_encoding() {
    let fx = fixture();
    put_object(&fx.buckets, "docs", "image.bin", &[0xff, 0xfe, 0x00, 0x81]);

    let result = fx
        .indexer
        .index_object(&ObjectLocation::new("docs", "image.bin"))
        .await;

    assert!(matches!(result, Err(IndexerError::InvalidEncoding(..))));
}

#[tokio::test]
async fn given_empty_object_when_indexing_then_returns_empty_document() {
    let fx = fixture();
    put_object(&fx.buckets, "docs", "empty.txt", b"");

    let result = fx
        .indexer
        .index_object(&ObjectLocation::new("docs", "empty.txt"))
        .await;

    assert!(matches!(
        result,
        Err(IndexerError::Ingestion(IngestionError::EmptyDocument(_)))
    ));
}
