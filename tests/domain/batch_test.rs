use std::num::NonZeroUsize;

use kinabalu::domain::{Batch, Chunk};

fn chunks(count: usize) -> Vec<Chunk> {
    (0..count)
        .map(|i| Chunk::new(format!("chunk {i}"), "src", i, i * 10))
        .collect()
}

fn size(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap()
}

#[test]
fn given_25_chunks_and_size_10_when_partitioning_then_yields_10_10_5() {
    let chunks = chunks(25);
    let lengths: Vec<usize> = Batch::partition(&chunks, size(10)).map(|b| b.len()).collect();
    assert_eq!(lengths, vec![10, 10, 5]);
}

#[test]
fn given_exact_multiple_when_partitioning_then_all_batches_full() {
    let chunks = chunks(20);
    let lengths: Vec<usize> = Batch::partition(&chunks, size(10)).map(|b| b.len()).collect();
    assert_eq!(lengths, vec![10, 10]);
}

#[test]
fn given_no_chunks_when_partitioning_then_yields_nothing() {
    let chunks = chunks(0);
    assert_eq!(Batch::partition(&chunks, size(10)).count(), 0);
    assert_eq!(Batch::count(0, size(10)), 0);
}

#[test]
fn given_partition_when_flattened_then_preserves_order() {
    let chunks = chunks(7);
    let flattened: Vec<usize> = Batch::partition(&chunks, size(3))
        .flat_map(|b| b.chunks.iter().map(|c| c.index))
        .collect();
    assert_eq!(flattened, (0..7).collect::<Vec<_>>());
}

#[test]
fn given_partition_when_indexing_then_batch_indexes_are_sequential() {
    let chunks = chunks(7);
    let indexes: Vec<usize> = Batch::partition(&chunks, size(3)).map(|b| b.index).collect();
    assert_eq!(indexes, vec![0, 1, 2]);
}

#[test]
fn given_counts_when_computing_batch_count_then_rounds_up() {
    assert_eq!(Batch::count(3, size(10)), 1);
    assert_eq!(Batch::count(10, size(10)), 1);
    assert_eq!(Batch::count(11, size(10)), 2);
    assert_eq!(Batch::count(25, size(10)), 3);
}

#[test]
fn given_batch_when_collecting_texts_then_matches_chunks() {
    let chunks = chunks(2);
    let batch = Batch::partition(&chunks, size(5)).next().unwrap();
    assert_eq!(batch.texts(), vec!["chunk 0", "chunk 1"]);
}
