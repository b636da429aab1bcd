mod fixed_size_splitter;

pub use fixed_size_splitter::FixedSizeSplitter;
