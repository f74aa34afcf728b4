// src/extractors/mod.rs
pub mod chunker;
pub mod items;
pub mod normalize;
pub mod section;

// Re-export key extraction types for convenience
pub use items::ItemMap;
pub use section::{ItemSegmenter, SegmentedDocument};
