// src/extractors/section.rs

// --- Imports ---
use serde::{Deserialize, Serialize};

use crate::extractors::chunker;
use crate::extractors::items::{ItemMap, SectionKey};

// How many following keys are tried when looking for a section's end.
const END_LOOKAHEAD_KEYS: usize = 3;

// --- Data Structures ---

/// One segmented, chunked item of a filing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    #[serde(rename = "item")]
    pub key: String,
    pub description: String,
    #[serde(rename = "contents")]
    pub chunks: Vec<String>,
}

/// Byte offsets of a section within the normalized text buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionBoundary {
    pub key: String,
    pub start: usize,
    pub end: usize,
}

/// Result of segmenting one normalized document.
#[derive(Debug, Clone, Default)]
pub struct SegmentedDocument {
    pub sections: Vec<Section>,
    pub boundaries: Vec<SectionBoundary>,
    /// Keys with no occurrence at all in the text.
    pub missing_keys: Vec<String>,
}

// --- Main Segmenter ---

/// Splits normalized filing text into item sections.
///
/// Item labels usually appear twice, once in the table of contents and once
/// as the real heading. The last occurrence of a key is taken as its start;
/// the end is the first occurrence after that start of one of the next three
/// keys in map order (the first key that has one wins), or end of text.
/// A key that only occurs in the table of contents therefore starts there.
pub struct ItemSegmenter<'a> {
    items: &'a ItemMap,
    target_words: usize,
}

impl<'a> ItemSegmenter<'a> {
    pub fn new(items: &'a ItemMap, target_words: usize) -> Self {
        Self { items, target_words }
    }

    /// Finds the boundaries of every key present in `text`, in map order.
    pub fn find_boundaries(&self, text: &str) -> (Vec<SectionBoundary>, Vec<String>) {
        let keys = self.items.keys();
        let mut boundaries = Vec::with_capacity(keys.len());
        let mut missing = Vec::new();

        for (idx, key) in keys.iter().enumerate() {
            let Some(&start) = key.positions(text).last() else {
                tracing::warn!("No occurrences found for {}", key.label);
                missing.push(key.label.clone());
                continue;
            };

            let end = next_key_position(text, &keys[idx + 1..], start).unwrap_or(text.len());
            tracing::trace!("{} spans bytes {}..{}", key.label, start, end);
            boundaries.push(SectionBoundary {
                key: key.label.clone(),
                start,
                end,
            });
        }

        (boundaries, missing)
    }

    /// Segments and chunks `text`. Sections come out in item map order.
    pub fn segment(&self, text: &str) -> SegmentedDocument {
        let (boundaries, missing_keys) = self.find_boundaries(text);

        let sections = boundaries
            .iter()
            .zip(self.items.keys().iter().filter(|k| !missing_keys.contains(&k.label)))
            .map(|(boundary, key)| {
                let content = text[boundary.start..boundary.end].trim();
                Section {
                    key: key.label.clone(),
                    description: key.description.clone(),
                    chunks: chunker::split_into_chunks(content, self.target_words),
                }
            })
            .collect();

        SegmentedDocument {
            sections,
            boundaries,
            missing_keys,
        }
    }
}

/// Earliest offset after `start` of the first following key that has one.
fn next_key_position(text: &str, following: &[SectionKey], start: usize) -> Option<usize> {
    following
        .iter()
        .take(END_LOOKAHEAD_KEYS)
        .find_map(|key| key.positions(text).into_iter().filter(|&pos| pos > start).min())
}
