// src/utils/debug_dump.rs
use std::fs;
use std::path::Path;

use crate::extractors::section::SectionBoundary;
use crate::utils::error::StorageError;

/// Inserts `<<<key @ offset>>>` / `<<</key @ offset>>>` markers into the
/// normalized text at every detected section boundary.
pub fn annotate_boundaries(text: &str, boundaries: &[SectionBoundary]) -> String {
    let mut markers: Vec<(usize, String)> = Vec::with_capacity(boundaries.len() * 2);
    for boundary in boundaries {
        markers.push((boundary.start, format!("<<<{} @ {}>>>", boundary.key, boundary.start)));
        markers.push((boundary.end, format!("<<</{} @ {}>>>", boundary.key, boundary.end)));
    }
    // Closing markers sort before opening ones at the same offset.
    markers.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.starts_with("<<</").cmp(&a.1.starts_with("<<</"))));

    let mut annotated = String::with_capacity(text.len() + markers.len() * 24);
    let mut last_pos = 0;
    for (pos, marker) in markers {
        let pos = pos.min(text.len());
        if pos > last_pos {
            annotated.push_str(&text[last_pos..pos]);
            last_pos = pos;
        }
        annotated.push('\n');
        annotated.push_str(&marker);
        annotated.push('\n');
    }
    if last_pos < text.len() {
        annotated.push_str(&text[last_pos..]);
    }
    annotated
}

/// Writes an annotated dump, creating parent directories as needed.
pub fn save_debug_text(path: &Path, contents: &str) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)?;
    tracing::info!("Saved debug dump to {}", path.display());
    Ok(())
}
