// src/extractors/chunker.rs

pub const DEFAULT_TARGET_WORDS: usize = 32;

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Splits text into sentences at every whitespace run that directly follows
/// `.`, `!` or `?`. The whitespace run itself is discarded.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut sentence_start = 0;
    let mut prev: Option<char> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if c.is_whitespace() && prev.is_some_and(is_terminal) {
            sentences.push(&text[sentence_start..idx]);
            let mut resume = text.len();
            while let Some(&(next_idx, next)) = chars.peek() {
                if !next.is_whitespace() {
                    resume = next_idx;
                    break;
                }
                chars.next();
            }
            sentence_start = resume;
            prev = None;
            continue;
        }
        prev = Some(c);
    }
    sentences.push(&text[sentence_start..]);
    sentences
}

/// Greedily packs whole sentences into chunks of at most `target_words`
/// whitespace-separated words. A sentence longer than the target becomes a
/// chunk on its own; sentences are never split.
pub fn split_into_chunks(text: &str, target_words: usize) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_words = 0;

    for sentence in split_sentences(text) {
        let words = sentence.split_whitespace().count();
        if current_words + words <= target_words {
            current.push(sentence);
            current_words += words;
        } else {
            if !current.is_empty() {
                chunks.push(current.join(" ").trim().to_string());
            }
            current = vec![sentence];
            current_words = words;
        }
    }
    if !current.is_empty() {
        chunks.push(current.join(" ").trim().to_string());
    }

    chunks
}
