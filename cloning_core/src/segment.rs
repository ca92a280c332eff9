use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Default maximum chunk length in characters.
pub const DEFAULT_MAX_CHUNK_LEN: usize = 400;

/// One synthesizable unit of text.
///
/// Chunks are produced in non-decreasing `paragraph_id`, then ascending
/// `part_index`. Joining the chunk texts of one paragraph with single
/// spaces reconstructs that paragraph's normalized text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChunk {
    /// 1-based paragraph number, either parsed from a `Paragraph N:`
    /// marker or assigned sequentially to blank-line-delimited blocks.
    pub paragraph_id: u32,
    /// 1-based position within the paragraph.
    pub part_index: u32,
    /// Total number of parts the paragraph was split into.
    pub part_count: u32,
    pub text: String,
}

impl TextChunk {
    /// File name for the audio rendered from this chunk. Unique within a
    /// job because the (paragraph_id, part_index) pairing is unique.
    pub fn output_file_name(&self) -> String {
        if self.part_count == 1 {
            format!("Paragraph_{}.wav", self.paragraph_id)
        } else {
            format!("Paragraph_{}_part_{}.wav", self.paragraph_id, self.part_index)
        }
    }
}

fn marker_regex() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    // Case-sensitive, whitespace allowed between the word and the number.
    MARKER.get_or_init(|| Regex::new(r"Paragraph\s+(\d+):").unwrap())
}

/// Partition `text` into ordered chunks of at most `max_chunk_len`
/// characters (single words longer than the limit go alone, unsplit).
///
/// Empty input yields an empty sequence. Paragraphs that normalize to
/// nothing are skipped without renumbering the rest.
pub fn segment(text: &str, max_chunk_len: usize) -> Vec<TextChunk> {
    let mut chunks = Vec::new();
    for (paragraph_id, raw) in extract_paragraphs(text) {
        let normalized = normalize(&raw);
        if normalized.is_empty() {
            continue;
        }
        let parts = pack_words(&normalized, max_chunk_len);
        let part_count = parts.len() as u32;
        for (i, part) in parts.into_iter().enumerate() {
            chunks.push(TextChunk {
                paragraph_id,
                part_index: i as u32 + 1,
                part_count,
                text: part,
            });
        }
    }
    chunks
}

/// Extract `(paragraph_id, raw_text)` pairs.
///
/// Structured extraction first: each `Paragraph N:` marker captures the
/// run up to the next marker or end of input. With zero markers, fall
/// back to blank-line-delimited blocks numbered from 1.
fn extract_paragraphs(text: &str) -> Vec<(u32, String)> {
    let markers: Vec<(usize, usize, u32)> = marker_regex()
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let id: u32 = caps.get(1)?.as_str().parse().ok()?;
            Some((whole.start(), whole.end(), id))
        })
        .collect();

    if markers.is_empty() {
        return text
            .split("\n\n")
            .filter(|block| !block.trim().is_empty())
            .enumerate()
            .map(|(i, block)| (i as u32 + 1, block.to_string()))
            .collect();
    }

    markers
        .iter()
        .enumerate()
        .map(|(i, &(_, body_start, id))| {
            let body_end = markers
                .get(i + 1)
                .map(|&(next_start, _, _)| next_start)
                .unwrap_or(text.len());
            (id, text[body_start..body_end].to_string())
        })
        .collect()
}

/// Trim and collapse internal whitespace runs (including newlines) to
/// single spaces.
fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Greedily pack words into chunks. A chunk's running length counts word
/// lengths plus one separator per word already placed, measured in
/// characters (the limit is a character budget, and multi-byte scripts
/// must pack the same as ASCII); a word is added only while that total
/// stays at or under `max_len`. Words are never split, so an oversize
/// word occupies a chunk by itself.
fn pack_words(text: &str, max_len: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;
    for word in text.split_whitespace() {
        let word_chars = word.chars().count();
        if current.is_empty() {
            current.push_str(word);
            current_chars = word_chars;
        } else if current_chars + 1 + word_chars <= max_len {
            current.push(' ');
            current.push_str(word);
            current_chars += 1 + word_chars;
        } else {
            chunks.push(std::mem::take(&mut current));
            current.push_str(word);
            current_chars = word_chars;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(segment("", DEFAULT_MAX_CHUNK_LEN).is_empty());
        assert!(segment("   \n\n  \n", DEFAULT_MAX_CHUNK_LEN).is_empty());
    }

    #[test]
    fn marked_paragraphs_keep_their_numbers() {
        let text = "Paragraph 1: Hello world.\n\nParagraph 2: Goodbye.";
        let chunks = segment(text, DEFAULT_MAX_CHUNK_LEN);
        assert_eq!(chunks.len(), 2);

        assert_eq!(chunks[0].paragraph_id, 1);
        assert_eq!(chunks[0].text, "Hello world.");
        assert_eq!(chunks[0].output_file_name(), "Paragraph_1.wav");

        assert_eq!(chunks[1].paragraph_id, 2);
        assert_eq!(chunks[1].text, "Goodbye.");
        assert_eq!(chunks[1].output_file_name(), "Paragraph_2.wav");
    }

    #[test]
    fn marker_capture_stops_at_next_marker() {
        let text = "Paragraph 3: first body Paragraph 7: second body";
        let chunks = segment(text, DEFAULT_MAX_CHUNK_LEN);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].paragraph_id, 3);
        assert_eq!(chunks[0].text, "first body");
        assert_eq!(chunks[1].paragraph_id, 7);
        assert_eq!(chunks[1].text, "second body");
    }

    #[test]
    fn marker_match_is_case_sensitive() {
        let text = "paragraph 1: lower case\n\nsecond block";
        let chunks = segment(text, DEFAULT_MAX_CHUNK_LEN);
        // No markers found, so blank-line fallback numbers blocks from 1.
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].paragraph_id, 1);
        assert_eq!(chunks[0].text, "paragraph 1: lower case");
        assert_eq!(chunks[1].paragraph_id, 2);
    }

    #[test]
    fn fallback_discards_whitespace_only_blocks() {
        let text = "first\n\n   \n\nsecond";
        let chunks = segment(text, DEFAULT_MAX_CHUNK_LEN);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "first");
        assert_eq!(chunks[1].paragraph_id, 2);
        assert_eq!(chunks[1].text, "second");
    }

    #[test]
    fn whitespace_only_marked_paragraph_is_skipped_without_renumbering() {
        let text = "Paragraph 1:   \nParagraph 2: kept";
        let chunks = segment(text, DEFAULT_MAX_CHUNK_LEN);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].paragraph_id, 2);
        assert_eq!(chunks[0].text, "kept");
    }

    #[test]
    fn newlines_collapse_to_single_spaces() {
        let text = "Paragraph 1: line one\nline two\n  line three  ";
        let chunks = segment(text, DEFAULT_MAX_CHUNK_LEN);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "line one line two line three");
    }

    #[test]
    fn long_paragraph_splits_into_numbered_parts() {
        let text = "Paragraph 1: alpha beta gamma delta";
        let chunks = segment(text, 11);
        assert!(chunks.len() > 1);
        let count = chunks.len() as u32;
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.paragraph_id, 1);
            assert_eq!(chunk.part_index, i as u32 + 1);
            assert_eq!(chunk.part_count, count);
            assert_eq!(
                chunk.output_file_name(),
                format!("Paragraph_1_part_{}.wav", i + 1)
            );
        }
    }

    #[test]
    fn greedy_packing_respects_the_boundary() {
        // 300 repetitions of "a " in one block, limit 10: each chunk packs
        // five words ("a a a a a", 9 chars) before the next would overflow.
        let text = "a ".repeat(300);
        let chunks = segment(&text, 10);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.text.len() <= 10);
        }
        assert_eq!(chunks[0].text, "a a a a a");
    }

    #[test]
    fn chunk_limit_counts_characters_not_bytes() {
        // "привет" is 6 characters but 12 bytes; with a limit of 13, two
        // words plus the separator (13 characters) fit per chunk.
        let text = "Paragraph 1: привет привет привет привет";
        let chunks = segment(text, 13);
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["привет привет", "привет привет"]);
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 13);
        }
    }

    #[test]
    fn oversize_word_gets_its_own_chunk() {
        let text = "short incomprehensibilities end";
        let chunks = segment(text, 10);
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["short", "incomprehensibilities", "end"]);
        for chunk in &chunks {
            assert!(chunk.text.len() <= 10 || !chunk.text.contains(' '));
        }
    }

    #[test]
    fn chunk_join_round_trips_normalized_paragraph() {
        let text = "Paragraph 4: one two\nthree   four five six seven eight nine ten";
        let normalized = "one two three four five six seven eight nine ten";
        let chunks = segment(text, 16);
        let joined = chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(joined, normalized);
    }

    #[test]
    fn segmentation_is_deterministic() {
        let text = "Paragraph 1: some text here\n\nParagraph 2: and some more text";
        let first = segment(text, 12);
        for _ in 0..5 {
            assert_eq!(segment(text, 12), first);
        }
    }

    #[test]
    fn file_names_are_unique_within_a_job() {
        let text = "Paragraph 1: a b c d e f g h\n\nParagraph 2: i j k l m n o p";
        let chunks = segment(text, 5);
        let mut names: Vec<String> = chunks.iter().map(|c| c.output_file_name()).collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn chunks_are_ordered_by_paragraph_then_part() {
        let text = "Paragraph 2: a b c d e f\n\nParagraph 5: g h i j k l";
        let chunks = segment(text, 5);
        let mut last = (0u32, 0u32);
        for chunk in &chunks {
            let key = (chunk.paragraph_id, chunk.part_index);
            assert!(key > last);
            if chunk.paragraph_id > last.0 {
                assert_eq!(chunk.part_index, 1);
            }
            last = key;
        }
    }
}
