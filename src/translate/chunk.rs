//! Splits long text into request-sized chunks at sentence or paragraph
//! boundaries. Window sizes are in characters; markers are ASCII, so every
//! byte offset where one matches is also a char boundary.

/// Break markers, tried in order.
const BREAK_MARKERS: [&str; 5] = [". ", "! ", "? ", "\n\n", "\r\n\r\n"];

/// Split `text` into contiguous chunks of roughly `max_length` characters.
///
/// For each marker, the last occurrence starting after the chunk start and
/// no later than the window end is found; the cut goes just after the
/// earliest-starting of those. A marker that starts inside the window but
/// straddles its end still counts, so a chunk can run up to a marker's length
/// minus one past `max_length`. With no marker the cut is exactly at the
/// window end. Concatenating the result always reproduces `text`.
pub fn chunk_text(text: &str, max_length: usize) -> Vec<&str> {
    let max_length = max_length.max(1);
    let bytes = text.as_bytes();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = window_end(text, start, max_length);
        if end < text.len() {
            let mut best = end;
            for marker in BREAK_MARKERS {
                if let Some(pos) = last_index_of(bytes, marker.as_bytes(), start, end) {
                    if pos < best {
                        best = pos + marker.len();
                    }
                }
            }
            end = best;
        }

        chunks.push(&text[start..end]);
        start = end;
    }

    chunks
}

/// Byte offset `max_chars` characters after `start`, clamped to the text end.
fn window_end(text: &str, start: usize, max_chars: usize) -> usize {
    text[start..]
        .char_indices()
        .nth(max_chars)
        .map_or(text.len(), |(offset, _)| start + offset)
}

/// Last position `p` with `after < p <= from` where `needle` starts in
/// `haystack`. The scan never goes back past `after`, keeping each window's
/// search proportional to the window.
fn last_index_of(haystack: &[u8], needle: &[u8], after: usize, from: usize) -> Option<usize> {
    let last_start = haystack.len().checked_sub(needle.len())?.min(from);
    (after + 1..=last_start)
        .rev()
        .find(|&i| haystack[i..].starts_with(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_exhaustive(text: &str, max_length: usize) {
        let chunks = chunk_text(text, max_length);
        assert_eq!(chunks.concat(), text, "max_length = {max_length}");
        assert!(chunks.iter().all(|c| !c.is_empty()));
    }

    #[test]
    fn empty_text_has_no_chunks() {
        assert!(chunk_text("", 10).is_empty());
    }

    #[test]
    fn short_text_is_single_chunk() {
        assert_eq!(chunk_text("Hello world", 11), vec!["Hello world"]);
        assert_eq!(chunk_text("Hello world", 4000), vec!["Hello world"]);
    }

    #[test]
    fn breaks_after_sentence_boundary() {
        let mut text = "a".repeat(3990);
        text.push_str(". ");
        text.push_str(&"b".repeat(4500 - text.len()));
        let chunks = chunk_text(&text, 4000);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 3992);
        assert!(chunks[0].ends_with(". "));
        assert_eq!(chunks[1], "b".repeat(4500 - 3992));
    }

    #[test]
    fn cuts_mid_word_without_boundary() {
        let text = "x".repeat(25);
        assert_eq!(chunk_text(&text, 10), vec!["x".repeat(10), "x".repeat(10), "x".repeat(5)]);
    }

    #[test]
    fn earliest_marker_wins_across_kinds() {
        // "! " at 2 starts before ". " at 6, so the first cut is after "! ".
        let text = "ab! cd. efghijkl";
        let chunks = chunk_text(text, 10);
        assert_eq!(chunks[0], "ab! ");
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn paragraph_breaks_are_boundaries() {
        let text = "first para\n\nsecond para that runs long";
        let chunks = chunk_text(text, 20);
        assert_eq!(chunks[0], "first para\n\n");
        assert_exhaustive(text, 20);
    }

    #[test]
    fn crlf_paragraphs_are_boundaries() {
        let text = "line one\r\n\r\nline two is longer";
        let chunks = chunk_text(text, 15);
        assert_eq!(chunks[0], "line one\r\n\r\n");
        assert_exhaustive(text, 15);
    }

    #[test]
    fn marker_at_chunk_start_is_ignored() {
        // The only ". " sits at the chunk start, so the window is cut plainly.
        let text = ". abcdefghijklmnop";
        let chunks = chunk_text(text, 8);
        assert_eq!(chunks[0], ". abcdef");
    }

    #[test]
    fn window_counts_characters_not_bytes() {
        let text = "ấ".repeat(12);
        let chunks = chunk_text(&text, 5);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 5);
        assert_eq!(chunks[2].chars().count(), 2);
    }

    #[test]
    fn reproduces_text_for_many_window_sizes() {
        let text = "Xin chào! Bạn khỏe không? Tôi khỏe. Cảm ơn.\n\nĐoạn hai.\r\n\r\nĐoạn ba rất dài mà không có dấu chấm";
        for max_length in 1..=text.chars().count() + 1 {
            assert_exhaustive(text, max_length);
        }
    }

    #[test]
    fn zero_window_is_treated_as_one() {
        assert_eq!(chunk_text("abc", 0), vec!["a", "b", "c"]);
    }

    #[test]
    fn last_index_of_respects_limit() {
        let hay = b"a. b. c";
        assert_eq!(last_index_of(hay, b". ", 0, 6), Some(4));
        assert_eq!(last_index_of(hay, b". ", 0, 3), Some(1));
        assert_eq!(last_index_of(hay, b". ", 0, 0), None);
        assert_eq!(last_index_of(b"a", b". ", 0, 5), None);
    }

    #[test]
    fn last_index_of_stops_at_chunk_start() {
        let hay = b"a. b. c";
        assert_eq!(last_index_of(hay, b". ", 1, 6), Some(4));
        assert_eq!(last_index_of(hay, b". ", 1, 3), None);
        assert_eq!(last_index_of(hay, b". ", 4, 6), None);
        assert_eq!(last_index_of(hay, b". ", 6, 6), None);
    }

    #[test]
    fn straddling_marker_extends_chunk_past_window() {
        // ". " starts at the last window char and ends one past it.
        let text = "abcd. efgh";
        let chunks = chunk_text(text, 5);
        assert_eq!(chunks[0], "abcd. ");
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn large_text_without_markers_chunks_in_linear_time() {
        let text = "x".repeat(2_000_000);
        let started = std::time::Instant::now();
        let chunks = chunk_text(&text, 4000);
        let elapsed = started.elapsed();
        assert_eq!(chunks.len(), 500);
        assert!(chunks.iter().all(|c| c.len() == 4000));
        assert!(elapsed < std::time::Duration::from_secs(2), "took {elapsed:?}");
    }
}
