//! Recursive text splitter.
//!
//! Content is split on a fixed hierarchy of delimiters (paragraph breaks,
//! line breaks, sentence ends, any whitespace). Pieces are greedily merged
//! back up to `max_size` characters, and any merged piece still too large is
//! split again at the next level. Sizes are counted in Unicode scalar values.

use std::sync::LazyLock;

use regex::Regex;

#[derive(Debug, Clone, Copy)]
enum Level {
    Paragraph,
    Line,
    Sentence,
    Whitespace,
}

const LEVELS: [Level; 4] = [
    Level::Paragraph,
    Level::Line,
    Level::Sentence,
    Level::Whitespace,
];

static PARAGRAPH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{2,}").expect("paragraph regex"));
static LINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n").expect("line regex"));
static SENTENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("sentence regex"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex"));

impl Level {
    fn regex(self) -> &'static Regex {
        match self {
            Self::Paragraph => &PARAGRAPH_RE,
            Self::Line => &LINE_RE,
            Self::Sentence => &SENTENCE_RE,
            Self::Whitespace => &WHITESPACE_RE,
        }
    }

    /// Bytes of each match that stay with the preceding piece. Sentence
    /// punctuation belongs to its sentence; only the whitespace is a delimiter.
    fn kept_prefix(self) -> usize {
        match self {
            Self::Sentence => 1,
            _ => 0,
        }
    }
}

/// Split `content` into ordered, overlapping chunks of at most `max_size`
/// characters.
///
/// Content that already fits is returned as a single trimmed chunk (so empty
/// input yields one empty string). A run of text with no delimiter left to
/// split on is returned whole even if it exceeds `max_size`.
///
/// Every chunk after the first is prefixed with the last `overlap`
/// characters of the previous raw chunk, then cut to its last `max_size`
/// characters. With `overlap == 0` the raw chunks are returned as-is.
pub fn chunk_text(content: &str, max_size: usize, overlap: usize) -> Vec<String> {
    let mut raw = Vec::new();
    split_recursive(content, max_size, 0, &mut raw);
    apply_overlap(raw, max_size, overlap)
}

fn split_recursive(text: &str, max_size: usize, depth: usize, out: &mut Vec<String>) {
    let Some(level) = LEVELS.get(depth).copied() else {
        out.push(text.trim().to_string());
        return;
    };
    if char_len(text) <= max_size {
        out.push(text.trim().to_string());
        return;
    }

    let mut buffer = String::new();
    let mut buffer_len = 0;
    for (glue, piece) in split_with_delimiters(text, level) {
        let piece_len = char_len(piece);
        if buffer.is_empty() {
            buffer.push_str(piece);
            buffer_len = piece_len;
            continue;
        }

        let glue_len = char_len(glue);
        if buffer_len + glue_len + piece_len > max_size {
            flush(&buffer, max_size, depth, out);
            buffer.clear();
            buffer.push_str(piece);
            buffer_len = piece_len;
        } else {
            buffer.push_str(glue);
            buffer.push_str(piece);
            buffer_len += glue_len + piece_len;
        }
    }
    flush(&buffer, max_size, depth, out);
}

fn flush(buffer: &str, max_size: usize, depth: usize, out: &mut Vec<String>) {
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return;
    }
    if char_len(trimmed) > max_size {
        split_recursive(trimmed, max_size, depth + 1, out);
    } else {
        out.push(trimmed.to_string());
    }
}

/// Split on `level`, pairing every piece with the delimiter text that
/// preceded it (empty for the first piece).
fn split_with_delimiters(text: &str, level: Level) -> Vec<(&str, &str)> {
    let mut pieces = Vec::new();
    let mut glue = "";
    let mut last = 0;
    for found in level.regex().find_iter(text) {
        let cut = found.start() + level.kept_prefix();
        pieces.push((glue, &text[last..cut]));
        glue = &text[cut..found.end()];
        last = found.end();
    }
    pieces.push((glue, &text[last..]));
    pieces
}

fn apply_overlap(raw: Vec<String>, max_size: usize, overlap: usize) -> Vec<String> {
    if overlap == 0 || raw.len() < 2 {
        return raw;
    }

    let mut chunks = Vec::with_capacity(raw.len());
    let mut previous: Option<&str> = None;
    for chunk in &raw {
        match previous {
            None => chunks.push(chunk.clone()),
            Some(prev) => {
                let joined = format!("{}{}", tail_chars(prev, overlap), chunk);
                chunks.push(tail_chars(&joined, max_size).to_string());
            }
        }
        previous = Some(chunk);
    }
    chunks
}

fn tail_chars(text: &str, count: usize) -> &str {
    let total = char_len(text);
    if total <= count {
        return text;
    }
    match text.char_indices().nth(total - count) {
        Some((start, _)) => &text[start..],
        None => "",
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MEETING: &str = "Standup notes.\n\nAlice walked through the roadmap for Q3. Bob raised the \
        budget question! Is the migration still on track?\nFollow-up with the infra team.\n\n\
        Action items: draft the RFC, book the review, update the tracker.";

    #[test]
    fn short_content_is_one_trimmed_chunk() {
        assert_eq!(chunk_text("  hello world \n", 1024, 100), vec!["hello world"]);
        assert_eq!(chunk_text("", 1024, 100), vec![""]);
    }

    #[test]
    fn merges_paragraphs_greedily() {
        let chunks = chunk_text("Alpha beta.\n\nGamma delta epsilon.\n\nZeta.", 25, 0);
        assert_eq!(chunks, vec!["Alpha beta.", "Gamma delta epsilon.", "Zeta."]);

        let chunks = chunk_text("Alpha beta.\n\nGamma.\n\nZeta.", 20, 0);
        assert_eq!(chunks, vec!["Alpha beta.\n\nGamma.", "Zeta."]);
    }

    #[test]
    fn falls_back_through_sentence_and_whitespace_levels() {
        let chunks = chunk_text("One. Two three. Four five six.", 12, 0);
        assert_eq!(chunks, vec!["One.", "Two three.", "Four five", "six."]);
    }

    #[test]
    fn undividable_token_is_returned_oversized() {
        let token = "a".repeat(30);
        assert_eq!(chunk_text(&token, 10, 2), vec![token.clone()]);

        let chunks = chunk_text(&format!("ok {token} ok"), 10, 0);
        assert_eq!(chunks, vec!["ok".to_string(), token, "ok".to_string()]);
    }

    #[test]
    fn overlap_prefixes_tail_of_previous_raw_chunk() {
        let chunks = chunk_text("Alpha beta.\n\nGamma delta epsilon.\n\nZeta.", 25, 4);
        insta::assert_debug_snapshot!(chunks, @r#"
        [
            "Alpha beta.",
            "eta.Gamma delta epsilon.",
            "lon.Zeta.",
        ]
        "#);
    }

    #[test]
    fn overlap_pushes_text_off_the_front() {
        let chunks = chunk_text("abcdefgh ijklmnop", 8, 3);
        assert_eq!(chunks, vec!["abcdefgh", "ijklmnop"]);

        let chunks = chunk_text("abcdef ghij", 8, 3);
        assert_eq!(chunks, vec!["abcdef", "defghij"]);
    }

    #[test]
    fn chunks_respect_bounds_and_overlap() {
        for (max_size, overlap) in [(20, 5), (40, 10), (64, 0), (100, 99)] {
            let raw = chunk_text(MEETING, max_size, 0);
            let chunks = chunk_text(MEETING, max_size, overlap);
            assert_eq!(raw.len(), chunks.len());

            for (i, chunk) in chunks.iter().enumerate() {
                assert!(char_len(chunk) <= max_size, "{chunk:?} exceeds {max_size}");
                if i == 0 || overlap == 0 {
                    assert_eq!(chunk, &raw[i]);
                    continue;
                }
                let expected = format!("{}{}", tail_chars(&raw[i - 1], overlap), raw[i]);
                assert_eq!(chunk, tail_chars(&expected, max_size));
                assert!(chunk.ends_with(raw[i].as_str()));
            }
        }
    }

    #[test]
    fn counts_characters_not_bytes() {
        let text = "ééééé ééééé";
        assert_eq!(chunk_text(text, 11, 0), vec![text]);
        assert_eq!(chunk_text(text, 5, 2), vec!["ééééé", "ééééé"]);
    }

    #[test]
    fn whitespace_only_pieces_never_become_overlap_only_chunks() {
        let chunks = chunk_text("delta! \ngamma.\n\n ", 11, 1);
        assert_eq!(chunks.last().map(String::as_str), Some("!gamma."));
        assert!(chunks.iter().all(|chunk| chunk.chars().count() > 1));
    }

    #[test]
    fn is_deterministic() {
        let first = chunk_text(MEETING, 30, 8);
        for _ in 0..5 {
            assert_eq!(chunk_text(MEETING, 30, 8), first);
        }
    }
}
