//! Sliding-window text chunking

use unicode_segmentation::UnicodeSegmentation;

use crate::error::{Error, Result};
use crate::types::Chunk;

/// Splits text into overlapping windows of user-perceived characters.
///
/// Consecutive chunks repeat `overlap` characters; the final window always ends
/// at the end of the text. Output depends only on the text and parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChunker {
    /// Window size in characters
    chunk_size: usize,
    /// Characters repeated between neighbours
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker, requiring `chunk_size > overlap >= 0`
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::input("chunk_size must be greater than 0"));
        }
        if overlap >= chunk_size {
            return Err(Error::input(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Distance between the starts of consecutive windows
    fn stride(&self) -> usize {
        self.chunk_size - self.overlap
    }

    /// Split `text` from `source` into ordered chunks
    pub fn split(&self, text: &str, source: &str) -> Vec<Chunk> {
        let graphemes: Vec<&str> = text.graphemes(true).collect();
        let total = graphemes.len();
        let mut chunks = Vec::new();

        let mut start = 0usize;
        while start < total {
            let end = (start + self.chunk_size).min(total);
            let window = graphemes[start..end].concat();

            if !window.trim().is_empty() {
                chunks.push(Chunk {
                    index: chunks.len(),
                    text: window,
                    source: source.to_string(),
                    char_start: start,
                    char_end: end,
                });
            }

            if end == total {
                break;
            }
            start += self.stride();
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rejects_overlap_not_smaller_than_size() {
        assert!(matches!(TextChunker::new(100, 100), Err(Error::Input(_))));
        assert!(matches!(TextChunker::new(100, 150), Err(Error::Input(_))));
        assert!(matches!(TextChunker::new(0, 0), Err(Error::Input(_))));
        assert!(TextChunker::new(100, 0).is_ok());
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let chunker = TextChunker::new(1000, 200).unwrap();
        let chunks = chunker.split("The capital of France is Paris.", "facts.pdf");

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].text, "The capital of France is Paris.");
        assert_eq!(chunks[0].source, "facts.pdf");
        assert_eq!((chunks[0].char_start, chunks[0].char_end), (0, 31));
    }

    #[test]
    fn test_windows_overlap_and_cover_text() {
        let chunker = TextChunker::new(4, 1).unwrap();
        let chunks = chunker.split("abcdefghij", "x");
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();

        assert_eq!(texts, vec!["abcd", "defg", "ghij"]);
        assert_eq!(chunks[1].char_start, 3);
        assert_eq!(chunks[2].char_end, 10);
    }

    #[test]
    fn test_last_window_ends_at_text_end() {
        let chunker = TextChunker::new(4, 1).unwrap();
        let texts: Vec<String> = chunker
            .split("abcdefgh", "x")
            .into_iter()
            .map(|c| c.text)
            .collect();

        assert_eq!(texts, vec!["abcd", "defg", "gh"]);
    }

    #[test]
    fn test_counts_graphemes_not_bytes() {
        let chunker = TextChunker::new(3, 1).unwrap();
        let chunks = chunker.split("héllo", "x");

        assert_eq!(chunks[0].text, "hél");
        assert_eq!(chunks[1].text, "llo");
    }

    #[test]
    fn test_whitespace_windows_dropped_and_renumbered() {
        let chunker = TextChunker::new(3, 0).unwrap();
        let chunks = chunker.split("abc      def", "x");
        let indices: Vec<usize> = chunks.iter().map(|c| c.index).collect();

        assert_eq!(chunks.len(), 2);
        assert_eq!(indices, vec![0, 1]);
        assert_eq!(chunks[1].text, "def");
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        let chunker = TextChunker::new(10, 2).unwrap();
        assert!(chunker.split("", "x").is_empty());
    }

    proptest! {
        #[test]
        fn prop_split_is_deterministic(
            text in "[a-zA-Z .\n]{0,400}",
            size in 1usize..60,
            overlap_frac in 0.0f64..1.0,
        ) {
            let overlap = ((size as f64) * overlap_frac) as usize;
            prop_assume!(overlap < size);
            let chunker = TextChunker::new(size, overlap).unwrap();

            prop_assert_eq!(chunker.split(&text, "s"), chunker.split(&text, "s"));
        }

        #[test]
        fn prop_neighbours_share_overlap(
            text in "[a-z]{1,300}",
            size in 2usize..40,
            overlap in 0usize..20,
        ) {
            prop_assume!(overlap < size);
            let chunker = TextChunker::new(size, overlap).unwrap();
            let chunks = chunker.split(&text, "s");

            for pair in chunks.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                prop_assert_eq!(b.char_start, a.char_start + size - overlap);
                let tail: String = a.text.chars().skip(size - overlap).collect();
                prop_assert!(b.text.starts_with(&tail));
            }
            let last = chunks.last().unwrap();
            prop_assert_eq!(last.char_end, text.chars().count());
        }
    }
}
