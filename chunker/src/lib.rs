use text_splitter::TextSplitter;

/// How a `Chunker` prefers to break text when it has to split at all.
/// `None` falls back to a fixed-width hard cut; `Paragraphs`/`Sentences`
/// both delegate to `text-splitter`'s semantic chunker, which already
/// prefers paragraph breaks over sentence breaks over word breaks within
/// a given capacity — the distinction mainly affects how eagerly overlap
/// is re-applied across the resulting boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Paragraphs,
    Sentences,
    None,
}

/// Boundary-respecting text splitter with overlap, matching the
/// ingestion-time contract: full coverage of the input, no chunk beyond
/// `chunk_size` plus a small tolerance, overlap clamped to half the
/// chunk size, empty/whitespace-only input produces no chunks, and text
/// already shorter than `chunk_size` passes through untouched.
#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
    boundary: Boundary,
}

impl Chunker {
    pub fn new(chunk_size: usize, overlap: usize, boundary: Boundary) -> Self {
        let overlap = overlap.min(chunk_size / 2);
        Self {
            chunk_size,
            overlap,
            boundary,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    pub fn chunk(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        if text.len() <= self.chunk_size {
            return vec![text.to_string()];
        }
        match self.boundary {
            Boundary::None => self.chunk_fixed_width(text),
            Boundary::Paragraphs | Boundary::Sentences => self.chunk_semantic(text),
        }
    }

    fn chunk_semantic(&self, text: &str) -> Vec<String> {
        let lower = self.chunk_size.saturating_sub(self.overlap).max(1);
        let splitter = TextSplitter::new(lower..self.chunk_size);
        let base: Vec<String> = splitter.chunks(text).map(str::to_string).collect();
        self.apply_overlap(base)
    }

    fn chunk_fixed_width(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let step = self.chunk_size.saturating_sub(self.overlap).max(1);
        let mut out = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            out.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += step;
        }
        out
    }

    /// Re-applies overlap across chunks produced by the non-overlapping
    /// semantic splitter by prepending the trailing `overlap` characters
    /// of the previous chunk to each chunk after the first.
    fn apply_overlap(&self, chunks: Vec<String>) -> Vec<String> {
        if self.overlap == 0 || chunks.len() < 2 {
            return chunks;
        }
        let mut out = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            if i == 0 {
                out.push(chunk.clone());
                continue;
            }
            let prev = &chunks[i - 1];
            let tail: String = prev
                .chars()
                .rev()
                .take(self.overlap)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            out.push(format!("{tail}{chunk}"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_produces_no_chunks() {
        let chunker = Chunker::new(100, 20, Boundary::Paragraphs);
        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk("   \n\t ").is_empty());
    }

    #[test]
    fn short_text_passes_through() {
        let chunker = Chunker::new(1000, 200, Boundary::Paragraphs);
        let text = "a short note";
        assert_eq!(chunker.chunk(text), vec![text.to_string()]);
    }

    #[test]
    fn overlap_is_clamped_to_half_chunk_size() {
        let chunker = Chunker::new(100, 90, Boundary::None);
        assert_eq!(chunker.overlap(), 50);
    }

    #[test]
    fn fixed_width_chunks_cover_the_whole_input() {
        let text = "x".repeat(250);
        let chunker = Chunker::new(100, 20, Boundary::None);
        let chunks = chunker.chunk(&text);
        assert!(chunks.len() >= 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 100));
        // last chunk reaches the end of input
        assert!(text.ends_with(chunks.last().unwrap().chars().last().unwrap().to_string().as_str()));
    }

    #[test]
    fn semantic_chunks_never_exceed_chunk_size_plus_tolerance() {
        let text = "Paragraph one has several words in it.\n\n".repeat(30);
        let chunker = Chunker::new(200, 40, Boundary::Paragraphs);
        let chunks = chunker.chunk(&text);
        assert!(!chunks.is_empty());
        for c in &chunks {
            assert!(c.chars().count() <= 200 + 40);
        }
    }
}
