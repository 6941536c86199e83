use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Break candidates in priority order: paragraph, line, sentence, word.
const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "! ", "? ", " "];

/// A bounded, overlapping slice of the active document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Opaque unique identifier, fresh per ingestion.
    pub id: Uuid,
    /// The chunk text, an exact slice of the source document.
    pub text: String,
    /// Ordinal position in the document, starting at 0.
    pub index: usize,
    /// Offset of the first char of this chunk in the document (in chars).
    pub offset: usize,
}

impl Chunk {
    /// Length of the chunk in chars.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Chunk sizing, in chars.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Largest chunk, in chars.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Chars shared by consecutive chunks.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_chunk_size() -> usize {
    500
}

fn default_chunk_overlap() -> usize {
    50
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

/// Splits document text into overlapping chunks, preferring natural
/// boundaries (paragraph, line, sentence, word) before a hard cut.
///
/// Consecutive chunks share exactly `chunk_overlap` chars, so dropping that
/// prefix from every chunk after the first and concatenating the rest
/// reproduces the input verbatim. Runs of whitespace are chunked like any
/// other text.
#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Chunker {
    /// Create a chunker. `chunk_size` is at least 1 and the overlap is
    /// clamped below it so every window makes progress.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }

    /// Create a chunker from its configuration section.
    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Largest chunk, in chars.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Effective overlap after clamping.
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into chunks. Empty input yields no chunks.
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        let mut chunks = Vec::new();
        if total == 0 {
            return chunks;
        }

        let mut start = 0;
        loop {
            let window_end = (start + self.chunk_size).min(total);
            let end = if window_end == total {
                total
            } else {
                self.find_break(&chars, start, window_end)
            };

            chunks.push(Chunk {
                id: Uuid::new_v4(),
                text: chars[start..end].iter().collect(),
                index: chunks.len(),
                offset: start,
            });

            if end == total {
                break;
            }
            start = end.saturating_sub(self.chunk_overlap).max(start + 1);
        }

        chunks
    }

    /// Pick the end of the window `[start, window_end)`.
    ///
    /// A break must land past `min_end` so the next window (which starts
    /// `chunk_overlap` chars earlier) still advances and chunks stay reasonably full.
    fn find_break(&self, chars: &[char], start: usize, window_end: usize) -> usize {
        let min_end = start + (self.chunk_size / 2).max(self.chunk_overlap + 1);

        for separator in SEPARATORS {
            let sep: Vec<char> = separator.chars().collect();
            if let Some(end) = last_break(chars, &sep, min_end, window_end) {
                return end;
            }
        }

        window_end
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self::from_config(&ChunkingConfig::default())
    }
}

/// Position just after the last `sep` ending inside `[min_end, window_end]`.
fn last_break(chars: &[char], sep: &[char], min_end: usize, window_end: usize) -> Option<usize> {
    let mut end = window_end;
    while end >= min_end && end >= sep.len() {
        if chars[end - sep.len()..end] == *sep {
            return Some(end);
        }
        end -= 1;
    }
    None
}
