//! Recursive character text splitting.
//!
//! Text is cut on the coarsest separator it contains (paragraphs, then
//! lines, then words, then characters) and the pieces are merged back into
//! chunks of at most `chunk_size` characters.

use tracing::warn;

use crate::{
    error::{PrecisError, Result},
    types::Document,
};

pub const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

#[derive(Debug, Clone)]
pub struct RecursiveCharacterTextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

impl RecursiveCharacterTextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_overlap > chunk_size {
            return Err(PrecisError::InvalidChunkOverlap {
                size: chunk_size,
                overlap: chunk_overlap,
            });
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    /// Split every document, keeping its metadata and recording the source
    /// line range of each chunk under `loc.lines`.
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Document> {
        let mut chunks = Vec::new();

        for document in documents {
            let text = &document.content;
            let mut line = 1;
            let mut cursor = 0;

            for chunk in self.split_text(text) {
                let start = text[cursor..]
                    .find(chunk.as_str())
                    .map(|pos| cursor + pos)
                    .unwrap_or(cursor);
                line += text[cursor..start].matches('\n').count();
                let newlines = chunk.matches('\n').count();

                let mut metadata = document.metadata.clone();
                metadata.insert(
                    "loc".to_string(),
                    serde_json::json!({ "lines": { "from": line, "to": line + newlines } }),
                );

                line += newlines;
                cursor = start + chunk.len();
                chunks.push(Document::new(chunk, metadata));
            }
        }

        chunks
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let mut final_chunks = Vec::new();

        let (index, separator) = separators
            .iter()
            .enumerate()
            .find(|(_, sep)| sep.is_empty() || text.contains(sep.as_str()))
            .map(|(i, sep)| (i, sep.as_str()))
            .unwrap_or((separators.len(), ""));
        let remaining: &[String] = if separator.is_empty() {
            &[]
        } else {
            &separators[index + 1..]
        };

        let splits: Vec<&str> = if separator.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            text.split(separator).collect()
        };

        let mut good_splits: Vec<&str> = Vec::new();
        for split in splits {
            if split.chars().count() < self.chunk_size {
                good_splits.push(split);
                continue;
            }
            if !good_splits.is_empty() {
                final_chunks.extend(self.merge_splits(&good_splits, separator));
                good_splits.clear();
            }
            if remaining.is_empty() {
                final_chunks.push(split.to_string());
            } else {
                final_chunks.extend(self.split_recursive(split, remaining));
            }
        }
        if !good_splits.is_empty() {
            final_chunks.extend(self.merge_splits(&good_splits, separator));
        }

        final_chunks
    }

    fn merge_splits(&self, splits: &[&str], separator: &str) -> Vec<String> {
        let separator_len = separator.chars().count();
        let mut docs = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut total = 0;

        for split in splits {
            let len = split.chars().count();

            if total + len + joined_len(&current, separator_len) > self.chunk_size {
                if total > self.chunk_size {
                    warn!(
                        size = total,
                        chunk_size = self.chunk_size,
                        "Created a chunk longer than the configured size"
                    );
                }
                if !current.is_empty() {
                    if let Some(doc) = join_docs(&current, separator) {
                        docs.push(doc);
                    }
                    while total > self.chunk_overlap
                        || (total + len + joined_len(&current, separator_len) > self.chunk_size
                            && total > 0)
                    {
                        let first = current.remove(0);
                        total -= first.chars().count()
                            + if current.is_empty() { 0 } else { separator_len };
                    }
                }
            }

            current.push(split);
            total += len + if current.len() > 1 { separator_len } else { 0 };
        }

        if let Some(doc) = join_docs(&current, separator) {
            docs.push(doc);
        }

        docs
    }
}

/// Separator length added when appending to a non-empty chunk
fn joined_len(current: &[&str], separator_len: usize) -> usize {
    if current.is_empty() { 0 } else { separator_len }
}

fn join_docs(docs: &[&str], separator: &str) -> Option<String> {
    let text = docs.join(separator).trim().to_string();
    if text.is_empty() { None } else { Some(text) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Metadata;

    #[test]
    fn test_overlap_larger_than_size_is_rejected() {
        assert!(matches!(
            RecursiveCharacterTextSplitter::new(10, 20),
            Err(PrecisError::InvalidChunkOverlap { size: 10, overlap: 20 })
        ));
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let splitter = RecursiveCharacterTextSplitter::new(2000, 0).unwrap();
        assert_eq!(splitter.split_text("  hello world  "), vec!["hello world"]);
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        let splitter = RecursiveCharacterTextSplitter::new(10, 0).unwrap();
        assert!(splitter.split_text("").is_empty());
        assert!(splitter.split_text("   \n\n  ").is_empty());
    }

    #[test]
    fn test_splits_on_paragraphs_first() {
        let splitter = RecursiveCharacterTextSplitter::new(12, 0).unwrap();
        let chunks = splitter.split_text("first para\n\nsecond one\n\nthird");
        assert_eq!(chunks, vec!["first para", "second one", "third"]);
    }

    #[test]
    fn test_merges_small_pieces() {
        let splitter = RecursiveCharacterTextSplitter::new(11, 0).unwrap();
        let chunks = splitter.split_text("a b c d e f g h");
        assert_eq!(chunks, vec!["a b c d e f", "g h"]);
    }

    #[test]
    fn test_falls_back_to_characters() {
        let splitter = RecursiveCharacterTextSplitter::new(4, 0).unwrap();
        let chunks = splitter.split_text("abcdefghij");
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_overlap_repeats_tail() {
        let splitter = RecursiveCharacterTextSplitter::new(7, 3).unwrap();
        let chunks = splitter.split_text("aa bb cc dd");
        assert_eq!(chunks, vec!["aa bb", "bb cc", "cc dd"]);
    }

    #[test]
    fn test_chunks_respect_size() {
        let text = "Lorem ipsum dolor sit amet, consectetur adipiscing elit.\n".repeat(200);
        let splitter = RecursiveCharacterTextSplitter::new(2000, 0).unwrap();
        let chunks = splitter.split_text(&text);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 2000));
    }

    #[test]
    fn test_multibyte_characters() {
        let splitter = RecursiveCharacterTextSplitter::new(3, 0).unwrap();
        assert_eq!(splitter.split_text("héllo"), vec!["hél", "lo"]);
    }

    #[test]
    fn test_split_documents_keeps_metadata_and_lines() {
        let mut metadata = Metadata::new();
        metadata.insert("title".to_string(), "Doc".into());
        let document = Document::new("line one\nline two\n\nline four", metadata);

        let splitter = RecursiveCharacterTextSplitter::new(18, 0).unwrap();
        let chunks = splitter.split_documents(&[document]);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, "line one\nline two");
        assert_eq!(chunks[0].metadata["title"], "Doc");
        assert_eq!(chunks[0].metadata["loc"]["lines"]["from"], 1);
        assert_eq!(chunks[0].metadata["loc"]["lines"]["to"], 2);
        assert_eq!(chunks[1].content, "line four");
        assert_eq!(chunks[1].metadata["loc"]["lines"]["from"], 4);
        assert_eq!(chunks[1].metadata["loc"]["lines"]["to"], 4);
    }
}
