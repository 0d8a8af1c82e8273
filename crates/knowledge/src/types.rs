//! Knowledge system type definitions.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of characters of chunk text shown as a source excerpt.
pub const EXCERPT_CHARS: usize = 200;

/// One page of extracted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Zero-based position of the page within its document
    pub page_number: usize,

    /// Extracted text, line endings normalised to `\n`
    pub text: String,
}

/// A loaded document: its origin filename and ordered pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub source_id: String,
    pub pages: Vec<Page>,
}

impl SourceDocument {
    pub fn new(source_id: impl Into<String>, pages: Vec<Page>) -> Self {
        Self {
            source_id: source_id.into(),
            pages,
        }
    }

    /// Build a document from page texts, numbering pages from zero.
    pub fn from_texts<I, S>(source_id: impl Into<String>, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pages = texts
            .into_iter()
            .enumerate()
            .map(|(page_number, text)| Page {
                page_number,
                text: text.into(),
            })
            .collect();
        Self::new(source_id, pages)
    }

    /// Whether any page carries non-whitespace text.
    pub fn has_text(&self) -> bool {
        self.pages.iter().any(|page| !page.text.trim().is_empty())
    }
}

/// A bounded span of page text, the unit of embedding and retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source_id: String,
    pub page_number: usize,

    /// Position in the ingestion batch, used for stable tie-breaking
    pub sequence_index: usize,
}

/// A chunk paired with its similarity to a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Top-k chunks ordered by descending similarity.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RetrievalResult {
    pub hits: Vec<ScoredChunk>,
}

impl RetrievalResult {
    pub fn new(hits: Vec<ScoredChunk>) -> Self {
        Self { hits }
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScoredChunk> {
        self.hits.iter()
    }

    /// Best-scoring hit, if any.
    pub fn top(&self) -> Option<&ScoredChunk> {
        self.hits.first()
    }
}

/// One completed question/answer exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub question: String,
    pub answer: String,
}

impl ConversationTurn {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// A synthesized answer with the exact retrieval it was grounded on.
#[derive(Debug, Clone, Serialize)]
pub struct AnsweredQuery {
    pub question: String,
    pub answer: String,
    pub sources: RetrievalResult,
}

impl AnsweredQuery {
    pub fn turn(&self) -> ConversationTurn {
        ConversationTurn::new(self.question.clone(), self.answer.clone())
    }

    pub fn source_refs(&self) -> Vec<SourceRef> {
        self.sources.iter().map(SourceRef::from).collect()
    }
}

/// Caller-facing attribution for one retrieved chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRef {
    pub source_id: String,
    pub page_number: usize,

    /// First `EXCERPT_CHARS` characters of the chunk text
    pub excerpt: String,
    pub score: f32,
}

impl From<&ScoredChunk> for SourceRef {
    fn from(hit: &ScoredChunk) -> Self {
        Self {
            source_id: hit.chunk.source_id.clone(),
            page_number: hit.chunk.page_number,
            excerpt: hit.chunk.text.chars().take(EXCERPT_CHARS).collect(),
            score: hit.score,
        }
    }
}

/// Answer returned from the query entry point.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub question: String,
    pub answer: String,
    pub sources: Vec<SourceRef>,

    /// Rewritten question used for retrieval when condensing is enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standalone_question: Option<String>,
}

/// A document left out of an ingestion under the skip-and-report policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedDocument {
    pub source_id: String,
    pub reason: String,
}

/// Summary of a successful ingestion.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    /// Source ids of the documents that made it into the index
    pub documents: Vec<String>,
    pub pages: usize,
    pub chunks: usize,
    pub dimensions: usize,
    pub skipped: Vec<SkippedDocument>,
    pub elapsed_ms: u64,
}

/// Lifecycle of a session's index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No index; queries fail with `NotReady`
    Empty,
    /// An ingestion is building a fresh index
    Ingesting,
    /// An index is available for queries
    Ready,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionState::Empty => "empty",
            SessionState::Ingesting => "ingesting",
            SessionState::Ready => "ready",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str) -> Chunk {
        Chunk {
            text: text.to_string(),
            source_id: "manual.pdf".to_string(),
            page_number: 3,
            sequence_index: 7,
        }
    }

    #[test]
    fn test_from_texts_numbers_pages_from_zero() {
        let doc = SourceDocument::from_texts("a.txt", ["one", "two"]);
        assert_eq!(doc.pages[0].page_number, 0);
        assert_eq!(doc.pages[1].page_number, 1);
        assert!(doc.has_text());
    }

    #[test]
    fn test_blank_document_has_no_text() {
        let doc = SourceDocument::from_texts("a.txt", ["", "  \n"]);
        assert!(!doc.has_text());
    }

    #[test]
    fn test_excerpt_is_first_200_chars() {
        let long = "é".repeat(450);
        let hit = ScoredChunk {
            chunk: chunk(&long),
            score: 0.5,
        };
        let source = SourceRef::from(&hit);
        assert_eq!(source.excerpt.chars().count(), EXCERPT_CHARS);
        assert_eq!(source.page_number, 3);
    }

    #[test]
    fn test_short_excerpt_is_whole_text() {
        let hit = ScoredChunk {
            chunk: chunk("The sky is blue."),
            score: 0.9,
        };
        assert_eq!(SourceRef::from(&hit).excerpt, "The sky is blue.");
    }

    #[test]
    fn test_source_ref_serializes_camel_case() {
        let hit = ScoredChunk {
            chunk: chunk("x"),
            score: 1.0,
        };
        let json = serde_json::to_value(SourceRef::from(&hit)).unwrap();
        assert_eq!(json["sourceId"], "manual.pdf");
        assert_eq!(json["pageNumber"], 3);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(SessionState::Ready.to_string(), "ready");
        assert_eq!(SessionState::Empty.to_string(), "empty");
    }
}
