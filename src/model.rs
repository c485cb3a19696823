//! Document and numbering value types.
//!
//! A document starts as a draft and is finalized exactly once. Finalization
//! stamps it with a scope key, a sequence number unique within that scope,
//! and the finalization instant. The three travel together in [`Numbering`],
//! so a finalized document without a number cannot be constructed.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Default zero-padding width of the sequence part of a display number.
pub const DEFAULT_PAD_WIDTH: usize = 3;

/// Opaque document identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Error constructing a [`ScopeKey`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScopeKeyError {
    #[error("Scope key must not be empty")]
    Empty,

    #[error("Scope key must not contain '/': {0}")]
    Separator(String),
}

/// Partition within which sequence numbers are unique, e.g. `"2025"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeKey(String);

impl ScopeKey {
    /// Validate and wrap a scope key.
    ///
    /// The key may not be empty or contain `/`, which separates the sequence
    /// from the scope in a display number.
    pub fn new(key: impl Into<String>) -> Result<Self, ScopeKeyError> {
        let key = key.into();
        if key.is_empty() {
            return Err(ScopeKeyError::Empty);
        }
        if key.contains('/') {
            return Err(ScopeKeyError::Separator(key));
        }
        Ok(Self(key))
    }

    /// Scope key for a calendar year.
    pub fn from_year(year: i32) -> Self {
        Self(year.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ScopeKey {
    type Err = ScopeKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Lifecycle status of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentStatus {
    Draft,
    Finalized,
}

impl DocumentStatus {
    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::Finalized => "finalized",
        }
    }

    /// Parse the storage representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(DocumentStatus::Draft),
            "finalized" => Some(DocumentStatus::Finalized),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Number assigned at finalization. Set once, never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Numbering {
    pub scope_key: ScopeKey,
    pub sequence_number: u64,
    pub finalized_at: DateTime<Utc>,
}

impl Numbering {
    pub fn display_number(&self, pad_width: usize) -> DisplayNumber {
        DisplayNumber::new(self.sequence_number, self.scope_key.clone(), pad_width)
    }
}

/// Draft or finalized, with the numbering carried by the finalized variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentState {
    Draft,
    Finalized(Numbering),
}

/// A numbered business document.
///
/// `subject` belongs to whichever context created the document; the
/// allocator only ever replaces `state`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: DocumentId,
    pub subject: String,
    pub created_at: DateTime<Utc>,
    pub state: DocumentState,
}

impl Document {
    /// New draft with a fresh id.
    pub fn draft(subject: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: DocumentId::new(),
            subject: subject.into(),
            created_at,
            state: DocumentState::Draft,
        }
    }

    pub fn status(&self) -> DocumentStatus {
        match self.state {
            DocumentState::Draft => DocumentStatus::Draft,
            DocumentState::Finalized(_) => DocumentStatus::Finalized,
        }
    }

    pub fn is_draft(&self) -> bool {
        matches!(self.state, DocumentState::Draft)
    }

    pub fn numbering(&self) -> Option<&Numbering> {
        match &self.state {
            DocumentState::Draft => None,
            DocumentState::Finalized(numbering) => Some(numbering),
        }
    }
}

/// Error parsing a [`DisplayNumber`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DisplayNumberError {
    #[error("Display number must look like NNN/SCOPE: {0}")]
    Format(String),

    #[error("Invalid sequence number in display number: {0}")]
    Sequence(String),

    #[error(transparent)]
    Scope(#[from] ScopeKeyError),
}

/// Human-facing number, `{sequence zero-padded}/{scope}` (e.g. `003/2025`).
///
/// Derived from a [`Numbering`]; never stored on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayNumber {
    sequence_number: u64,
    scope_key: ScopeKey,
    pad_width: usize,
}

impl DisplayNumber {
    pub fn new(sequence_number: u64, scope_key: ScopeKey, pad_width: usize) -> Self {
        Self {
            sequence_number,
            scope_key,
            pad_width,
        }
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn scope_key(&self) -> &ScopeKey {
        &self.scope_key
    }
}

impl fmt::Display for DisplayNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:0width$}/{}",
            self.sequence_number,
            self.scope_key,
            width = self.pad_width
        )
    }
}

impl FromStr for DisplayNumber {
    type Err = DisplayNumberError;

    /// Parses `"008/2025"`. The pad width is taken from the sequence digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (sequence, scope) = s
            .split_once('/')
            .ok_or_else(|| DisplayNumberError::Format(s.to_string()))?;
        if sequence.is_empty() || !sequence.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DisplayNumberError::Sequence(sequence.to_string()));
        }
        let sequence_number: u64 = sequence
            .parse()
            .map_err(|_| DisplayNumberError::Sequence(sequence.to_string()))?;
        if sequence_number == 0 {
            return Err(DisplayNumberError::Sequence(sequence.to_string()));
        }
        Ok(Self::new(
            sequence_number,
            ScopeKey::new(scope)?,
            sequence.len(),
        ))
    }
}

/// Result of a successful finalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub document_id: DocumentId,
    pub sequence_number: u64,
    pub scope_key: ScopeKey,
    pub display_number: DisplayNumber,
    pub finalized_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_number_pads_sequence() {
        let number = DisplayNumber::new(3, ScopeKey::from_year(2025), DEFAULT_PAD_WIDTH);
        assert_eq!(number.to_string(), "003/2025");
    }

    #[test]
    fn test_display_number_wider_than_pad() {
        let number = DisplayNumber::new(1234, ScopeKey::from_year(2025), DEFAULT_PAD_WIDTH);
        assert_eq!(number.to_string(), "1234/2025");
    }

    #[test]
    fn test_display_number_parse() {
        let number: DisplayNumber = "008/2025".parse().unwrap();
        assert_eq!(number.sequence_number(), 8);
        assert_eq!(number.scope_key().as_str(), "2025");
        assert_eq!(number.to_string(), "008/2025");
    }

    #[test]
    fn test_display_number_parse_rejects_garbage() {
        assert!(matches!(
            "2025".parse::<DisplayNumber>(),
            Err(DisplayNumberError::Format(_))
        ));
        assert!(matches!(
            "abc/2025".parse::<DisplayNumber>(),
            Err(DisplayNumberError::Sequence(_))
        ));
        assert!(matches!(
            "000/2025".parse::<DisplayNumber>(),
            Err(DisplayNumberError::Sequence(_))
        ));
        assert!(matches!(
            "001/".parse::<DisplayNumber>(),
            Err(DisplayNumberError::Scope(ScopeKeyError::Empty))
        ));
    }

    #[test]
    fn test_scope_key_validation() {
        assert_eq!(ScopeKey::new(""), Err(ScopeKeyError::Empty));
        assert!(matches!(
            ScopeKey::new("2025/01"),
            Err(ScopeKeyError::Separator(_))
        ));
        assert_eq!(ScopeKey::new("2025").unwrap(), ScopeKey::from_year(2025));
    }

    #[test]
    fn test_status_round_trip_storage_names() {
        assert_eq!(DocumentStatus::parse("draft"), Some(DocumentStatus::Draft));
        assert_eq!(
            DocumentStatus::parse(DocumentStatus::Finalized.as_str()),
            Some(DocumentStatus::Finalized)
        );
        assert_eq!(DocumentStatus::parse("archived"), None);
    }

    #[test]
    fn test_document_status_follows_state() {
        let mut doc = Document::draft("Notice", Utc::now());
        assert_eq!(doc.status(), DocumentStatus::Draft);
        assert!(doc.numbering().is_none());

        doc.state = DocumentState::Finalized(Numbering {
            scope_key: ScopeKey::from_year(2025),
            sequence_number: 4,
            finalized_at: Utc::now(),
        });
        assert_eq!(doc.status(), DocumentStatus::Finalized);
        assert_eq!(doc.numbering().unwrap().display_number(3).to_string(), "004/2025");
    }
}
