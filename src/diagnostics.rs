//! Non-fatal notes about request input the pipeline had to skip.

use std::fmt;

/// Why a piece of the request did not make it into the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A filter, sort, search or projection key does not name a known column.
    UnknownField { stage: &'static str, key: String },
    /// `[op]value` with an operator token that is not recognized.
    UnknownOperator { key: String, operator: String },
    /// `[between]` without exactly two non-empty, comma-separated values.
    MalformedBetween { key: String, value: String },
    /// A membership filter that is empty once blank items are removed.
    EmptyMembership { key: String },
    /// A value shape the filter stage does not understand (object, bool, ...).
    UnsupportedValue { key: String },
    /// A reserved parameter with the wrong shape, e.g. `sort` sent as a number.
    IgnoredParameter { key: &'static str },
    /// A stage had to degrade because no entity metadata was available.
    MetadataUnavailable { stage: &'static str },
    /// Projection resolved to no columns, so the selection was left untouched.
    EmptySelection,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownField { stage, key } => {
                write!(f, "{stage}: skipping unknown field '{key}'")
            }
            Self::UnknownOperator { key, operator } => {
                write!(f, "filter: unknown operator '[{operator}]' for field '{key}'")
            }
            Self::MalformedBetween { key, value } => write!(
                f,
                "filter: 'between' on field '{key}' expects two comma-separated values, got '{value}'"
            ),
            Self::EmptyMembership { key } => {
                write!(f, "filter: membership list for field '{key}' is empty")
            }
            Self::UnsupportedValue { key } => {
                write!(f, "filter: unsupported value for field '{key}' without operator prefix")
            }
            Self::IgnoredParameter { key } => {
                write!(f, "ignoring parameter '{key}': expected a string")
            }
            Self::MetadataUnavailable { stage } => {
                write!(f, "{stage}: entity metadata unavailable, using degraded defaults")
            }
            Self::EmptySelection => {
                write!(f, "projection: no columns resolved, keeping the full selection")
            }
        }
    }
}

/// Collects diagnostics for one query build and logs each one as it is recorded.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(diagnostic = %diagnostic, "list query input skipped");
        self.0.push(diagnostic);
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.0
    }
}
