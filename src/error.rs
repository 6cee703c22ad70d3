//! Import Error Taxonomy
//!
//! Every failure inside the pipeline is classified into one of six kinds
//! before it reaches the caller. The kind stays typed until the boundary,
//! where `boundary_message()` renders the single `"Error: ..."` string the
//! host expects in the result slot.

use thiserror::Error;

/// Error kind, independent of the message text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    Fetch,
    MalformedDocument,
    Query,
    NotFound,
    Unavailable,
}

/// Classified import failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    /// Missing, blank or unusable input
    #[error("{0}")]
    InvalidArgument(String),

    /// Network or HTTP failure, message carries the cause chain
    #[error("Unable to fetch data from the URL - {0}")]
    Fetch(String),

    /// Strict-mode (XML) parse failure
    #[error("Invalid XML data - {0}")]
    MalformedDocument(String),

    /// Invalid XPath expression or one that does not select nodes
    #[error("Invalid XPath query - {0}")]
    Query(String),

    /// Well-formed request with nothing to return
    #[error("{0}")]
    NotFound(String),

    /// The native library never finished loading
    #[error("Importer unavailable - {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, ImportError>;

impl ImportError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        ImportError::InvalidArgument(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ImportError::NotFound(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ImportError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            ImportError::Fetch(_) => ErrorKind::Fetch,
            ImportError::MalformedDocument(_) => ErrorKind::MalformedDocument,
            ImportError::Query(_) => ErrorKind::Query,
            ImportError::NotFound(_) => ErrorKind::NotFound,
            ImportError::Unavailable(_) => ErrorKind::Unavailable,
        }
    }

    /// The string placed in the host's result slot
    pub fn boundary_message(&self) -> String {
        format!("Error: {self}")
    }
}

impl From<reqwest::Error> for ImportError {
    fn from(err: reqwest::Error) -> Self {
        ImportError::Fetch(error_chain(&err))
    }
}

/// Join an error and its sources with ": " so the root cause survives.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// Reject a blank required argument.
pub fn require<'s>(value: &'s str, message: &str) -> Result<&'s str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ImportError::invalid_argument(message))
    } else {
        Ok(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_message_carries_category_text() {
        let err = ImportError::Fetch("connection refused".to_string());
        assert_eq!(
            err.boundary_message(),
            "Error: Unable to fetch data from the URL - connection refused"
        );
        assert_eq!(err.kind(), ErrorKind::Fetch);

        let err = ImportError::not_found("Table not found");
        assert_eq!(err.boundary_message(), "Error: Table not found");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn query_and_not_found_are_distinct_kinds() {
        let query = ImportError::Query("Expected ]".to_string());
        let empty = ImportError::not_found("No data found for the given XPath query");
        assert_ne!(query.kind(), empty.kind());
    }

    #[test]
    fn unavailable_does_not_claim_a_fetch() {
        let err = ImportError::Unavailable("not loaded".to_string());
        assert_eq!(err.boundary_message(), "Error: Importer unavailable - not loaded");
        assert_eq!(err.kind(), ErrorKind::Unavailable);
    }

    #[test]
    fn require_rejects_whitespace() {
        assert!(matches!(
            require("  \t", "URL is required"),
            Err(ImportError::InvalidArgument(m)) if m == "URL is required"
        ));
        assert_eq!(require(" //a ", "q").unwrap(), "//a");
    }

    #[test]
    fn error_chain_appends_sources() {
        #[derive(Debug)]
        struct Outer(std::io::Error);
        impl std::fmt::Display for Outer {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "request failed")
            }
        }
        impl std::error::Error for Outer {
            fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
                Some(&self.0)
            }
        }

        let err = Outer(std::io::Error::new(std::io::ErrorKind::Other, "refused"));
        assert_eq!(error_chain(&err), "request failed: refused");
    }
}
