/*!
 * Error types for the filterkit library.
 *
 * `FilterError` covers everything a filter, the writer or the code finder can
 * report for a single document. `AppError` is the application layer wrapper
 * used by the batch controller and the CLI.
 */

use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, FilterError>;

/// Errors that can occur while extracting or re-writing one document
#[derive(Error, Debug)]
pub enum FilterError {
    /// Stream open/read/write failure
    #[error("I/O error ({context}): {source}")]
    Io {
        /// What was being done, usually with the path
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Charset label not known to the decoder
    #[error("The encoding '{0}' is not supported")]
    UnsupportedEncoding(String),

    /// Byte sequence not valid for the declared encoding
    #[error("Malformed input for encoding {encoding} near byte {offset}")]
    Decode {
        /// Encoding used for decoding
        encoding: String,
        /// Approximate byte offset of the first bad sequence
        offset: usize,
    },

    /// Character the output encoding cannot represent
    #[error("Character {ch:?} cannot be encoded in {encoding}")]
    Unencodable {
        /// Output encoding
        encoding: String,
        /// Offending character
        ch: char,
    },

    /// Malformed record in the input
    #[error("Line {line}: {message}")]
    Grammar {
        /// 1-based line number
        line: usize,
        /// Description of the problem
        message: String,
    },

    /// Skeleton reference that resolves to nothing
    #[error("Reference not found: '{0}'")]
    MissingReference(String),

    /// Event sequence or subfilter stream out of sync
    #[error("Structural mismatch: {0}")]
    StructuralMismatch(String),

    /// Code finder rule that does not compile
    #[error("Invalid code finder rule '{rule}': {message}")]
    InvalidRule {
        /// The rule as configured
        rule: String,
        /// Compiler message
        message: String,
    },

    /// Registry lookup miss
    #[error("Unknown filter configuration: '{0}'")]
    UnknownConfiguration(String),

    /// Protocol misuse, e.g. `next()` on a closed filter
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl FilterError {
    /// Wraps an I/O error with some context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io { context: context.into(), source }
    }

    /// Grammar error at a 1-based line
    pub fn grammar(line: usize, message: impl Into<String>) -> Self {
        Self::Grammar { line, message: message.into() }
    }

    /// Whether the error is a structural (reference) error
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::MissingReference(_) | Self::StructuralMismatch(_))
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from the configuration file
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from a filter or writer
    #[error("Filter error: {0}")]
    Filter(#[from] FilterError),

    /// Round-trip output did not match the input
    #[error("Round-trip mismatch in {path}: {detail}")]
    RoundTrip {
        /// Document that failed
        path: String,
        /// First difference
        detail: String,
    },

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::Config(error.to_string())
    }
}
