use thiserror::Error;

/// Errors specific to the QDIMACS codec (C5), mirroring `satgalaxy`'s
/// `errors::parser::ParserError` shape (one variant per failure site,
/// `#[from]` conversions for the library errors it wraps).
#[derive(Error, Debug)]
pub enum QdimacsError {
    #[error("failed to read QDIMACS file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse QDIMACS: {0}")]
    Parse(String),

    #[error("failed to parse integer in QDIMACS stream: {0}")]
    ParseInt(#[from] std::num::ParseIntError),

    #[error("malformed solver response: {0}")]
    BadResponse(String),
}
