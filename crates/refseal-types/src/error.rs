/// Errors produced when constructing foundation types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    #[error("hash string is not hex encoded: {0}")]
    InvalidHex(String),

    #[error("hash string is wrong length: expected 40 or 64, got {actual}")]
    InvalidLength { actual: usize },

    #[error("invalid reference name {name:?}: {reason}")]
    InvalidRefName { name: String, reason: String },
}
