use thiserror::Error;

/// Error types
#[derive(Debug, Error)]
pub enum Error {
    #[error("plumevote: insufficient entropy - secure random source unavailable: {0}")]
    InsufficientEntropy(#[from] rand::Error),

    #[error("plumevote: failed to write credential store: {0}")]
    StorageWrite(#[source] std::io::Error),

    #[error("plumevote: failed to read credential store: {0}")]
    StorageRead(#[source] std::io::Error),

    #[error("plumevote: signing failed: {0}")]
    Signing(String),

    #[error("plumevote: missing required credential {0}")]
    MissingCredential(&'static str),

    #[error("plumevote: invalid credential {0} - invalid hexadecimal")]
    CredentialBadHex(&'static str),

    #[error("plumevote: invalid credential {0} - wrong length")]
    CredentialBadLen(&'static str),

    #[error("plumevote: invalid credential {0} - out of range")]
    CredentialOutOfRange(&'static str),

    #[error("plumevote: mismatched public keys")]
    MismatchedPublicKeys,

    #[error("plumevote: signature proof failed to verify")]
    InvalidSignature,

    #[error("plumevote: nullifier does not match nullifier point")]
    NullifierMismatch,

    #[error("plumevote: JSON error encoding vote payload: {0}")]
    JSONSerialization(#[from] serde_json::Error),

    #[error("plumevote: curve point encoding error: {0}")]
    PointEncoding(#[from] ark_serialize::SerializationError),
}

/// Ledger boundary errors. Timeout and rejection are distinct on purpose:
/// a timeout leaves the outcome unknown, a rejection means the ledger
/// actively refused the vote (e.g. a duplicate nullifier) and the same
/// payload must not be resubmitted.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("plumevote ledger: timed out waiting for a receipt")]
    Timeout,

    #[error("plumevote ledger: vote rejected: {0}")]
    Rejected(String),

    #[error("plumevote ledger: transport failure: {0}")]
    Transport(String),
}
