use thiserror::Error;

#[derive(Error, Debug)]
pub enum StegoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Capacity exceeded: message needs {required} bits but the segment holds {available}")]
    CapacityExceeded { required: usize, available: usize },

    #[error("Incompatible audio: {0}")]
    IncompatibleAudio(String),

    #[error("Chaos parameters out of domain: {0}")]
    GeneratorDomain(String),

    #[error("Invalid metadata record: {0}")]
    InvalidMetadata(String),

    #[error("Invalid key record: {0}")]
    InvalidKey(String),

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Compression error: {0}")]
    CompressionError(String),

    #[error("Decompression error: {0}")]
    DecompressionError(String),

    #[error("No stored record with id {0}")]
    RecordNotFound(String),
}

pub type Result<T> = std::result::Result<T, StegoError>;
