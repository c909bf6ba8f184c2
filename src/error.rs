use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Quote Fetch Errors
    #[error("transport failure from {provider}: {detail}")]
    Transport {
        provider: &'static str,
        detail: String,
    },

    #[error("unexpected status {status} from {provider}")]
    BadStatus {
        provider: &'static str,
        status: u16,
    },

    #[error("malformed payload from {provider}: {detail}")]
    MalformedPayload {
        provider: &'static str,
        detail: String,
    },

    #[error("payload from {0} carried no usable spot price")]
    EmptyQuote(&'static str),

    #[error("missing API credential for {0}")]
    MissingCredential(&'static str),

    // Storage Errors
    #[error("storage read failed for {key}: {detail}")]
    StorageRead {
        key: String,
        detail: String,
    },

    #[error("storage write failed for {key}: {detail}")]
    StorageWrite {
        key: String,
        detail: String,
    },

    #[error("stored record {key} failed to decode: {detail}")]
    StorageDecode {
        key: String,
        detail: String,
    },

    // System Errors
    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
