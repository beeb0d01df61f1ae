use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Process not found: {0}")]
    ProcessNotFound(String),

    #[error("Failed to open process: {0}")]
    ProcessOpenFailed(String),

    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    #[error("Pointer chain broken at hop {hop} (address {address:#x}): {reason}")]
    ChainBroken {
        hop: usize,
        address: u64,
        reason: String,
    },

    #[error("Failed to read process memory at address {address:#x}: {message}")]
    MemoryReadFailed { address: u64, message: String },

    #[error("Failed to send input: {0}")]
    InputFailed(String),

    #[error("Observer channel closed")]
    ObserverSinkFailure,

    #[error("Worker thread panicked")]
    WorkerPanicked,

    #[error("Config parse error: {0}")]
    ConfigParseError(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Errors that end the worker instead of being retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::ObserverSinkFailure)
    }

    pub fn chain_broken(hop: usize, address: u64, reason: impl Into<String>) -> Self {
        Error::ChainBroken {
            hop,
            address,
            reason: reason.into(),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::ConfigParseError(e.message().to_string())
    }
}
