pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no connection to sonic: {0}")]
    NoConnection(String),

    #[error("sonic rejected the channel password")]
    Authentication,

    #[error("sonic protocol error: {0}")]
    Protocol(String),

    #[error("sonic command {command} failed: {reason}")]
    CommandFailed {
        command: &'static str,
        reason: String,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("record store error: {0}")]
    Store(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("could not parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
}
