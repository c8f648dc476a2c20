use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("failed to connect to {addr} after {attempts} attempts: {source}")]
    ConnectFailed {
        addr: String,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to bind/listen on {1}: {0}")]
    BindFailed(#[source] std::io::Error, String),

    #[error("connection closed by peer")]
    ConnectionClosed,

    #[error("framed message length {0} exceeds the configured ceiling of {1} bytes")]
    FrameTooLarge(u32, u32),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum SocketError {
    #[error("socket is not connected")]
    NotConnected,

    #[error("link error: {0}")]
    Link(#[from] LinkError),

    #[error("handshake error: {0}")]
    Handshake(String),

    #[error("pipeline error: {0}")]
    Pipeline(#[from] pixelwire_image::PipelineError),

    #[error("crypto error: {0}")]
    Crypto(#[from] pixelwire_crypto::CryptoError),
}
