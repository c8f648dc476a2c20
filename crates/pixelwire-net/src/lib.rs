pub mod config;
pub mod error;
pub mod framing;
pub mod handshake;
pub mod link;
pub mod socket;

pub use config::EncryptedSocketConfig;
pub use error::{LinkError, SocketError};
pub use link::FramedLink;
pub use socket::{EncryptedSocket, SocketState};
