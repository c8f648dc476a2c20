//! Encrypted-socket configuration, grounded on
//! `sven-p2p::config::P2pConfig`: one immutable struct carrying every knob
//! the rest of the crate needs, constructed once at startup.

use std::path::PathBuf;

use pixelwire_image::{DEFAULT_COLS, DEFAULT_ROWS, MAX_CONTENT_LENGTH};

pub const DEFAULT_SENDER_OUT_PORT: u16 = 5008;
pub const DEFAULT_SENDER_IN_PORT: u16 = 5007;
pub const DEFAULT_RECEIVER_OUT_PORT: u16 = 5007;
pub const DEFAULT_RECEIVER_IN_PORT: u16 = 5008;

#[derive(Debug, Clone)]
pub struct EncryptedSocketConfig {
    pub peer_ip: String,
    pub sender_out_port: u16,
    pub sender_in_port: u16,
    pub receiver_out_port: u16,
    pub receiver_in_port: u16,
    pub rows: u32,
    pub cols: u32,
    pub max_content_length: usize,
    /// Root directory under which each message's scoped temp directory is
    /// created. Defaults to the system temp location.
    pub temp_root: PathBuf,
}

impl EncryptedSocketConfig {
    pub fn new(peer_ip: impl Into<String>) -> Self {
        Self {
            peer_ip: peer_ip.into(),
            sender_out_port: DEFAULT_SENDER_OUT_PORT,
            sender_in_port: DEFAULT_SENDER_IN_PORT,
            receiver_out_port: DEFAULT_RECEIVER_OUT_PORT,
            receiver_in_port: DEFAULT_RECEIVER_IN_PORT,
            rows: DEFAULT_ROWS,
            cols: DEFAULT_COLS,
            max_content_length: MAX_CONTENT_LENGTH,
            temp_root: std::env::temp_dir(),
        }
    }

    pub fn with_ports(mut self, sender_out: u16, sender_in: u16, receiver_out: u16, receiver_in: u16) -> Self {
        self.sender_out_port = sender_out;
        self.sender_in_port = sender_in;
        self.receiver_out_port = receiver_out;
        self.receiver_in_port = receiver_in;
        self
    }

    pub fn with_grid(mut self, rows: u32, cols: u32) -> Self {
        self.rows = rows;
        self.cols = cols;
        self
    }

    pub fn with_temp_root(mut self, temp_root: impl Into<PathBuf>) -> Self {
        self.temp_root = temp_root.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_ports_and_grid() {
        let config = EncryptedSocketConfig::new("127.0.0.1");
        assert_eq!(config.sender_out_port, 5008);
        assert_eq!(config.sender_in_port, 5007);
        assert_eq!(config.receiver_out_port, 5007);
        assert_eq!(config.receiver_in_port, 5008);
        assert_eq!(config.rows, 6);
        assert_eq!(config.cols, 8);
        assert_eq!(config.max_content_length, 115_167);
    }
}
