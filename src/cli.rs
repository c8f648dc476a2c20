// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use clap::Parser;

/// PixelWire: a peer-to-peer encrypted messenger that carries ciphertext
/// inside tiled, steganographic PNGs.
#[derive(Parser, Debug)]
#[command(name = "pixelwire", version, about)]
pub struct Cli {
    /// IP address of the peer to connect to.
    pub peer_ip: String,

    /// Port this side's sender-role link dials on the peer.
    #[arg(long, default_value_t = pixelwire_net::config::DEFAULT_SENDER_OUT_PORT)]
    pub sender_out_port: u16,

    /// Port this side's sender-role link listens on.
    #[arg(long, default_value_t = pixelwire_net::config::DEFAULT_SENDER_IN_PORT)]
    pub sender_in_port: u16,

    /// Port this side's receiver-role link dials on the peer.
    #[arg(long, default_value_t = pixelwire_net::config::DEFAULT_RECEIVER_OUT_PORT)]
    pub receiver_out_port: u16,

    /// Port this side's receiver-role link listens on.
    #[arg(long, default_value_t = pixelwire_net::config::DEFAULT_RECEIVER_IN_PORT)]
    pub receiver_in_port: u16,

    /// Tile grid rows.
    #[arg(long, default_value_t = pixelwire_image::DEFAULT_ROWS)]
    pub rows: u32,

    /// Tile grid columns.
    #[arg(long, default_value_t = pixelwire_image::DEFAULT_COLS)]
    pub cols: u32,

    /// Optional URL template (with `{width}`/`{height}` placeholders) for a
    /// remote cover-image source; omit to always use a solid-colour fallback.
    #[arg(long)]
    pub cover_endpoint: Option<String>,

    /// Increase log verbosity (stderr).
    #[arg(long, short = 'v')]
    pub verbose: bool,
}
