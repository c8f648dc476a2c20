// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
mod cli;

use std::io::Write as _;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use cli::Cli;
use pixelwire_image::CoverSource;
use pixelwire_net::{EncryptedSocket, EncryptedSocketConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cover = match cli.cover_endpoint {
        Some(endpoint) => CoverSource::remote(endpoint),
        None => CoverSource::disabled(),
    };

    let config = EncryptedSocketConfig::new(cli.peer_ip)
        .with_ports(cli.sender_out_port, cli.sender_in_port, cli.receiver_out_port, cli.receiver_in_port)
        .with_grid(cli.rows, cli.cols);

    let socket = Arc::new(EncryptedSocket::new(config, cover));
    socket.connect().await.context("failed to connect to peer")?;
    eprintln!("connected; type a message and press enter to send it");

    let receiver = {
        let socket = socket.clone();
        tokio::spawn(async move {
            loop {
                match socket.receive().await {
                    Ok(bytes) => println!("{}", decode_line(&bytes)),
                    Err(_) => return,
                }
            }
        })
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        if let Err(err) = socket.send(encode_line(&line)) {
            tracing::error!(%err, "failed to send message");
            break;
        }
    }

    socket.close().await;
    let _ = receiver.await;
    Ok(())
}

fn encode_line(line: &str) -> Vec<u8> {
    line.encode_utf16().flat_map(u16::to_le_bytes).collect()
}

fn decode_line(bytes: &[u8]) -> String {
    let units = bytes.chunks_exact(2).map(|c| u16::from_le_bytes([c[0], c[1]]));
    char::decode_utf16(units).map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER)).collect()
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(env_filter)
        .init();
    let _ = std::io::stderr().flush();
}
