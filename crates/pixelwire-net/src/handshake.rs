//! Key-agreement handshake (C2) wire orchestration over a [`FramedLink`].
//!
//! Sender-role: transmit `p`, `g`, `pub` as three frames, then read one
//! frame carrying the peer's `pub`. Receiver-role: the mirror image.

use rand::rngs::OsRng;

use pixelwire_crypto::{bytes_to_int, int_to_bytes, DhEndpoint};

use crate::error::{LinkError, SocketError};
use crate::link::FramedLink;

/// Run the handshake as the side that speaks first, returning the derived
/// shared secret.
pub async fn run_sender_role(link: &FramedLink) -> Result<u64, SocketError> {
    let mut endpoint = DhEndpoint::random(&mut OsRng);

    link.send_message(&int_to_bytes(endpoint.p())).await?;
    link.send_message(&int_to_bytes(endpoint.g())).await?;
    link.send_message(&int_to_bytes(endpoint.generate_public_key())).await?;

    let peer_public = read_integer_frame(link).await?;
    Ok(endpoint.generate_full_key(peer_public))
}

/// Run the handshake as the side that listens first, returning the derived
/// shared secret.
pub async fn run_receiver_role(link: &FramedLink) -> Result<u64, SocketError> {
    let p = read_integer_frame(link).await?;
    let g = read_integer_frame(link).await?;
    let peer_public = read_integer_frame(link).await?;

    let mut endpoint = DhEndpoint::new(p, g, rand::Rng::gen_range(&mut OsRng, 10_000..=99_999));
    link.send_message(&int_to_bytes(endpoint.generate_public_key())).await?;

    Ok(endpoint.generate_full_key(peer_public))
}

async fn read_integer_frame(link: &FramedLink) -> Result<u64, SocketError> {
    let frame = link.get_message().await.map_err(LinkError::from).map_err(SocketError::from)?;
    bytes_to_int(&frame).map_err(SocketError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    async fn free_port() -> u16 {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn both_roles_derive_the_same_shared_secret() {
        let a_out = free_port().await;
        let b_out = free_port().await;

        let (a, b) = tokio::join!(
            FramedLink::connect("127.0.0.1", b_out, a_out),
            FramedLink::connect("127.0.0.1", a_out, b_out),
        );
        let a = a.unwrap();
        let b = b.unwrap();

        let (sender_secret, receiver_secret) = tokio::join!(run_sender_role(&a), run_receiver_role(&b));

        assert_eq!(sender_secret.unwrap(), receiver_secret.unwrap());

        a.close().await;
        b.close().await;
    }
}
