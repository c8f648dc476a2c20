//! Framed Duplex Link (C1): one outbound (dialed) socket for sending, one
//! inbound (accepted) socket for receiving, presenting a bidirectional
//! length-prefixed message stream.
//!
//! Grounded on `original_source/p2p.py`'s `Peer2Peer`: two distinct TCP
//! sockets rather than one full-duplex connection, `MAX_RETRIES = 3` with a
//! 5-second delay between dial attempts.

use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::error::LinkError;
use crate::framing::{self, DEFAULT_MAX_FRAME_BYTES};

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(5);
/// Poll period for the receive loop's cooperative stop-flag check
/// (spec.md §5: "Workers check it after each blocking step with a ≤ 1 s
/// period").
const STOP_POLL_PERIOD: Duration = Duration::from_secs(1);

pub struct FramedLink {
    outbound: Mutex<TcpStream>,
    message_rx: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
    stop_tx: watch::Sender<bool>,
    receiver_task: Mutex<Option<JoinHandle<()>>>,
}

impl FramedLink {
    /// Bind+listen+accept on `receive_port` while concurrently dialing
    /// `(peer_ip, send_port)` with retry. Returns once both sides are up.
    pub async fn connect(peer_ip: &str, send_port: u16, receive_port: u16) -> Result<Self, LinkError> {
        let accept = async {
            let listener = TcpListener::bind(("0.0.0.0", receive_port))
                .await
                .map_err(|e| LinkError::BindFailed(e, format!("0.0.0.0:{receive_port}")))?;
            let (stream, _) = listener
                .accept()
                .await
                .map_err(|e| LinkError::BindFailed(e, format!("0.0.0.0:{receive_port}")))?;
            Ok::<TcpStream, LinkError>(stream)
        };

        let dial = async {
            let addr = format!("{peer_ip}:{send_port}");
            let mut attempts = 0u32;
            loop {
                attempts += 1;
                match TcpStream::connect((peer_ip, send_port)).await {
                    Ok(stream) => return Ok::<TcpStream, LinkError>(stream),
                    Err(source) if attempts >= MAX_RETRIES => {
                        return Err(LinkError::ConnectFailed {
                            addr,
                            attempts,
                            source,
                        })
                    }
                    Err(_) => sleep(RETRY_DELAY).await,
                }
            }
        };

        let (inbound, outbound) = tokio::try_join!(accept, dial)?;

        let (message_tx, message_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = watch::channel(false);

        let receiver_task = tokio::spawn(receive_loop(inbound, message_tx, stop_rx));

        Ok(Self {
            outbound: Mutex::new(outbound),
            message_rx: Mutex::new(message_rx),
            stop_tx,
            receiver_task: Mutex::new(Some(receiver_task)),
        })
    }

    /// Write one framed message on the outbound socket. Serialized with
    /// respect to other callers.
    pub async fn send_message(&self, payload: &[u8]) -> Result<(), LinkError> {
        let mut socket = self.outbound.lock().await;
        framing::write_frame(&mut *socket, payload).await
    }

    /// Block until a complete framed message is available.
    pub async fn get_message(&self) -> Result<Vec<u8>, LinkError> {
        let mut rx = self.message_rx.lock().await;
        rx.recv().await.ok_or(LinkError::ConnectionClosed)
    }

    pub async fn send_file(&self, path: &std::path::Path) -> Result<(), LinkError> {
        let bytes = tokio::fs::read(path).await?;
        self.send_message(&bytes).await
    }

    pub async fn get_file(&self, path: &std::path::Path) -> Result<(), LinkError> {
        let bytes = self.get_message().await?;
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }

    /// Idempotent: signals the receive loop to stop and shuts the outbound
    /// socket. Safe to call more than once.
    pub async fn close(&self) {
        let _ = self.stop_tx.send(true);

        let mut socket = self.outbound.lock().await;
        let _ = tokio::io::AsyncWriteExt::shutdown(&mut *socket).await;
        drop(socket);

        if let Some(task) = self.receiver_task.lock().await.take() {
            let _ = tokio::time::timeout(Duration::from_secs(2), task).await;
        }
    }
}

async fn receive_loop(
    mut inbound: TcpStream,
    message_tx: mpsc::UnboundedSender<Vec<u8>>,
    mut stop_rx: watch::Receiver<bool>,
) {
    loop {
        if *stop_rx.borrow() {
            return;
        }

        let read = tokio::time::timeout(
            STOP_POLL_PERIOD,
            framing::read_frame(&mut inbound, DEFAULT_MAX_FRAME_BYTES),
        )
        .await;

        match read {
            Ok(Ok(Some(payload))) => {
                if message_tx.send(payload).is_err() {
                    return;
                }
            }
            Ok(Ok(None)) => {
                tracing::debug!("peer closed the inbound connection");
                return;
            }
            Ok(Err(err)) => {
                tracing::warn!(%err, "receive loop terminating on framing error");
                return;
            }
            Err(_elapsed) => continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn free_port() -> u16 {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        listener.local_addr().unwrap().port()
    }

    #[tokio::test]
    async fn two_links_exchange_messages_in_both_directions() {
        let a_out = free_port().await;
        let b_out = free_port().await;

        let (a, b) = tokio::join!(
            FramedLink::connect("127.0.0.1", b_out, a_out),
            FramedLink::connect("127.0.0.1", a_out, b_out),
        );
        let a = a.unwrap();
        let b = b.unwrap();

        a.send_message(b"hello from a").await.unwrap();
        assert_eq!(b.get_message().await.unwrap(), b"hello from a");

        b.send_message(b"hello from b").await.unwrap();
        assert_eq!(a.get_message().await.unwrap(), b"hello from b");

        a.close().await;
        b.close().await;
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let a_out = free_port().await;
        let b_out = free_port().await;

        let (a, b) = tokio::join!(
            FramedLink::connect("127.0.0.1", b_out, a_out),
            FramedLink::connect("127.0.0.1", a_out, b_out),
        );
        let a = a.unwrap();
        let _b = b.unwrap();

        a.close().await;
        a.close().await;
    }

    #[tokio::test]
    async fn get_message_errors_after_peer_closes() {
        let a_out = free_port().await;
        let b_out = free_port().await;

        let (a, b) = tokio::join!(
            FramedLink::connect("127.0.0.1", b_out, a_out),
            FramedLink::connect("127.0.0.1", a_out, b_out),
        );
        let a = a.unwrap();
        let b = b.unwrap();

        b.close().await;
        let err = a.get_message().await.unwrap_err();
        assert!(matches!(err, LinkError::ConnectionClosed));
    }
}
