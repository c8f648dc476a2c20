//! Encrypted Socket (C6): orchestrates the handshake, the carrier
//! pipeline, and two cooperating worker loops behind a `send`/`receive`
//! queue interface.
//!
//! State machine mirrors spec.md §4.5/§9: a single explicit state variable
//! replaces the source's mutable `is_connected`/`stop_event` pair.

use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

use pixelwire_crypto::int_to_bytes;
use pixelwire_image::{pipeline, CoverSource};

use crate::config::EncryptedSocketConfig;
use crate::error::{LinkError, SocketError};
use crate::handshake;
use crate::link::FramedLink;

const WORKER_JOIN_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketState {
    Disconnected,
    Connecting,
    Connected,
    Closing,
    Closed,
}

pub struct EncryptedSocket {
    config: EncryptedSocketConfig,
    cover: CoverSource,
    state: StdMutex<SocketState>,
    outbox_tx: mpsc::UnboundedSender<Vec<u8>>,
    outbox_rx: StdMutex<Option<mpsc::UnboundedReceiver<Vec<u8>>>>,
    inbox_rx: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
    // Held only until `connect()` moves it into the receiver worker, so the
    // channel closes (and `receive()` wakes with `NotConnected`) once that
    // worker exits, rather than staying open for this struct's lifetime.
    inbox_tx: StdMutex<Option<mpsc::UnboundedSender<Vec<u8>>>>,
    stop_tx: watch::Sender<bool>,
    sender_task: Mutex<Option<JoinHandle<()>>>,
    receiver_task: Mutex<Option<JoinHandle<()>>>,
    sender_link: Mutex<Option<Arc<FramedLink>>>,
    receiver_link: Mutex<Option<Arc<FramedLink>>>,
}

impl EncryptedSocket {
    pub fn new(config: EncryptedSocketConfig, cover: CoverSource) -> Self {
        let (outbox_tx, outbox_rx) = mpsc::unbounded_channel();
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let (stop_tx, _) = watch::channel(false);

        Self {
            config,
            cover,
            state: StdMutex::new(SocketState::Disconnected),
            outbox_tx,
            outbox_rx: StdMutex::new(Some(outbox_rx)),
            inbox_rx: Mutex::new(inbox_rx),
            inbox_tx: StdMutex::new(Some(inbox_tx)),
            stop_tx,
            sender_task: Mutex::new(None),
            receiver_task: Mutex::new(None),
            sender_link: Mutex::new(None),
            receiver_link: Mutex::new(None),
        }
    }

    pub fn state(&self) -> SocketState {
        *self.state.lock().unwrap()
    }

    /// Establish both directed links, run both handshakes, and spawn the
    /// two worker loops. Returns once `Connected`.
    pub async fn connect(&self) -> Result<(), SocketError> {
        *self.state.lock().unwrap() = SocketState::Connecting;

        let (sender_link, receiver_link) = tokio::try_join!(
            FramedLink::connect(&self.config.peer_ip, self.config.sender_out_port, self.config.sender_in_port),
            FramedLink::connect(
                &self.config.peer_ip,
                self.config.receiver_out_port,
                self.config.receiver_in_port
            ),
        )
        .map_err(|e| {
            *self.state.lock().unwrap() = SocketState::Disconnected;
            SocketError::from(e)
        })?;
        let sender_link = Arc::new(sender_link);
        let receiver_link = Arc::new(receiver_link);

        let (sender_secret, receiver_secret) =
            tokio::try_join!(handshake::run_sender_role(&sender_link), handshake::run_receiver_role(&receiver_link),)
                .map_err(|e| {
                    *self.state.lock().unwrap() = SocketState::Disconnected;
                    e
                })?;

        let outbox_rx = self
            .outbox_rx
            .lock()
            .unwrap()
            .take()
            .expect("connect() called more than once");
        let inbox_tx = self
            .inbox_tx
            .lock()
            .unwrap()
            .take()
            .expect("connect() called more than once");

        let sender_task = tokio::spawn(sender_loop(
            sender_link.clone(),
            outbox_rx,
            int_to_bytes(sender_secret),
            self.cover.clone(),
            self.config.rows,
            self.config.cols,
            self.config.max_content_length,
            self.config.temp_root.clone(),
            self.stop_tx.subscribe(),
        ));

        let receiver_task = tokio::spawn(receiver_loop(
            receiver_link.clone(),
            inbox_tx,
            int_to_bytes(receiver_secret),
            self.config.temp_root.clone(),
            self.stop_tx.subscribe(),
        ));

        *self.sender_task.lock().await = Some(sender_task);
        *self.receiver_task.lock().await = Some(receiver_task);
        *self.sender_link.lock().await = Some(sender_link);
        *self.receiver_link.lock().await = Some(receiver_link);

        *self.state.lock().unwrap() = SocketState::Connected;
        Ok(())
    }

    /// Enqueue `bytes` for the sender worker. Never blocks.
    pub fn send(&self, bytes: Vec<u8>) -> Result<(), SocketError> {
        if self.state() != SocketState::Connected {
            return Err(SocketError::NotConnected);
        }
        self.outbox_tx.send(bytes).map_err(|_| SocketError::NotConnected)
    }

    /// Block until a decoded message is available or the socket closes.
    pub async fn receive(&self) -> Result<Vec<u8>, SocketError> {
        self.inbox_rx.lock().await.recv().await.ok_or(SocketError::NotConnected)
    }

    /// Idempotent: stop both workers, shut both links, transition to
    /// `Closed`. Workers are given [`WORKER_JOIN_TIMEOUT`] to exit.
    pub async fn close(&self) {
        {
            let mut state = self.state.lock().unwrap();
            if matches!(*state, SocketState::Closing | SocketState::Closed) {
                return;
            }
            *state = SocketState::Closing;
        }

        let _ = self.stop_tx.send(true);

        if let Some(task) = self.sender_task.lock().await.take() {
            let _ = tokio::time::timeout(WORKER_JOIN_TIMEOUT, task).await;
        }
        if let Some(task) = self.receiver_task.lock().await.take() {
            let _ = tokio::time::timeout(WORKER_JOIN_TIMEOUT, task).await;
        }
        if let Some(link) = self.sender_link.lock().await.take() {
            link.close().await;
        }
        if let Some(link) = self.receiver_link.lock().await.take() {
            link.close().await;
        }

        *self.state.lock().unwrap() = SocketState::Closed;
    }
}

#[allow(clippy::too_many_arguments)]
async fn sender_loop(
    link: Arc<FramedLink>,
    mut outbox_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    key_material: Vec<u8>,
    cover: CoverSource,
    rows: u32,
    cols: u32,
    max_content_length: usize,
    temp_root: PathBuf,
    mut stop_rx: watch::Receiver<bool>,
) {
    loop {
        let bytes = tokio::select! {
            _ = stop_rx.changed() => return,
            bytes = outbox_rx.recv() => match bytes {
                Some(bytes) => bytes,
                None => return,
            },
        };

        let message_id = Uuid::new_v4();
        let _span = tracing::info_span!("pixelwire_send", %message_id).entered();

        let temp_dir = match tempfile::TempDir::new_in(&temp_root) {
            Ok(dir) => dir,
            Err(err) => {
                tracing::warn!(%err, "failed to create scoped temp directory, dropping message");
                continue;
            }
        };

        match pipeline::encode_message(&bytes, &key_material, &cover, rows, cols, max_content_length, temp_dir.path())
            .await
        {
            Ok(archive) => {
                if let Err(err) = link.send_message(&archive).await {
                    tracing::warn!(%err, "sender link failed, terminating sender worker");
                    return;
                }
            }
            Err(err) => tracing::warn!(%err, "encode pipeline failed, dropping message"),
        }
        // temp_dir drops here, recursively removing itself regardless of
        // which branch above ran.
    }
}

async fn receiver_loop(
    link: Arc<FramedLink>,
    inbox_tx: mpsc::UnboundedSender<Vec<u8>>,
    key_material: Vec<u8>,
    temp_root: PathBuf,
    mut stop_rx: watch::Receiver<bool>,
) {
    loop {
        let archive = tokio::select! {
            _ = stop_rx.changed() => return,
            message = link.get_message() => match message {
                Ok(archive) => archive,
                Err(LinkError::ConnectionClosed) => return,
                Err(err) => {
                    tracing::warn!(%err, "receiver link failed, terminating receiver worker");
                    return;
                }
            },
        };

        let message_id = Uuid::new_v4();
        let _span = tracing::info_span!("pixelwire_receive", %message_id).entered();

        let temp_dir = match tempfile::TempDir::new_in(&temp_root) {
            Ok(dir) => dir,
            Err(err) => {
                tracing::warn!(%err, "failed to create scoped temp directory, dropping message");
                continue;
            }
        };

        match pipeline::decode_message(&archive, &key_material, temp_dir.path()).await {
            Ok(plaintext) => {
                if inbox_tx.send(plaintext).is_err() {
                    return;
                }
            }
            Err(err) => tracing::warn!(%err, "decode pipeline failed, dropping message"),
        }
        // temp_dir drops here, recursively removing itself regardless of
        // which branch above ran.
    }
}
