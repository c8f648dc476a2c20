//! Length-prefixed message framing: `uint32_be length || payload`.
//!
//! Reads the payload in chunks of at most [`READ_CHUNK`] bytes, matching
//! `original_source/p2p.py`'s `_recv_exactly` (a throughput knob, not part
//! of the wire contract).

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::LinkError;

const READ_CHUNK: usize = 1024;

/// Default ceiling on an accepted frame length; frames above this are
/// rejected rather than read into memory (spec.md §4.1 recommends a
/// configured ceiling for this implementer choice).
pub const DEFAULT_MAX_FRAME_BYTES: u32 = 64 * 1024 * 1024;

pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, payload: &[u8]) -> Result<(), LinkError> {
    writer.write_u32(payload.len() as u32).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one complete frame, or `Ok(None)` if the peer closed before the
/// length prefix arrived (a clean EOF, not an error).
pub async fn read_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
    max_frame_bytes: u32,
) -> Result<Option<Vec<u8>>, LinkError> {
    let len = match reader.read_u32().await {
        Ok(len) => len,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    if len > max_frame_bytes {
        return Err(LinkError::FrameTooLarge(len, max_frame_bytes));
    }

    let mut payload = vec![0u8; len as usize];
    let mut read = 0usize;
    while read < payload.len() {
        let end = (read + READ_CHUNK).min(payload.len());
        let n = reader.read_exact(&mut payload[read..end]).await;
        match n {
            Ok(_) => read = end,
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }
    }
    Ok(Some(payload))
}
