//! Length-prefixed framing: `[u32-BE length][payload]` (§4.1). The codec is
//! stateless and reentrant — a function pair over any `AsyncRead`/`AsyncWrite`,
//! not an object with its own state.

use crate::error::NetError;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Default maximum frame size: 10 MiB (§4.1, §6.4 `server.maxMessageSize`).
pub const DEFAULT_MAX_FRAME: u32 = 10 * 1024 * 1024;

/// Reads one frame. The length is validated against `max_frame` before any
/// payload allocation so an attacker cannot force large allocations with a
/// bogus length prefix.
pub async fn read_frame<R: AsyncRead + Unpin>(
    io: &mut R,
    max_frame: u32,
) -> Result<Vec<u8>, NetError> {
    let mut len_buf = [0u8; 4];
    io.read_exact(&mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf);
    if len > max_frame {
        return Err(NetError::FrameTooLarge {
            len,
            max: max_frame,
        });
    }
    let mut payload = vec![0u8; len as usize];
    io.read_exact(&mut payload).await?;
    Ok(payload)
}

/// Writes one frame. Callers are responsible for ensuring `payload.len()`
/// fits within their own configured `max_frame`; this function only
/// enforces the wire-format limit of `u32::MAX`.
pub async fn write_frame<W: AsyncWrite + Unpin>(
    io: &mut W,
    payload: &[u8],
) -> Result<(), NetError> {
    let len: u32 = payload
        .len()
        .try_into()
        .map_err(|_| NetError::FrameTooLarge {
            len: u32::MAX,
            max: u32::MAX,
        })?;
    io.write_all(&len.to_be_bytes()).await?;
    io.write_all(payload).await?;
    io.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn roundtrip() {
        let mut buf = Vec::new();
        write_frame(&mut buf, b"hello").await.unwrap();
        let mut cursor = Cursor::new(buf);
        let out = read_frame(&mut cursor, DEFAULT_MAX_FRAME).await.unwrap();
        assert_eq!(out, b"hello");
    }

    #[tokio::test]
    async fn rejects_oversized_frame_before_allocating() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&100u32.to_be_bytes());
        // Note: no payload bytes follow — if the length check allocated
        // first, this would hang on `read_exact` instead of erroring fast.
        let mut cursor = Cursor::new(buf);
        let err = read_frame(&mut cursor, 10).await.unwrap_err();
        assert!(matches!(err, NetError::FrameTooLarge { len: 100, max: 10 }));
    }
}
