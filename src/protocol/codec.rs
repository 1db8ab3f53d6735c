//! Frame codec
//!
//! Every message on the wire, in both directions, is one frame: a 2-byte
//! big-endian length followed by that many bytes of UTF-8 text.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::FrameError;

/// Largest payload the length prefix can describe.
pub const MAX_FRAME_LEN: usize = u16::MAX as usize;

/// Encodes `text` as a single frame.
///
/// Fails with `FrameError::Oversized` before anything is written when the
/// UTF-8 encoding exceeds [`MAX_FRAME_LEN`].
pub fn encode(text: &str) -> Result<Vec<u8>, FrameError> {
    let payload = text.as_bytes();
    let len = u16::try_from(payload.len()).map_err(|_| FrameError::Oversized(payload.len()))?;

    let mut frame = Vec::with_capacity(2 + payload.len());
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(payload);
    Ok(frame)
}

/// Reads exactly one frame, waiting as long as it takes for it to arrive.
///
/// A stream that ends before the first header byte yields
/// `FrameError::ConnectionClosed`; one that ends anywhere later yields
/// `FrameError::Truncated`.
pub async fn read_frame<R>(reader: &mut R) -> Result<String, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; 2];
    match read_full(reader, &mut header).await? {
        0 => return Err(FrameError::ConnectionClosed),
        1 => {
            return Err(FrameError::Truncated {
                expected: 2,
                received: 1,
            });
        }
        _ => {}
    }

    let len = u16::from_be_bytes(header) as usize;
    let mut payload = vec![0u8; len];
    let received = read_full(reader, &mut payload).await?;
    if received < len {
        return Err(FrameError::Truncated {
            expected: len,
            received,
        });
    }

    String::from_utf8(payload).map_err(|_| FrameError::InvalidUtf8)
}

/// Writes `text` as one frame and flushes it.
pub async fn write_frame<W>(writer: &mut W, text: &str) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode(text)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Fills `buf` until it is full or the stream ends; returns the bytes read.
async fn read_full<R>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]).await? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}
