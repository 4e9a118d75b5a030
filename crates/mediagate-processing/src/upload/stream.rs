//! Reader adapters for the streaming commit path.

use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};

/// Yields exactly `expected` bytes from the inner reader.
///
/// Bytes past `expected` are dropped. An inner EOF before `expected` bytes is
/// an `UnexpectedEof` error, so the storage write fails instead of committing
/// a short object.
pub struct ExactLengthReader<R> {
    inner: R,
    remaining: u64,
}

impl<R> ExactLengthReader<R> {
    pub fn new(inner: R, expected: u64) -> Self {
        Self {
            inner,
            remaining: expected,
        }
    }
}

impl<R: AsyncRead + Unpin> AsyncRead for ExactLengthReader<R> {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if self.remaining == 0 || buf.remaining() == 0 {
            return Poll::Ready(Ok(()));
        }

        let before = buf.filled().len();
        ready!(Pin::new(&mut self.inner).poll_read(cx, buf))?;
        let read = (buf.filled().len() - before) as u64;

        if read == 0 {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("payload ended {} bytes short of declared length", self.remaining),
            )));
        }

        if read > self.remaining {
            let keep = before + self.remaining as usize;
            buf.set_filled(keep);
            self.remaining = 0;
        } else {
            self.remaining -= read;
        }

        Poll::Ready(Ok(()))
    }
}
