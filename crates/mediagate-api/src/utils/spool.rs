//! Request body spooling
//!
//! Multipart file parts are accumulated here before the pipeline runs, so the
//! declared length is known exactly. Parts below the in-memory limit stay in a
//! buffer; at the limit the spool rolls over to an anonymous temp file and is
//! later handed to the pipeline as a stream. Bytes past the hard ceiling are
//! refused as soon as they arrive.

use bytes::BytesMut;
use mediagate_processing::PayloadSource;
use std::io::SeekFrom;
use tokio::io::{AsyncSeekExt, AsyncWriteExt};

#[derive(Debug, thiserror::Error)]
pub enum SpoolError {
    #[error("Upload exceeds the maximum of {max} bytes")]
    TooLarge { max: u64 },

    #[error("Spool I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

enum SpoolState {
    Memory(BytesMut),
    Disk(tokio::fs::File),
}

pub struct UploadSpool {
    state: SpoolState,
    len: u64,
    memory_limit: u64,
    max_bytes: u64,
}

impl UploadSpool {
    pub fn new(memory_limit: u64, max_bytes: u64) -> Self {
        Self {
            state: SpoolState::Memory(BytesMut::new()),
            len: 0,
            memory_limit,
            max_bytes,
        }
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_on_disk(&self) -> bool {
        matches!(self.state, SpoolState::Disk(_))
    }

    pub async fn push(&mut self, chunk: &[u8]) -> Result<(), SpoolError> {
        let new_len = self.len + chunk.len() as u64;
        if new_len > self.max_bytes {
            return Err(SpoolError::TooLarge {
                max: self.max_bytes,
            });
        }

        if let SpoolState::Memory(buffer) = &mut self.state {
            if new_len < self.memory_limit {
                buffer.extend_from_slice(chunk);
                self.len = new_len;
                return Ok(());
            }
            let buffered = std::mem::take(buffer);
            self.state = SpoolState::Disk(Self::roll_over(&buffered).await?);
        }

        if let SpoolState::Disk(file) = &mut self.state {
            file.write_all(chunk).await?;
        }
        self.len = new_len;
        Ok(())
    }

    async fn roll_over(buffered: &[u8]) -> Result<tokio::fs::File, SpoolError> {
        let file = tokio::task::spawn_blocking(tempfile::tempfile)
            .await
            .map_err(|e| SpoolError::Io(std::io::Error::other(e)))??;
        let mut file = tokio::fs::File::from_std(file);
        file.write_all(buffered).await?;

        tracing::debug!(buffered_bytes = buffered.len(), "Upload spool rolled over to disk");
        Ok(file)
    }

    /// Hand the spooled bytes to the pipeline.
    pub async fn into_source(self) -> Result<PayloadSource, SpoolError> {
        match self.state {
            SpoolState::Memory(buffer) => Ok(PayloadSource::Buffered(buffer.freeze())),
            SpoolState::Disk(mut file) => {
                file.flush().await?;
                file.seek(SeekFrom::Start(0)).await?;
                Ok(PayloadSource::Stream(Box::pin(file)))
            }
        }
    }
}
