//! Client-side counterpart of `gst-daemon`'s record reader: peels
//! `IAC`-framed records off the host connection after telnet negotiation,
//! discarding any in-band telnet command the host sends mid-session.
//!
//! Deliberately not shared with `gst-daemon` — each end of the
//! connection owns its own framing reader, the same split as the
//! protocol crates themselves (`gst-protocol` vs `gst-server-protocol`).

use std::collections::VecDeque;
use std::time::Duration;

use gst_error::{ErrorCode, GstError};
use gst_wire::{DO, DONT, EOR, IAC, SB, SE, WILL, WONT};
use tokio::io::{AsyncRead, AsyncReadExt};

pub struct RecordReader<S> {
    stream: S,
    pending: VecDeque<u8>,
}

impl<S: AsyncRead + Unpin> RecordReader<S> {
    pub fn new(stream: S, pending: Vec<u8>) -> Self {
        Self { stream, pending: pending.into() }
    }

    async fn read_byte(&mut self, timeout: Duration) -> Result<u8, GstError> {
        if let Some(byte) = self.pending.pop_front() {
            return Ok(byte);
        }
        let mut buf = [0u8; 1];
        tokio::time::timeout(timeout, self.stream.read_exact(&mut buf))
            .await
            .map_err(|_| GstError::new(ErrorCode::Timeout, "timed out waiting for a 5250 record byte"))?
            .map_err(|e| GstError::new(ErrorCode::ConnectError, "socket closed while reading a 5250 record").with_source(e))?;
        Ok(buf[0])
    }

    async fn discard_subnegotiation(&mut self, timeout: Duration) -> Result<(), GstError> {
        loop {
            let byte = self.read_byte(timeout).await?;
            if byte == IAC && self.read_byte(timeout).await? == SE {
                return Ok(());
            }
        }
    }

    pub async fn next_record(&mut self, timeout: Duration) -> Result<Option<Vec<u8>>, GstError> {
        let mut raw = Vec::new();
        loop {
            let byte = match self.read_byte(timeout).await {
                Ok(byte) => byte,
                Err(e) if raw.is_empty() && e.code == ErrorCode::ConnectError => return Ok(None),
                Err(e) => return Err(e),
            };

            if byte != IAC {
                raw.push(byte);
                continue;
            }

            let command = self.read_byte(timeout).await?;
            match command {
                EOR => return Ok(Some(raw)),
                IAC => {
                    raw.push(IAC);
                    raw.push(IAC);
                }
                DO | DONT | WILL | WONT => {
                    self.read_byte(timeout).await?;
                }
                SB => self.discard_subnegotiation(timeout).await?,
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncWriteExt};

    const T: Duration = Duration::from_secs(2);

    #[tokio::test]
    async fn reads_a_plain_record_terminated_by_iac_eor() {
        let (mut client, server) = duplex(4096);
        let mut reader = RecordReader::new(server, Vec::new());
        client.write_all(b"hello").await.unwrap();
        client.write_all(&[IAC, EOR]).await.unwrap();
        let record = reader.next_record(T).await.unwrap().unwrap();
        assert_eq!(record, b"hello");
    }

    #[tokio::test]
    async fn clean_close_before_any_byte_returns_none() {
        let (client, server) = duplex(4096);
        drop(client);
        let mut reader = RecordReader::new(server, Vec::new());
        assert!(reader.next_record(T).await.unwrap().is_none());
    }
}
