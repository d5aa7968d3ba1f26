//! Post-negotiation 5250 record reader: peels `IAC`-framed records off a
//! raw byte stream, the way [`gst_telnet`] peels telnet option commands
//! off the same stream during negotiation, and hands the caller the
//! still-escaped record body for [`gst_protocol::framing`] to unescape.

use std::collections::VecDeque;
use std::time::Duration;

use gst_error::{ErrorCode, GstError};
use gst_wire::{DO, DONT, EOR, IAC, SB, SE, WILL, WONT};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Wraps a socket's read half plus whatever non-telnet bytes
/// [`gst_telnet::negotiate_server`] read past the start of negotiation —
/// those bytes belong to the first record and must be drained before the
/// socket is touched again.
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

    /// Read one complete record, still `IAC`-escaped. In-band telnet
    /// commands (option renegotiation, subnegotiations) encountered
    /// mid-stream are discarded rather than passed through. Returns
    /// `Ok(None)` if the peer closed the connection before any byte of a
    /// new record arrived.
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
                    // Escaped literal 0xFF: keep both bytes so framing::unescape
                    // collapses them downstream instead of here.
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
    use std::time::Duration;
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
    async fn pending_bytes_are_consumed_before_the_socket() {
        let (mut client, server) = duplex(4096);
        let mut reader = RecordReader::new(server, vec![b'p', b'r', b'e']);
        client.write_all(&[IAC, EOR]).await.unwrap();
        let record = reader.next_record(T).await.unwrap().unwrap();
        assert_eq!(record, b"pre");
    }

    #[tokio::test]
    async fn escaped_iac_survives_into_the_raw_record() {
        let (mut client, server) = duplex(4096);
        let mut reader = RecordReader::new(server, Vec::new());
        client.write_all(&[0x01, IAC, IAC, 0x02]).await.unwrap();
        client.write_all(&[IAC, EOR]).await.unwrap();
        let record = reader.next_record(T).await.unwrap().unwrap();
        assert_eq!(record, vec![0x01, IAC, IAC, 0x02]);
    }

    #[tokio::test]
    async fn in_band_do_dont_is_discarded() {
        let (mut client, server) = duplex(4096);
        let mut reader = RecordReader::new(server, Vec::new());
        client.write_all(&[0x01, IAC, DO, 0x2C, 0x02]).await.unwrap();
        client.write_all(&[IAC, EOR]).await.unwrap();
        let record = reader.next_record(T).await.unwrap().unwrap();
        assert_eq!(record, vec![0x01, 0x02]);
    }

    #[tokio::test]
    async fn in_band_subnegotiation_is_discarded() {
        let (mut client, server) = duplex(4096);
        let mut reader = RecordReader::new(server, Vec::new());
        client.write_all(&[0x01]).await.unwrap();
        client.write_all(&[IAC, SB, 0x18, 0x00, 0x41, IAC, SE]).await.unwrap();
        client.write_all(&[0x02]).await.unwrap();
        client.write_all(&[IAC, EOR]).await.unwrap();
        let record = reader.next_record(T).await.unwrap().unwrap();
        assert_eq!(record, vec![0x01, 0x02]);
    }

    #[tokio::test]
    async fn clean_close_before_any_byte_returns_none() {
        let (client, server) = duplex(4096);
        drop(client);
        let mut reader = RecordReader::new(server, Vec::new());
        let result = reader.next_record(T).await.unwrap();
        assert!(result.is_none());
    }
}
