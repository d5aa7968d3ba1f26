//! Async telnet option negotiator driving the BINARY / END-OF-RECORD /
//! TERMINAL-TYPE exchange both client- and server-side.
//!
//! Tolerates arbitrary interleaving of the three option negotiations:
//! incoming commands are handled as they arrive rather than in a fixed
//! order, and any non-telnet byte seen before negotiation completes is
//! pushed into a pending-data buffer for the data-stream parser to
//! consume first, the one piece of state explicitly shared between the
//! negotiator and the rest of the connector.

#![deny(unsafe_code)]

use gst_error::{ErrorCode, GstError};
use gst_wire::{
    DO, DONT, IAC, SB, SE, TELOPT_BINARY, TELOPT_END_OF_RECORD, TELOPT_TERMINAL_TYPE,
    TERMINAL_TYPE_IS, TERMINAL_TYPE_SEND, WILL, WONT,
};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Default per-byte read timeout during negotiation.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(15);

/// Which side of an option this negotiator represents.
#[derive(Debug, Default)]
struct RequiredOptionState {
    /// We have sent `WILL` (client) / `DO` (server) and the peer agreed.
    us_confirmed: bool,
    /// The peer has sent `WILL` (us replying `DO`) / `DO` (us replying
    /// `WILL`) for the complementary direction.
    them_confirmed: bool,
}

impl RequiredOptionState {
    fn settled(&self) -> bool {
        self.us_confirmed && self.them_confirmed
    }
}

struct Negotiation {
    binary: RequiredOptionState,
    end_of_record: RequiredOptionState,
    terminal_type_sent: bool,
    pending: Vec<u8>,
}

impl Negotiation {
    fn new() -> Self {
        Self {
            binary: RequiredOptionState::default(),
            end_of_record: RequiredOptionState::default(),
            terminal_type_sent: false,
            pending: Vec::new(),
        }
    }

    fn done(&self) -> bool {
        self.binary.settled() && self.end_of_record.settled() && self.terminal_type_sent
    }
}

fn fatal(opt: u8, verb: &'static str) -> GstError {
    GstError::new(
        ErrorCode::NegotiateError,
        format!("peer refused required telnet option 0x{opt:02X} with {verb}"),
    )
    .with_context("option", format!("0x{opt:02X}"))
    .with_context("verb", verb)
}

async fn read_byte(stream: &mut (impl AsyncRead + Unpin), timeout: Duration) -> Result<u8, GstError> {
    let mut buf = [0u8; 1];
    tokio::time::timeout(timeout, stream.read_exact(&mut buf))
        .await
        .map_err(|_| GstError::new(ErrorCode::NegotiateError, "timed out waiting for telnet byte"))?
        .map_err(|e| GstError::new(ErrorCode::NegotiateError, "socket closed during telnet negotiation").with_source(e))?;
    Ok(buf[0])
}

async fn write_all(stream: &mut (impl AsyncWrite + Unpin), bytes: &[u8]) -> Result<(), GstError> {
    stream
        .write_all(bytes)
        .await
        .map_err(|e| GstError::new(ErrorCode::NegotiateError, "failed writing telnet negotiation bytes").with_source(e))
}

/// Run the client-side negotiation: send `IAC WILL TERMINAL-TYPE`, answer
/// the resulting `SEND` subnegotiation with `IS <terminal_type>[@<device_name>]`,
/// then negotiate `BINARY` and `END-OF-RECORD` in both directions.
///
/// Returns any non-telnet bytes read past the start of negotiation, to be
/// fed to the data-stream parser before the socket is read again.
pub async fn negotiate_client<S>(
    stream: &mut S,
    terminal_type: &str,
    device_name: Option<&str>,
    read_timeout: Duration,
) -> Result<Vec<u8>, GstError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut neg = Negotiation::new();

    write_all(stream, &[IAC, WILL, TELOPT_TERMINAL_TYPE]).await?;
    write_all(stream, &[IAC, WILL, TELOPT_BINARY]).await?;
    write_all(stream, &[IAC, DO, TELOPT_BINARY]).await?;
    write_all(stream, &[IAC, WILL, TELOPT_END_OF_RECORD]).await?;
    write_all(stream, &[IAC, DO, TELOPT_END_OF_RECORD]).await?;

    while !neg.done() {
        step(stream, &mut neg, read_timeout, Some((terminal_type, device_name))).await?;
    }

    Ok(neg.pending)
}

/// Run the server-side negotiation: initiate the symmetric requests and
/// capture the client's terminal-type response.
///
/// Returns `(pending_bytes, terminal_type)`.
pub async fn negotiate_server<S>(
    stream: &mut S,
    read_timeout: Duration,
) -> Result<(Vec<u8>, String), GstError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut neg = Negotiation::new();
    let mut received_terminal_type = String::new();

    write_all(stream, &[IAC, DO, TELOPT_TERMINAL_TYPE]).await?;
    write_all(stream, &[IAC, WILL, TELOPT_BINARY]).await?;
    write_all(stream, &[IAC, DO, TELOPT_BINARY]).await?;
    write_all(stream, &[IAC, WILL, TELOPT_END_OF_RECORD]).await?;
    write_all(stream, &[IAC, DO, TELOPT_END_OF_RECORD]).await?;

    // The server doesn't send an `IS` reply of its own; when a
    // subnegotiation arrives carrying `IS <text>` the handler below
    // stashes it here via a closure-free side channel (the `step` helper
    // takes an `Option<(&str, ...)>` slot for the client's SEND-answer
    // path, so the server reads the `IS` payload directly).
    while !neg.done() {
        step_server(stream, &mut neg, read_timeout, &mut received_terminal_type).await?;
    }

    Ok((neg.pending, received_terminal_type))
}

async fn read_subnegotiation(
    stream: &mut (impl AsyncRead + Unpin),
    timeout: Duration,
) -> Result<Vec<u8>, GstError> {
    let mut body = Vec::new();
    loop {
        let byte = read_byte(stream, timeout).await?;
        if byte == IAC {
            let next = read_byte(stream, timeout).await?;
            if next == SE {
                return Ok(body);
            }
            // IAC IAC inside a subnegotiation escapes a literal 0xFF.
            body.push(next);
        } else {
            body.push(byte);
        }
    }
}

async fn step<S>(
    stream: &mut S,
    neg: &mut Negotiation,
    timeout: Duration,
    client_terminal_type: Option<(&str, Option<&str>)>,
) -> Result<(), GstError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let byte = read_byte(stream, timeout).await?;
    if byte != IAC {
        neg.pending.push(byte);
        return Ok(());
    }

    let command = read_byte(stream, timeout).await?;
    match command {
        WILL => {
            let opt = read_byte(stream, timeout).await?;
            handle_will(stream, neg, opt).await?;
        }
        WONT => {
            let opt = read_byte(stream, timeout).await?;
            handle_wont_dont(opt, "WONT")?;
        }
        DO => {
            let opt = read_byte(stream, timeout).await?;
            handle_do(stream, neg, opt).await?;
        }
        DONT => {
            let opt = read_byte(stream, timeout).await?;
            handle_wont_dont(opt, "DONT")?;
        }
        SB => {
            let opt = read_byte(stream, timeout).await?;
            let body = read_subnegotiation(stream, timeout).await?;
            if opt == TELOPT_TERMINAL_TYPE && body.first() == Some(&TERMINAL_TYPE_SEND) {
                if let Some((terminal_type, device_name)) = client_terminal_type {
                    respond_terminal_type(stream, terminal_type, device_name).await?;
                    neg.terminal_type_sent = true;
                }
            }
        }
        IAC => {
            // Escaped literal 0xFF in the data stream.
            neg.pending.push(IAC);
        }
        _ => {}
    }
    Ok(())
}

async fn step_server<S>(
    stream: &mut S,
    neg: &mut Negotiation,
    timeout: Duration,
    received_terminal_type: &mut String,
) -> Result<(), GstError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let byte = read_byte(stream, timeout).await?;
    if byte != IAC {
        neg.pending.push(byte);
        return Ok(());
    }

    let command = read_byte(stream, timeout).await?;
    match command {
        WILL => {
            let opt = read_byte(stream, timeout).await?;
            handle_will(stream, neg, opt).await?;
        }
        WONT => {
            let opt = read_byte(stream, timeout).await?;
            handle_wont_dont(opt, "WONT")?;
        }
        DO => {
            let opt = read_byte(stream, timeout).await?;
            handle_do(stream, neg, opt).await?;
        }
        DONT => {
            let opt = read_byte(stream, timeout).await?;
            handle_wont_dont(opt, "DONT")?;
        }
        SB => {
            let opt = read_byte(stream, timeout).await?;
            let body = read_subnegotiation(stream, timeout).await?;
            if opt == TELOPT_TERMINAL_TYPE && body.first() == Some(&TERMINAL_TYPE_IS) {
                *received_terminal_type = String::from_utf8_lossy(&body[1..]).into_owned();
                neg.terminal_type_sent = true;
            }
        }
        IAC => {
            neg.pending.push(IAC);
        }
        _ => {}
    }
    Ok(())
}

async fn handle_will<S>(stream: &mut S, neg: &mut Negotiation, opt: u8) -> Result<(), GstError>
where
    S: AsyncWrite + Unpin,
{
    match opt {
        TELOPT_BINARY => neg.binary.them_confirmed = true,
        TELOPT_END_OF_RECORD => neg.end_of_record.them_confirmed = true,
        TELOPT_TERMINAL_TYPE => {
            // The peer has agreed to send its terminal type; ask for it.
            // The client never reaches this arm (it already sent WILL up
            // front and the server only ever DOs this option), so in
            // practice this is the server's half of the exchange.
            write_all(stream, &[IAC, SB, TELOPT_TERMINAL_TYPE, TERMINAL_TYPE_SEND, IAC, SE]).await?;
        }
        _ => {
            write_all(stream, &[IAC, DONT, opt]).await?;
        }
    }
    Ok(())
}

async fn handle_do<S>(stream: &mut S, neg: &mut Negotiation, opt: u8) -> Result<(), GstError>
where
    S: AsyncWrite + Unpin,
{
    match opt {
        TELOPT_BINARY => neg.binary.us_confirmed = true,
        TELOPT_END_OF_RECORD => neg.end_of_record.us_confirmed = true,
        TELOPT_TERMINAL_TYPE => {
            // Tracked implicitly; the actual answer happens on the SEND
            // subnegotiation.
        }
        _ => {
            write_all(stream, &[IAC, WONT, opt]).await?;
        }
    }
    Ok(())
}

fn handle_wont_dont(opt: u8, verb: &'static str) -> Result<(), GstError> {
    if opt == TELOPT_BINARY || opt == TELOPT_END_OF_RECORD || opt == TELOPT_TERMINAL_TYPE {
        return Err(fatal(opt, verb));
    }
    Ok(())
}

async fn respond_terminal_type<S>(
    stream: &mut S,
    terminal_type: &str,
    device_name: Option<&str>,
) -> Result<(), GstError>
where
    S: AsyncWrite + Unpin,
{
    let mut payload = vec![TERMINAL_TYPE_IS];
    payload.extend_from_slice(terminal_type.as_bytes());
    if let Some(device) = device_name {
        payload.push(b'@');
        payload.extend_from_slice(device.as_bytes());
    }

    let mut frame = vec![IAC, SB, TELOPT_TERMINAL_TYPE];
    frame.extend_from_slice(&payload);
    frame.extend_from_slice(&[IAC, SE]);
    write_all(stream, &frame).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[tokio::test]
    async fn client_server_negotiation_completes() {
        let (client_stream, server_stream) = duplex(4096);
        let (mut client_stream, mut server_stream) = (client_stream, server_stream);

        let client = tokio::spawn(async move {
            negotiate_client(&mut client_stream, "IBM-3477-FC", Some("DEV01"), Duration::from_secs(2))
                .await
                .map(|pending| (pending, client_stream))
        });
        let server = tokio::spawn(async move {
            negotiate_server(&mut server_stream, Duration::from_secs(2))
                .await
                .map(|r| (r, server_stream))
        });

        let (client_result, server_result) = tokio::join!(client, server);
        let (client_pending, _client_stream) = client_result.unwrap().unwrap();
        let ((server_pending, terminal_type), _server_stream) = server_result.unwrap().unwrap();

        assert!(client_pending.is_empty());
        assert!(server_pending.is_empty());
        assert_eq!(terminal_type, "IBM-3477-FC@DEV01");
    }

    #[tokio::test]
    async fn fatal_refusal_of_required_option_errors() {
        let (mut client_stream, mut server_stream) = duplex(4096);

        let client = tokio::spawn(async move {
            negotiate_client(&mut client_stream, "IBM-3477-FC", None, Duration::from_secs(2)).await
        });

        // Minimal, uncooperative peer: refuse BINARY outright.
        server_stream.write_all(&[IAC, WONT, TELOPT_BINARY]).await.unwrap();

        let result = client.await.unwrap();
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().code, ErrorCode::NegotiateError);
    }

    #[tokio::test]
    async fn read_timeout_is_fatal() {
        let (mut client_stream, _server_stream) = duplex(4096);
        let result = negotiate_client(&mut client_stream, "IBM-3477-FC", None, Duration::from_millis(20)).await;
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().code, ErrorCode::NegotiateError);
    }
}
