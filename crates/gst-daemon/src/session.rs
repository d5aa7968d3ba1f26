//! Per-connection session loop (C14): negotiate, paint the initial
//! screen, then repeatedly decode a client reply, extract its fields,
//! evaluate the matching navigation rule, and paint whatever screen that
//! rule leaves the session on.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use gst_catalog::ScreenDefinition;
use gst_error::{ErrorCode, GstError};
use gst_transition::TransitionEvaluator;
use gst_wire::aid_to_name;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use crate::reader::RecordReader;
use crate::DaemonContext;

const NEGOTIATION_TIMEOUT: Duration = Duration::from_secs(15);
const SESSION_READ_TIMEOUT: Duration = Duration::from_secs(600);

struct SessionState {
    current_screen: String,
    is_authenticated: bool,
    user_id: Option<String>,
    data: BTreeMap<String, String>,
}

/// Drive one accepted connection to completion, logging and discarding
/// whatever error ends it — a session failure never brings down the
/// daemon's accept loop.
pub async fn handle_session(mut socket: TcpStream, peer: SocketAddr, ctx: Arc<DaemonContext>) {
    match run_session(&mut socket, &ctx).await {
        Ok(()) => tracing::debug!(%peer, "session closed"),
        Err(err) => tracing::warn!(%peer, code = ?err.code, message = %err.message, "session ended with error"),
    }
}

async fn run_session(socket: &mut TcpStream, ctx: &DaemonContext) -> Result<(), GstError> {
    let (pending, terminal_type) = gst_telnet::negotiate_server(socket, NEGOTIATION_TIMEOUT).await?;
    tracing::debug!(%terminal_type, "telnet negotiation complete");

    let (read_half, mut write_half) = socket.split();
    let mut reader = RecordReader::new(read_half, pending);
    let evaluator = TransitionEvaluator::new(ctx.nav_config.clone(), ctx.loan_store.clone());

    let mut state = SessionState {
        current_screen: ctx.nav_config.initial_screen.clone(),
        is_authenticated: false,
        user_id: None,
        data: BTreeMap::new(),
    };

    let initial = screen(ctx, &state.current_screen)?;
    let frame = gst_server_protocol::render(initial, &state.data, None);
    write_half.write_all(&frame).await.map_err(write_err)?;

    loop {
        let raw = match reader.next_record(SESSION_READ_TIMEOUT).await? {
            Some(raw) => raw,
            None => return Ok(()),
        };

        let (aid_byte, _cursor_row, _cursor_col, fields) = gst_protocol::encoder::decode(&raw)?;
        let aid_name = aid_to_name(aid_byte)
            .map(str::to_string)
            .unwrap_or_else(|_| format!("0x{aid_byte:02X}"));

        let current_def = screen(ctx, &state.current_screen)?;
        let input = gst_server_protocol::extract(current_def, &fields);
        let result = evaluator.evaluate(&state.current_screen, &aid_name, &input);

        let frame = if result.success {
            let target = result.target.expect("a successful transition always names a target screen");
            let leaving_initial = state.current_screen == ctx.nav_config.initial_screen && target != ctx.nav_config.initial_screen;

            state.data.extend(result.data_updates);
            hydrate_loan_lookup(ctx, &mut state.data);

            if leaving_initial {
                state.is_authenticated = true;
                state.user_id = state.data.get("user_id").cloned();
            }
            if target == ctx.nav_config.initial_screen {
                state.is_authenticated = false;
                state.user_id = None;
                state.data.clear();
            }

            state.current_screen = target;
            let target_def = screen(ctx, &state.current_screen)?;
            gst_server_protocol::render(target_def, &state.data, None)
        } else {
            let current_def = screen(ctx, &state.current_screen)?;
            gst_server_protocol::render(current_def, &state.data, result.error.as_deref())
        };

        write_half.write_all(&frame).await.map_err(write_err)?;
    }
}

fn screen<'a>(ctx: &'a DaemonContext, id: &str) -> Result<&'a ScreenDefinition, GstError> {
    ctx.catalog.get(id).ok_or_else(|| {
        GstError::new(ErrorCode::ConfigError, format!("navigation config references unknown screen: {id}"))
            .with_context("screen_id", id.to_string())
    })
}

fn hydrate_loan_lookup(ctx: &DaemonContext, data: &mut BTreeMap<String, String>) {
    let Some(loan_number) = data.get("loan_number").cloned() else {
        return;
    };
    if let Some(loan) = ctx.loan_store.find(&loan_number) {
        for (key, value) in loan {
            data.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }
}

fn write_err(e: std::io::Error) -> GstError {
    GstError::new(ErrorCode::ConnectError, "failed writing a 5250 record to the client").with_source(e)
}
