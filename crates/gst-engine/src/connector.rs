//! The green-screen connector (C9): a [`Component`] that opens a TN5250
//! session, runs a script of Navigate/Assert/Scrape steps against it, and
//! returns whatever fields were scraped.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use gst_catalog::ScreenCatalog;
use gst_component::{CancellationToken, Component, ComponentConfiguration, ComponentResult};
use gst_dict::DataDictionary;
use gst_error::{ErrorCode, GstError};
use gst_screen::ScreenBuffer;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::config::{AssertOperator, EngineConfig, OnFailure, RetryPolicy, Step, StepKind};
use crate::reader::RecordReader;

const NEGOTIATION_TIMEOUT: Duration = Duration::from_secs(15);
const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(30);

const SENSITIVE_FIELDS: &[&str] = &["password", "passcode", "pin"];

fn is_sensitive(field: &str) -> bool {
    SENSITIVE_FIELDS.iter().any(|s| s.eq_ignore_ascii_case(field))
}

/// Pad/truncate a resolved field value to its catalog length, the same
/// way the server's `RecordBuilder::write_field_value` prepares a value
/// for the wire.
fn pad(value: &str, length: u16) -> String {
    let length = length as usize;
    let mut out: String = value.chars().take(length).collect();
    while out.chars().count() < length {
        out.push(' ');
    }
    out
}

/// The green-screen connector, registered in the orchestrator under
/// `"green_screen_connector"`.
#[derive(Debug, Default)]
pub struct GreenScreenConnector;

impl GreenScreenConnector {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Component for GreenScreenConnector {
    fn component_type(&self) -> &str {
        "green_screen_connector"
    }

    async fn execute(&self, config: &ComponentConfiguration, dict: &mut DataDictionary, cancel: CancellationToken) -> ComponentResult {
        let start = Instant::now();
        match run(config, dict, &cancel).await {
            Ok(output) => ComponentResult::success(output, elapsed_ms(start)),
            Err(err) => ComponentResult::failure((&err).into(), elapsed_ms(start)),
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

async fn run(config: &ComponentConfiguration, dict: &mut DataDictionary, cancel: &CancellationToken) -> Result<BTreeMap<String, String>, GstError> {
    let engine_config: EngineConfig = serde_json::from_value(config.config_blob.clone())
        .map_err(|e| GstError::new(ErrorCode::ConfigError, "invalid green-screen engine configuration").with_source(e))?;

    let catalog = if engine_config.screen_catalog_path.is_dir() {
        ScreenCatalog::load_dir(&engine_config.screen_catalog_path)?
    } else {
        ScreenCatalog::load_file(&engine_config.screen_catalog_path)?
    };

    let addr = format!("{}:{}", engine_config.connection.host, engine_config.connection.port);
    let mut stream = TcpStream::connect(&addr)
        .await
        .map_err(|e| GstError::new(ErrorCode::ConnectError, format!("failed to connect to {addr}")).with_source(e))?;

    let pending = gst_telnet::negotiate_client(
        &mut stream,
        &engine_config.connection.terminal_type,
        engine_config.connection.device_name.as_deref(),
        NEGOTIATION_TIMEOUT,
    )
    .await?;

    let (read_half, mut write_half) = stream.split();
    let mut reader = RecordReader::new(read_half, pending);
    let mut buffer = ScreenBuffer::new();

    read_and_parse(&mut reader, &mut buffer, DEFAULT_STEP_TIMEOUT).await?;

    let mut output = BTreeMap::new();

    for step in &engine_config.steps {
        if cancel.is_cancelled() {
            return Err(GstError::new(ErrorCode::UnexpectedError, "cancelled before step ran").with_context("step", step.name.clone()));
        }

        match run_step_with_retry(step, &catalog, &mut buffer, &mut reader, &mut write_half, dict).await {
            Ok(scraped) => output.extend(scraped),
            Err(err) if step.on_failure == OnFailure::LogAndContinue => {
                tracing::warn!(step = %step.name, code = ?err.code, message = %err.message, "step failed, continuing per on_failure policy");
            }
            Err(err) => return Err(err),
        }
    }

    Ok(output)
}

async fn read_and_parse<R: AsyncRead + Unpin>(reader: &mut RecordReader<R>, buffer: &mut ScreenBuffer, timeout: Duration) -> Result<(), GstError> {
    let raw = reader
        .next_record(timeout)
        .await?
        .ok_or_else(|| GstError::new(ErrorCode::ConnectError, "host closed the connection"))?;
    gst_protocol::parse_record(buffer, &raw)?;
    Ok(())
}

fn write_err(e: std::io::Error) -> GstError {
    GstError::new(ErrorCode::ConnectError, "failed writing a 5250 record to the host").with_source(e)
}

/// Run one step, retrying per its `retry` policy. `timeout_seconds`
/// bounds each individual attempt, not the sum of all attempts including
/// backoff sleeps.
async fn run_step_with_retry<R, W>(
    step: &Step,
    catalog: &ScreenCatalog,
    buffer: &mut ScreenBuffer,
    reader: &mut RecordReader<R>,
    writer: &mut W,
    dict: &mut DataDictionary,
) -> Result<BTreeMap<String, String>, GstError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let max_attempts = step.retry.as_ref().map(RetryPolicy::max_attempts).unwrap_or(1).max(1);
    let timeout = step.timeout_seconds.map(Duration::from_secs).unwrap_or(DEFAULT_STEP_TIMEOUT);

    let mut last_err = None;
    for attempt in 0..max_attempts {
        let attempt_result = tokio::time::timeout(timeout, execute_step(step, catalog, buffer, reader, writer, dict))
            .await
            .unwrap_or_else(|_| Err(GstError::new(ErrorCode::Timeout, format!("step '{}' timed out", step.name))));

        match attempt_result {
            Ok(scraped) => return Ok(scraped),
            Err(err) => {
                tracing::warn!(step = %step.name, attempt, code = ?err.code, message = %err.message, "step attempt failed");
                last_err = Some(err);
                if attempt + 1 < max_attempts {
                    if let Some(policy) = &step.retry {
                        tokio::time::sleep(policy.delay_for(attempt)).await;
                    }
                }
            }
        }
    }

    Err(last_err.expect("loop runs at least once since max_attempts >= 1"))
}

async fn execute_step<R, W>(
    step: &Step,
    catalog: &ScreenCatalog,
    buffer: &mut ScreenBuffer,
    reader: &mut RecordReader<R>,
    writer: &mut W,
    dict: &mut DataDictionary,
) -> Result<BTreeMap<String, String>, GstError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    match &step.kind {
        StepKind::Navigate { fields, aid_key, expect_screen } => {
            navigate(fields, aid_key, expect_screen.as_deref(), catalog, buffer, reader, writer, dict).await
        }
        StepKind::Assert { expect_screen, error_text, error_row, assert_fields, assert_operator, case_sensitive } => {
            assert_step(
                expect_screen.as_deref(),
                error_text.as_deref(),
                *error_row,
                assert_fields,
                *assert_operator,
                *case_sensitive,
                catalog,
                buffer,
                dict,
            )
        }
        StepKind::Scrape { scrape_fields } => scrape(scrape_fields, catalog, buffer, dict),
    }
}

#[allow(clippy::too_many_arguments)]
async fn navigate<R, W>(
    fields: &BTreeMap<String, String>,
    aid_key: &str,
    expect_screen: Option<&str>,
    catalog: &ScreenCatalog,
    buffer: &mut ScreenBuffer,
    reader: &mut RecordReader<R>,
    writer: &mut W,
    dict: &DataDictionary,
) -> Result<BTreeMap<String, String>, GstError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let current = catalog
        .identify(buffer)
        .ok_or_else(|| GstError::new(ErrorCode::ScreenMismatch, "current screen is not recognised by the catalog"))?;

    let mut modified = Vec::new();
    let mut logged_fields = Vec::new();
    for (name, template) in fields {
        let value = gst_util::substitute(template, |key| dict.get(key).map(str::to_string));
        let field = current
            .field(name)
            .ok_or_else(|| GstError::new(ErrorCode::FieldNotFound, format!("no field named '{name}' on screen '{}'", current.id)))?;
        modified.push(gst_protocol::ModifiedField { row: field.row, col: field.col, value: pad(&value, field.length) });
        logged_fields.push(if is_sensitive(name) { format!("{name}=[REDACTED]") } else { format!("{name}={value}") });
    }
    tracing::debug!(screen = %current.id, aid = %aid_key, fields = %logged_fields.join(","), "navigating");

    let aid = gst_wire::name_to_aid(aid_key)?;
    let (cursor_row, cursor_col) = buffer.cursor();
    let frame = gst_protocol::encode(aid, cursor_row, cursor_col, &modified)?;
    writer.write_all(&frame).await.map_err(write_err)?;

    read_and_parse(reader, buffer, DEFAULT_STEP_TIMEOUT).await?;

    if let Some(expected) = expect_screen {
        if !catalog.is_screen(buffer, expected) {
            return Err(GstError::new(ErrorCode::ScreenMismatch, format!("expected screen '{expected}' after navigate step")));
        }
    }

    Ok(BTreeMap::new())
}

#[allow(clippy::too_many_arguments)]
fn assert_step(
    expect_screen: Option<&str>,
    error_text: Option<&str>,
    error_row: Option<u16>,
    assert_fields: &BTreeMap<String, String>,
    assert_operator: AssertOperator,
    case_sensitive: bool,
    catalog: &ScreenCatalog,
    buffer: &ScreenBuffer,
    dict: &DataDictionary,
) -> Result<BTreeMap<String, String>, GstError> {
    if let Some(expected) = expect_screen {
        if !catalog.is_screen(buffer, expected) {
            return Err(GstError::new(ErrorCode::ScreenMismatch, format!("expected screen '{expected}'")));
        }
    }

    if let (Some(text), Some(row)) = (error_text, error_row) {
        if buffer.read_row(row).contains(text) {
            return Err(GstError::new(ErrorCode::StepFailed, format!("error text found on row {row}")).with_context("error_text", text.to_string()));
        }
    }

    if !assert_fields.is_empty() {
        let current = catalog
            .identify(buffer)
            .ok_or_else(|| GstError::new(ErrorCode::ScreenMismatch, "current screen is not recognised by the catalog"))?;
        for (name, template) in assert_fields {
            let expected = gst_util::substitute(template, |key| dict.get(key).map(str::to_string));
            let field = current
                .field(name)
                .ok_or_else(|| GstError::new(ErrorCode::FieldNotFound, format!("no field named '{name}' on screen '{}'", current.id)))?;
            let actual = buffer.read_text(field.row, field.col + 1, field.length).trim_end().to_string();
            if !assert_operator.matches(&actual, &expected, case_sensitive) {
                return Err(GstError::new(ErrorCode::StepFailed, format!("assert_fields mismatch on '{name}'")));
            }
        }
    }

    Ok(BTreeMap::new())
}

fn scrape(scrape_fields: &[String], catalog: &ScreenCatalog, buffer: &ScreenBuffer, dict: &mut DataDictionary) -> Result<BTreeMap<String, String>, GstError> {
    let current = catalog
        .identify(buffer)
        .ok_or_else(|| GstError::new(ErrorCode::ScreenMismatch, "current screen is not recognised by the catalog"))?;

    let mut out = BTreeMap::new();
    for name in scrape_fields {
        let field = current
            .field(name)
            .ok_or_else(|| GstError::new(ErrorCode::FieldNotFound, format!("no field named '{name}' on screen '{}'", current.id)))?;
        let value = buffer.read_text(field.row, field.col + 1, field.length).trim_end().to_string();
        dict.set(name.clone(), value.clone());
        out.insert(name.clone(), value);
    }
    Ok(out)
}
