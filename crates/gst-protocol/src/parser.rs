//! Data-stream parser: applies a single unescaped 5250 record's orders to
//! a [`ScreenBuffer`], leaving buffer state (grid, fields, cursor)
//! reflecting the record just applied.

use gst_error::{ErrorCode, GstError};
use gst_screen::{ScreenBuffer, ScreenField};
use gst_wire::{
    CMD_CLEAR_UNIT, CMD_WRITE_TO_DISPLAY, ESC, ORDER_IC, ORDER_RA, ORDER_SBA, ORDER_SF,
};

use crate::framing::{self, GdsHeader};

/// Outcome of parsing one record: the GDS header that framed it and the
/// AID key the host was waiting on, if the record invited input.
#[derive(Debug, Clone, Copy)]
pub struct ParsedRecord {
    pub header: GdsHeader,
}

/// Parse a full wire record — `IAC`-doubled payload up to (but not
/// including) the `IAC EOR` terminator — applying its orders to
/// `buffer` in place.
///
/// `buffer` carries state across calls: a record that omits
/// `CLEAR_UNIT` is a partial update layered on whatever the buffer
/// already held, exactly as a real 5250 session's intervening screens
/// work.
pub fn parse_record(buffer: &mut ScreenBuffer, raw_escaped: &[u8]) -> Result<ParsedRecord, GstError> {
    let unescaped = framing::unescape(raw_escaped)?;
    let (header, body) = framing::parse_header(&unescaped)?;
    apply_body(buffer, body)?;
    Ok(ParsedRecord { header })
}

fn apply_body(buffer: &mut ScreenBuffer, body: &[u8]) -> Result<(), GstError> {
    let mut pos = 0usize;
    let mut write_pos = buffer.cursor();
    let mut in_write = false;

    while pos < body.len() {
        let byte = body[pos];
        match byte {
            ESC => {
                let cmd = *body.get(pos + 1).ok_or_else(|| truncated("ESC command"))?;
                match cmd {
                    CMD_CLEAR_UNIT => {
                        tracing::trace!("clear_unit: resetting screen buffer");
                        buffer.clear();
                        write_pos = (1, 1);
                        in_write = false;
                        pos += 2;
                    }
                    CMD_WRITE_TO_DISPLAY => {
                        let _cc1 = *body.get(pos + 2).ok_or_else(|| truncated("WRITE_TO_DISPLAY cc1"))?;
                        let _cc2 = *body.get(pos + 3).ok_or_else(|| truncated("WRITE_TO_DISPLAY cc2"))?;
                        in_write = true;
                        pos += 4;
                    }
                    other => {
                        return Err(GstError::new(
                            ErrorCode::UnexpectedError,
                            format!("unknown 5250 command byte: 0x{other:02X}"),
                        ));
                    }
                }
            }
            ORDER_SBA => {
                let row = *body.get(pos + 1).ok_or_else(|| truncated("SBA row"))?;
                let col = *body.get(pos + 2).ok_or_else(|| truncated("SBA col"))?;
                write_pos = (row as u16, col as u16);
                pos += 3;
            }
            ORDER_SF => {
                let ffw0 = *body.get(pos + 1).ok_or_else(|| truncated("SF ffw0"))?;
                let ffw1 = *body.get(pos + 2).ok_or_else(|| truncated("SF ffw1"))?;
                buffer.add_field(ScreenField {
                    row: write_pos.0,
                    col: write_pos.1,
                    length: 0,
                    ffw0,
                    ffw1,
                });
                write_pos = ScreenBuffer::advance_position(write_pos.0, write_pos.1);
                pos += 3;
            }
            ORDER_RA => {
                let row = *body.get(pos + 1).ok_or_else(|| truncated("RA row"))?;
                let col = *body.get(pos + 2).ok_or_else(|| truncated("RA col"))?;
                let ch = *body.get(pos + 3).ok_or_else(|| truncated("RA char"))?;
                buffer.fill_range(write_pos.0, write_pos.1, row as u16, col as u16, gst_codec::to_ascii(ch));
                write_pos = (row as u16, col as u16);
                pos += 4;
            }
            ORDER_IC => {
                buffer.set_cursor(write_pos.0, write_pos.1);
                pos += 1;
            }
            other if other < 0x40 => {
                // Every byte below EBCDIC space (0x40) that isn't one of
                // the orders matched above is an order this design does
                // not implement (e.g. erase-to-address, move-cursor).
                // Its width is unknown, so there is no safe way to skip
                // past it.
                return Err(GstError::new(
                    ErrorCode::UnexpectedError,
                    format!("unknown 5250 order byte: 0x{other:02X}"),
                ));
            }
            data_byte => {
                if in_write {
                    buffer.set_char(write_pos.0, write_pos.1, gst_codec::to_ascii(data_byte));
                    write_pos = ScreenBuffer::advance_position(write_pos.0, write_pos.1);
                }
                pos += 1;
            }
        }
    }

    buffer.finalize_field_lengths();
    Ok(())
}

fn truncated(what: &str) -> GstError {
    GstError::new(ErrorCode::UnexpectedError, format!("truncated record: expected {what}"))
}
