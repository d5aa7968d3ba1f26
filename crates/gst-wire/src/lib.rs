//! Frozen namespace of TN5250 wire-protocol bytes: telnet command/option
//! bytes, 5250 commands and orders, GDS record framing constants, AID key
//! bytes, field-format-word flags, and screen geometry.
//!
//! Nothing in this crate does I/O; it is pure constants plus two
//! bidirectional AID name/byte lookup helpers.

#![deny(unsafe_code)]

use gst_error::{ErrorCode, GstError};

// ---------------------------------------------------------------------------
// Screen geometry
// ---------------------------------------------------------------------------

/// Number of rows in the fixed screen grid.
pub const SCREEN_ROWS: usize = 24;
/// Number of columns in the fixed screen grid.
pub const SCREEN_COLS: usize = 80;

// ---------------------------------------------------------------------------
// Telnet layer
// ---------------------------------------------------------------------------

/// Interpret-As-Command byte.
pub const IAC: u8 = 0xFF;
/// Telnet `DO` command.
pub const DO: u8 = 0xFD;
/// Telnet `DONT` command.
pub const DONT: u8 = 0xFE;
/// Telnet `WILL` command.
pub const WILL: u8 = 0xFB;
/// Telnet `WONT` command.
pub const WONT: u8 = 0xFC;
/// Telnet subnegotiation begin.
pub const SB: u8 = 0xFA;
/// Telnet subnegotiation end.
pub const SE: u8 = 0xF0;
/// Telnet end-of-record marker (follows `IAC`).
pub const EOR: u8 = 0xEF;

/// Telnet option: transmit binary.
pub const TELOPT_BINARY: u8 = 0x00;
/// Telnet option: terminal type.
pub const TELOPT_TERMINAL_TYPE: u8 = 0x18;
/// Telnet option: end-of-record.
pub const TELOPT_END_OF_RECORD: u8 = 0x19;

/// Terminal-type subnegotiation `SEND` byte.
pub const TERMINAL_TYPE_SEND: u8 = 0x01;
/// Terminal-type subnegotiation `IS` byte.
pub const TERMINAL_TYPE_IS: u8 = 0x00;

// ---------------------------------------------------------------------------
// 5250 commands and orders
// ---------------------------------------------------------------------------

/// Escape byte introducing a 5250 command.
pub const ESC: u8 = 0x04;

/// Clear-unit command: erase the display and reset fields.
pub const CMD_CLEAR_UNIT: u8 = 0x40;
/// Write-to-display command: begin a frame of display orders.
pub const CMD_WRITE_TO_DISPLAY: u8 = 0x11;
/// Write-structured-field command (not interpreted by this design; reserved).
pub const CMD_WRITE_STRUCTURED_FIELD: u8 = 0xF3;

/// Set-buffer-address order.
pub const ORDER_SBA: u8 = 0x11;
/// Repeat-to-address order.
pub const ORDER_RA: u8 = 0x02;
/// Erase-to-address order (not interpreted beyond acknowledgement).
pub const ORDER_EA: u8 = 0x03;
/// Insert-cursor order.
pub const ORDER_IC: u8 = 0x13;
/// Move-cursor order (not interpreted beyond acknowledgement).
pub const ORDER_MC: u8 = 0x14;
/// Start-field order.
pub const ORDER_SF: u8 = 0x1D;

/// Write-to-display control byte 1: lock keyboard.
pub const CC1_LOCK_KEYBOARD: u8 = 0x20;

// ---------------------------------------------------------------------------
// GDS (General Data Stream) record framing
// ---------------------------------------------------------------------------

/// GDS record type for 5250 data streams.
pub const GDS_RECORD_TYPE: u16 = 0x12A0;
/// Variable-header length field used by every record this design emits.
pub const GDS_VARIABLE_HEADER_LEN: u16 = 0x0400;
/// Size in bytes of the fixed GDS header.
pub const GDS_HEADER_LEN: usize = 10;

/// GDS opcode: no operation.
pub const OPCODE_NO_OP: u8 = 0x00;
/// GDS opcode: invite (host is prompting for input).
pub const OPCODE_INVITE: u8 = 0x01;
/// GDS opcode: output-only (host sends, no response expected).
pub const OPCODE_OUTPUT_ONLY: u8 = 0x02;
/// GDS opcode: put/get (request/response cycle).
pub const OPCODE_PUT_GET: u8 = 0x03;

// ---------------------------------------------------------------------------
// Field Format Word flags
// ---------------------------------------------------------------------------

/// Bypass (protected) bit in `ffw0`.
pub const FFW_BYPASS: u8 = 0x20;
/// Mask over the low 3 bits of `ffw0` that select the shift/nondisplay class.
pub const FFW_SHIFT_MASK: u8 = 0x07;
/// Shift-class value meaning "nondisplay" (hidden field).
pub const FFW_SHIFT_NONDISPLAY: u8 = 0x07;
/// Modified-data-tag bit in `ffw1`.
pub const FFW_MDT: u8 = 0x01;

// ---------------------------------------------------------------------------
// AID (Attention Identifier) keys
// ---------------------------------------------------------------------------

/// No AID; used as a sentinel, never sent.
pub const AID_NONE: u8 = 0x00;
/// Enter / field-exit.
pub const AID_ENTER: u8 = 0xF1;
/// Function key F1.
pub const AID_F1: u8 = 0x31;
/// Function key F2.
pub const AID_F2: u8 = 0x32;
/// Function key F3.
pub const AID_F3: u8 = 0x33;
/// Function key F4.
pub const AID_F4: u8 = 0x34;
/// Function key F5.
pub const AID_F5: u8 = 0x35;
/// Function key F6.
pub const AID_F6: u8 = 0x36;
/// Function key F7.
pub const AID_F7: u8 = 0x37;
/// Function key F8.
pub const AID_F8: u8 = 0x38;
/// Function key F9.
pub const AID_F9: u8 = 0x39;
/// Function key F10.
pub const AID_F10: u8 = 0x3A;
/// Function key F11.
pub const AID_F11: u8 = 0x3B;
/// Function key F12.
pub const AID_F12: u8 = 0x3C;
/// Help key.
pub const AID_HELP: u8 = 0xF3;
/// Roll down (Page Up).
pub const AID_ROLL_DOWN: u8 = 0xF4;
/// Roll up (Page Down).
pub const AID_ROLL_UP: u8 = 0xF5;
/// Print key.
pub const AID_PRINT: u8 = 0xF6;
/// Clear key.
pub const AID_CLEAR: u8 = 0xBD;

/// `(name, byte)` table backing [`aid_to_name`] and [`name_to_aid`].
///
/// Canonical names match spec usage: `"Enter"`, `"F1"`..`"F12"`,
/// `"PageUp"` (alias for roll-down), `"PageDown"` (alias for roll-up),
/// `"Help"`, `"Print"`, `"Clear"`.
const AID_TABLE: &[(&str, u8)] = &[
    ("Enter", AID_ENTER),
    ("F1", AID_F1),
    ("F2", AID_F2),
    ("F3", AID_F3),
    ("F4", AID_F4),
    ("F5", AID_F5),
    ("F6", AID_F6),
    ("F7", AID_F7),
    ("F8", AID_F8),
    ("F9", AID_F9),
    ("F10", AID_F10),
    ("F11", AID_F11),
    ("F12", AID_F12),
    ("PageUp", AID_ROLL_DOWN),
    ("PageDown", AID_ROLL_UP),
    ("Help", AID_HELP),
    ("Print", AID_PRINT),
    ("Clear", AID_CLEAR),
];

/// Look up the canonical name for an AID byte.
///
/// Returns a [`GstError`] with [`ErrorCode::ConfigError`] when `aid` is not
/// one of the recognised keys. `AID_NONE` is not a valid key and is
/// rejected too.
pub fn aid_to_name(aid: u8) -> Result<&'static str, GstError> {
    AID_TABLE
        .iter()
        .find(|(_, byte)| *byte == aid)
        .map(|(name, _)| *name)
        .ok_or_else(|| {
            GstError::new(ErrorCode::ConfigError, format!("unknown AID byte: 0x{aid:02X}"))
                .with_context("aid_byte", format!("0x{aid:02X}"))
        })
}

/// Look up the AID byte for a canonical key name.
///
/// Matching is case-sensitive and exact (`"enter"` does not match
/// `"Enter"`), matching the closed table callers are expected to use
/// verbatim from workflow step definitions.
pub fn name_to_aid(name: &str) -> Result<u8, GstError> {
    AID_TABLE
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, byte)| *byte)
        .ok_or_else(|| {
            GstError::new(ErrorCode::ConfigError, format!("unknown AID key name: {name}"))
                .with_context("aid_name", name)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_table_entry_round_trips() {
        for (name, byte) in AID_TABLE {
            assert_eq!(name_to_aid(name).unwrap(), *byte);
            assert_eq!(aid_to_name(*byte).unwrap(), *name);
        }
    }

    #[test]
    fn unknown_name_is_config_error() {
        let err = name_to_aid("Bogus").unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigError);
    }

    #[test]
    fn unknown_byte_is_config_error() {
        let err = aid_to_name(0x7F).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigError);
    }

    #[test]
    fn aid_none_is_not_a_valid_key() {
        assert!(aid_to_name(AID_NONE).is_err());
    }

    #[test]
    fn page_up_and_down_alias_roll_orders() {
        assert_eq!(name_to_aid("PageUp").unwrap(), AID_ROLL_DOWN);
        assert_eq!(name_to_aid("PageDown").unwrap(), AID_ROLL_UP);
    }

    #[test]
    fn ffw_protected_and_hidden_masks() {
        let protected_ffw0 = FFW_BYPASS;
        assert_ne!(protected_ffw0 & FFW_BYPASS, 0);

        let hidden_ffw0 = FFW_SHIFT_NONDISPLAY;
        assert_eq!(hidden_ffw0 & FFW_SHIFT_MASK, FFW_SHIFT_NONDISPLAY);
    }

    #[test]
    fn screen_geometry_is_24_by_80() {
        assert_eq!(SCREEN_ROWS, 24);
        assert_eq!(SCREEN_COLS, 80);
    }

    #[test]
    fn gds_header_len_is_ten() {
        assert_eq!(GDS_HEADER_LEN, 10);
    }

    #[test]
    fn no_duplicate_aid_bytes() {
        let mut bytes: Vec<u8> = AID_TABLE.iter().map(|(_, b)| *b).collect();
        bytes.sort_unstable();
        let before = bytes.len();
        bytes.dedup();
        assert_eq!(bytes.len(), before, "AID_TABLE has duplicate byte values");
    }

    #[test]
    fn no_duplicate_aid_names() {
        let mut names: Vec<&str> = AID_TABLE.iter().map(|(n, _)| *n).collect();
        names.sort_unstable();
        let before = names.len();
        names.dedup();
        assert_eq!(names.len(), before, "AID_TABLE has duplicate names");
    }
}
