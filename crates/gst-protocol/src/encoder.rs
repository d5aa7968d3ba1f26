//! Client input encoder: turns an AID key, the cursor position, and the
//! set of fields the user modified into a fully framed wire record.

use gst_error::{ErrorCode, GstError};
use gst_wire::{ORDER_SBA, SCREEN_COLS, SCREEN_ROWS};

use crate::framing;

/// Decode a client input record — the inverse of [`encode`] — recovering
/// the AID key, cursor position, and the modified fields the client
/// sent.
///
/// `raw_escaped` is the `IAC`-doubled payload up to (but not including)
/// the `IAC EOR` terminator, matching [`crate::parser::parse_record`]'s
/// input convention.
pub fn decode(raw_escaped: &[u8]) -> Result<(u8, u16, u16, Vec<ModifiedField>), GstError> {
    let unescaped = framing::unescape(raw_escaped)?;
    let (_header, body) = framing::parse_header(&unescaped)?;
    if body.len() < 3 {
        return Err(GstError::new(
            ErrorCode::UnexpectedError,
            "truncated input record: expected cursor row, col, and AID",
        ));
    }
    let cursor_row = body[0] as u16;
    let cursor_col = body[1] as u16;
    let aid = body[2];

    let mut fields = Vec::new();
    let mut pos = 3;
    while pos < body.len() {
        if body[pos] != ORDER_SBA {
            return Err(GstError::new(
                ErrorCode::UnexpectedError,
                format!("expected SBA order in input record, found 0x{:02X}", body[pos]),
            ));
        }
        let row = *body
            .get(pos + 1)
            .ok_or_else(|| GstError::new(ErrorCode::UnexpectedError, "truncated SBA row in input record"))?
            as u16;
        let col = *body
            .get(pos + 2)
            .ok_or_else(|| GstError::new(ErrorCode::UnexpectedError, "truncated SBA col in input record"))?
            as u16;
        pos += 3;
        let start = pos;
        while pos < body.len() && body[pos] != ORDER_SBA {
            pos += 1;
        }
        let value = gst_codec::decode_bytes(&body[start..pos]);
        fields.push(ModifiedField { row, col, value });
    }

    Ok((aid, cursor_row, cursor_col, fields))
}

/// One modified input field: its attribute position and the new value
/// typed into it.
#[derive(Debug, Clone)]
pub struct ModifiedField {
    /// 1-based row of the field's attribute byte.
    pub row: u16,
    /// 1-based column of the field's attribute byte.
    pub col: u16,
    /// The value as typed, already sized to the field's width.
    pub value: String,
}

fn check_position(row: u16, col: u16, what: &str) -> Result<(), GstError> {
    if (1..=SCREEN_ROWS as u16).contains(&row) && (1..=SCREEN_COLS as u16).contains(&col) {
        Ok(())
    } else {
        Err(GstError::new(
            ErrorCode::UnexpectedError,
            format!("{what} position ({row}, {col}) is outside the 24x80 grid"),
        ))
    }
}

/// Build an `IAC EOR`-terminated, `0xFF`-doubled input record carrying
/// `aid`, the cursor position, and the modified fields, in that order.
pub fn encode(
    aid: u8,
    cursor_row: u16,
    cursor_col: u16,
    modified_fields: &[ModifiedField],
) -> Result<Vec<u8>, GstError> {
    check_position(cursor_row, cursor_col, "cursor")?;
    for field in modified_fields {
        check_position(field.row, field.col, "field")?;
    }

    let mut body = vec![cursor_row as u8, cursor_col as u8, aid];
    for field in modified_fields {
        body.push(ORDER_SBA);
        body.push(field.row as u8);
        body.push(field.col as u8);
        body.extend(gst_codec::encode_str(&field.value));
    }

    let header = framing::build_header(body.len(), gst_wire::OPCODE_PUT_GET);
    let mut record = header.to_vec();
    record.extend(body);

    let escaped = framing::escape(&record);
    let mut framed = escaped;
    framed.push(gst_wire::IAC);
    framed.push(gst_wire::EOR);
    Ok(framed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gst_wire::{AID_ENTER, EOR, IAC};

    #[test]
    fn encode_terminates_with_iac_eor() {
        let record = encode(AID_ENTER, 1, 1, &[]).unwrap();
        assert_eq!(&record[record.len() - 2..], &[IAC, EOR]);
    }

    #[test]
    fn encode_rejects_out_of_range_cursor() {
        assert!(encode(AID_ENTER, 25, 1, &[]).is_err());
        assert!(encode(AID_ENTER, 1, 81, &[]).is_err());
        assert!(encode(AID_ENTER, 0, 1, &[]).is_err());
    }

    #[test]
    fn encode_rejects_out_of_range_field_position() {
        let fields = vec![ModifiedField {
            row: 99,
            col: 1,
            value: "x".into(),
        }];
        assert!(encode(AID_ENTER, 1, 1, &fields).is_err());
    }

    #[test]
    fn encode_doubles_ff_bytes_from_header_or_body() {
        // Force a body byte of exactly 0xFF by using row/col values that
        // land on it is not representable (rows/cols are 1..=24/1..=80),
        // so instead verify doubling via a value whose EBCDIC translation
        // happens to be 0xFF-free is still escaped correctly end to end:
        // the GDS length byte can coincidentally be 0xFF for a
        // sufficiently large body.
        let long_value = "A".repeat(250);
        let fields = vec![ModifiedField {
            row: 1,
            col: 1,
            value: long_value,
        }];
        let record = encode(AID_ENTER, 1, 1, &fields).unwrap();
        // terminator must still be the real IAC EOR pair, not a doubled
        // IAC from the body being misparsed.
        assert_eq!(&record[record.len() - 2..], &[IAC, EOR]);
    }

    #[test]
    fn decode_recovers_what_encode_sent() {
        let fields = vec![
            ModifiedField { row: 6, col: 20, value: "jsmith".into() },
            ModifiedField { row: 7, col: 20, value: "secret".into() },
        ];
        let record = encode(AID_ENTER, 8, 2, &fields).unwrap();
        let (aid, row, col, decoded) = decode(&record[..record.len() - 2]).unwrap();
        assert_eq!(aid, AID_ENTER);
        assert_eq!((row, col), (8, 2));
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].row, 6);
        assert_eq!(decoded[0].value, "jsmith");
        assert_eq!(decoded[1].value, "secret");
    }

    #[test]
    fn encode_body_layout_has_cursor_then_aid_then_fields() {
        let fields = vec![ModifiedField {
            row: 2,
            col: 3,
            value: "hi".into(),
        }];
        let record = encode(AID_ENTER, 5, 6, &fields).unwrap();
        let unescaped = framing::unescape(&record[..record.len() - 2]).unwrap();
        let (_, body) = framing::parse_header(&unescaped).unwrap();
        assert_eq!(body[0], 5);
        assert_eq!(body[1], 6);
        assert_eq!(body[2], AID_ENTER);
        assert_eq!(body[3], ORDER_SBA);
        assert_eq!(body[4], 2);
        assert_eq!(body[5], 3);
    }
}
