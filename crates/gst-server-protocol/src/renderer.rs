//! Screen renderer: turns a catalog [`ScreenDefinition`] plus the current
//! data dictionary into a complete write-to-display wire record.

use std::collections::BTreeMap;

use gst_catalog::{CatalogFieldType, ScreenDefinition};
use gst_wire::{CC1_LOCK_KEYBOARD, OPCODE_OUTPUT_ONLY};

use crate::builder::RecordBuilder;

const ERROR_ROW: u16 = 24;
const ERROR_COL: u16 = 2;
const ERROR_WIDTH: u16 = 78;

fn is_hidden(attributes: &Option<serde_json::Value>) -> bool {
    attributes
        .as_ref()
        .and_then(|v| v.get("hidden"))
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false)
}

/// Render `screen` into a wire record, substituting current values from
/// `data` (falling back to each field's catalog default), and — if
/// `error_message` is set — painting it on row 24.
#[must_use]
pub fn render(screen: &ScreenDefinition, data: &BTreeMap<String, String>, error_message: Option<&str>) -> Vec<u8> {
    let mut builder = RecordBuilder::new().clear_unit().write_to_display(CC1_LOCK_KEYBOARD, 0x00);

    let mut static_text = screen.static_text.clone();
    static_text.sort_by_key(|s| (s.row, s.col));
    for text in &static_text {
        builder = builder.set_buffer_address(text.row, text.col).write_text(&text.text);
    }

    let mut fields = screen.fields.clone();
    fields.sort_by_key(|f| (f.row, f.col));

    let mut first_input: Option<(u16, u16)> = None;
    for field in &fields {
        let value = data
            .get(&field.name)
            .cloned()
            .or_else(|| field.default_value.clone())
            .unwrap_or_default();

        builder = builder.set_buffer_address(field.row, field.col);
        builder = match field.field_type {
            CatalogFieldType::Input if is_hidden(&field.attributes) => builder.start_hidden_field(),
            CatalogFieldType::Input => builder.start_input_field(),
            CatalogFieldType::Display => builder.start_protected_field(),
        };
        builder = builder.write_field_value(&value, field.length);

        if field.field_type == CatalogFieldType::Input && first_input.is_none() {
            first_input = Some((field.row, field.col));
        }
    }

    // Terminate the last field with a protected attribute one cell past
    // its data, so its derived length doesn't run off the end of the
    // screen on the receiving side.
    if let Some(last) = fields.last() {
        let term_col = last.col + 1 + last.length;
        if term_col <= gst_wire::SCREEN_COLS as u16 {
            builder = builder.set_buffer_address(last.row, term_col).start_protected_field();
        }
    }

    if let Some(message) = error_message {
        builder = builder
            .set_buffer_address(ERROR_ROW, ERROR_COL)
            .write_field_value(message, ERROR_WIDTH);
    }

    if let Some((row, data_col)) = first_input.map(|(r, c)| (r, c + 1)) {
        builder = builder.set_buffer_address(row, data_col).insert_cursor();
    } else {
        builder = builder.insert_cursor();
    }

    builder.build(OPCODE_OUTPUT_ONLY)
}
