//! Field extractor: maps a decoded client input record back onto catalog
//! field names.

use std::collections::BTreeMap;

use gst_catalog::{CatalogFieldType, ScreenDefinition};
use gst_protocol::ModifiedField;

/// Match each modified field in `input` against `screen`'s catalog input
/// fields by attribute position, accepting either the attribute column
/// itself or the first data column (attribute column + 1) — clients are
/// not required to agree on which one they echo back. Fields with no
/// matching catalog entry are dropped.
#[must_use]
pub fn extract(screen: &ScreenDefinition, input: &[ModifiedField]) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    for field in &screen.fields {
        if field.field_type != CatalogFieldType::Input {
            continue;
        }
        if let Some(modified) = input
            .iter()
            .find(|m| m.row == field.row && (m.col == field.col || m.col == field.col + 1))
        {
            out.insert(field.name.clone(), modified.value.trim_end().to_string());
        }
    }
    out
}
