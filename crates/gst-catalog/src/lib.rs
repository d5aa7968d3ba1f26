//! Screen catalog (C7) and screen identifier (C8).
//!
//! The catalog is loaded once, at startup, from either a directory of
//! single-screen JSON files or one file holding a JSON array of screens,
//! the way every config loader in this workspace reads its JSON/TOML
//! shape up front and treats the result as read-only for the remainder
//! of the process.

#![deny(unsafe_code)]

use gst_error::{ErrorCode, GstError};
use gst_screen::ScreenBuffer;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Anchor used to recognise a screen: the text expected at a fixed
/// position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenIdentifier {
    /// 1-based row of the anchor text.
    pub row: u16,
    /// 1-based column of the anchor text.
    pub col: u16,
    /// Expected text at that position.
    pub expected_text: String,
}

/// Whether a catalog field is meant to be read from (`Display`) or
/// written to (`Input`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogFieldType {
    /// Writable field, targeted by Navigate steps.
    Input,
    /// Read-only field, targeted by Scrape steps.
    Display,
}

/// One named field within a catalog screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogField {
    /// Canonical field name, unique within its screen.
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: CatalogFieldType,
    /// 1-based row of the field's attribute byte.
    pub row: u16,
    /// 1-based column of the field's attribute byte.
    pub col: u16,
    /// Data length in columns, following the attribute byte.
    pub length: u16,
    /// Free-form rendering attributes (e.g. `{"hidden": true}`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<serde_json::Value>,
    /// Default value written when a screen is first rendered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

/// Static (non-field) text rendered at a fixed position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticText {
    /// 1-based row.
    pub row: u16,
    /// 1-based column.
    pub col: u16,
    /// Literal text to render.
    pub text: String,
}

/// One catalog entry: a screen's identifying anchor, fields, and static
/// decoration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenDefinition {
    /// Screen identifier, unique across the catalog.
    #[serde(rename = "screen_id")]
    pub id: String,
    /// Anchor used to recognise this screen.
    pub identifier: ScreenIdentifier,
    /// Named fields on this screen.
    #[serde(default)]
    pub fields: Vec<CatalogField>,
    /// Static text decoration on this screen.
    #[serde(default)]
    pub static_text: Vec<StaticText>,
}

impl ScreenDefinition {
    /// Look up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&CatalogField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// An ordered collection of [`ScreenDefinition`]s.
///
/// Backed by a `Vec`, not a `HashMap`: catalog order is insertion order,
/// so "first matching entry" during identification is well-defined and
/// reproducible across runs.
#[derive(Debug, Clone, Default)]
pub struct ScreenCatalog {
    screens: Vec<ScreenDefinition>,
}

impl ScreenCatalog {
    /// Build a catalog from an already-parsed list of screens, rejecting
    /// duplicate `id`s.
    pub fn from_definitions(screens: Vec<ScreenDefinition>) -> Result<Self, GstError> {
        let mut seen = std::collections::HashSet::new();
        for screen in &screens {
            if !seen.insert(screen.id.clone()) {
                return Err(GstError::new(
                    ErrorCode::ConfigError,
                    format!("duplicate screen id in catalog: {}", screen.id),
                )
                .with_context("screen_id", screen.id.clone()));
            }
        }
        Ok(Self { screens })
    }

    /// Load a catalog from a single JSON file containing a top-level
    /// array of screen definitions.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, GstError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            GstError::new(ErrorCode::ConfigError, format!("failed to read catalog file: {}", path.display()))
                .with_source(e)
        })?;
        let screens: Vec<ScreenDefinition> = serde_json::from_str(&contents).map_err(|e| {
            GstError::new(ErrorCode::ConfigError, format!("failed to parse catalog file: {}", path.display()))
                .with_source(e)
        })?;
        tracing::debug!(path = %path.display(), count = screens.len(), "loaded screen catalog file");
        Self::from_definitions(screens)
    }

    /// Load a catalog from a directory of single-screen JSON files (one
    /// [`ScreenDefinition`] per `*.json` file).
    pub fn load_dir(path: impl AsRef<Path>) -> Result<Self, GstError> {
        let path = path.as_ref();
        let entries = std::fs::read_dir(path).map_err(|e| {
            GstError::new(ErrorCode::ConfigError, format!("failed to read catalog directory: {}", path.display()))
                .with_source(e)
        })?;

        let mut screens = Vec::new();
        let mut files: Vec<_> = entries
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        files.sort();

        for file in files {
            let contents = std::fs::read_to_string(&file).map_err(|e| {
                GstError::new(ErrorCode::ConfigError, format!("failed to read screen file: {}", file.display()))
                    .with_source(e)
            })?;
            let screen: ScreenDefinition = serde_json::from_str(&contents).map_err(|e| {
                GstError::new(ErrorCode::ConfigError, format!("failed to parse screen file: {}", file.display()))
                    .with_source(e)
            })?;
            screens.push(screen);
        }

        tracing::debug!(path = %path.display(), count = screens.len(), "loaded screen catalog directory");
        Self::from_definitions(screens)
    }

    /// Look up a screen by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ScreenDefinition> {
        self.screens.iter().find(|s| s.id == id)
    }

    /// All screens, in catalog order.
    #[must_use]
    pub fn screens(&self) -> &[ScreenDefinition] {
        &self.screens
    }

    /// Identify which catalog screen (if any) the buffer currently shows.
    ///
    /// A buffer matches screen `s` iff the text at `s.identifier`'s
    /// position, read for the length of `s.identifier.expected_text`,
    /// equals the expected text after case-folding and trailing-space
    /// trimming on both sides. Returns the first matching entry in
    /// catalog order.
    #[must_use]
    pub fn identify(&self, buffer: &ScreenBuffer) -> Option<&ScreenDefinition> {
        self.screens.iter().find(|s| self.matches(buffer, s))
    }

    fn matches(&self, buffer: &ScreenBuffer, screen: &ScreenDefinition) -> bool {
        let ident = &screen.identifier;
        let expected_len = ident.expected_text.len() as u16;
        let actual = buffer.read_text(ident.row, ident.col, expected_len);
        normalize(&actual) == normalize(&ident.expected_text)
    }

    /// Whether the buffer currently shows the screen with the given id.
    #[must_use]
    pub fn is_screen(&self, buffer: &ScreenBuffer, id: &str) -> bool {
        self.identify(buffer).is_some_and(|s| s.id == id)
    }
}

fn normalize(s: &str) -> String {
    s.trim_end().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign_on_screen() -> ScreenDefinition {
        ScreenDefinition {
            id: "SIGN_ON".into(),
            identifier: ScreenIdentifier {
                row: 1,
                col: 30,
                expected_text: "Sign On".into(),
            },
            fields: vec![
                CatalogField {
                    name: "user_id".into(),
                    field_type: CatalogFieldType::Input,
                    row: 6,
                    col: 20,
                    length: 10,
                    attributes: None,
                    default_value: None,
                },
                CatalogField {
                    name: "password".into(),
                    field_type: CatalogFieldType::Input,
                    row: 7,
                    col: 20,
                    length: 10,
                    attributes: None,
                    default_value: None,
                },
            ],
            static_text: vec![],
        }
    }

    fn menu_screen() -> ScreenDefinition {
        ScreenDefinition {
            id: "MAIN_MENU".into(),
            identifier: ScreenIdentifier {
                row: 1,
                col: 30,
                expected_text: "Main Menu".into(),
            },
            fields: vec![],
            static_text: vec![],
        }
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let err = ScreenCatalog::from_definitions(vec![sign_on_screen(), sign_on_screen()]).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigError);
    }

    #[test]
    fn unique_ids_load_successfully() {
        let catalog = ScreenCatalog::from_definitions(vec![sign_on_screen(), menu_screen()]).unwrap();
        assert_eq!(catalog.screens().len(), 2);
    }

    #[test]
    fn identifies_matching_screen() {
        let catalog = ScreenCatalog::from_definitions(vec![sign_on_screen()]).unwrap();
        let mut buf = ScreenBuffer::new();
        for (i, ch) in "Sign On".bytes().enumerate() {
            buf.set_char(1, 30 + i as u16, ch);
        }
        let found = catalog.identify(&buf).unwrap();
        assert_eq!(found.id, "SIGN_ON");
        assert!(catalog.is_screen(&buf, "SIGN_ON"));
    }

    #[test]
    fn all_space_buffer_identifies_nothing() {
        let catalog = ScreenCatalog::from_definitions(vec![sign_on_screen(), menu_screen()]).unwrap();
        let buf = ScreenBuffer::new();
        assert!(catalog.identify(&buf).is_none());
    }

    #[test]
    fn identification_is_case_insensitive_and_trims_trailing_space() {
        let catalog = ScreenCatalog::from_definitions(vec![sign_on_screen()]).unwrap();
        let mut buf = ScreenBuffer::new();
        for (i, ch) in "SIGN ON".bytes().enumerate() {
            buf.set_char(1, 30 + i as u16, ch);
        }
        assert!(catalog.identify(&buf).is_some());
    }

    #[test]
    fn first_matching_entry_wins_on_catalog_order() {
        // Both screens share an identifier position/text on purpose to
        // exercise "first match wins, not last".
        let mut duplicate_anchor = menu_screen();
        duplicate_anchor.id = "MAIN_MENU_ALIAS".into();
        let catalog = ScreenCatalog::from_definitions(vec![menu_screen(), duplicate_anchor]).unwrap();
        let mut buf = ScreenBuffer::new();
        for (i, ch) in "Main Menu".bytes().enumerate() {
            buf.set_char(1, 30 + i as u16, ch);
        }
        assert_eq!(catalog.identify(&buf).unwrap().id, "MAIN_MENU");
    }

    #[test]
    fn load_file_round_trips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        let screens = vec![sign_on_screen(), menu_screen()];
        std::fs::write(&path, serde_json::to_string(&screens).unwrap()).unwrap();
        let catalog = ScreenCatalog::load_file(&path).unwrap();
        assert_eq!(catalog.screens().len(), 2);
        assert!(catalog.get("SIGN_ON").is_some());
    }

    #[test]
    fn load_dir_reads_one_screen_per_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("sign_on.json"),
            serde_json::to_string(&sign_on_screen()).unwrap(),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("menu.json"),
            serde_json::to_string(&menu_screen()).unwrap(),
        )
        .unwrap();
        let catalog = ScreenCatalog::load_dir(dir.path()).unwrap();
        assert_eq!(catalog.screens().len(), 2);
    }

    #[test]
    fn field_lookup_by_name() {
        let screen = sign_on_screen();
        assert!(screen.field("user_id").is_some());
        assert!(screen.field("nonexistent").is_none());
    }
}
