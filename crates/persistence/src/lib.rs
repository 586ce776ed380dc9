#![deny(warnings)]

//! Persistence layer: JSON import/export of property documents.

use estate_core::PropertyDocument;
use estate_grid::{check_shape, GridError};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// File name offered for every export, independent of the property name.
pub const EXPORT_FILE_NAME: &str = "property.json";
pub const EXPORT_MIME_TYPE: &str = "application/json";

#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Not JSON, or JSON missing required fields.
    #[error("malformed document: {0}")]
    Malformed(String),
    /// The grid is not a rectangular footprint with at least one level per cell.
    #[error("malformed document: {0}")]
    Shape(#[from] GridError),
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for PersistenceError {
    fn from(e: std::io::Error) -> Self {
        PersistenceError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(e: serde_json::Error) -> Self {
        PersistenceError::Malformed(e.to_string())
    }
}

/// A serialized document ready to hand to a download.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Export {
    pub file_name: &'static str,
    pub mime_type: &'static str,
    pub body: String,
}

/// Compact JSON, as written for downloads.
pub fn serialize(document: &PropertyDocument) -> Result<String, PersistenceError> {
    Ok(serde_json::to_string(document)?)
}

pub fn serialize_pretty(document: &PropertyDocument) -> Result<String, PersistenceError> {
    Ok(serde_json::to_string_pretty(document)?)
}

/// Parse uploaded text and check the grid shape before anything else touches it.
pub fn parse_document(text: &str) -> Result<PropertyDocument, PersistenceError> {
    let document: PropertyDocument = serde_json::from_str(text)?;
    check_shape(&document.map_matrix)?;
    Ok(document)
}

pub fn export(document: &PropertyDocument) -> Result<Export, PersistenceError> {
    Ok(Export {
        file_name: EXPORT_FILE_NAME,
        mime_type: EXPORT_MIME_TYPE,
        body: serialize(document)?,
    })
}

/// Write a document to disk as pretty-printed JSON.
pub fn save<P: AsRef<Path>>(path: P, document: &PropertyDocument) -> Result<(), PersistenceError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serialize_pretty(document)?)?;
    info!(path = %path.display(), property = %document.property_name, "saved property");
    Ok(())
}

pub fn load<P: AsRef<Path>>(path: P) -> Result<PropertyDocument, PersistenceError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    let document = parse_document(&text)?;
    info!(path = %path.display(), property = %document.property_name, "loaded property");
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use estate_core::{construct_document, Catalog, GridSize, Selections, Tile};

    fn document() -> PropertyDocument {
        let catalog = Catalog::builtin().unwrap();
        let mut doc = construct_document(
            &catalog,
            &Selections {
                property_name: "Riverside Keep".into(),
                player_name: "Ada".into(),
                country: Some("Orde".into()),
                region: Some("Ordenholm".into()),
                traits: vec!["Riverside".into()],
                grid_size: GridSize::new(2, 3),
                tile_matrix: vec![],
            },
        );
        doc.map_matrix[1][2].push(Tile::new("Generic", "Ornate"));
        doc
    }

    #[test]
    fn export_uses_fixed_name_and_mime() {
        let e = export(&document()).unwrap();
        assert_eq!(e.file_name, "property.json");
        assert_eq!(e.mime_type, "application/json");
        assert!(!e.body.contains('\n'));
        assert!(e.body.contains(r#""propertyName":"Riverside Keep""#));
    }

    #[test]
    fn serialized_text_parses_back() {
        let doc = document();
        assert_eq!(parse_document(&serialize(&doc).unwrap()).unwrap(), doc);
        assert_eq!(parse_document(&serialize_pretty(&doc).unwrap()).unwrap(), doc);
    }

    #[test]
    fn accepts_hand_written_document() {
        let text = r#"{
            "propertyName": "Shack",
            "playerName": "Bo",
            "lastDateModified": "Ignored",
            "versionCreatedWith": "Ignored",
            "countryName": "",
            "regionName": "",
            "regionTraitsSelected": [],
            "mapMatrix": [[[{"name": "Empty", "trait": ""}]]]
        }"#;
        let doc = parse_document(text).unwrap();
        assert_eq!(doc.grid_size(), GridSize::new(1, 1));
        assert_eq!(doc.country(), None);
    }

    #[test]
    fn invalid_json_is_malformed() {
        assert!(matches!(
            parse_document("{ not json"),
            Err(PersistenceError::Malformed(_))
        ));
    }

    #[test]
    fn missing_field_is_malformed() {
        let err = parse_document(r#"{"propertyName": "x"}"#).unwrap_err();
        assert!(matches!(err, PersistenceError::Malformed(_)));
        assert!(err.to_string().contains("missing field"));
    }

    #[test]
    fn ragged_grid_is_rejected_upfront() {
        let mut doc = document();
        doc.map_matrix[0].pop();
        let text = serialize(&doc).unwrap();
        assert!(matches!(
            parse_document(&text),
            Err(PersistenceError::Shape(GridError::Ragged { .. }))
        ));
    }

    #[test]
    fn save_and_load_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("keep.json");
        let doc = document();
        save(&path, &doc).unwrap();
        assert_eq!(load(&path).unwrap(), doc);
    }

    #[test]
    fn loading_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load(dir.path().join("nope.json")),
            Err(PersistenceError::Io(_))
        ));
    }
}
