#![deny(warnings)]

//! Core domain models for the property designer.
//!
//! This crate defines the value-modifier resolver, the read-only reference
//! catalog, and the serializable property document shared by every other crate.

pub mod catalog;
pub mod document;
pub mod error;
pub mod modifier;

pub use catalog::{
    Catalog, CatalogConsts, CatalogData, Country, Quality, Region, Subregion, TileCategory,
    TileKind, Trait,
};
pub use document::{
    construct_document, empty_tile_matrix, timestamp, GridSize, PropertyDocument, Selections,
    Tile, TileMatrix,
};
pub use error::{CatalogError, ReferenceKind};
pub use modifier::{resolve, ModifierKind, ModifierSet, Multipliers, ValueModifier};

/// Version stamped into `versionCreatedWith`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
