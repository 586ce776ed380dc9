#![deny(warnings)]

//! Editable block grid: blocks resolved against the catalog, and conversion
//! to and from the persisted tile matrix.

pub mod block;
pub mod matrix;

pub use block::{Block, BlockRequest};
pub use matrix::{check_shape, level_counts, to_block_matrix, to_tile_matrix, BlockMatrix, CellPos};

use estate_core::CatalogError;
use thiserror::Error;

/// Errors produced while building or editing block grids.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GridError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    /// An edit request named no tile source, or two of them.
    #[error("invalid block construction: {0}")]
    InvalidBlockConstruction(&'static str),
    #[error("quality {quality:?} is not allowed on tile {tile:?}")]
    QualityNotAllowed { tile: String, quality: String },
    #[error("cell ({x}, {y}) level {level} is outside the grid")]
    OutOfBounds { x: usize, y: usize, level: usize },
    /// Columns of the footprint differ in length.
    #[error("column {x} has {found} rows, expected {expected}")]
    Ragged {
        x: usize,
        expected: usize,
        found: usize,
    },
    #[error("cell ({x}, {y}) has no levels")]
    EmptyCell { x: usize, y: usize },
}
