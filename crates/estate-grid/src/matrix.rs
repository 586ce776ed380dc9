//! Conversion between the persisted tile matrix and the in-memory block matrix.
//!
//! Both forms are indexed `[x][y][level]`. Conversion never reorders or drops
//! cells, so the per-cell level counts of the two forms always match.

use crate::{Block, GridError};
use estate_core::{Catalog, GridSize, TileMatrix};
use tracing::debug;

/// Address of one level of one cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellPos {
    pub x: usize,
    pub y: usize,
    pub level: usize,
}

impl CellPos {
    pub const fn new(x: usize, y: usize, level: usize) -> Self {
        Self { x, y, level }
    }
}

/// Blocks indexed `[x][y][level]`.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockMatrix<'c> {
    cells: Vec<Vec<Vec<Block<'c>>>>,
}

impl<'c> BlockMatrix<'c> {
    /// Resolve every tile of a persisted matrix.
    pub fn from_tiles(catalog: &'c Catalog, tiles: &TileMatrix) -> Result<Self, GridError> {
        let mut cells = Vec::with_capacity(tiles.len());
        for (x, column) in tiles.iter().enumerate() {
            let mut col = Vec::with_capacity(column.len());
            for (y, stack) in column.iter().enumerate() {
                let mut levels = Vec::with_capacity(stack.len());
                for (level, tile) in stack.iter().enumerate() {
                    let block = Block::from_tile(catalog, tile).map_err(|e| {
                        debug!(x, y, level, error = %e, "tile did not resolve");
                        e
                    })?;
                    levels.push(block);
                }
                col.push(levels);
            }
            cells.push(col);
        }
        Ok(Self { cells })
    }

    /// A grid with one default block per cell.
    pub fn filled(catalog: &'c Catalog, size: GridSize) -> Self {
        let block = Block::default_for(catalog);
        Self {
            cells: vec![vec![vec![block]; size.y]; size.x],
        }
    }

    pub fn to_tiles(&self) -> TileMatrix {
        self.cells
            .iter()
            .map(|column| {
                column
                    .iter()
                    .map(|stack| stack.iter().map(Block::to_tile).collect())
                    .collect()
            })
            .collect()
    }

    pub fn grid_size(&self) -> GridSize {
        GridSize {
            x: self.cells.len(),
            y: self.cells.first().map_or(0, Vec::len),
        }
    }

    /// Number of levels stacked at `(x, y)`, or `None` outside the footprint.
    pub fn depth(&self, x: usize, y: usize) -> Option<usize> {
        self.cells.get(x).and_then(|c| c.get(y)).map(Vec::len)
    }

    pub fn get(&self, pos: CellPos) -> Option<&Block<'c>> {
        self.cells.get(pos.x)?.get(pos.y)?.get(pos.level)
    }

    /// Every block, flattened in `[x][y][level]` order.
    pub fn blocks(&self) -> impl Iterator<Item = &Block<'c>> {
        self.cells.iter().flatten().flatten()
    }

    /// Total number of blocks across all levels.
    pub fn block_count(&self) -> usize {
        self.cells.iter().flatten().map(Vec::len).sum()
    }

    pub fn level_counts(&self) -> Vec<Vec<usize>> {
        self.cells
            .iter()
            .map(|column| column.iter().map(Vec::len).collect())
            .collect()
    }

    /// Copy of this matrix with one block replaced.
    ///
    /// A level equal to the current depth of the cell stacks a new level on top.
    pub fn with_block(&self, pos: CellPos, block: Block<'c>) -> Result<Self, GridError> {
        let out_of_bounds = GridError::OutOfBounds {
            x: pos.x,
            y: pos.y,
            level: pos.level,
        };
        let depth = self.depth(pos.x, pos.y).ok_or(out_of_bounds.clone())?;
        let mut next = self.clone();
        let stack = &mut next.cells[pos.x][pos.y];
        match pos.level {
            l if l < depth => stack[l] = block,
            l if l == depth => stack.push(block),
            _ => return Err(out_of_bounds),
        }
        Ok(next)
    }
}

/// Resolve a persisted matrix into blocks.
pub fn to_block_matrix<'c>(
    catalog: &'c Catalog,
    tiles: &TileMatrix,
) -> Result<BlockMatrix<'c>, GridError> {
    BlockMatrix::from_tiles(catalog, tiles)
}

/// Turn blocks back into their persisted form.
pub fn to_tile_matrix(blocks: &BlockMatrix<'_>) -> TileMatrix {
    blocks.to_tiles()
}

/// Level count of every `(x, y)` cell.
pub fn level_counts(tiles: &TileMatrix) -> Vec<Vec<usize>> {
    tiles
        .iter()
        .map(|column| column.iter().map(Vec::len).collect())
        .collect()
}

/// Check that the footprint is rectangular and no cell is without a level.
pub fn check_shape(tiles: &TileMatrix) -> Result<GridSize, GridError> {
    let expected = tiles.first().map_or(0, Vec::len);
    for (x, column) in tiles.iter().enumerate() {
        if column.len() != expected {
            return Err(GridError::Ragged {
                x,
                expected,
                found: column.len(),
            });
        }
        if let Some(y) = column.iter().position(Vec::is_empty) {
            return Err(GridError::EmptyCell { x, y });
        }
    }
    Ok(GridSize {
        x: tiles.len(),
        y: expected,
    })
}
