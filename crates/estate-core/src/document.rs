//! The persisted property document and its tile grid.

use crate::catalog::Catalog;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Persisted form of a grid cell: tile kind display name plus optional quality name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    pub name: String,
    /// Quality name, `""` when the cell has none.
    #[serde(rename = "trait")]
    pub quality: String,
}

impl Tile {
    pub fn new(name: impl Into<String>, quality: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quality: quality.into(),
        }
    }

    /// A tile without a quality.
    pub fn plain(name: impl Into<String>) -> Self {
        Self::new(name, "")
    }

    pub fn quality_name(&self) -> Option<&str> {
        (!self.quality.is_empty()).then_some(self.quality.as_str())
    }
}

/// Tiles indexed `[x][y][level]`.
pub type TileMatrix = Vec<Vec<Vec<Tile>>>;

/// Footprint of a property in cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    pub x: usize,
    pub y: usize,
}

impl GridSize {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    pub fn is_empty(&self) -> bool {
        self.x == 0 || self.y == 0
    }
}

impl fmt::Display for GridSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.x, self.y)
    }
}

impl FromStr for GridSize {
    type Err = String;

    /// Parses `"<x>x<y>"`, e.g. `"10x15"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .trim()
            .split_once(|c: char| c == 'x' || c == 'X')
            .ok_or_else(|| format!("expected <x>x<y>, got {s:?}"))?;
        let x = x.trim().parse().map_err(|_| format!("bad width in {s:?}"))?;
        let y = y.trim().parse().map_err(|_| format!("bad height in {s:?}"))?;
        Ok(Self { x, y })
    }
}

/// Snapshot of a property as saved to and loaded from JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDocument {
    pub property_name: String,
    pub player_name: String,
    pub last_date_modified: String,
    pub version_created_with: String,
    /// `""` until a country is chosen.
    pub country_name: String,
    /// Subregion name, `""` until chosen.
    pub region_name: String,
    pub region_traits_selected: Vec<String>,
    pub map_matrix: TileMatrix,
}

impl PropertyDocument {
    pub fn country(&self) -> Option<&str> {
        (!self.country_name.is_empty()).then_some(self.country_name.as_str())
    }

    pub fn region(&self) -> Option<&str> {
        (!self.region_name.is_empty()).then_some(self.region_name.as_str())
    }

    /// Footprint taken from the outer two matrix dimensions.
    pub fn grid_size(&self) -> GridSize {
        GridSize {
            x: self.map_matrix.len(),
            y: self.map_matrix.first().map_or(0, Vec::len),
        }
    }

    /// Number of tiles across every cell and level.
    pub fn tile_count(&self) -> usize {
        self.map_matrix.iter().flatten().map(Vec::len).sum()
    }

    /// Copy of this document with a new grid and a fresh modification stamp.
    pub fn with_map_matrix(&self, map_matrix: TileMatrix) -> Self {
        Self {
            last_date_modified: timestamp(),
            map_matrix,
            ..self.clone()
        }
    }
}

/// Everything the wizard collects before a document is built.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Selections {
    pub property_name: String,
    pub player_name: String,
    pub country: Option<String>,
    pub region: Option<String>,
    pub traits: Vec<String>,
    pub grid_size: GridSize,
    /// Existing grid to keep; an empty matrix means "start fresh".
    pub tile_matrix: TileMatrix,
}

/// Current time in the format stored in `lastDateModified`.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// A grid with one level per cell, each holding the catalog's default tile.
pub fn empty_tile_matrix(catalog: &Catalog, size: GridSize) -> TileMatrix {
    let tile = Tile::plain(catalog.default_tile().display_name.clone());
    vec![vec![vec![tile]; size.y]; size.x]
}

/// Build a document from wizard selections, creating an empty grid when none exists yet.
pub fn construct_document(catalog: &Catalog, selections: &Selections) -> PropertyDocument {
    let map_matrix = if selections.tile_matrix.is_empty() {
        empty_tile_matrix(catalog, selections.grid_size)
    } else {
        selections.tile_matrix.clone()
    };
    PropertyDocument {
        property_name: selections.property_name.clone(),
        player_name: selections.player_name.clone(),
        last_date_modified: timestamp(),
        version_created_with: crate::VERSION.to_string(),
        country_name: selections.country.clone().unwrap_or_default(),
        region_name: selections.region.clone().unwrap_or_default(),
        region_traits_selected: selections.traits.clone(),
        map_matrix,
    }
}
