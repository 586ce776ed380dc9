use crate::GridError;
use estate_core::{Catalog, Quality, Tile, TileKind, ValueModifier};

/// One editable grid cell level: a tile kind plus an optional quality.
///
/// Blocks borrow their catalog entries, so a block can only outlive the catalog
/// it was resolved against if it is first turned back into a [`Tile`].
#[derive(Clone, Copy, Debug)]
pub struct Block<'c> {
    kind: &'c TileKind,
    quality: Option<&'c Quality>,
}

/// Edit request for a single cell: either a persisted tile or a tile kind name
/// with an optional quality name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BlockRequest {
    pub tile: Option<Tile>,
    pub kind: Option<String>,
    pub quality: Option<String>,
}

impl BlockRequest {
    pub fn from_tile(tile: Tile) -> Self {
        Self {
            tile: Some(tile),
            ..Self::default()
        }
    }

    pub fn kind(kind: impl Into<String>, quality: Option<String>) -> Self {
        Self {
            tile: None,
            kind: Some(kind.into()),
            quality,
        }
    }
}

fn resolve_quality<'c>(
    catalog: &'c Catalog,
    kind: &'c TileKind,
    name: Option<&str>,
) -> Result<Option<&'c Quality>, GridError> {
    let Some(name) = name.filter(|n| !n.is_empty()) else {
        return Ok(None);
    };
    let quality = catalog.quality(name)?;
    if !kind.allows(name) {
        return Err(GridError::QualityNotAllowed {
            tile: kind.display_name.clone(),
            quality: name.to_string(),
        });
    }
    Ok(Some(quality))
}

impl<'c> Block<'c> {
    /// Resolve a persisted tile against the catalog.
    pub fn from_tile(catalog: &'c Catalog, tile: &Tile) -> Result<Self, GridError> {
        let kind = catalog.tile_kind(&tile.name)?;
        let quality = resolve_quality(catalog, kind, tile.quality_name())?;
        Ok(Self { kind, quality })
    }

    /// Build from a tile kind picked in the editor; an empty quality name means none.
    pub fn from_selection(
        catalog: &'c Catalog,
        kind: &'c TileKind,
        quality: Option<&str>,
    ) -> Result<Self, GridError> {
        let quality = resolve_quality(catalog, kind, quality)?;
        Ok(Self { kind, quality })
    }

    /// Build from an edit request that must name exactly one tile source.
    pub fn from_request(catalog: &'c Catalog, request: &BlockRequest) -> Result<Self, GridError> {
        match (&request.tile, &request.kind) {
            (Some(tile), None) => {
                if request.quality.is_some() {
                    return Err(GridError::InvalidBlockConstruction(
                        "a persisted tile carries its own quality",
                    ));
                }
                Self::from_tile(catalog, tile)
            }
            (None, Some(kind)) => {
                let kind = catalog.tile_kind(kind)?;
                Self::from_selection(catalog, kind, request.quality.as_deref())
            }
            (None, None) => Err(GridError::InvalidBlockConstruction(
                "need either a persisted tile or a tile kind",
            )),
            (Some(_), Some(_)) => Err(GridError::InvalidBlockConstruction(
                "got both a persisted tile and a tile kind",
            )),
        }
    }

    /// The catalog's default tile with no quality.
    pub fn default_for(catalog: &'c Catalog) -> Self {
        Self {
            kind: catalog.default_tile(),
            quality: None,
        }
    }

    pub fn tile_kind(&self) -> &'c TileKind {
        self.kind
    }

    pub fn quality(&self) -> Option<&'c Quality> {
        self.quality
    }

    /// Modifier applied to the tile's base gold cost.
    pub fn build_modifier(&self) -> ValueModifier {
        self.quality.map_or(ValueModifier::NEUTRAL, |q| q.build_cost)
    }

    /// Modifier applied to the tile's base TP cost.
    pub fn tp_modifier(&self) -> ValueModifier {
        self.quality.map_or(ValueModifier::NEUTRAL, |q| q.tp_value)
    }

    pub fn to_tile(&self) -> Tile {
        Tile::new(
            self.kind.display_name.clone(),
            self.quality.map(|q| q.name.clone()).unwrap_or_default(),
        )
    }
}

impl PartialEq for Block<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.kind.display_name == other.kind.display_name
            && self.quality.map(|q| &q.name) == other.quality.map(|q| &q.name)
    }
}
