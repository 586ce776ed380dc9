#![deny(warnings)]

//! Pricing for a designed property.
//!
//! This module provides:
//! - Multiplier resolution from the selected subregion and traits
//! - Per-block build cost and TP value under an optional quality
//! - Whole-property totals, with rounding for presentation
//!
//! Multipliers start neutral at `1`, every selected trait is resolved in
//! selection order, and the subregion's base values are multiplied in last.

use estate_core::{resolve, Catalog, CatalogError, Multipliers, PropertyDocument, ReferenceKind};
use estate_grid::{to_block_matrix, Block, BlockMatrix, GridError};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Errors produced while pricing a property.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EconError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Multipliers and absolute costs for a whole property.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub multipliers: Multipliers,
    pub total_land_cost: f64,
    pub total_build_cost: f64,
    pub total_tp_value: f64,
}

/// Totals as shown to the player: whole numbers, multipliers in percent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundedTotals {
    pub danger_level: i64,
    pub land_cost_pct: i64,
    pub build_cost_pct: i64,
    pub tp_value_pct: i64,
    pub total_land_cost: i64,
    pub total_build_cost: i64,
    pub total_tp_value: i64,
}

fn round(v: f64) -> i64 {
    v.round() as i64
}

impl Totals {
    pub fn rounded(&self) -> RoundedTotals {
        let m = &self.multipliers;
        RoundedTotals {
            danger_level: round(m.danger_level),
            land_cost_pct: round(m.land_cost * 100.0),
            build_cost_pct: round(m.build_cost * 100.0),
            tp_value_pct: round(m.tp_value * 100.0),
            total_land_cost: round(self.total_land_cost),
            total_build_cost: round(self.total_build_cost),
            total_tp_value: round(self.total_tp_value),
        }
    }
}

impl fmt::Display for Totals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.rounded();
        writeln!(
            f,
            "Total: Land Cost {} gp | Build Cost {} gp | TP Value {} tp",
            r.total_land_cost, r.total_build_cost, r.total_tp_value
        )?;
        write!(
            f,
            "Multipliers: Danger Level {} | Land Cost {}% | Build Cost {}% | TP Value {}%",
            r.danger_level, r.land_cost_pct, r.build_cost_pct, r.tp_value_pct
        )
    }
}

/// Base values of the selected subregion, or neutral when nothing is selected yet.
///
/// A named country must exist even when no subregion is chosen; a subregion
/// cannot be resolved without its country.
pub fn base_multipliers(
    catalog: &Catalog,
    country: Option<&str>,
    region: Option<&str>,
) -> Result<Multipliers, EconError> {
    match (country, region) {
        (Some(c), Some(r)) => Ok(catalog.subregion(c, r)?.base()),
        (Some(c), None) => {
            catalog.country(c)?;
            Ok(Multipliers::NEUTRAL)
        }
        (None, Some(r)) => Err(CatalogError::not_found(ReferenceKind::Subregion, r).into()),
        (None, None) => Ok(Multipliers::NEUTRAL),
    }
}

/// Final danger level and land/build/TP multipliers.
///
/// Once a subregion is chosen every selected trait must be one it offers.
pub fn resolve_multipliers<S: AsRef<str>>(
    catalog: &Catalog,
    country: Option<&str>,
    region: Option<&str>,
    traits: &[S],
) -> Result<Multipliers, EconError> {
    let selected = catalog.check_trait_selection(traits)?;
    if let (Some(c), Some(r)) = (country, region) {
        catalog.check_offered(catalog.subregion(c, r)?, &selected)?;
    }
    let adjusted = selected
        .iter()
        .fold(Multipliers::NEUTRAL, |m, t| m.modified_by(&t.modifiers));
    Ok(adjusted * base_multipliers(catalog, country, region)?)
}

/// Gold cost of one block: the tile's base cost under its quality's build modifier.
pub fn block_build_cost(block: &Block<'_>) -> f64 {
    resolve(block.tile_kind().base_gold_cost, &block.build_modifier())
}

/// TP value of one block: the tile's base TP under its quality's TP modifier.
pub fn block_tp_value(block: &Block<'_>) -> f64 {
    resolve(block.tile_kind().base_tp_cost, &block.tp_modifier())
}

/// Land cost counts every level of every cell.
pub fn land_cost(tile_count: usize, base_per_tile: f64, land_multiplier: f64) -> f64 {
    tile_count as f64 * base_per_tile * land_multiplier
}

/// Totals for an in-memory grid under already-resolved multipliers.
pub fn aggregate_blocks(
    catalog: &Catalog,
    blocks: &BlockMatrix<'_>,
    multipliers: Multipliers,
) -> Totals {
    let (build, tp) = blocks.blocks().fold((0.0, 0.0), |(b, t), block| {
        (b + block_build_cost(block), t + block_tp_value(block))
    });
    Totals {
        multipliers,
        total_land_cost: land_cost(
            blocks.block_count(),
            catalog.base_land_cost_per_tile(),
            multipliers.land_cost,
        ),
        total_build_cost: build,
        total_tp_value: tp,
    }
}

/// Price a property document against the catalog.
pub fn aggregate(catalog: &Catalog, document: &PropertyDocument) -> Result<Totals, EconError> {
    let multipliers = resolve_multipliers(
        catalog,
        document.country(),
        document.region(),
        &document.region_traits_selected,
    )?;
    let blocks = to_block_matrix(catalog, &document.map_matrix)?;
    let totals = aggregate_blocks(catalog, &blocks, multipliers);
    debug!(
        tiles = blocks.block_count(),
        land = totals.total_land_cost,
        build = totals.total_build_cost,
        tp = totals.total_tp_value,
        "aggregated property"
    );
    Ok(totals)
}
