//! Static reference data: countries, subregions, traits, tile kinds and qualities.
//!
//! The catalog is parsed from YAML once, cross-checked, and then only read.
//! Every lookup goes through a name index built at construction time.

use crate::document::GridSize;
use crate::error::{CatalogError, ReferenceKind};
use crate::modifier::{ModifierSet, Multipliers, ValueModifier};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

const BUILTIN_CATALOG: &str = include_str!("../../../assets/catalog.yaml");

/// A selectable area inside a region, carrying base multiplier values.
#[derive(Clone, Debug, Deserialize)]
pub struct Subregion {
    pub name: String,
    pub danger_level: f64,
    pub land_cost: f64,
    pub build_cost: f64,
    pub tp_value: f64,
    /// Traits that may be selected for this subregion.
    #[serde(default)]
    pub traits: Vec<String>,
}

impl Subregion {
    /// Base values as a multiplier set.
    pub fn base(&self) -> Multipliers {
        Multipliers {
            danger_level: self.danger_level,
            land_cost: self.land_cost,
            build_cost: self.build_cost,
            tp_value: self.tp_value,
        }
    }

    pub fn offers(&self, trait_name: &str) -> bool {
        self.traits.iter().any(|t| t == trait_name)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct Region {
    pub name: String,
    pub subregions: Vec<Subregion>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Country {
    pub name: String,
    #[serde(default)]
    pub image_name: String,
    pub regions: Vec<Region>,
}

impl Country {
    /// All subregions across every region, in catalog order.
    pub fn subregions(&self) -> impl Iterator<Item = &Subregion> {
        self.regions.iter().flat_map(|r| r.subregions.iter())
    }
}

/// A region-level modifier the player can opt into.
#[derive(Clone, Debug, Deserialize)]
pub struct Trait {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub modifiers: ModifierSet,
    /// Traits that may not be selected together with this one.
    #[serde(default)]
    pub exclusive_with: Vec<String>,
}

impl Trait {
    pub fn excludes(&self, other: &str) -> bool {
        self.exclusive_with.iter().any(|t| t == other)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TileCategory {
    #[default]
    Indoor,
    Outdoor,
    Special,
}

/// A kind of grid cell with base costs.
#[derive(Clone, Debug, Deserialize)]
pub struct TileKind {
    /// Short slug, e.g. "very-expensive".
    pub tile_type: String,
    /// Name persisted in documents.
    pub display_name: String,
    pub color: String,
    pub base_gold_cost: f64,
    pub base_tp_cost: f64,
    #[serde(default)]
    pub possible_qualities: Vec<String>,
    /// Assigned from the list the entry was declared in.
    #[serde(skip)]
    pub category: TileCategory,
}

impl TileKind {
    pub fn allows(&self, quality: &str) -> bool {
        self.possible_qualities.iter().any(|q| q == quality)
    }
}

/// An optional finish on a tile that adjusts its build cost and TP value.
#[derive(Clone, Debug, Deserialize)]
pub struct Quality {
    pub name: String,
    #[serde(default)]
    pub build_cost: ValueModifier,
    #[serde(default)]
    pub tp_value: ValueModifier,
    #[serde(default)]
    pub icon: String,
}

/// Pricing constants and wizard options.
#[derive(Clone, Debug, Deserialize)]
pub struct CatalogConsts {
    /// Land price of a single cell at multiplier 1.
    pub base_land_cost_per_tile: f64,
    /// Tile kind used to fill new grids.
    #[serde(default = "default_tile_name")]
    pub default_tile: String,
    /// Grid sizes offered when starting a new property.
    #[serde(default)]
    pub grid_sizes: Vec<GridSize>,
}

fn default_tile_name() -> String {
    "Empty".to_string()
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TileLists {
    #[serde(default)]
    pub indoor: Vec<TileKind>,
    #[serde(default)]
    pub outdoor: Vec<TileKind>,
    #[serde(default)]
    pub special: Vec<TileKind>,
}

/// Raw catalog as it appears on disk, before cross-checking.
#[derive(Clone, Debug, Deserialize)]
pub struct CatalogData {
    pub consts: CatalogConsts,
    #[serde(default)]
    pub countries: Vec<Country>,
    #[serde(default)]
    pub traits: Vec<Trait>,
    #[serde(default)]
    pub tiles: TileLists,
    #[serde(default)]
    pub qualities: Vec<Quality>,
}

/// Validated, read-only reference catalog.
#[derive(Clone, Debug)]
pub struct Catalog {
    consts: CatalogConsts,
    countries: Vec<Country>,
    traits: Vec<Trait>,
    tiles: Vec<TileKind>,
    qualities: Vec<Quality>,
    country_index: BTreeMap<String, usize>,
    // country name -> subregion name -> (region, subregion)
    subregion_index: BTreeMap<String, BTreeMap<String, (usize, usize)>>,
    trait_index: BTreeMap<String, usize>,
    tile_index: BTreeMap<String, usize>,
    quality_index: BTreeMap<String, usize>,
    default_tile: usize,
}

fn index_by<T>(
    items: &[T],
    kind: ReferenceKind,
    name: impl Fn(&T) -> &str,
) -> Result<BTreeMap<String, usize>, CatalogError> {
    let mut index = BTreeMap::new();
    for (i, item) in items.iter().enumerate() {
        let n = name(item);
        if index.insert(n.to_string(), i).is_some() {
            return Err(CatalogError::Duplicate {
                kind,
                name: n.to_string(),
            });
        }
    }
    Ok(index)
}

fn check_refs(
    owner: &str,
    names: &[String],
    kind: ReferenceKind,
    index: &BTreeMap<String, usize>,
) -> Result<(), CatalogError> {
    match names.iter().find(|n| !index.contains_key(n.as_str())) {
        Some(missing) => Err(CatalogError::DanglingReference {
            owner: owner.to_string(),
            kind,
            name: missing.clone(),
        }),
        None => Ok(()),
    }
}

fn check_finite(owner: &str, what: &str, values: &[f64]) -> Result<(), CatalogError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(CatalogError::InvalidConst(format!(
            "{owner:?} has a non-finite {what}"
        )))
    }
}

impl Catalog {
    /// Build a catalog, rejecting duplicate names and dangling references.
    pub fn from_data(data: CatalogData) -> Result<Self, CatalogError> {
        let CatalogData {
            consts,
            countries,
            traits,
            tiles,
            qualities,
        } = data;

        let land = consts.base_land_cost_per_tile;
        if !land.is_finite() || land < 0.0 {
            return Err(CatalogError::InvalidConst(format!(
                "base_land_cost_per_tile must be finite and >= 0, got {land}"
            )));
        }
        if let Some(g) = consts.grid_sizes.iter().find(|g| g.is_empty()) {
            return Err(CatalogError::InvalidConst(format!(
                "grid size {g} has a zero dimension"
            )));
        }

        let mut all_tiles = Vec::new();
        for (category, list) in [
            (TileCategory::Indoor, tiles.indoor),
            (TileCategory::Outdoor, tiles.outdoor),
            (TileCategory::Special, tiles.special),
        ] {
            all_tiles.extend(list.into_iter().map(|mut t| {
                t.category = category;
                t
            }));
        }

        let country_index = index_by(&countries, ReferenceKind::Country, |c| c.name.as_str())?;
        let trait_index = index_by(&traits, ReferenceKind::Trait, |t| t.name.as_str())?;
        let tile_index = index_by(&all_tiles, ReferenceKind::TileKind, |t| {
            t.display_name.as_str()
        })?;
        let quality_index = index_by(&qualities, ReferenceKind::Quality, |q| q.name.as_str())?;

        let mut subregion_index = BTreeMap::new();
        for country in &countries {
            let mut subs = BTreeMap::new();
            for (ri, region) in country.regions.iter().enumerate() {
                for (si, sub) in region.subregions.iter().enumerate() {
                    let base = sub.base();
                    check_finite(
                        &sub.name,
                        "base value",
                        &[base.danger_level, base.land_cost, base.build_cost, base.tp_value],
                    )?;
                    check_refs(&sub.name, &sub.traits, ReferenceKind::Trait, &trait_index)?;
                    if subs.insert(sub.name.clone(), (ri, si)).is_some() {
                        return Err(CatalogError::Duplicate {
                            kind: ReferenceKind::Subregion,
                            name: sub.name.clone(),
                        });
                    }
                }
            }
            subregion_index.insert(country.name.clone(), subs);
        }
        for t in &traits {
            let m = &t.modifiers;
            check_finite(
                &t.name,
                "modifier amount",
                &[
                    m.danger_level.amount,
                    m.land_cost.amount,
                    m.build_cost.amount,
                    m.tp_value.amount,
                ],
            )?;
            check_refs(&t.name, &t.exclusive_with, ReferenceKind::Trait, &trait_index)?;
        }
        for q in &qualities {
            check_finite(
                &q.name,
                "modifier amount",
                &[q.build_cost.amount, q.tp_value.amount],
            )?;
        }
        for t in &all_tiles {
            check_finite(
                &t.display_name,
                "base cost",
                &[t.base_gold_cost, t.base_tp_cost],
            )?;
            check_refs(
                &t.display_name,
                &t.possible_qualities,
                ReferenceKind::Quality,
                &quality_index,
            )?;
        }

        let default_tile = *tile_index.get(&consts.default_tile).ok_or_else(|| {
            CatalogError::DanglingReference {
                owner: "default_tile".to_string(),
                kind: ReferenceKind::TileKind,
                name: consts.default_tile.clone(),
            }
        })?;

        debug!(
            countries = countries.len(),
            traits = traits.len(),
            tiles = all_tiles.len(),
            qualities = qualities.len(),
            "catalog built"
        );

        Ok(Self {
            consts,
            countries,
            traits,
            tiles: all_tiles,
            qualities,
            country_index,
            subregion_index,
            trait_index,
            tile_index,
            quality_index,
            default_tile,
        })
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, CatalogError> {
        let data: CatalogData = serde_yaml::from_str(text)?;
        Self::from_data(data)
    }

    /// Load a catalog from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// The catalog shipped in `assets/catalog.yaml`.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_yaml_str(BUILTIN_CATALOG)
    }

    pub fn consts(&self) -> &CatalogConsts {
        &self.consts
    }

    pub fn base_land_cost_per_tile(&self) -> f64 {
        self.consts.base_land_cost_per_tile
    }

    pub fn grid_sizes(&self) -> &[GridSize] {
        &self.consts.grid_sizes
    }

    /// Tile kind used to fill empty grids.
    pub fn default_tile(&self) -> &TileKind {
        &self.tiles[self.default_tile]
    }

    pub fn countries(&self) -> &[Country] {
        &self.countries
    }

    pub fn traits(&self) -> &[Trait] {
        &self.traits
    }

    pub fn tile_kinds(&self) -> &[TileKind] {
        &self.tiles
    }

    pub fn tile_kinds_in(&self, category: TileCategory) -> impl Iterator<Item = &TileKind> {
        self.tiles.iter().filter(move |t| t.category == category)
    }

    pub fn qualities(&self) -> &[Quality] {
        &self.qualities
    }

    pub fn country(&self, name: &str) -> Result<&Country, CatalogError> {
        self.country_index
            .get(name)
            .map(|&i| &self.countries[i])
            .ok_or_else(|| CatalogError::not_found(ReferenceKind::Country, name))
    }

    /// Find a subregion of `country` by name, across all of its regions.
    pub fn subregion(&self, country: &str, name: &str) -> Result<&Subregion, CatalogError> {
        let c = self.country(country)?;
        self.subregion_index
            .get(country)
            .and_then(|subs| subs.get(name))
            .map(|&(ri, si)| &c.regions[ri].subregions[si])
            .ok_or_else(|| CatalogError::not_found(ReferenceKind::Subregion, name))
    }

    pub fn trait_named(&self, name: &str) -> Result<&Trait, CatalogError> {
        self.trait_index
            .get(name)
            .map(|&i| &self.traits[i])
            .ok_or_else(|| CatalogError::not_found(ReferenceKind::Trait, name))
    }

    pub fn tile_kind(&self, display_name: &str) -> Result<&TileKind, CatalogError> {
        self.tile_index
            .get(display_name)
            .map(|&i| &self.tiles[i])
            .ok_or_else(|| CatalogError::not_found(ReferenceKind::TileKind, display_name))
    }

    pub fn quality(&self, name: &str) -> Result<&Quality, CatalogError> {
        self.quality_index
            .get(name)
            .map(|&i| &self.qualities[i])
            .ok_or_else(|| CatalogError::not_found(ReferenceKind::Quality, name))
    }

    /// Resolve a trait selection in order, rejecting repeats and mutually exclusive pairs.
    ///
    /// Exclusion is symmetric: it is enough for either trait to list the other.
    pub fn check_trait_selection<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<Vec<&Trait>, CatalogError> {
        let selected = names
            .iter()
            .map(|n| self.trait_named(n.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        for (i, a) in selected.iter().enumerate() {
            for b in &selected[i + 1..] {
                if a.name == b.name {
                    return Err(CatalogError::RepeatedSelection {
                        kind: ReferenceKind::Trait,
                        name: a.name.clone(),
                    });
                }
                if a.excludes(&b.name) || b.excludes(&a.name) {
                    return Err(CatalogError::ExclusiveTraits {
                        first: a.name.clone(),
                        second: b.name.clone(),
                    });
                }
            }
        }
        Ok(selected)
    }

    /// Reject the first selected trait the subregion does not offer.
    pub fn check_offered(
        &self,
        subregion: &Subregion,
        selected: &[&Trait],
    ) -> Result<(), CatalogError> {
        match selected.iter().find(|t| !subregion.offers(&t.name)) {
            Some(t) => Err(CatalogError::NotOffered {
                trait_name: t.name.clone(),
                subregion: subregion.name.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Traits a subregion offers, in the subregion's order.
    pub fn traits_for(&self, subregion: &Subregion) -> Vec<&Trait> {
        subregion
            .traits
            .iter()
            .filter_map(|n| self.trait_named(n).ok())
            .collect()
    }

    /// Qualities allowed on a tile kind, in the tile kind's order.
    pub fn qualities_for(&self, tile: &TileKind) -> Vec<&Quality> {
        tile.possible_qualities
            .iter()
            .filter_map(|n| self.quality(n).ok())
            .collect()
    }
}
