#![deny(warnings)]

//! Headless editing session: the wizard stages from country selection to the
//! grid editor, holding the current document and swapping it on every change.

use estate_core::{
    construct_document, Catalog, CatalogError, GridSize, PropertyDocument, Selections, Subregion,
    Trait,
};
use estate_econ::{aggregate, EconError, Totals};
use estate_grid::{
    to_block_matrix, to_tile_matrix, Block, BlockMatrix, BlockRequest, CellPos, GridError,
};
use persistence::{parse_document, Export, PersistenceError};
use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

/// Wizard stage, in the order a new property walks through them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Landing,
    CountrySelect,
    RegionSelect,
    TraitSelect,
    SizeSelect,
    Edit,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Landing => "landing",
            Stage::CountrySelect => "country-select",
            Stage::RegionSelect => "region-select",
            Stage::TraitSelect => "trait-select",
            Stage::SizeSelect => "size-select",
            Stage::Edit => "edit",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("cannot {action} during {stage}")]
    WrongStage { action: &'static str, stage: Stage },
    #[error("no {0} selected")]
    NothingSelected(&'static str),
    #[error("trait {trait_name:?} is not offered by {region:?}")]
    TraitNotOffered { trait_name: String, region: String },
    #[error("grid size {0} is not offered")]
    SizeNotOffered(GridSize),
    #[error("level {level} is above the highest editable level {max}")]
    LevelOutOfRange { level: usize, max: usize },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Econ(#[from] EconError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// One editing session over a borrowed catalog.
pub struct Session<'c> {
    catalog: &'c Catalog,
    stage: Stage,
    selections: Selections,
    document: PropertyDocument,
    blocks: BlockMatrix<'c>,
    current_level: usize,
}

impl<'c> Session<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        let selections = Selections {
            property_name: "New Property".to_string(),
            ..Selections::default()
        };
        let document = construct_document(catalog, &selections);
        Self {
            catalog,
            stage: Stage::Landing,
            selections,
            document,
            blocks: BlockMatrix::filled(catalog, GridSize::default()),
            current_level: 0,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn selections(&self) -> &Selections {
        &self.selections
    }

    /// Current document snapshot.
    pub fn document(&self) -> &PropertyDocument {
        &self.document
    }

    pub fn blocks(&self) -> &BlockMatrix<'c> {
        &self.blocks
    }

    pub fn current_level(&self) -> usize {
        self.current_level
    }

    fn expect_stage(&self, stage: Stage, action: &'static str) -> Result<(), SessionError> {
        if self.stage != stage {
            return Err(SessionError::WrongStage {
                action,
                stage: self.stage,
            });
        }
        Ok(())
    }

    fn rebuild(&mut self) {
        self.document = construct_document(self.catalog, &self.selections);
    }

    fn enter(&mut self, stage: Stage) {
        info!(from = %self.stage, to = %stage, "stage change");
        self.stage = stage;
    }

    pub fn set_identity(
        &mut self,
        property_name: impl Into<String>,
        player_name: impl Into<String>,
    ) {
        self.selections.property_name = property_name.into();
        self.selections.player_name = player_name.into();
        self.document.property_name = self.selections.property_name.clone();
        self.document.player_name = self.selections.player_name.clone();
    }

    /// Begin a fresh property from the landing stage.
    pub fn start_new(&mut self) -> Result<(), SessionError> {
        self.expect_stage(Stage::Landing, "start a new property")?;
        self.selections = Selections {
            property_name: std::mem::take(&mut self.selections.property_name),
            player_name: std::mem::take(&mut self.selections.player_name),
            ..Selections::default()
        };
        self.rebuild();
        self.enter(Stage::CountrySelect);
        Ok(())
    }

    /// Choose a country; switching countries clears the region and traits.
    pub fn select_country(&mut self, name: &str) -> Result<(), SessionError> {
        self.expect_stage(Stage::CountrySelect, "select a country")?;
        let country = self.catalog.country(name)?;
        if self.selections.country.as_deref() != Some(name) {
            self.selections.country = Some(country.name.clone());
            self.selections.region = None;
            self.selections.traits.clear();
        }
        self.rebuild();
        Ok(())
    }

    /// Choose a subregion of the selected country; switching clears the traits.
    pub fn select_region(&mut self, name: &str) -> Result<(), SessionError> {
        self.expect_stage(Stage::RegionSelect, "select a region")?;
        let country = self
            .selections
            .country
            .as_deref()
            .ok_or(SessionError::NothingSelected("country"))?;
        let sub = self.catalog.subregion(country, name)?;
        if self.selections.region.as_deref() != Some(name) {
            self.selections.region = Some(sub.name.clone());
            self.selections.traits.clear();
        }
        self.rebuild();
        Ok(())
    }

    fn subregion(&self) -> Result<&'c Subregion, SessionError> {
        let country = self
            .selections
            .country
            .as_deref()
            .ok_or(SessionError::NothingSelected("country"))?;
        let region = self
            .selections
            .region
            .as_deref()
            .ok_or(SessionError::NothingSelected("region"))?;
        Ok(self.catalog.subregion(country, region)?)
    }

    /// Traits the selected subregion offers.
    pub fn offered_traits(&self) -> Result<Vec<&'c Trait>, SessionError> {
        Ok(self.catalog.traits_for(self.subregion()?))
    }

    /// Select a trait, or deselect it if already selected. Returns whether it is now selected.
    pub fn toggle_trait(&mut self, name: &str) -> Result<bool, SessionError> {
        self.expect_stage(Stage::TraitSelect, "toggle a trait")?;
        let sub = self.subregion()?;
        self.catalog.trait_named(name)?;
        if !sub.offers(name) {
            return Err(SessionError::TraitNotOffered {
                trait_name: name.to_string(),
                region: sub.name.clone(),
            });
        }
        let selected = if let Some(i) = self.selections.traits.iter().position(|t| t == name) {
            self.selections.traits.remove(i);
            false
        } else {
            let mut candidate = self.selections.traits.clone();
            candidate.push(name.to_string());
            if let Err(e) = self.catalog.check_trait_selection(&candidate) {
                warn!(trait_name = name, error = %e, "trait rejected");
                return Err(e.into());
            }
            self.selections.traits = candidate;
            true
        };
        self.rebuild();
        Ok(selected)
    }

    pub fn select_grid_size(&mut self, size: GridSize) -> Result<(), SessionError> {
        self.expect_stage(Stage::SizeSelect, "select a grid size")?;
        if !self.catalog.grid_sizes().contains(&size) {
            return Err(SessionError::SizeNotOffered(size));
        }
        self.selections.grid_size = size;
        self.selections.tile_matrix.clear();
        self.rebuild();
        Ok(())
    }

    /// Advance to the next stage once the current one has what it needs.
    pub fn next(&mut self) -> Result<Stage, SessionError> {
        let next = match self.stage {
            Stage::CountrySelect => {
                self.selections
                    .country
                    .as_ref()
                    .ok_or(SessionError::NothingSelected("country"))?;
                Stage::RegionSelect
            }
            Stage::RegionSelect => {
                self.selections
                    .region
                    .as_ref()
                    .ok_or(SessionError::NothingSelected("region"))?;
                Stage::TraitSelect
            }
            Stage::TraitSelect => Stage::SizeSelect,
            Stage::SizeSelect => {
                if self.selections.grid_size.is_empty() {
                    return Err(SessionError::NothingSelected("grid size"));
                }
                self.blocks = to_block_matrix(self.catalog, &self.document.map_matrix)?;
                self.current_level = 0;
                Stage::Edit
            }
            Stage::Landing | Stage::Edit => {
                return Err(SessionError::WrongStage {
                    action: "advance",
                    stage: self.stage,
                })
            }
        };
        self.enter(next);
        Ok(next)
    }

    /// Return to the previous stage. The editor can only be left while the grid is untouched.
    pub fn back(&mut self) -> Result<Stage, SessionError> {
        let previous = match self.stage {
            Stage::Landing => {
                return Err(SessionError::WrongStage {
                    action: "go back",
                    stage: self.stage,
                })
            }
            Stage::CountrySelect => Stage::Landing,
            Stage::RegionSelect => Stage::CountrySelect,
            Stage::TraitSelect => Stage::RegionSelect,
            Stage::SizeSelect => Stage::TraitSelect,
            Stage::Edit => {
                if !self.selections.tile_matrix.is_empty() {
                    return Err(SessionError::WrongStage {
                        action: "go back after placing tiles",
                        stage: self.stage,
                    });
                }
                Stage::SizeSelect
            }
        };
        self.enter(previous);
        Ok(previous)
    }

    /// Replace the whole session with an uploaded document and open the editor.
    ///
    /// Every name in the document must resolve before anything is replaced.
    pub fn load(&mut self, text: &str) -> Result<(), SessionError> {
        let document = parse_document(text)?;
        aggregate(self.catalog, &document)?;
        let blocks = to_block_matrix(self.catalog, &document.map_matrix)?;
        self.selections = Selections {
            property_name: document.property_name.clone(),
            player_name: document.player_name.clone(),
            country: document.country().map(str::to_string),
            region: document.region().map(str::to_string),
            traits: document.region_traits_selected.clone(),
            grid_size: document.grid_size(),
            tile_matrix: document.map_matrix.clone(),
        };
        info!(property = %document.property_name, tiles = blocks.block_count(), "document loaded");
        self.document = document;
        self.blocks = blocks;
        self.current_level = 0;
        self.stage = Stage::Edit;
        Ok(())
    }

    /// Choose the level edits apply to; one past the deepest stack starts a new level.
    pub fn set_level(&mut self, level: usize) -> Result<(), SessionError> {
        self.expect_stage(Stage::Edit, "change level")?;
        let max = self.blocks.level_counts().into_iter().flatten().max().unwrap_or(0);
        if level > max {
            return Err(SessionError::LevelOutOfRange { level, max });
        }
        self.current_level = level;
        Ok(())
    }

    /// Place a block at `(x, y)` on the current level and commit a new document snapshot.
    pub fn place(
        &mut self,
        x: usize,
        y: usize,
        request: &BlockRequest,
    ) -> Result<&PropertyDocument, SessionError> {
        self.expect_stage(Stage::Edit, "place a tile")?;
        let block = Block::from_request(self.catalog, request)?;
        let blocks = self
            .blocks
            .with_block(CellPos::new(x, y, self.current_level), block)?;
        let document = self.document.with_map_matrix(to_tile_matrix(&blocks));
        self.selections.tile_matrix = document.map_matrix.clone();
        self.blocks = blocks;
        self.document = document;
        Ok(&self.document)
    }

    /// Price the current document.
    pub fn totals(&self) -> Result<Totals, SessionError> {
        Ok(aggregate(self.catalog, &self.document)?)
    }

    pub fn export(&self) -> Result<Export, SessionError> {
        Ok(persistence::export(&self.document)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use estate_core::Tile;

    fn catalog() -> Catalog {
        Catalog::builtin().unwrap()
    }

    fn to_edit(session: &mut Session<'_>) {
        session.start_new().unwrap();
        session.select_country("Orde").unwrap();
        session.next().unwrap();
        session.select_region("Ordenholm").unwrap();
        session.next().unwrap();
        assert!(session.toggle_trait("Riverside").unwrap());
        session.next().unwrap();
        session.select_grid_size(GridSize::new(5, 5)).unwrap();
        assert_eq!(session.next().unwrap(), Stage::Edit);
    }

    #[test]
    fn walks_through_every_stage() {
        let c = catalog();
        let mut s = Session::new(&c);
        assert_eq!(s.stage(), Stage::Landing);
        s.set_identity("Riverside Keep", "Ada");
        to_edit(&mut s);
        let doc = s.document();
        assert_eq!(doc.property_name, "Riverside Keep");
        assert_eq!(doc.country_name, "Orde");
        assert_eq!(doc.region_name, "Ordenholm");
        assert_eq!(doc.region_traits_selected, vec!["Riverside".to_string()]);
        assert_eq!(doc.grid_size(), GridSize::new(5, 5));
        assert_eq!(s.blocks().block_count(), 25);
    }

    #[test]
    fn next_is_gated_on_selections() {
        let c = catalog();
        let mut s = Session::new(&c);
        assert!(matches!(s.next(), Err(SessionError::WrongStage { .. })));
        s.start_new().unwrap();
        assert!(matches!(s.next(), Err(SessionError::NothingSelected("country"))));
        s.select_country("Orde").unwrap();
        s.next().unwrap();
        assert!(matches!(s.next(), Err(SessionError::NothingSelected("region"))));
        s.select_region("Frostmere").unwrap();
        s.next().unwrap();
        s.next().unwrap();
        assert!(matches!(s.next(), Err(SessionError::NothingSelected("grid size"))));
    }

    #[test]
    fn selections_are_checked_against_catalog() {
        let c = catalog();
        let mut s = Session::new(&c);
        s.start_new().unwrap();
        assert!(matches!(s.select_country("Narnia"), Err(SessionError::Catalog(_))));
        s.select_country("Valtoria").unwrap();
        s.next().unwrap();
        // Ordenholm belongs to Orde.
        assert!(matches!(s.select_region("Ordenholm"), Err(SessionError::Catalog(_))));
        s.select_region("Port Aurel").unwrap();
        s.next().unwrap();
        assert!(matches!(
            s.toggle_trait("Bandit Country"),
            Err(SessionError::TraitNotOffered { .. })
        ));
        s.next().unwrap();
        assert!(matches!(
            s.select_grid_size(GridSize::new(7, 7)),
            Err(SessionError::SizeNotOffered(_))
        ));
    }

    #[test]
    fn changing_country_clears_region_and_traits() {
        let c = catalog();
        let mut s = Session::new(&c);
        s.start_new().unwrap();
        s.select_country("Orde").unwrap();
        s.next().unwrap();
        s.select_region("Ordenholm").unwrap();
        s.next().unwrap();
        s.toggle_trait("Trade Route").unwrap();
        s.back().unwrap();
        s.back().unwrap();
        assert_eq!(s.stage(), Stage::CountrySelect);
        s.select_country("Orde").unwrap();
        assert_eq!(s.selections().traits.len(), 1);
        s.select_country("Valtoria").unwrap();
        assert_eq!(s.selections().region, None);
        assert!(s.selections().traits.is_empty());
        assert_eq!(s.document().region_name, "");
    }

    #[test]
    fn toggling_adds_removes_and_enforces_exclusion() {
        let c = catalog();
        let mut s = Session::new(&c);
        s.start_new().unwrap();
        s.select_country("Orde").unwrap();
        s.next().unwrap();
        s.select_region("Ordenholm").unwrap();
        s.next().unwrap();
        assert_eq!(s.offered_traits().unwrap().len(), 4);
        assert!(s.toggle_trait("Riverside").unwrap());
        assert!(matches!(
            s.toggle_trait("Arid"),
            Err(SessionError::Catalog(CatalogError::ExclusiveTraits { .. }))
        ));
        assert!(!s.toggle_trait("Riverside").unwrap());
        assert!(s.toggle_trait("Arid").unwrap());
        assert_eq!(s.document().region_traits_selected, vec!["Arid".to_string()]);
    }

    #[test]
    fn totals_follow_selections() {
        let c = catalog();
        let mut s = Session::new(&c);
        to_edit(&mut s);
        let t = s.totals().unwrap();
        assert!((t.multipliers.land_cost - 1.8).abs() < 1e-9);
        assert!((t.total_land_cost - 25.0 * c.base_land_cost_per_tile() * 1.8).abs() < 1e-6);
        assert_eq!(t.total_build_cost, 0.0);
    }

    #[test]
    fn placing_replaces_snapshot() {
        let c = catalog();
        let mut s = Session::new(&c);
        to_edit(&mut s);
        let before = s.document().clone();
        s.place(1, 2, &BlockRequest::kind("Generic", Some("Ornate".into())))
            .unwrap();
        assert_eq!(before.map_matrix[1][2][0], Tile::plain("Empty"));
        assert_eq!(s.document().map_matrix[1][2][0], Tile::new("Generic", "Ornate"));
        let t = s.totals().unwrap();
        assert!((t.total_build_cost - 36.0).abs() < 1e-9);
        assert!((t.total_tp_value - 10.0).abs() < 1e-9);
        assert!(matches!(s.back(), Err(SessionError::WrongStage { .. })));
    }

    #[test]
    fn stacking_on_a_new_level() {
        let c = catalog();
        let mut s = Session::new(&c);
        to_edit(&mut s);
        assert!(matches!(
            s.set_level(2),
            Err(SessionError::LevelOutOfRange { level: 2, max: 1 })
        ));
        s.set_level(1).unwrap();
        s.place(0, 0, &BlockRequest::kind("Cheap", None)).unwrap();
        assert_eq!(s.document().map_matrix[0][0].len(), 2);
        assert_eq!(s.document().tile_count(), 26);
        // (0, 1) has one level, so level 1 stacks, and level 2 would not.
        s.set_level(2).unwrap();
        assert!(matches!(
            s.place(0, 1, &BlockRequest::kind("Cheap", None)),
            Err(SessionError::Grid(GridError::OutOfBounds { .. }))
        ));
    }

    #[test]
    fn invalid_requests_leave_document_alone() {
        let c = catalog();
        let mut s = Session::new(&c);
        to_edit(&mut s);
        let before = s.document().clone();
        assert!(matches!(
            s.place(0, 0, &BlockRequest::default()),
            Err(SessionError::Grid(GridError::InvalidBlockConstruction(_)))
        ));
        assert!(s.place(9, 9, &BlockRequest::kind("Cheap", None)).is_err());
        assert!(s.place(0, 0, &BlockRequest::kind("Field", Some("Gilded".into()))).is_err());
        assert_eq!(s.document(), &before);
    }

    #[test]
    fn load_replaces_session_wholesale() {
        let c = catalog();
        let mut source = Session::new(&c);
        source.set_identity("Dune Fort", "Bo");
        source.start_new().unwrap();
        source.select_country("Valtoria").unwrap();
        source.next().unwrap();
        source.select_region("Dunmoor").unwrap();
        source.next().unwrap();
        source.next().unwrap();
        source.select_grid_size(GridSize::new(10, 10)).unwrap();
        source.next().unwrap();
        source.place(3, 3, &BlockRequest::kind("Escape Tunnel", Some("Hidden".into()))).unwrap();
        let body = source.export().unwrap().body;

        let mut s = Session::new(&c);
        to_edit(&mut s);
        s.load(&body).unwrap();
        assert_eq!(s.stage(), Stage::Edit);
        assert_eq!(s.document(), source.document());
        assert_eq!(s.selections().country.as_deref(), Some("Valtoria"));
        assert_eq!(s.selections().grid_size, GridSize::new(10, 10));
        assert_eq!(s.totals().unwrap(), source.totals().unwrap());
    }

    #[test]
    fn load_rejects_unresolvable_documents() {
        let c = catalog();
        let mut s = Session::new(&c);
        to_edit(&mut s);
        let before = s.document().clone();
        let body = s.export().unwrap().body.replace("Ordenholm", "Atlantis");
        assert!(matches!(s.load(&body), Err(SessionError::Econ(_))));
        assert!(matches!(s.load("[]"), Err(SessionError::Persistence(_))));
        assert_eq!(s.document(), &before);
    }

    #[test]
    fn load_rejects_trait_lists_the_wizard_would_refuse() {
        let c = catalog();
        let mut s = Session::new(&c);
        to_edit(&mut s);
        let before = s.selections().clone();
        let body = s.export().unwrap().body;
        let selected = r#""regionTraitsSelected":["Riverside"]"#;
        assert!(body.contains(selected));

        let twice = body.replace(selected, r#""regionTraitsSelected":["Riverside","Riverside"]"#);
        assert!(matches!(
            s.load(&twice),
            Err(SessionError::Econ(EconError::Catalog(CatalogError::RepeatedSelection { .. })))
        ));
        let unoffered = body.replace(selected, r#""regionTraitsSelected":["Riverside","Coastal"]"#);
        assert!(matches!(
            s.load(&unoffered),
            Err(SessionError::Econ(EconError::Catalog(CatalogError::NotOffered { .. })))
        ));
        assert_eq!(s.selections(), &before);
    }
}
