use std::fmt;
use thiserror::Error;

/// Which catalog table a name was looked up in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Country,
    Subregion,
    Trait,
    TileKind,
    Quality,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReferenceKind::Country => "country",
            ReferenceKind::Subregion => "subregion",
            ReferenceKind::Trait => "trait",
            ReferenceKind::TileKind => "tile kind",
            ReferenceKind::Quality => "quality",
        };
        f.write_str(s)
    }
}

/// Errors raised while building the catalog or resolving names against it.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CatalogError {
    /// A named reference is absent from the catalog.
    #[error("{kind} not found: {name:?}")]
    ReferenceNotFound { kind: ReferenceKind, name: String },
    /// Two catalog entries of the same kind share a name.
    #[error("duplicate {kind} name: {name:?}")]
    Duplicate { kind: ReferenceKind, name: String },
    /// A catalog entry points at a name that does not exist.
    #[error("{owner:?} references unknown {kind} {name:?}")]
    DanglingReference {
        owner: String,
        kind: ReferenceKind,
        name: String,
    },
    /// A constant in the catalog is unusable.
    #[error("invalid catalog constant: {0}")]
    InvalidConst(String),
    /// Two selected traits exclude each other.
    #[error("trait {first:?} cannot be combined with {second:?}")]
    ExclusiveTraits { first: String, second: String },
    /// The same name appears more than once in a selection.
    #[error("{kind} {name:?} is selected more than once")]
    RepeatedSelection { kind: ReferenceKind, name: String },
    /// A selected trait is not offered by the chosen subregion.
    #[error("trait {trait_name:?} is not offered by {subregion:?}")]
    NotOffered {
        trait_name: String,
        subregion: String,
    },
    #[error("catalog parse error: {0}")]
    Parse(String),
    #[error("io error: {0}")]
    Io(String),
}

impl CatalogError {
    pub fn not_found(kind: ReferenceKind, name: impl Into<String>) -> Self {
        CatalogError::ReferenceNotFound {
            kind,
            name: name.into(),
        }
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(e: std::io::Error) -> Self {
        CatalogError::Io(e.to_string())
    }
}

impl From<serde_yaml::Error> for CatalogError {
    fn from(e: serde_yaml::Error) -> Self {
        CatalogError::Parse(e.to_string())
    }
}
