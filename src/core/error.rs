//! PC-002: Error taxonomy for interpretation and execution.
//!
//! Interpretation errors (`RecipeSyntax`, `NestedRecipe`) are recovered by
//! skipping the statement. Every other variant aborts a cook.

use std::fmt;
use std::path::PathBuf;

/// What kind of identifier failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Ingredient,
    Seasoning,
    FileLink,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ingredient => write!(f, "ingredient"),
            Self::Seasoning => write!(f, "seasoning"),
            Self::FileLink => write!(f, "file link"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChefError {
    #[error("cannot parse '{statement}': {reason}")]
    RecipeSyntax { statement: String, reason: String },

    #[error("nested recipe {}: {reason}", .path.display())]
    NestedRecipe { path: PathBuf, reason: String },

    #[error("unresolved {kind} reference {id}")]
    UnresolvedReference { kind: ReferenceKind, id: String },

    #[error("cannot prepare {kind} ingredient {id}: {reason}")]
    IngredientConstruction {
        kind: String,
        id: String,
        reason: String,
    },

    #[error("seasoning {seasoning} failed on {target}: {reason}")]
    Seasoning {
        seasoning: String,
        target: String,
        reason: String,
    },

    #[error("seasoning chain at {id}: {reason}")]
    SeasoningChain { id: String, reason: String },

    #[error("stage {stage} could not be served: {reason}")]
    Serve { stage: usize, reason: String },
}

impl ChefError {
    pub(crate) fn unresolved(kind: ReferenceKind, id: impl fmt::Display) -> Self {
        Self::UnresolvedReference {
            kind,
            id: id.to_string(),
        }
    }
}
