//! PC-001: Description store types.
//!
//! A dish description is a graph of deferred ingredient constructions. Every
//! cross-reference (file links, seasoning links, recipe orders) goes through
//! an opaque identifier, never a direct pointer, so the whole description can
//! be serialized, inspected, and edited before anything is cooked.

use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Opaque handle of an ingredient description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct IngredientId(Uuid);

impl IngredientId {
    /// Generate a fresh, never-reused identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for IngredientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for IngredientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle of a file link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct FileId(Uuid);

impl FileId {
    /// Generate a fresh, never-reused identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FileId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Ingredient descriptions
// ============================================================================

/// Closed set of primitive operations a description can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IngredientKind {
    /// Load an image from a file.
    Pierogi,
    /// Pixel sort.
    Sort,
    /// Color quantization.
    Quantize,
    /// Lightness threshold test (used as a seasoning).
    Threshold,
}

impl fmt::Display for IngredientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pierogi => write!(f, "pierogi"),
            Self::Sort => write!(f, "sort"),
            Self::Quantize => write!(f, "quantize"),
            Self::Threshold => write!(f, "threshold"),
        }
    }
}

/// A positional or keyword argument of an ingredient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    Int(i64),
    Text(String),
    /// Unresolved reference into `file_links`.
    File(FileId),
    /// Literal path, produced by resolving a `File` reference.
    Path(String),
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{}", n),
            Self::Text(s) | Self::Path(s) => write!(f, "{}", s),
            Self::File(id) => write!(f, "file:{}", id),
        }
    }
}

/// Keyword arguments, insertion ordered.
pub type Kwargs = IndexMap<String, Value>;

/// Reserved kwarg holding a file reference.
pub const FILE_KWARG: &str = "file";

/// A deferred construction request for one primitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IngredientDescription {
    /// Which primitive to construct
    #[serde(rename = "type")]
    pub kind: IngredientKind,

    /// Positional arguments
    #[serde(default)]
    pub args: Vec<Value>,

    /// Keyword arguments
    #[serde(default)]
    pub kwargs: Kwargs,

    /// Kwarg names that were filled from option defaults rather than supplied
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub defaulted: Vec<String>,
}

impl IngredientDescription {
    pub fn new(kind: IngredientKind) -> Self {
        Self {
            kind,
            args: Vec::new(),
            kwargs: Kwargs::new(),
            defaulted: Vec::new(),
        }
    }

    /// Builder-style kwarg insertion.
    pub fn with_kwarg(mut self, name: &str, value: Value) -> Self {
        self.kwargs.insert(name.to_string(), value);
        self
    }

    /// Whether a kwarg was explicitly supplied (present and not defaulted).
    pub fn is_explicit(&self, name: &str) -> bool {
        self.kwargs.contains_key(name) && !self.defaulted.iter().any(|d| d == name)
    }
}

// ============================================================================
// Dish description (the store)
// ============================================================================

/// The mutable description graph built during interpretation and consumed by
/// the executor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DishDescription {
    /// Ingredient descriptions by identifier
    #[serde(default)]
    pub ingredients: IndexMap<IngredientId, IngredientDescription>,

    /// Literal file paths by identifier
    #[serde(default)]
    pub file_links: IndexMap<FileId, String>,

    /// Target ingredient → seasoning ingredient
    #[serde(default)]
    pub seasoning_links: IndexMap<IngredientId, IngredientId>,

    /// Ordered execution stages
    #[serde(default)]
    pub recipes: Vec<Vec<IngredientId>>,
}

impl DishDescription {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an ingredient description under a fresh identifier.
    pub fn add_ingredient(&mut self, desc: IngredientDescription) -> IngredientId {
        let id = IngredientId::new();
        self.ingredients.insert(id, desc);
        id
    }

    /// Store a literal path under a fresh identifier.
    pub fn add_file_link(&mut self, path: impl Into<String>) -> FileId {
        let id = FileId::new();
        self.file_links.insert(id, path.into());
        id
    }

    /// Append an execution stage. Identifiers are not checked here.
    pub fn add_recipe(&mut self, order: Vec<IngredientId>) {
        self.recipes.push(order);
    }

    /// Link a seasoning to a target, replacing any previous link.
    pub fn add_seasoning(&mut self, target: IngredientId, seasoning: IngredientId) {
        self.seasoning_links.insert(target, seasoning);
    }

    pub fn ingredient(&self, id: &IngredientId) -> Option<&IngredientDescription> {
        self.ingredients.get(id)
    }

    pub fn file_link(&self, id: &FileId) -> Option<&str> {
        self.file_links.get(id).map(String::as_str)
    }

    pub fn seasoning_for(&self, target: &IngredientId) -> Option<IngredientId> {
        self.seasoning_links.get(target).copied()
    }

    /// One-line summary of the store's size.
    pub fn summary(&self) -> String {
        format!(
            "{} ingredients, {} file links, {} seasonings, {} stages",
            self.ingredients.len(),
            self.file_links.len(),
            self.seasoning_links.len(),
            self.recipes.len()
        )
    }
}
