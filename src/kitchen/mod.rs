//! PC-007: Kitchen — the primitive-library interface the executor cooks with.
//!
//! A kitchen constructs ingredients from descriptions, lets seasonings
//! condition other ingredients, and renders a course (one stage's working
//! group) into an artifact.

pub mod plan;

use crate::core::types::IngredientDescription;

/// One element of a working group.
#[derive(Debug)]
pub enum Portion<'a, I, A> {
    /// The artifact served by the previous stage.
    Plated(&'a A),
    /// A prepared ingredient.
    Raw(&'a I),
}

/// The working group of one stage, in add order.
#[derive(Debug)]
pub struct Course<'a, I, A> {
    portions: Vec<Portion<'a, I, A>>,
}

impl<I, A> Default for Course<'_, I, A> {
    fn default() -> Self {
        Self {
            portions: Vec::new(),
        }
    }
}

impl<'a, I, A> Course<'a, I, A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, portion: Portion<'a, I, A>) {
        self.portions.push(portion);
    }

    pub fn portions(&self) -> &[Portion<'a, I, A>] {
        &self.portions
    }

    pub fn len(&self) -> usize {
        self.portions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.portions.is_empty()
    }
}

/// Capability set of a primitive-operation library.
pub trait Kitchen {
    type Ingredient;
    type Artifact;

    /// Construct one ingredient. `file` kwargs are already literal paths.
    fn prepare(&mut self, desc: &IngredientDescription) -> Result<Self::Ingredient, String>;

    /// Let `seasoning` condition `ingredient`, with the in-progress artifact
    /// (if any) as its target.
    fn season(
        &mut self,
        seasoning: &mut Self::Ingredient,
        target: Option<&Self::Artifact>,
        ingredient: &mut Self::Ingredient,
    ) -> Result<(), String>;

    /// Render a working group into a new artifact.
    fn serve(
        &mut self,
        course: Course<'_, Self::Ingredient, Self::Artifact>,
    ) -> Result<Self::Artifact, String>;
}
