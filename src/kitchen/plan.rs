//! PC-008: Plan kitchen — a deterministic kitchen that plates descriptions
//! instead of pixels.
//!
//! Every served plate lists its layers and carries a BLAKE3 digest over
//! them. Identifiers never reach the digest, so the same recipe text over the
//! same paths always plates the same digest.

use super::{Course, Kitchen, Portion};
use crate::core::types::{IngredientDescription, IngredientKind, Value, FILE_KWARG};
use serde::Serialize;

/// A prepared ingredient: a canonical label plus any seasoning note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedIngredient {
    pub kind: IngredientKind,
    pub label: String,
    pub seasoning: Option<String>,
}

impl PlannedIngredient {
    fn layer(&self) -> String {
        match &self.seasoning {
            Some(note) => format!("{} [{}]", self.label, note),
            None => self.label.clone(),
        }
    }
}

/// A served stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plate {
    pub layers: Vec<String>,
    pub digest: String,
}

/// Kitchen that records what would be rendered.
#[derive(Debug, Default)]
pub struct PlanKitchen {
    served: usize,
}

impl PlanKitchen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stages served so far.
    pub fn served(&self) -> usize {
        self.served
    }
}

/// Hash a string. Returns `"blake3:{hex}"`.
pub fn hash_string(s: &str) -> String {
    format!("blake3:{}", blake3::hash(s.as_bytes()).to_hex())
}

fn label(desc: &IngredientDescription) -> String {
    let mut label = desc.kind.to_string();
    for arg in &desc.args {
        label.push(' ');
        label.push_str(&arg.to_string());
    }
    for (name, value) in &desc.kwargs {
        label.push_str(&format!(" {}={}", name, value));
    }
    label
}

fn require_ints(desc: &IngredientDescription) -> Result<(), String> {
    for (name, value) in &desc.kwargs {
        if value.as_int().is_none() {
            return Err(format!("{} expects an integer, got '{}'", name, value));
        }
    }
    Ok(())
}

impl Kitchen for PlanKitchen {
    type Ingredient = PlannedIngredient;
    type Artifact = Plate;

    fn prepare(&mut self, desc: &IngredientDescription) -> Result<PlannedIngredient, String> {
        match desc.kind {
            IngredientKind::Pierogi => match desc.kwargs.get(FILE_KWARG) {
                Some(Value::Path(_)) => {}
                Some(Value::File(id)) => {
                    return Err(format!("file reference {} was never resolved", id))
                }
                Some(other) => return Err(format!("file must be a path, got '{}'", other)),
                None => return Err("pierogi needs a file".to_string()),
            },
            IngredientKind::Quantize => {
                require_ints(desc)?;
                if let Some(colors) = desc.kwargs.get("colors").and_then(Value::as_int) {
                    if !(1..=256).contains(&colors) {
                        return Err(format!("colors must be within 1..=256, got {}", colors));
                    }
                }
            }
            IngredientKind::Sort | IngredientKind::Threshold => require_ints(desc)?,
        }

        Ok(PlannedIngredient {
            kind: desc.kind,
            label: label(desc),
            seasoning: None,
        })
    }

    fn season(
        &mut self,
        seasoning: &mut PlannedIngredient,
        target: Option<&Plate>,
        ingredient: &mut PlannedIngredient,
    ) -> Result<(), String> {
        if seasoning.kind != IngredientKind::Threshold {
            return Err(format!("{} cannot season", seasoning.kind));
        }
        let over = target.map_or("nothing", |p| p.digest.as_str());
        ingredient.seasoning = Some(format!("{} over {}", seasoning.label, over));
        Ok(())
    }

    fn serve(&mut self, course: Course<'_, PlannedIngredient, Plate>) -> Result<Plate, String> {
        if course.is_empty() {
            return Err("nothing to serve".to_string());
        }
        let layers: Vec<String> = course
            .portions()
            .iter()
            .map(|portion| match portion {
                Portion::Plated(plate) => format!("plate {}", plate.digest),
                Portion::Raw(ingredient) => ingredient.layer(),
            })
            .collect();
        let digest = hash_string(&layers.join("\n"));
        self.served += 1;
        Ok(Plate { layers, digest })
    }
}
