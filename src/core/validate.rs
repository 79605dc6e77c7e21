//! PC-009: Static checks over a dish description.
//!
//! Finds what would make a cook fail before any kitchen is involved:
//! - stage and seasoning identifiers must name stored ingredients
//! - file references must name stored file links
//! - seasonings may not season themselves or be seasoned
//! - stages must not be empty

use super::types::{DishDescription, Value};

/// Validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Validate a description. Returns a list of errors (empty = cookable).
pub fn validate_description(dish: &DishDescription) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut push = |message: String| errors.push(ValidationError { message });

    for (id, desc) in &dish.ingredients {
        for value in desc.args.iter().chain(desc.kwargs.values()) {
            if let Value::File(file) = value {
                if !dish.file_links.contains_key(file) {
                    push(format!(
                        "ingredient {} ({}) references unknown file link {}",
                        id, desc.kind, file
                    ));
                }
            }
        }
    }

    for (stage, order) in dish.recipes.iter().enumerate() {
        if order.is_empty() {
            push(format!("stage {} has no ingredients", stage));
        }
        for id in order {
            if !dish.ingredients.contains_key(id) {
                push(format!("stage {} references unknown ingredient {}", stage, id));
            }
        }
    }

    for (target, seasoning) in &dish.seasoning_links {
        if !dish.ingredients.contains_key(target) {
            push(format!("seasoning link targets unknown ingredient {}", target));
        }
        if !dish.ingredients.contains_key(seasoning) {
            push(format!(
                "ingredient {} is seasoned by unknown ingredient {}",
                target, seasoning
            ));
        }
        if target == seasoning {
            push(format!("ingredient {} seasons itself", target));
        } else if dish.seasoning_links.contains_key(seasoning) {
            push(format!(
                "seasoning {} of {} is itself seasoned",
                seasoning, target
            ));
        }
    }

    errors
}
