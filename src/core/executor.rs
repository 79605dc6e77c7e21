//! PC-006: Executor — resolve a dish description and cook it stage by stage.
//!
//! Phase A rewrites file references into literal paths and prepares one
//! kitchen ingredient per description. Phase B serves each recipe order in
//! sequence; every stage after the first starts from the previous stage's
//! artifact. Any missing identifier or kitchen failure aborts the cook.

use super::error::{ChefError, ReferenceKind};
use super::types::{DishDescription, FileId, IngredientId, Value};
use crate::kitchen::{Course, Kitchen, Portion};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;

/// Prepared kitchen ingredients by identifier.
pub type Pantry<I> = FxHashMap<IngredientId, I>;

fn resolve_value(files: &IndexMap<FileId, String>, value: &mut Value) -> Result<(), ChefError> {
    if let Value::File(id) = value {
        let path = files
            .get(id)
            .ok_or_else(|| ChefError::unresolved(ReferenceKind::FileLink, *id))?;
        *value = Value::Path(path.clone());
    }
    Ok(())
}

/// Replace every `File` reference (args and kwargs) with its literal path.
///
/// Already-resolved paths are left alone, so running this twice is a no-op.
pub fn resolve_files(dish: &mut DishDescription) -> Result<(), ChefError> {
    let files = &dish.file_links;
    for desc in dish.ingredients.values_mut() {
        for value in desc.args.iter_mut().chain(desc.kwargs.values_mut()) {
            resolve_value(files, value)?;
        }
    }
    Ok(())
}

/// Construct one kitchen ingredient per description, in insertion order.
pub fn prepare<K: Kitchen>(
    kitchen: &mut K,
    dish: &DishDescription,
) -> Result<Pantry<K::Ingredient>, ChefError> {
    let mut pantry: Pantry<K::Ingredient> = Pantry::default();
    for (id, desc) in &dish.ingredients {
        let ingredient =
            kitchen
                .prepare(desc)
                .map_err(|reason| ChefError::IngredientConstruction {
                    kind: desc.kind.to_string(),
                    id: id.to_string(),
                    reason,
                })?;
        pantry.insert(*id, ingredient);
    }
    Ok(pantry)
}

/// Every seasoning link must name two prepared ingredients, whether or not
/// its target appears in a stage.
pub fn check_seasoning_links<I>(
    dish: &DishDescription,
    pantry: &Pantry<I>,
) -> Result<(), ChefError> {
    for (target, seasoning) in &dish.seasoning_links {
        if !pantry.contains_key(target) {
            return Err(ChefError::unresolved(ReferenceKind::Ingredient, target));
        }
        if !pantry.contains_key(seasoning) {
            return Err(ChefError::unresolved(ReferenceKind::Seasoning, seasoning));
        }
    }
    Ok(())
}

/// Apply the seasoning linked to `target`, if any.
fn apply_seasoning<K: Kitchen>(
    kitchen: &mut K,
    dish: &DishDescription,
    pantry: &mut Pantry<K::Ingredient>,
    target: IngredientId,
    current: Option<&K::Artifact>,
) -> Result<(), ChefError> {
    let Some(season_id) = dish.seasoning_for(&target) else {
        return Ok(());
    };
    if season_id == target {
        return Err(ChefError::SeasoningChain {
            id: target.to_string(),
            reason: "ingredient seasons itself".to_string(),
        });
    }
    if dish.seasoning_links.contains_key(&season_id) {
        return Err(ChefError::SeasoningChain {
            id: season_id.to_string(),
            reason: "seasonings cannot themselves be seasoned".to_string(),
        });
    }

    let mut seasoning = pantry
        .remove(&season_id)
        .ok_or_else(|| ChefError::unresolved(ReferenceKind::Seasoning, season_id))?;
    let result = match pantry.get_mut(&target) {
        Some(ingredient) => kitchen
            .season(&mut seasoning, current, ingredient)
            .map_err(|reason| ChefError::Seasoning {
                seasoning: season_id.to_string(),
                target: target.to_string(),
                reason,
            }),
        None => Err(ChefError::unresolved(ReferenceKind::Ingredient, target)),
    };
    pantry.insert(season_id, seasoning);
    result
}

/// Serve every stage of a prepared pantry. `Ok(None)` when there are no stages.
pub fn serve_stages<K: Kitchen>(
    kitchen: &mut K,
    dish: &DishDescription,
    pantry: &mut Pantry<K::Ingredient>,
) -> Result<Option<K::Artifact>, ChefError> {
    let mut current: Option<K::Artifact> = None;

    for (stage, order) in dish.recipes.iter().enumerate() {
        for id in order {
            if !pantry.contains_key(id) {
                return Err(ChefError::unresolved(ReferenceKind::Ingredient, id));
            }
            apply_seasoning(kitchen, dish, pantry, *id, current.as_ref())?;
        }

        let mut course = Course::new();
        if let Some(artifact) = current.as_ref() {
            course.add(Portion::Plated(artifact));
        }
        for id in order {
            let ingredient = pantry
                .get(id)
                .ok_or_else(|| ChefError::unresolved(ReferenceKind::Ingredient, id))?;
            course.add(Portion::Raw(ingredient));
        }

        tracing::debug!(stage, portions = course.len(), "serving stage");
        let artifact = kitchen
            .serve(course)
            .map_err(|reason| ChefError::Serve { stage, reason })?;
        current = Some(artifact);
    }

    Ok(current)
}

/// Resolve, prepare, and serve a dish description.
///
/// The only mutation of `dish` is rewriting file references into paths.
pub fn cook<K: Kitchen>(
    kitchen: &mut K,
    dish: &mut DishDescription,
) -> Result<Option<K::Artifact>, ChefError> {
    resolve_files(dish)?;
    let mut pantry = prepare(kitchen, dish)?;
    check_seasoning_links(dish, &pantry)?;
    let served = serve_stages(kitchen, dish, &mut pantry)?;
    tracing::info!(stages = dish.recipes.len(), served = served.is_some(), "cook complete");
    Ok(served)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chef::Chef;
    use crate::core::types::{IngredientDescription, IngredientKind, FILE_KWARG};
    use crate::kitchen::plan::PlanKitchen;

    /// What a recording kitchen saw in one course.
    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Seen {
        Artifact(usize),
        Ingredient(String),
    }

    /// Ingredient = its label; artifact = serve call number.
    #[derive(Default)]
    struct RecordingKitchen {
        courses: Vec<Vec<Seen>>,
        seasonings: Vec<(String, Option<usize>, String)>,
        fail_prepare: Option<IngredientKind>,
    }

    impl Kitchen for RecordingKitchen {
        type Ingredient = String;
        type Artifact = usize;

        fn prepare(&mut self, desc: &IngredientDescription) -> Result<String, String> {
            if self.fail_prepare == Some(desc.kind) {
                return Err("no such primitive".to_string());
            }
            Ok(match desc.kwargs.get(FILE_KWARG) {
                Some(file) => format!("{}({})", desc.kind, file),
                None => desc.kind.to_string(),
            })
        }

        fn season(
            &mut self,
            seasoning: &mut String,
            target: Option<&usize>,
            ingredient: &mut String,
        ) -> Result<(), String> {
            self.seasonings
                .push((seasoning.clone(), target.copied(), ingredient.clone()));
            ingredient.push_str("+seasoned");
            Ok(())
        }

        fn serve(&mut self, course: Course<'_, String, usize>) -> Result<usize, String> {
            let seen = course
                .portions()
                .iter()
                .map(|p| match p {
                    Portion::Plated(n) => Seen::Artifact(**n),
                    Portion::Raw(s) => Seen::Ingredient((*s).clone()),
                })
                .collect();
            self.courses.push(seen);
            Ok(self.courses.len())
        }
    }

    fn read(text: &str) -> DishDescription {
        let mut dish = DishDescription::new();
        Chef::default().read_recipe(&mut dish, text);
        dish
    }

    #[test]
    fn test_pc006_two_stages_compose() {
        let mut dish = read("pierogi /a.png; quantize -k 4");
        let mut kitchen = RecordingKitchen::default();
        let result = cook(&mut kitchen, &mut dish).unwrap();

        assert_eq!(result, Some(2));
        assert_eq!(kitchen.courses.len(), 2);
        assert_eq!(
            kitchen.courses[0],
            vec![Seen::Ingredient("pierogi(/a.png)".to_string())]
        );
        assert_eq!(
            kitchen.courses[1],
            vec![Seen::Artifact(1), Seen::Ingredient("quantize".to_string())]
        );
    }

    #[test]
    fn test_pc006_empty_recipes_is_none() {
        let mut dish = DishDescription::new();
        dish.add_ingredient(IngredientDescription::new(IngredientKind::Sort));
        let mut kitchen = RecordingKitchen::default();
        assert_eq!(cook(&mut kitchen, &mut dish).unwrap(), None);
        assert!(kitchen.courses.is_empty());
    }

    #[test]
    fn test_pc006_seasoning_sees_running_artifact() {
        let mut dish = read("pierogi /a.png; sort -l 40");
        let mut kitchen = RecordingKitchen::default();
        cook(&mut kitchen, &mut dish).unwrap();

        assert_eq!(
            kitchen.seasonings,
            vec![("threshold".to_string(), Some(1), "sort".to_string())]
        );
        assert_eq!(
            kitchen.courses[1],
            vec![
                Seen::Artifact(1),
                Seen::Ingredient("sort+seasoned".to_string())
            ]
        );
    }

    #[test]
    fn test_pc006_seasoning_first_stage_has_no_target() {
        let mut dish = read("sort -u 100");
        let mut kitchen = RecordingKitchen::default();
        cook(&mut kitchen, &mut dish).unwrap();
        assert_eq!(kitchen.seasonings[0].1, None);
        assert_eq!(kitchen.courses.len(), 1);
    }

    #[test]
    fn test_pc006_resolve_files_rewrites_and_is_idempotent() {
        let mut dish = read("pierogi /a.png; pierogi /b.png");
        resolve_files(&mut dish).unwrap();
        let once = dish.clone();
        resolve_files(&mut dish).unwrap();
        assert_eq!(dish, once);

        let paths: Vec<_> = dish
            .ingredients
            .values()
            .map(|d| d.kwargs[FILE_KWARG].clone())
            .collect();
        assert_eq!(
            paths,
            vec![
                Value::Path("/a.png".to_string()),
                Value::Path("/b.png".to_string())
            ]
        );
    }

    #[test]
    fn test_pc006_resolves_positional_file_args() {
        let mut dish = DishDescription::new();
        let file = dish.add_file_link("/c.png");
        let mut desc = IngredientDescription::new(IngredientKind::Pierogi);
        desc.args.push(Value::File(file));
        let id = dish.add_ingredient(desc);
        resolve_files(&mut dish).unwrap();
        assert_eq!(dish.ingredients[&id].args[0], Value::Path("/c.png".to_string()));
    }

    #[test]
    fn test_pc006_missing_file_link_is_fatal() {
        let mut dish = read("pierogi /a.png");
        dish.file_links.clear();
        let mut kitchen = RecordingKitchen::default();
        let err = cook(&mut kitchen, &mut dish).unwrap_err();
        assert!(matches!(
            err,
            ChefError::UnresolvedReference {
                kind: ReferenceKind::FileLink,
                ..
            }
        ));
        assert!(kitchen.courses.is_empty());
    }

    #[test]
    fn test_pc006_missing_stage_ingredient_is_fatal() {
        let mut dish = read("quantize");
        dish.add_recipe(vec![IngredientId::new()]);
        let mut kitchen = RecordingKitchen::default();
        let err = cook(&mut kitchen, &mut dish).unwrap_err();
        assert!(matches!(
            err,
            ChefError::UnresolvedReference {
                kind: ReferenceKind::Ingredient,
                ..
            }
        ));
    }

    #[test]
    fn test_pc006_missing_seasoning_is_fatal() {
        let mut dish = read("sort");
        let sort = dish.recipes[0][0];
        dish.add_seasoning(sort, IngredientId::new());
        let err = cook(&mut RecordingKitchen::default(), &mut dish).unwrap_err();
        assert!(matches!(
            err,
            ChefError::UnresolvedReference {
                kind: ReferenceKind::Seasoning,
                ..
            }
        ));
    }

    #[test]
    fn test_pc006_dangling_seasoning_link_is_fatal() {
        let mut dish = read("pierogi /a.png; quantize -k 4");
        dish.add_seasoning(IngredientId::new(), IngredientId::new());
        let mut kitchen = RecordingKitchen::default();
        let err = cook(&mut kitchen, &mut dish).unwrap_err();
        assert!(matches!(
            err,
            ChefError::UnresolvedReference {
                kind: ReferenceKind::Ingredient,
                ..
            }
        ));
        assert!(kitchen.courses.is_empty());

        let mut dish = read("pierogi /a.png; quantize -k 4");
        let unstaged = dish.add_ingredient(IngredientDescription::new(IngredientKind::Sort));
        dish.add_seasoning(unstaged, IngredientId::new());
        let err = cook(&mut PlanKitchen::new(), &mut dish).unwrap_err();
        assert!(matches!(
            err,
            ChefError::UnresolvedReference {
                kind: ReferenceKind::Seasoning,
                ..
            }
        ));
    }

    #[test]
    fn test_pc006_seasoning_chains_rejected() {
        let mut dish = read("sort -l 1");
        let sort = dish.recipes[0][0];
        let threshold = dish.seasoning_for(&sort).unwrap();
        let extra = dish.add_ingredient(IngredientDescription::new(IngredientKind::Threshold));
        dish.add_seasoning(threshold, extra);
        let err = cook(&mut RecordingKitchen::default(), &mut dish).unwrap_err();
        assert!(matches!(err, ChefError::SeasoningChain { .. }));

        let mut dish = read("sort");
        let sort = dish.recipes[0][0];
        dish.add_seasoning(sort, sort);
        let err = cook(&mut RecordingKitchen::default(), &mut dish).unwrap_err();
        assert!(err.to_string().contains("seasons itself"));
    }

    #[test]
    fn test_pc006_construction_failure_is_fatal() {
        let mut dish = read("pierogi /a.png; quantize");
        let mut kitchen = RecordingKitchen {
            fail_prepare: Some(IngredientKind::Quantize),
            ..RecordingKitchen::default()
        };
        let err = cook(&mut kitchen, &mut dish).unwrap_err();
        assert!(matches!(err, ChefError::IngredientConstruction { .. }));
        assert!(err.to_string().contains("no such primitive"));
        assert!(kitchen.courses.is_empty());
    }

    #[test]
    fn test_pc006_plan_kitchen_is_deterministic() {
        let text = "pierogi /a.png; sort -t 1 -l 30; quantize -k 6";
        let mut first = read(text);
        let mut second = read(text);
        assert_ne!(
            first.ingredients.keys().next(),
            second.ingredients.keys().next()
        );

        let a = cook(&mut PlanKitchen::new(), &mut first).unwrap().unwrap();
        let b = cook(&mut PlanKitchen::new(), &mut second).unwrap().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.layers.len(), 2);
        assert!(a.layers[1].starts_with("quantize colors=6"));
    }

    #[test]
    fn test_pc006_plan_kitchen_serve_failure() {
        let mut dish = DishDescription::new();
        dish.add_recipe(vec![]);
        let err = cook(&mut PlanKitchen::new(), &mut dish).unwrap_err();
        assert!(matches!(err, ChefError::Serve { stage: 0, .. }));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_pc006_resolution_idempotent(
                paths in proptest::collection::vec("/[a-z]{1,6}\\.png", 0..6)
            ) {
                let text: Vec<String> = paths.iter().map(|p| format!("pierogi {}", p)).collect();
                let mut dish = read(&text.join(";"));
                resolve_files(&mut dish).unwrap();
                let once = dish.clone();
                resolve_files(&mut dish).unwrap();
                prop_assert_eq!(&dish, &once);
                prop_assert!(dish
                    .ingredients
                    .values()
                    .all(|d| matches!(d.kwargs[FILE_KWARG], Value::Path(_))));
            }
        }
    }
}
