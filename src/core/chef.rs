//! PC-004: Recipe interpreter and command handlers.
//!
//! A recipe is a `;`-separated list of statements. Each statement is
//! tokenized against the menu and its handler appends ingredients, file
//! links, seasonings, and stages to one dish description. Interpretation is
//! best-effort: a statement that cannot be applied is reported and skipped,
//! and the description stays exactly as it was before that statement.

use super::config::{ChefConfig, ThresholdPolicy};
use super::error::ChefError;
use super::menu::{Menu, Parsed, ParsedCommand, ValueSource};
use super::types::{DishDescription, IngredientDescription, IngredientKind, Value, FILE_KWARG};
use std::path::{Path, PathBuf};

/// What happened to one statement.
#[derive(Debug)]
pub enum Outcome {
    Applied { command: &'static str },
    Skipped { reason: String },
    Failed(ChefError),
}

/// One interpreted statement.
#[derive(Debug)]
pub struct StatementReport {
    /// Nesting depth (0 = top-level recipe)
    pub depth: usize,
    /// Statement index within its recipe text
    pub index: usize,
    pub statement: String,
    pub outcome: Outcome,
}

/// Per-statement outcomes of a recipe, nested recipes included.
#[derive(Debug, Default)]
pub struct RecipeReport {
    pub statements: Vec<StatementReport>,
}

impl RecipeReport {
    pub fn applied(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Applied { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, Outcome::Failed(_)))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&StatementReport, &ChefError)> {
        self.statements.iter().filter_map(|s| match &s.outcome {
            Outcome::Failed(e) => Some((s, e)),
            _ => None,
        })
    }

    fn count(&self, pred: impl Fn(&Outcome) -> bool) -> usize {
        self.statements.iter().filter(|s| pred(&s.outcome)).count()
    }
}

/// Interpretation state threaded through handlers. Handlers borrow it only
/// for the duration of their own call.
pub struct Session<'a> {
    pub chef: &'a Chef,
    pub dish: &'a mut DishDescription,
    pub report: &'a mut RecipeReport,
    pub depth: usize,
}

/// Reads recipe text into dish descriptions.
#[derive(Debug, Clone, Default)]
pub struct Chef {
    menu: Menu,
    config: ChefConfig,
}

impl Chef {
    pub fn new(config: ChefConfig) -> Self {
        Self {
            menu: Menu::standard(),
            config,
        }
    }

    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    /// Interpret recipe text, appending its effects to `dish`.
    pub fn read_recipe(&self, dish: &mut DishDescription, text: &str) -> RecipeReport {
        let mut report = RecipeReport::default();
        let mut session = Session {
            chef: self,
            dish,
            report: &mut report,
            depth: 0,
        };
        self.read_statements(&mut session, text);
        report
    }

    /// Read a recipe file into a fresh description.
    pub fn read_recipe_file(&self, path: &Path) -> Result<(DishDescription, RecipeReport), String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read recipe {}: {}", path.display(), e))?;
        let mut dish = DishDescription::new();
        let report = self.read_recipe(&mut dish, &text);
        Ok((dish, report))
    }

    fn read_statements(&self, session: &mut Session<'_>, text: &str) {
        for (index, statement) in text.split(self.config.delimiter).enumerate() {
            let outcome = self.apply_statement(session, statement);
            match &outcome {
                Outcome::Applied { command } => {
                    tracing::debug!(depth = session.depth, index, command, "statement applied");
                }
                Outcome::Skipped { reason } => {
                    tracing::debug!(depth = session.depth, index, %reason, "statement skipped");
                }
                Outcome::Failed(err) => {
                    tracing::warn!(depth = session.depth, index, error = %err, "statement failed");
                }
            }
            session.report.statements.push(StatementReport {
                depth: session.depth,
                index,
                statement: statement.trim().to_string(),
                outcome,
            });
        }
    }

    fn apply_statement(&self, session: &mut Session<'_>, statement: &str) -> Outcome {
        let (spec, cmd) = match self.menu.parse(statement) {
            Ok(Parsed::Command(spec, cmd)) => (spec, cmd),
            Ok(Parsed::Empty) => {
                return Outcome::Skipped {
                    reason: "empty statement".to_string(),
                }
            }
            Ok(Parsed::Unknown(name)) => {
                return Outcome::Skipped {
                    reason: format!("unknown command '{}'", name),
                }
            }
            Err(e) => return Outcome::Failed(e),
        };
        if !cmd.ignored.is_empty() {
            tracing::debug!(command = spec.name, ignored = ?cmd.ignored, "ignoring unknown tokens");
        }
        match (spec.handler)(session, &cmd) {
            Ok(()) => Outcome::Applied { command: spec.name },
            Err(e) => Outcome::Failed(e),
        }
    }
}

/// Kwargs for every declared value, plus the names that came from defaults.
fn kwargs_of(cmd: &ParsedCommand, desc: &mut IngredientDescription) {
    for (dest, parsed) in &cmd.values {
        desc.kwargs.insert((*dest).to_string(), parsed.value.clone());
        if parsed.source == ValueSource::Default {
            desc.defaulted.push((*dest).to_string());
        }
    }
}

/// `pierogi <image_path>`: file link + load ingredient + its own stage.
pub fn add_pierogi_desc(session: &mut Session<'_>, cmd: &ParsedCommand) -> Result<(), ChefError> {
    let path = cmd.text("image_path").unwrap_or_default();
    if path.is_empty() {
        return Err(ChefError::RecipeSyntax {
            statement: cmd.name.to_string(),
            reason: "pierogi needs an image path".to_string(),
        });
    }

    let dish = &mut *session.dish;
    let file = dish.add_file_link(path);
    let pierogi = dish.add_ingredient(
        IngredientDescription::new(IngredientKind::Pierogi)
            .with_kwarg(FILE_KWARG, Value::File(file)),
    );
    dish.add_recipe(vec![pierogi]);
    Ok(())
}

/// `sort`: sort ingredient, optionally seasoned by an implied threshold.
pub fn add_sort_desc(session: &mut Session<'_>, cmd: &ParsedCommand) -> Result<(), ChefError> {
    let mut sort = IngredientDescription::new(IngredientKind::Sort);
    kwargs_of(cmd, &mut sort);

    let implied = match session.chef.config.threshold {
        ThresholdPolicy::Always => true,
        ThresholdPolicy::Explicit => {
            cmd.is_explicit("lower_threshold") || cmd.is_explicit("upper_threshold")
        }
    };
    let threshold = implied.then(|| {
        let mut threshold = IngredientDescription::new(IngredientKind::Threshold);
        for name in ["lower_threshold", "upper_threshold"] {
            if let Some(parsed) = cmd.get(name) {
                threshold.kwargs.insert(name.to_string(), parsed.value.clone());
                if parsed.source == ValueSource::Default {
                    threshold.defaulted.push(name.to_string());
                }
            }
        }
        threshold
    });

    let dish = &mut *session.dish;
    let sort_id = dish.add_ingredient(sort);
    if let Some(threshold) = threshold {
        let season_id = dish.add_ingredient(threshold);
        dish.add_seasoning(sort_id, season_id);
    }
    dish.add_recipe(vec![sort_id]);
    Ok(())
}

/// `quantize`: quantize ingredient in its own stage.
pub fn add_quantize_desc(session: &mut Session<'_>, cmd: &ParsedCommand) -> Result<(), ChefError> {
    let mut quantize = IngredientDescription::new(IngredientKind::Quantize);
    kwargs_of(cmd, &mut quantize);

    let dish = &mut *session.dish;
    let id = dish.add_ingredient(quantize);
    dish.add_recipe(vec![id]);
    Ok(())
}

/// `recipe [path]`: splice another recipe file into the same description.
///
/// The nested recipe is read into a copy of the description and committed
/// only if every nested statement applied or was skipped. Otherwise the
/// description is left untouched, the nested effects are reported as rolled
/// back, and the first nested failure becomes this statement's error.
pub fn add_recipe_desc(session: &mut Session<'_>, cmd: &ParsedCommand) -> Result<(), ChefError> {
    let path = cmd
        .text("recipe_path")
        .map(PathBuf::from)
        .ok_or_else(|| ChefError::RecipeSyntax {
            statement: cmd.name.to_string(),
            reason: "recipe needs a path".to_string(),
        })?;
    let chef = session.chef;

    if session.depth + 1 > chef.config.max_recipe_depth {
        return Err(ChefError::NestedRecipe {
            path,
            reason: format!(
                "nesting deeper than {} recipes",
                chef.config.max_recipe_depth
            ),
        });
    }

    let text = std::fs::read_to_string(&path).map_err(|e| ChefError::NestedRecipe {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    tracing::info!(path = %path.display(), depth = session.depth + 1, "splicing nested recipe");
    let mut draft = session.dish.clone();
    let mut nested_report = RecipeReport::default();
    let mut nested = Session {
        chef,
        dish: &mut draft,
        report: &mut nested_report,
        depth: session.depth + 1,
    };
    chef.read_statements(&mut nested, &text);

    let failure = nested_report.failures().next().map(|(stmt, err)| {
        format!(
            "statement {} at depth {} failed: {}",
            stmt.index, stmt.depth, err
        )
    });
    match failure {
        None => {
            *session.dish = draft;
            session.report.statements.append(&mut nested_report.statements);
            Ok(())
        }
        Some(reason) => {
            for stmt in &mut nested_report.statements {
                if let Outcome::Applied { command } = stmt.outcome {
                    stmt.outcome = Outcome::Skipped {
                        reason: format!("{} rolled back", command),
                    };
                }
            }
            session.report.statements.append(&mut nested_report.statements);
            Err(ChefError::NestedRecipe { path, reason })
        }
    }
}
