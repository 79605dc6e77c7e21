//! PC-011: CLI subcommands — read, cook, check, menu, schema, completions.

use crate::core::chef::{Chef, Outcome, RecipeReport};
use crate::core::menu::ArgKind;
use crate::core::state::{self, Format};
use crate::core::types::DishDescription;
use crate::core::{config, executor, validate};
use crate::kitchen::plan::PlanKitchen;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "chef",
    version,
    about = "Deferred-execution recipe pipelines — read recipes into dish descriptions, then cook them"
)]
pub struct Cli {
    /// Chef config file (YAML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log interpretation and execution details
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where recipe text comes from.
#[derive(clap::Args, Debug, Clone)]
pub struct RecipeInput {
    /// Recipe file
    pub recipe: Option<PathBuf>,

    /// Inline recipe text instead of a file
    #[arg(short, long, conflicts_with = "recipe")]
    pub text: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interpret a recipe and print its dish description
    Read {
        #[command(flatten)]
        input: RecipeInput,

        /// Write the description here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format for stdout (files use their extension)
        #[arg(long, value_enum, default_value = "yaml")]
        format: Format,
    },

    /// Interpret (or load) a description and cook it with the plan kitchen
    Cook {
        #[command(flatten)]
        input: RecipeInput,

        /// Cook a saved description instead of a recipe
        #[arg(short, long, conflicts_with_all = ["recipe", "text"])]
        description: Option<PathBuf>,
    },

    /// Check a saved description for dangling references
    Check {
        /// Saved description (YAML or JSON)
        description: PathBuf,
    },

    /// List recipe commands and their options
    Menu,

    /// Print the JSON schema of a dish description
    Schema,

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Dispatch a CLI command.
pub fn dispatch(cli: Cli) -> Result<(), String> {
    let cfg = config::load_config(cli.config.as_deref())?;
    let chef = Chef::new(cfg);
    match cli.command {
        Commands::Read {
            input,
            output,
            format,
        } => cmd_read(&chef, &input, output.as_deref(), format),
        Commands::Cook { input, description } => {
            cmd_cook(&chef, &input, description.as_deref())
        }
        Commands::Check { description } => cmd_check(&description),
        Commands::Menu => cmd_menu(&chef),
        Commands::Schema => cmd_schema(),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "chef", &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Interpret the recipe named by `input`, printing statement failures.
fn read_input(chef: &Chef, input: &RecipeInput) -> Result<DishDescription, String> {
    let (dish, report) = match (&input.text, &input.recipe) {
        (Some(text), _) => {
            let mut dish = DishDescription::new();
            let report = chef.read_recipe(&mut dish, text);
            (dish, report)
        }
        (None, Some(path)) => chef.read_recipe_file(path)?,
        (None, None) => return Err("no recipe given (pass a file or --text)".to_string()),
    };
    print_report(&report);
    Ok(dish)
}

fn print_report(report: &RecipeReport) {
    for (stmt, err) in report.failures() {
        eprintln!(
            "  WARNING: {}statement {} skipped: {}",
            "  ".repeat(stmt.depth),
            stmt.index,
            err
        );
    }
    for stmt in &report.statements {
        if let Outcome::Skipped { reason } = &stmt.outcome {
            if !stmt.statement.is_empty() {
                eprintln!("  note: '{}' ignored ({})", stmt.statement, reason);
            }
        }
    }
}

fn cmd_read(
    chef: &Chef,
    input: &RecipeInput,
    output: Option<&Path>,
    format: Format,
) -> Result<(), String> {
    let dish = read_input(chef, input)?;
    match output {
        Some(path) => {
            state::save_description(path, &dish)?;
            println!("Wrote {} ({})", path.display(), dish.summary());
        }
        None => print!("{}", state::render_description(&dish, format)?),
    }
    Ok(())
}

fn cmd_cook(
    chef: &Chef,
    input: &RecipeInput,
    description: Option<&Path>,
) -> Result<(), String> {
    let mut dish = match description {
        Some(path) => state::load_description(path)?,
        None => read_input(chef, input)?,
    };

    let errors = validate::validate_description(&dish);
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("  ERROR: {}", e);
        }
        return Err(format!("{} validation error(s)", errors.len()));
    }

    let mut kitchen = PlanKitchen::new();
    match executor::cook(&mut kitchen, &mut dish).map_err(|e| e.to_string())? {
        Some(plate) => {
            let yaml = serde_yaml_ng::to_string(&plate)
                .map_err(|e| format!("serialize error: {}", e))?;
            print!("{}", yaml);
            eprintln!("Served {} stage(s).", kitchen.served());
        }
        None => println!("Nothing to serve (no stages)."),
    }
    Ok(())
}

fn cmd_check(description: &Path) -> Result<(), String> {
    let dish = state::load_description(description)?;
    let errors = validate::validate_description(&dish);
    if errors.is_empty() {
        println!("OK: {} ({})", description.display(), dish.summary());
        return Ok(());
    }
    for e in &errors {
        eprintln!("  ERROR: {}", e);
    }
    Err(format!("{} validation error(s)", errors.len()))
}

fn cmd_menu(chef: &Chef) -> Result<(), String> {
    for name in chef.menu().names() {
        let Some(spec) = chef.menu().get(name) else {
            continue;
        };
        println!("{} — {}", spec.name, spec.about);
        for arg in &spec.args {
            let flags = match (arg.short, arg.long) {
                (Some(s), Some(l)) => format!("-{}, --{}", s, l),
                (Some(s), None) => format!("-{}", s),
                (None, Some(l)) => format!("--{}", l),
                (None, None) => format!("<{}>", arg.dest),
            };
            let default = match arg.kind {
                ArgKind::Int { default } => default.to_string(),
                ArgKind::Text { default } if default.is_empty() => {
                    "required".to_string()
                }
                ArgKind::Text { default } => default.to_string(),
            };
            println!("    {:<24} [{}] {}", flags, default, arg.help);
        }
    }
    Ok(())
}

fn cmd_schema() -> Result<(), String> {
    let schema = schemars::schema_for!(DishDescription);
    let json = serde_json::to_string_pretty(&schema)
        .map_err(|e| format!("serialize error: {}", e))?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inline(text: &str) -> RecipeInput {
        RecipeInput {
            recipe: None,
            text: Some(text.to_string()),
        }
    }

    #[test]
    fn test_pc011_cli_parses() {
        let cli = Cli::try_parse_from(["chef", "-v", "read", "--text", "sort", "--format", "json"])
            .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Read { input, format, .. } => {
                assert_eq!(input.text.as_deref(), Some("sort"));
                assert_eq!(format, Format::Json);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_pc011_cli_rejects_file_and_text() {
        let result = Cli::try_parse_from(["chef", "cook", "r.txt", "--text", "sort"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_pc011_read_to_file_then_check_and_cook() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("dish.yaml");
        let chef = Chef::default();
        cmd_read(
            &chef,
            &inline("pierogi /a.png; sort -l 9"),
            Some(&out),
            Format::Yaml,
        )
        .unwrap();
        assert!(out.exists());
        cmd_check(&out).unwrap();
        cmd_cook(&chef, &inline(""), Some(&out)).unwrap();
    }

    #[test]
    fn test_pc011_read_recipe_file() {
        let dir = tempfile::tempdir().unwrap();
        let recipe = dir.path().join("recipe.txt");
        std::fs::write(&recipe, "pierogi /a.png; quantize -k 2").unwrap();
        let input = RecipeInput {
            recipe: Some(recipe),
            text: None,
        };
        let dish = read_input(&Chef::default(), &input).unwrap();
        assert_eq!(dish.recipes.len(), 2);
    }

    #[test]
    fn test_pc011_no_input_is_error() {
        let input = RecipeInput {
            recipe: None,
            text: None,
        };
        assert!(read_input(&Chef::default(), &input)
            .unwrap_err()
            .contains("no recipe given"));
    }

    #[test]
    fn test_pc011_cook_empty_recipe() {
        cmd_cook(&Chef::default(), &inline("saute"), None).unwrap();
    }

    #[test]
    fn test_pc011_cook_fails_on_kitchen_error() {
        let err = cmd_cook(&Chef::default(), &inline("quantize -k 999"), None).unwrap_err();
        assert!(err.contains("1..=256"));
    }

    #[test]
    fn test_pc011_check_reports_dangling() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dish.json");
        let mut dish = DishDescription::new();
        dish.add_recipe(vec![crate::core::types::IngredientId::new()]);
        state::save_description(&path, &dish).unwrap();
        let err = cmd_check(&path).unwrap_err();
        assert!(err.contains("1 validation error"));
    }

    #[test]
    fn test_pc011_menu_and_schema() {
        cmd_menu(&Chef::default()).unwrap();
        cmd_schema().unwrap();
    }

    #[test]
    fn test_pc011_bad_config_path() {
        let cli = Cli::try_parse_from(["chef", "--config", "/nonexistent/chef.yaml", "menu"])
            .unwrap();
        assert!(dispatch(cli).unwrap_err().contains("cannot read config"));
    }
}
