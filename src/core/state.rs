//! PC-010: Description persistence — load, save (atomic), format by extension.

use super::types::DishDescription;
use std::path::Path;

/// On-disk encoding of a description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// `.json` → JSON, anything else → YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Yaml,
        }
    }
}

/// Render a description in the given format.
pub fn render_description(dish: &DishDescription, format: Format) -> Result<String, String> {
    match format {
        Format::Yaml => serde_yaml_ng::to_string(dish).map_err(|e| e.to_string()),
        Format::Json => serde_json::to_string_pretty(dish).map_err(|e| e.to_string()),
    }
    .map_err(|e| format!("serialize error: {}", e))
}

/// Parse a description in the given format.
pub fn parse_description(content: &str, format: Format) -> Result<DishDescription, String> {
    match format {
        Format::Yaml => serde_yaml_ng::from_str(content).map_err(|e| e.to_string()),
        Format::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
    }
    .map_err(|e| format!("invalid description: {}", e))
}

/// Load a description file.
pub fn load_description(path: &Path) -> Result<DishDescription, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    parse_description(&content, Format::from_path(path))
        .map_err(|e| format!("{}: {}", path.display(), e))
}

/// Save a description atomically (write to temp, then rename).
pub fn save_description(path: &Path, dish: &DishDescription) -> Result<(), String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("cannot create dir {}: {}", parent.display(), e))?;
    }

    let content = render_description(dish, Format::from_path(path))?;

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = std::path::PathBuf::from(tmp_name);
    std::fs::write(&tmp_path, &content)
        .map_err(|e| format!("cannot write {}: {}", tmp_path.display(), e))?;
    std::fs::rename(&tmp_path, path).map_err(|e| {
        format!(
            "cannot rename {} → {}: {}",
            tmp_path.display(),
            path.display(),
            e
        )
    })?;

    Ok(())
}
