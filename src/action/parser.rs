//! Action Definition Parser
//!
//! Loads action definitions from YAML files and writes them back.

use std::error::Error;
use std::fs;

use log::{debug, info};

use super::model::{ActionDefinition, ActionKind};
use super::validator::validate_action;

/// Parses an action definition from YAML text without validating it.
pub fn parse_action(yaml_content: &str) -> Result<ActionDefinition, Box<dyn Error>> {
    let def: ActionDefinition = serde_yaml::from_str(yaml_content).map_err(|e| {
        format!(
            "Failed to parse action YAML: {}. Check the file format.",
            e
        )
    })?;
    Ok(def)
}

/// Loads an action definition from a YAML file.
///
/// This function:
/// 1. Reads and parses the YAML file
/// 2. Validates the definition
///
/// # Example
///
/// ```rust,no_run
/// use sheetflow::action::load_action;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let def = load_action("append.yaml")?;
///     println!("Loaded {} rows", def.values.len());
///     Ok(())
/// }
/// ```
pub fn load_action(path: &str) -> Result<ActionDefinition, Box<dyn Error>> {
    info!("Loading action from: {}", path);

    let yaml_content = fs::read_to_string(path).map_err(|e| {
        format!(
            "Failed to read action file '{}': {}. Check that the file exists and is readable.",
            path, e
        )
    })?;

    debug!("YAML content loaded ({} bytes)", yaml_content.len());

    let def = parse_action(&yaml_content)?;

    match def.action {
        ActionKind::AppendMultipleRows => info!(
            "Parsed {} with {} candidate rows",
            def.action,
            def.values.len()
        ),
        ActionKind::AppendRow => info!(
            "Parsed {} with {} values",
            def.action,
            def.row.as_ref().map_or(0, |r| r.width())
        ),
    }

    validate_action(&def)?;

    Ok(def)
}

/// Saves an action definition to a YAML file.
pub fn save_action(def: &ActionDefinition, path: &str) -> Result<(), Box<dyn Error>> {
    let yaml_content = serde_yaml::to_string(def)?;
    fs::write(path, yaml_content)?;
    info!("Action saved to: {}", path);
    Ok(())
}
