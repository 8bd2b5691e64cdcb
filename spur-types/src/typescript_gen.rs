use std::path::{Path, PathBuf};

use ts_rs::TS;

/// Types the front end consumes, in output order
pub const EXPORTED_TYPES: &[&str] = &["Role", "ChatMessage", "RunMode", "RunState", "TaskState"];

pub fn generate_typescript_definitions(
    type_names: &[&str],
) -> Result<String, Box<dyn std::error::Error>> {
    if type_names.is_empty() {
        return Err("No type names provided".into());
    }

    let mut definitions = Vec::new();

    for name in type_names {
        let type_def = export_type(name)?;
        let cleaned = clean_type(type_def);

        if !cleaned.trim().is_empty() {
            definitions.push(cleaned);
        }
    }

    Ok(definitions.join("\n\n"))
}

/// Write every exported type into `{output_dir}/types.ts`
pub fn write_typescript_bindings(output_dir: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let output = generate_typescript_definitions(EXPORTED_TYPES)?;

    std::fs::create_dir_all(output_dir)?;
    let output_path = output_dir.join("types.ts");
    std::fs::write(&output_path, format!("{}\n", output))?;

    Ok(output_path)
}

fn export_type(name: &str) -> Result<String, Box<dyn std::error::Error>> {
    use crate::*;

    let result = match name {
        "Role" => Role::export_to_string()?,
        "ChatMessage" => ChatMessage::export_to_string()?,
        "RunMode" => RunMode::export_to_string()?,
        "RunState" => RunState::export_to_string()?,
        "TaskState" => TaskState::export_to_string()?,

        _ => {
            return Err(format!(
                "Unknown type: '{}'. Exported types are: {}",
                name,
                EXPORTED_TYPES.join(", ")
            )
            .into());
        }
    };

    Ok(result)
}

fn clean_type(mut type_def: String) -> String {
    type_def.retain(|c| c != '\r');

    let lines: Vec<&str> = type_def.lines().collect();

    let filtered: Vec<&str> = lines
        .iter()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.starts_with("import type")
                && !trimmed.starts_with("// This file was generated")
        })
        .cloned()
        .collect();

    filtered.join("\n").trim().to_string()
}
