use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("frontend/api-types"));

    let output_path = spur_types::write_typescript_bindings(&output_dir)?;
    println!("Generated TypeScript types in {}", output_path.display());

    Ok(())
}
