use super::{invoke, resolve_project_path};
use crate::cli::ProjectArgs;
use crate::inject;
use anyhow::{Context, Result};
use std::path::Path;

/// Generate the specification and write it to `output`, relative to the
/// project root.
pub fn generate_openapi(project: &ProjectArgs, output: &Path) -> Result<()> {
    let directory = resolve_project_path(project)?;
    let generate = inject::openapi3_generator(&directory)?;
    let spec = invoke(&generate)?;

    println!("✏️ Writing output file");
    let path = directory.join(output);
    std::fs::write(&path, spec)
        .with_context(|| format!("Failed to write OpenAPI specification to: {}", path.display()))?;

    println!("✅ OpenAPI 3 specification generated!");
    Ok(())
}
