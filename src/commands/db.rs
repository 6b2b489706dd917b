use super::{invoke, resolve_project_path};
use crate::cli::ProjectArgs;
use crate::inject;
use anyhow::Result;

pub fn migrate(project: &ProjectArgs) -> Result<()> {
    let directory = resolve_project_path(project)?;
    let migrate = inject::migrate(&directory)?;

    println!("💾 Running migrations...");
    invoke(&migrate)?;
    println!("✅ Database migrated!");
    Ok(())
}

pub fn seed(project: &ProjectArgs, seeders: &[String]) -> Result<()> {
    let directory = resolve_project_path(project)?;
    let seed = inject::seeder(&directory, seeders)?;

    println!("💾 Running seeders...");
    invoke(&seed)?;
    println!("✅ Database seeded!");
    Ok(())
}

pub fn clear(project: &ProjectArgs) -> Result<()> {
    let directory = resolve_project_path(project)?;
    let clear = inject::db_clear(&directory)?;

    println!("🗑️ Clearing database...");
    invoke(&clear)?;
    println!("✅ Database cleared!");
    Ok(())
}
