use crate::commands::{print_json, Context};
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct MigrateArgs {}

pub fn migrate(ctx: &Context<'_>, _args: MigrateArgs) -> Result<()> {
    // The store is migrated on open; this reports where it ended up.
    let version = ctx.store.schema_version()?;
    if ctx.json {
        print_json(&serde_json::json!({ "schema_version": version }))?;
    } else {
        println!("schema version {version}");
    }
    Ok(())
}
