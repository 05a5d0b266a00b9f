use anyhow::Result;
use peony_core::storage::schema::SCHEMA_VERSION;

use crate::output::OutputFormat;

pub fn run(format: OutputFormat) -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "version": version, "schema_version": SCHEMA_VERSION })
        ),
        OutputFormat::Text => println!("Peony v{version} (schema {SCHEMA_VERSION})"),
    }
    Ok(())
}
