//! CLI tool for schema checks and form inspection.
//!
//! Provides commands for:
//! - Validating a schema file against the registered field converters
//! - Printing the synthesized form of one record type as JSON

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use scaffold_core::forms::{ConverterRegistry, FormOptions, FormSynthesizer};
use scaffold_core::schema::Schema;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a schema file and check every field kind has a converter
    Check {
        schema: PathBuf,
    },
    /// Print the form synthesized for one record type
    Form {
        schema: PathBuf,
        entity: String,
        /// Field left out of the form; repeatable
        #[arg(long)]
        exclude: Vec<String>,
        /// Keep a non-auto primary key as an editable field
        #[arg(long)]
        keep_pk: bool,
    },
}

fn load(path: &Path) -> anyhow::Result<Schema> {
    Schema::from_json_file(path).with_context(|| format!("Failed to load schema {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    match cli.command {
        Command::Check { schema } => {
            let parsed = load(&schema)?;
            ConverterRegistry::standard().check_schema(&parsed)?;
            for entity in parsed.entities() {
                println!("{}: {} field(s)", entity.name(), entity.fields().len());
            }
            tracing::info!("Schema {} is valid", schema.display());
        }
        Command::Form {
            schema,
            entity,
            exclude,
            keep_pk,
        } => {
            let parsed = load(&schema)?;
            let mut options = FormOptions::default();
            for field in exclude {
                options = options.exclude(field);
            }
            if keep_pk {
                options = options.keep_pk();
            }
            let target = parsed.entity(&entity)?;
            let spec = FormSynthesizer::default().synthesize(Some(target.as_ref()), &options)?;
            println!("{}", serde_json::to_string_pretty(&spec)?);
        }
    }
    Ok(())
}
