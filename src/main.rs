//! xreflect — generate XML API documentation from PHP sources.
//!
//! Scans a directory for class and interface declarations, parses the
//! phpdoc blocks attached to them, and writes one XML document
//! describing the full API surface: members, modifiers, parameters,
//! summaries, descriptions and tags.

mod model;
mod parser;
mod scanner;
mod walker;
mod xml;

use anyhow::{Context, Result};
use clap::Parser;
use regex::Regex;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "xreflect",
    about = "Generate XML API documentation from PHP source files"
)]
struct Cli {
    /// Directory to scan for source files
    path: PathBuf,

    /// File path filter (full regex)
    #[arg(long, default_value = r"\.php$")]
    file_pattern: String,

    /// Class name filter (full regex)
    #[arg(long, default_value = ".*")]
    class_pattern: String,

    /// Output file. Writes to stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path prefix cut from the front of fileName elements
    #[arg(long, default_value = "/")]
    doc_root: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let file_pattern =
        Regex::new(&cli.file_pattern).context("invalid --file-pattern regex")?;
    let class_pattern =
        Regex::new(&cli.class_pattern).context("invalid --class-pattern regex")?;

    let registry = scanner::scan(&cli.path, &file_pattern, &class_pattern)?;
    let tree = walker::build_document(&registry, &cli.doc_root);
    let output = xml::render_document(&tree);

    match &cli.output {
        Some(path) => fs::write(path, output)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => print!("{}", output),
    }

    Ok(())
}
