use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};

use components_compiler::cache::{is_up_to_date, source_hash};
use components_compiler::component::CompiledComponent;
use components_compiler::discovery::{find_template_sources, load_templates, TemplateSource};
use components_compiler::finalize::{compile_templates, EmitOptions};
use components_compiler::roundtrip::verify_round_trip;

#[derive(Parser)]
#[command(
    name = "build-components",
    version,
    about = "Compile HTML <template> elements into DOM construction functions"
)]
struct Cli {
    /// HTML file, or a directory searched for .html files
    input: PathBuf,
    /// Output module (default: components.js)
    #[arg(short, long, default_value = "components.js")]
    out: PathBuf,
    /// JSON file with emit options
    #[arg(long)]
    config: Option<PathBuf>,
    /// Rewrite the output even when its source hash is current
    #[arg(long)]
    force: bool,
    /// Skip parsing the generated module before writing it
    #[arg(long)]
    no_verify: bool,
    /// Rebuild every template in memory and compare it with its source
    #[arg(long)]
    check_round_trip: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut options = match &cli.config {
        Some(path) => load_options(path)?,
        None => EmitOptions::default(),
    };
    if cli.no_verify {
        options.verify = false;
    }

    let sources = load_sources(&cli.input)?;
    let html: Vec<&str> = sources.iter().map(|s| s.html.as_str()).collect();
    let hash = source_hash(&html, &options);

    if !cli.force {
        if let Ok(existing) = fs::read_to_string(&cli.out) {
            if is_up_to_date(&existing, &hash) {
                log::info!("{} is up to date", cli.out.display());
                return Ok(());
            }
        }
    }

    let templates: Vec<_> = sources
        .iter()
        .flat_map(|s| s.templates.iter().cloned())
        .collect();

    if cli.check_round_trip {
        for template in &templates {
            verify_round_trip(template, &CompiledComponent::compile(template))
                .with_context(|| format!("round trip failed for '{}'", template.id))?;
        }
        log::info!("{} template(s) round-trip", templates.len());
    }

    let input = cli.input.to_string_lossy();
    let output = compile_templates(&templates, &options, &input, Some(hash))?;

    if let Some(dir) = cli.out.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    }
    fs::write(&cli.out, &output.code)
        .with_context(|| format!("failed to write {}", cli.out.display()))?;

    println!(
        "Generated: {} ({} components)",
        cli.out.display(),
        output.components.len()
    );
    Ok(())
}

fn load_options(path: &Path) -> Result<EmitOptions> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid options in {}", path.display()))
}

fn load_sources(input: &Path) -> Result<Vec<TemplateSource>> {
    if !input.is_dir() {
        return Ok(load_templates(&[input.to_path_buf()])?);
    }
    let files = find_template_sources(input);
    if files.is_empty() {
        log::warn!("no .html files under {}", input.display());
    }
    Ok(load_templates(&files)?)
}
