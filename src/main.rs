use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::path::{Path, PathBuf};

use markdocx::template::MapperOptions;
use markdocx::{Config, Converter, LocalDirSink, StyleMapper, TemplateReader};

#[derive(Parser)]
#[command(name = "markdocx")]
#[command(about = "Convert Markdown into .docx documents styled by a Word template")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a Markdown file into a .docx document
    Convert {
        /// Markdown file to convert
        input: PathBuf,

        /// Word template whose styles the output uses
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Directory the document is written to
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Show the styles a template defines and how elements map onto them
    Inspect {
        template: PathBuf,

        /// Print the mapping as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the default configuration file
    InitConfig,
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if path.is_some() {
        config.apply_env(|key| std::env::var(key).ok());
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    let env = env_logger::Env::default().default_filter_or(&config.logging.level);
    env_logger::Builder::from_env(env).init();

    let problems = config.validate();
    if !problems.is_empty() {
        for problem in &problems {
            warn!("Configuration: {problem}");
        }
        bail!("invalid configuration ({} problem(s))", problems.len());
    }

    match cli.command {
        Commands::Convert {
            input,
            template,
            output_dir,
        } => convert(config, &input, template.as_deref(), output_dir).await,
        Commands::Inspect { template, json } => inspect(&config, &template, json),
        Commands::InitConfig => {
            Config::init_default()?;
            match Config::get_config_path() {
                Some(path) => println!("Wrote default configuration to {}", path.display()),
                None => println!("Wrote default configuration"),
            }
            Ok(())
        }
    }
}

async fn convert(
    mut config: Config,
    input: &Path,
    template: Option<&Path>,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    if let Some(dir) = output_dir {
        config.output.dir = dir;
    }
    if let Some(template) = template {
        if !TemplateReader::exists(template) {
            bail!("Template not found: {}", template.display());
        }
    }

    let markdown = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let sink = LocalDirSink::from_config(&config.output);
    let converter = Converter::new(config)?;
    let url = converter
        .convert_and_upload(&markdown, template, &sink)
        .await
        .map_err(|e| anyhow!(e.localized(converter.language())))?;

    info!("Converted {}", input.display());
    println!("{url}");
    Ok(())
}

fn inspect(config: &Config, path: &Path, json: bool) -> Result<()> {
    let reader = TemplateReader::load(path)
        .with_context(|| format!("Failed to load template {}", path.display()))?;
    let options = MapperOptions {
        fallback_style: config.template.fallback_style.clone(),
        log_mappings: false,
    };
    let mapper = StyleMapper::new(reader.into(), options);
    let summary = mapper.mapping_summary();

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let reader = mapper.reader();
    println!("Template: {}", path.display());
    println!(
        "Styles: {} paragraph, {} character, {} table",
        reader.paragraph_styles().len(),
        reader.character_styles().len(),
        reader.table_styles().len()
    );
    if let Some(page) = reader.page_settings() {
        println!(
            "Page: {}x{} mm, margins {}/{}/{}/{} mm",
            page.width,
            page.height,
            page.margin_top,
            page.margin_right,
            page.margin_bottom,
            page.margin_left
        );
    }

    println!();
    println!("{:<14} {:<24} {}", "Element", "Style", "Source");
    for (element, style) in &summary {
        let source = if style.native { "template" } else { "fallback" };
        println!("{:<14} {:<24} {source}", element.to_string(), style.name);
    }

    let report = mapper.validate_mappings();
    if !report.is_valid {
        println!();
        println!("{} element(s) use the fallback style", report.missing.len());
    }

    if let Err(e) = mapper.fallback_style() {
        warn!("{e}; conversions with this template will fail");
    }
    Ok(())
}
