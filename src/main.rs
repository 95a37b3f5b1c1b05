//! Command-line interface for metadata-catalog

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use std::time::Duration;

#[cfg(feature = "cli")]
use metadata_catalog::config::{
    ExtractConfig, GenerateConfig, ScrapeConfig, DEFAULT_CATALOG_OUTPUT, DEFAULT_DOC_BASE_URL,
    DEFAULT_EXTENSION, DEFAULT_MAPPING_OUTPUT, DEFAULT_TOC_ENDPOINT, DEFAULT_XSD_OUTPUT,
};
#[cfg(feature = "cli")]
use metadata_catalog::{catalog, extractor, generator, scraper};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "metacatalog")]
#[command(author, version = metadata_catalog::VERSION, about = "Metadata API documentation catalog and XSD builder", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Map metadata type names to reference URLs from the documentation TOC
    Scrape {
        /// TOC endpoint returning JSON
        #[arg(long, default_value = DEFAULT_TOC_ENDPOINT)]
        endpoint: String,

        /// Base URL that TOC links are relative to
        #[arg(long, default_value = DEFAULT_DOC_BASE_URL)]
        base_url: String,

        /// Output JSON file
        #[arg(short, long, default_value = DEFAULT_MAPPING_OUTPUT)]
        output: PathBuf,

        /// Request timeout in seconds
        #[arg(long, default_value_t = 30)]
        timeout: u64,
    },

    /// Extract a catalog from a directory of XML reference pages
    Extract {
        /// Directory containing the reference pages
        #[arg(short, long, value_name = "DIR")]
        input: PathBuf,

        /// Output JSON file
        #[arg(short, long, default_value = DEFAULT_CATALOG_OUTPUT)]
        output: PathBuf,

        /// Extension of the files to read
        #[arg(short, long, default_value = DEFAULT_EXTENSION)]
        extension: String,

        /// Base URL for reference page links
        #[arg(long, default_value = DEFAULT_DOC_BASE_URL)]
        base_url: String,
    },

    /// Convert a catalog JSON file to an XSD
    Generate {
        /// Catalog JSON produced by `extract`
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output XSD file
        #[arg(short, long, default_value = DEFAULT_XSD_OUTPUT)]
        output: PathBuf,
    },
}

#[cfg(feature = "cli")]
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Scrape {
            endpoint,
            base_url,
            output,
            timeout,
        } => cmd_scrape(
            ScrapeConfig::new()
                .with_endpoint(endpoint)
                .with_base_url(base_url)
                .with_output(output)
                .with_timeout(Duration::from_secs(timeout)),
        ),
        Commands::Extract {
            input,
            output,
            extension,
            base_url,
        } => cmd_extract(
            ExtractConfig::new(input)
                .with_output(output)
                .with_extension(extension)
                .with_base_url(base_url),
        ),
        Commands::Generate { input, output } => {
            cmd_generate(GenerateConfig::new(input).with_output(output))
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn cmd_scrape(config: ScrapeConfig) -> metadata_catalog::Result<()> {
    println!("Metadata Types Scraper");
    println!("API Source: {}", config.endpoint);
    println!("{}", "=".repeat(60));

    let mapping = scraper::run(&config)?;

    println!();
    println!("Read {} metadata types from official documentation", mapping.len());
    println!("Saved mapping to {}", config.output.display());
    println!();
    println!("Sample mappings:");
    for (name, url) in mapping.iter().take(5) {
        println!("  {}: {}", name, url);
    }
    if mapping.len() > 5 {
        println!("  ... and {} more", mapping.len() - 5);
    }

    println!();
    println!("Complete Metadata Types Mapping:");
    println!("{}", "=".repeat(50));
    println!("{}", catalog::to_json_string(&mapping)?);
    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_extract(config: ExtractConfig) -> metadata_catalog::Result<()> {
    println!("Extracting metadata types from {}", config.input_dir.display());

    let report = extractor::run(&config)?;

    println!();
    println!("Files scanned: {}", report.files_scanned);
    println!("Metadata types: {}", report.catalog.len());
    println!("Fields: {}", report.field_count());
    if !report.untitled.is_empty() {
        println!("Files without a title: {}", report.untitled.len());
    }
    if !report.duplicates.is_empty() {
        println!("Duplicate titles (later file kept):");
        for dup in &report.duplicates {
            println!(
                "  {}: {} replaced {}",
                dup.title,
                dup.kept.display(),
                dup.replaced.display()
            );
        }
    }
    if !report.failures.is_empty() {
        println!("Failed files:");
        for failure in &report.failures {
            println!("  {}: {}", failure.path.display(), failure.error);
        }
    }
    println!("Saved catalog to {}", config.output.display());
    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_generate(config: GenerateConfig) -> metadata_catalog::Result<()> {
    println!("Converting {} to XSD format...", config.input.display());

    let summary = generator::run(&config)?;

    println!("Successfully converted {} metadata types to XSD", summary.type_count);
    println!("Output saved to: {}", config.output.display());
    println!("XSD file size: {:.1} KB", summary.bytes_written as f64 / 1024.0);
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
