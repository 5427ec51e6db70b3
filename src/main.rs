use anyhow::Context;
use clap::{Parser, Subcommand};
use groundtruth_checker::{config, processing, server, Radius};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the interactive checker
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Run one comparison and print the summary table
    Compare {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        /// Matching radius in meters (defaults to the configured radius)
        #[arg(short, long)]
        radius: Option<f64>,
        /// Also write the not-yet-visited reference points to this GeoJSON file
        #[arg(short, long, value_name = "FILE")]
        export: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => {
            let app_config = config::AppConfig::load_from_file(&config)?;
            server::start_server(app_config).await?;
        }
        Commands::Compare { config, radius, export } => {
            let app_config = config::AppConfig::load_from_file(&config)?;
            let radius = match radius {
                Some(r) => Radius::new(r).context("Invalid --radius")?,
                None => app_config.default_radius()?,
            };

            let comparison = processing::compare(&app_config, radius)?;
            print!("{}", processing::format_table(&comparison.rows));

            if let Some(path) = export {
                let export = comparison.export();
                export.write_to(&path)?;
                println!("Wrote {} points to {:?}", export.count, path);
            }
        }
    }

    Ok(())
}
