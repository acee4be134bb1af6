use clap::{Parser, Subcommand};
use media_gallery::UploadPart;
use std::path::PathBuf;
use std::sync::Arc;

mod config;
mod database;
mod error;
mod services;

use config::AppConfig;
use error::AppError;
use services::{render, MediaService};

/// Photo share media pipeline
#[derive(Parser, Debug)]
#[command(name = "photoshare", version, about)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, env = "PHOTOSHARE_CONFIG", default_value = "photoshare.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload image files as one batch
    Ingest {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Import files already present in the storage directory
    Reconcile,
    /// List a page of media, or `random` for a single random media
    List { page: Option<String> },
    /// Show one random media
    Random,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let failed = match setup(&cli.config) {
        Ok(service) => run(&service, cli.command).await,
        Err(e) => {
            println!("{}", render::<()>(Err(e)));
            true
        }
    };

    if failed {
        std::process::exit(1);
    }
}

fn setup(config_path: &std::path::Path) -> Result<MediaService, AppError> {
    let config = AppConfig::load(config_path)?;
    let store = database::init_database(&config.database)?;
    log::info!(
        "Serving {} as {}",
        config.gallery.storage_root,
        config.server.external_base()
    );
    MediaService::new(&config, Arc::new(store))
}

/// Runs one command, prints its JSON response and reports whether it failed
async fn run(service: &MediaService, command: Command) -> bool {
    match command {
        Command::Ingest { files } => {
            let result = match read_parts(&files) {
                Ok(parts) => service.upload(parts).await,
                Err(e) => Err(e),
            };
            print_result(result)
        }
        Command::Reconcile => print_result(service.refresh().await),
        Command::List { page } => print_result(service.get_media(page.as_deref()).await),
        Command::Random => print_result(service.get_media(Some("random")).await),
    }
}

fn print_result<T: serde::Serialize>(result: Result<T, AppError>) -> bool {
    let failed = result.is_err();
    println!("{}", render(result));
    failed
}

fn read_parts(files: &[PathBuf]) -> Result<Vec<UploadPart>, AppError> {
    files
        .iter()
        .map(|path| {
            let bytes = std::fs::read(path)?;
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            Ok(UploadPart::new("file", file_name, bytes))
        })
        .collect()
}
