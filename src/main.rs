//! # Video Batch Publisher - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Dialogo interattivo: cartelle, modalità, date manuali, consenso OAuth
//! - Avvio del batch, interrompibile con Ctrl-C
//!
//! ## Flusso di esecuzione:
//! 1. Carica e valida la configurazione
//! 2. Elenca le cartelle idonee (video + `metadata.json`)
//! 3. Chiede la selezione delle cartelle
//! 4. Ottiene il token OAuth (errore fatale prima di pianificazione e upload)
//! 5. Chiede la modalità e calcola il piano di pubblicazione
//! 6. Pubblica una cartella alla volta e archivia quelle riuscite
//!
//! ## Esempio di utilizzo:
//! ```bash
//! video-publisher ~/Videos/ready --config publisher.json --verbose
//! ```

use anyhow::{bail, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use video_batch_publisher::{
    credentials::resolve_path,
    json_output::JsonMessage,
    prompt::{describe_candidates, Prompt},
    upload::youtube::build_client,
    BatchPublisher, Config, CredentialProvider, DirectoryArchiver, FileManager, FolderCandidate, SchedulePlanner,
    YouTubeTransportFactory,
};

#[derive(Parser)]
#[command(name = "video-publisher")]
#[command(about = "Publish prepared video folders to YouTube, scheduled or immediately")]
struct Args {
    /// Directory holding one subfolder per video (defaults to the current directory)
    root: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit newline-delimited JSON events instead of progress bars
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout stays clean for JSON events
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();

    let json = args.json;
    if let Err(e) = run(args).await {
        if json {
            JsonMessage::error("Batch aborted".to_string(), Some(format!("{:#}", e))).emit();
        }
        return Err(e);
    }
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let root = match args.root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };
    if !root.is_dir() {
        bail!("Root directory does not exist: {}", root.display());
    }

    let mut config = match &args.config {
        Some(path) => Config::from_file(path).await?,
        None => Config::default(),
    };
    if args.json {
        config.json_output = true;
    }
    config.validate()?;
    let planner = SchedulePlanner::from_config(&config)?;

    let candidates = FileManager::find_candidates(&root, &config.done_dir)?;
    if candidates.is_empty() {
        bail!("No folder with a video and a metadata.json in {}", root.display());
    }

    let writer: Box<dyn Write> = if config.json_output {
        Box::new(std::io::stderr())
    } else {
        Box::new(std::io::stdout())
    };
    let mut prompt = Prompt::new(std::io::stdin().lock(), writer);

    let names = describe_candidates(&candidates);
    let selected: Vec<FolderCandidate> = prompt
        .select_folders(&names, config.max_selection)?
        .into_iter()
        .map(|i| candidates[i].clone())
        .collect();

    let client = build_client()?;
    let credentials = CredentialProvider::new(
        client.clone(),
        resolve_path(&root, &config.client_secret_path),
        resolve_path(&root, &config.token_path),
    );
    let (mode, slots) = prompt
        .authorize_and_plan(&credentials, &planner, selected.len())
        .await?;

    for (candidate, slot) in selected.iter().zip(&slots) {
        info!("📅 {} → {}", candidate.name, slot);
    }

    let factory = YouTubeTransportFactory::new(client, credentials, config.chunk_size);
    let archiver = DirectoryArchiver::new(config.done_dir_in(&root));
    let publisher = BatchPublisher::new(config, factory, archiver);

    tokio::select! {
        result = publisher.publish(&root, &selected, &slots, &mode) => {
            let (reports, stats) = result?;
            if stats.failed > 0 {
                let failed: Vec<&str> = reports
                    .iter()
                    .filter(|r| !r.outcome.is_published())
                    .map(|r| r.folder.as_str())
                    .collect();
                warn!("Left in place: {}", failed.join(", "));
            }
        }
        _ = tokio::signal::ctrl_c() => {
            bail!("Interrupted, remaining folders were not uploaded");
        }
    }

    Ok(())
}
