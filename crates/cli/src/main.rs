use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use remix_pipeline::{
    generate_previews, BackendFactory, BackendKind, ClientConfig, OutputFormat, StylePreset,
    UploadedAsset,
};
use std::path::PathBuf;
use tracing::{info, warn};
use wizard::{Generation, Wizard};

#[derive(Parser)]
#[command(name = "dj-composer-cli")]
#[command(about = "DJ Composer CLI - Headless remix generation against the composer backend")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, global = true)]
    verbose: bool,

    /// Load a saved client config JSON instead of per-flag settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL
    #[arg(long, global = true, default_value = "http://localhost:8000")]
    api_url: String,

    /// Backend API flavor (tasks, process)
    #[arg(long, global = true, default_value = "tasks")]
    backend: String,

    /// Status polling cadence in milliseconds
    #[arg(long, global = true, default_value = "1000")]
    poll_interval_ms: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a remix of a local track
    Remix {
        /// Original audio file
        #[arg(short, long)]
        input: PathBuf,

        /// Optional style-reference audio file
        #[arg(short, long)]
        reference: Option<PathBuf>,

        /// Free-text style description
        #[arg(long)]
        style_text: Option<String>,

        /// Preset style (house, techno, trance, drum-n-bass)
        #[arg(short, long)]
        preset: String,

        /// Target BPM override
        #[arg(long)]
        bpm: Option<u32>,

        /// Output format (mp3, wav)
        #[arg(long, default_value = "mp3")]
        format: String,

        /// Directory for the downloaded remix
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },

    /// Generate a short preview for every preset style
    Preview {
        /// Original audio file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// List preset styles
    Presets,

    /// Check backend availability
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt().with_max_level(level).init();

    let config = resolve_config(&cli)?;

    match cli.command {
        Commands::Remix {
            input,
            reference,
            style_text,
            preset,
            bpm,
            format,
            out,
        } => remix_command(config, input, reference, style_text, preset, bpm, format, out).await,
        Commands::Preview { input } => preview_command(config, input).await,
        Commands::Presets => presets_command(),
        Commands::Health => health_command(config).await,
    }
}

fn resolve_config(cli: &Cli) -> Result<ClientConfig> {
    if let Some(path) = &cli.config {
        return ClientConfig::load(path)
            .with_context(|| format!("failed to load config from {:?}", path));
    }

    let backend = match cli.backend.as_str() {
        "tasks" => BackendKind::Tasks,
        "process" => BackendKind::Process,
        other => bail!("unknown backend flavor: {}", other),
    };

    Ok(ClientConfig::new(cli.api_url.clone())
        .with_backend(backend)
        .with_poll_interval_ms(cli.poll_interval_ms))
}

#[allow(clippy::too_many_arguments)]
async fn remix_command(
    config: ClientConfig,
    input: PathBuf,
    reference: Option<PathBuf>,
    style_text: Option<String>,
    preset: String,
    bpm: Option<u32>,
    format: String,
    out: PathBuf,
) -> Result<()> {
    let preset = StylePreset::from_id(&preset)
        .with_context(|| format!("unknown preset style: {}", preset))?;
    let format = parse_format(&format)?;

    let backend = BackendFactory::create(&config)?;
    let mut session = Wizard::new(backend, config.poll_interval()).with_optional_style_text();

    session.set_original(&input)?;
    if let Some(reference) = &reference {
        session.set_reference(reference)?;
    }
    if let Some(text) = style_text {
        session.set_style_text(text);
    }
    session.set_output_format(format);

    info!("Uploading {:?}", input);
    session.advance_to_style().await?;

    session.select_preset(preset);
    if let Some(bpm) = bpm {
        session.set_target_bpm(bpm);
    }
    session.advance_to_generate()?;

    info!(
        "Generating {} remix at {} BPM",
        preset.name(),
        session.selection().effective_bpm().unwrap_or(preset.bpm())
    );
    let mut rx = session.start_generation().await?;

    let bar = ProgressBar::new(100);
    let style = ProgressStyle::with_template("{spinner} [{bar:40}] {pos}% {msg}")
        .context("invalid progress bar template")?;
    bar.set_style(style.progress_chars("=> "));

    while session.generation() == Generation::Generating {
        let closed = rx.changed().await.is_err();
        session.refresh();
        if let Some(job) = session.job() {
            bar.set_position(job.progress as u64);
        }
        if closed {
            break;
        }
    }

    match session.generation() {
        Generation::Complete => {
            bar.finish_with_message("done");
            if let Some(job) = session.job() {
                if let (Some(bpm), Some(key)) = (job.bpm, job.key.as_deref()) {
                    info!("Source analysis: {:.0} BPM, key {}", bpm, key);
                }
                if let Some(rendered) = job.output_format.as_deref() {
                    info!("Rendered format: {}", rendered);
                }
            }
            let path = session.download(&out).await?;
            info!("Remix written to {:?}", path);
            Ok(())
        }
        _ => {
            bar.abandon_with_message("failed");
            bail!(
                "remix generation failed: {}",
                session.last_error().unwrap_or("unknown error")
            )
        }
    }
}

async fn preview_command(config: ClientConfig, input: PathBuf) -> Result<()> {
    let backend = BackendFactory::create(&config)?;

    let asset = UploadedAsset::from_path(&input)?;
    info!("Uploading {:?}", input);
    let remote = backend.upload(&asset).await?;

    info!("Generating previews for {} styles", StylePreset::ALL.len());
    let previews = generate_previews(
        backend,
        &remote,
        &StylePreset::ALL,
        config.poll_interval(),
    )
    .await?;

    for preview in previews {
        match &preview.job.output {
            Some(output) => info!("{:>12}: {}", preview.preset.id(), output),
            None => warn!(
                "{:>12}: {}",
                preview.preset.id(),
                preview.job.error.as_deref().unwrap_or("no output")
            ),
        }
    }

    Ok(())
}

fn presets_command() -> Result<()> {
    for preset in StylePreset::ALL {
        println!(
            "{:<12} {:>3} BPM  {} - {}",
            preset.id(),
            preset.bpm(),
            preset.name(),
            preset.description()
        );
    }
    Ok(())
}

async fn health_command(config: ClientConfig) -> Result<()> {
    let backend = BackendFactory::create(&config)?;
    if backend.is_available().await? {
        info!("Backend at {} is available", config.api_url);
        Ok(())
    } else {
        bail!("backend at {} is not reachable", config.api_url)
    }
}

fn parse_format(s: &str) -> Result<OutputFormat> {
    match s {
        "mp3" => Ok(OutputFormat::Mp3),
        "wav" => Ok(OutputFormat::Wav),
        other => bail!("unknown output format: {}", other),
    }
}
