use hairstyle_studio::{
    config::AppConfig,
    models::run::ItemStatus,
    services::{image_payload, studio::Studio},
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const DEFAULT_OUT_DIR: &str = "hairstyles";

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let mut args = std::env::args().skip(1);
    let Some(portrait) = args.next().map(PathBuf::from) else {
        eprintln!("usage: render <portrait.(png|jpg|webp)> [out_dir]");
        std::process::exit(2);
    };
    let out_dir = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR));

    let config = AppConfig::from_env().expect("Failed to load configuration");

    if let Err(e) = render(&config, &portrait, &out_dir).await {
        tracing::error!(error = %e, "Render failed");
        std::process::exit(1);
    }
}

/// Analyze one portrait, generate every style and write the results to `out_dir`.
async fn render(
    config: &AppConfig,
    portrait: &Path,
    out_dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let studio = Arc::new(Studio::from_config(config)?);

    let bytes = std::fs::read(portrait)?;
    let image = image_payload::from_bytes(&bytes)?;

    tracing::info!(portrait = %portrait.display(), "Analyzing portrait");
    let run = studio.select_source(image).await?;

    // Log progress as the scheduler publishes it
    let mut progress = run.subscribe();
    let run_id = run.id();
    let watcher = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let summary = progress.borrow_and_update().summary();
            tracing::info!(
                run_id = %run_id,
                pending = summary.pending,
                loading = summary.loading,
                succeeded = summary.succeeded,
                failed = summary.failed,
                "Progress"
            );
        }
    });

    let report = studio.generate(&run).await;
    watcher.abort();

    std::fs::create_dir_all(out_dir)?;
    let state = run.snapshot();
    for item in &state.items {
        match &item.status {
            ItemStatus::Success { image } => {
                let path = out_dir.join(image.file_name(item.id));
                std::fs::write(&path, image.decode()?)?;
                println!("{:>3}  {:<28} {}", item.id, item.descriptor.label, path.display());
            }
            ItemStatus::Error { message } => {
                println!("{:>3}  {:<28} failed: {}", item.id, item.descriptor.label, message);
            }
            other => {
                println!("{:>3}  {:<28} {}", item.id, item.descriptor.label, other);
            }
        }
    }

    println!(
        "{} generated, {} failed -> {}",
        report.succeeded,
        report.failed,
        out_dir.display()
    );
    Ok(())
}
