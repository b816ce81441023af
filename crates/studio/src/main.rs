//! `seedream` -- command-line surface for Seedream 4.0 generation.
//!
//! Each invocation mounts one surface over the file-backed history in
//! the data directory, runs a single command and exits (except `watch`).
//!
//! # Environment variables
//!
//! | Variable                     | Default       | Description                     |
//! |------------------------------|---------------|---------------------------------|
//! | `SEEDREAM_IMAGE_WEBHOOK_URL` | n8n test hook | Image generation endpoint       |
//! | `SEEDREAM_VIDEO_WEBHOOK_URL` | n8n test hook | Video generation endpoint       |
//! | `SEEDREAM_DATA_DIR`          | `.seedream`   | Persisted history and language  |
//! | `SEEDREAM_DOWNLOAD_DIR`      | `downloads`   | Where downloads are saved       |
//! | `RUST_LOG`                   | `seedream=info` | Log filter                    |

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use seedream_client::{DesktopHost, DownloadOutcome, GenerationClient, ShareOutcome};
use seedream_core::{Dimension, GeneratedImage, GeneratedVideo, GenerationRequest, Language, Quality, Style};
use seedream_events::EventBus;
use seedream_store::{preferences, FileStore, HistorySnapshot, KeyValueStore};
use seedream_studio::{GenerationSession, StudioConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Seconds between storage polls in `watch`.
const DEFAULT_WATCH_INTERVAL_SECS: u64 = 2;

#[derive(Parser)]
#[command(name = "seedream", version, about = "Generate images and videos with Seedream 4.0")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate an image from a prompt.
    Generate {
        prompt: String,
        #[arg(long, default_value_t = Style::default())]
        style: Style,
        #[arg(long, default_value_t = Dimension::default())]
        dimension: Dimension,
        #[arg(long, default_value_t = Quality::default())]
        quality: Quality,
        /// Also animate the result into a video.
        #[arg(long)]
        video: bool,
    },
    /// Generate again with the options of an earlier image.
    Retry { image_id: String },
    /// Animate an earlier image into a video.
    Video { image_id: String },
    /// List generated images (or videos), newest first.
    History {
        #[arg(long)]
        videos: bool,
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Save an image or video locally.
    Download { id: String },
    /// Share an image or video URL.
    Share { id: String },
    /// Show or set the interface language.
    Language { language: Option<Language> },
    /// Print history whenever it changes.
    Watch {
        #[arg(long, default_value_t = DEFAULT_WATCH_INTERVAL_SECS)]
        interval_secs: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seedream=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = StudioConfig::from_env();
    tracing::debug!(data_dir = %config.data_dir.display(), "Loaded configuration");

    let bus = Arc::new(EventBus::default());
    let storage: Arc<dyn KeyValueStore> =
        Arc::new(FileStore::new(config.data_dir.clone()).with_bus(Arc::clone(&bus)));

    let host = Arc::new(DesktopHost::new(config.client.download_dir.clone()));
    let client = Arc::new(GenerationClient::from_config(&config.client, host));
    let session = GenerationSession::mount(client, Arc::clone(&storage), bus).await;

    match cli.command {
        Command::Generate {
            prompt,
            style,
            dimension,
            quality,
            video,
        } => {
            let request = GenerationRequest::new(prompt, style, dimension, quality);
            let image = session.generate_image(&request).await?;
            print_image(&image);
            if video {
                print_video(&session.generate_video(&image.id).await?);
            }
        }
        Command::Retry { image_id } => print_image(&session.retry_image(&image_id).await?),
        Command::Video { image_id } => print_video(&session.generate_video(&image_id).await?),
        Command::History { videos, page } => print_history(&session.snapshot(), videos, page),
        Command::Download { id } => match session.download(&id).await? {
            DownloadOutcome::Saved(path) => println!("Saved {}", path.display()),
            DownloadOutcome::OpenedExternally => println!("Opened {id} in the default viewer"),
        },
        Command::Share { id } => match session.share(&id).await? {
            ShareOutcome::Shared => println!("Shared {id}"),
            // The host already printed the acknowledgement.
            ShareOutcome::CopiedToClipboard => {}
        },
        Command::Watch { interval_secs } => watch(&session, interval_secs).await,
        Command::Language { language: Some(language) } => {
            preferences::save_language(storage.as_ref(), language).await?;
            println!("Language set to {language}");
        }
        Command::Language { language: None } => {
            println!("{}", preferences::load_language(storage.as_ref()).await?);
        }
    }

    Ok(())
}

/// Print history on every change until interrupted.
///
/// Writes from this process arrive through the bus; other processes are
/// only visible on disk, so storage is also re-read on an interval.
async fn watch(session: &GenerationSession, interval_secs: u64) {
    let mut changes = session.history().subscribe();
    let mut poll = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    print_history(&changes.borrow_and_update(), false, 1);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = poll.tick() => {
                session.history().reload().await;
            }
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = changes.borrow_and_update().clone();
                println!();
                print_history(&snapshot, false, 1);
            }
        }
    }
}

fn print_image(image: &GeneratedImage) {
    println!(
        "{}  {}  [{} | {} | {}]  {}",
        image.id,
        image.created_at.format("%Y-%m-%d %H:%M"),
        image.style,
        image.dimension.label(),
        image.quality,
        image.prompt
    );
    println!("    {}", image.url);
}

fn print_video(video: &GeneratedVideo) {
    println!(
        "{}  {}  from {}  {}",
        video.id,
        video.created_at.format("%Y-%m-%d %H:%M"),
        video.image_id,
        video.prompt
    );
    println!("    {}", video.url);
}

fn print_history(snapshot: &HistorySnapshot, videos: bool, page: usize) {
    if videos {
        println!(
            "Videos ({} total, page {page}/{})",
            snapshot.videos.len(),
            snapshot.video_page_count().max(1)
        );
        snapshot.video_page(page).iter().for_each(print_video);
    } else {
        println!(
            "Images ({} total, page {page}/{})",
            snapshot.images.len(),
            snapshot.image_page_count().max(1)
        );
        snapshot.image_page(page).iter().for_each(print_image);
    }
}
