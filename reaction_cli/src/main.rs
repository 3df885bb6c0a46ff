use clap::{Parser, Subcommand};
use reaction_core::cache::{JsonFileLikeStore, LikeStore};
use reaction_core::config::{parse_base, ReactionConfig};
use reaction_core::control::{ControlMap, HeartState, LikeButton, LikeControl};
use reaction_core::engine::ToggleOutcome;
use reaction_core::events::FeedEvent;
use reaction_core::gesture::TapOutcome;
use reaction_core::remote::HttpReactionApi;
use reaction_core::session::StaticSession;
use reaction_core::{Feed, FeedOptions};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

type CliFeed = Feed<HttpReactionApi, JsonFileLikeStore>;

#[derive(Parser, Debug)]
#[command(name = "reaction_cli")]
struct Args {
    /// Overrides REACTION_API_BASE.
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Overrides REACTION_SESSION_TOKEN.
    #[arg(long, global = true)]
    token: Option<String>,

    /// Overrides REACTION_STORE_DIR.
    #[arg(long, value_name = "PATH", global = true)]
    store_dir: Option<PathBuf>,

    /// Print emitted feed events as JSON lines.
    #[arg(long, default_value_t = false, global = true)]
    events: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Click the like button once.
    Toggle {
        #[arg(long)]
        item: String,

        /// Like count currently shown for the item.
        #[arg(long, default_value_t = 0)]
        count: i64,
    },
    /// Send touch-end events to the item's surface.
    Tap {
        #[arg(long)]
        item: String,

        #[arg(long, default_value_t = 0)]
        count: i64,

        #[arg(long, default_value_t = 2)]
        taps: u32,

        #[arg(long, default_value_t = 150)]
        gap_ms: u64,
    },
    /// Show whether the item is liked locally.
    Status {
        #[arg(long)]
        item: String,
    },
    /// Forget every local like.
    Reset,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let cfg = load_config(&args)?;

    let store = JsonFileLikeStore::open(&cfg.store_dir, &cfg.store_name)
        .map_err(|e| anyhow::anyhow!("failed to open like store in {}: {e}", cfg.store_dir.display()))?;

    if let Command::Status { item } = &args.command {
        let liked = store.has(item);
        println!("{item}: {}", if liked { "liked" } else { "not liked" });
        return Ok(());
    }

    let api = HttpReactionApi::new(cfg.api_base.clone(), cfg.http_timeout)?;
    let session = Arc::new(StaticSession::new(cfg.session_token.clone()));
    let controls = Arc::new(ControlMap::new());
    let feed: CliFeed = Feed::with_options(
        api,
        store,
        session,
        controls.clone(),
        FeedOptions::from(&cfg),
    );
    let events = args.events.then(|| feed.subscribe());

    match &args.command {
        Command::Toggle { item, count } => {
            let button = register(&controls, &feed, item, *count);
            let outcome = feed.toggle(&*button).await;
            report_toggle(item, &outcome);
            eprintln!("button: {} ({:?})", button.text(), button.heart());
        }
        Command::Tap {
            item,
            count,
            taps,
            gap_ms,
        } => {
            let button = register(&controls, &feed, item, *count);
            let surface = feed.add_listener(item);
            for n in 0..*taps {
                if n > 0 {
                    tokio::time::sleep(Duration::from_millis(*gap_ms)).await;
                }
                match surface.touch_end().await {
                    TapOutcome::Toggled(outcome) => report_toggle(item, &outcome),
                    other => eprintln!("tap {}: {other:?}", n + 1),
                }
            }
            feed.remove_listener(item);
            eprintln!("button: {} ({:?})", button.text(), button.heart());
        }
        Command::Reset => {
            feed.reset();
            eprintln!("local likes cleared");
        }
        Command::Status { .. } => {}
    }

    if let Some(rx) = events {
        print_events(rx)?;
    }
    Ok(())
}

fn load_config(args: &Args) -> anyhow::Result<ReactionConfig> {
    let mut cfg = ReactionConfig::from_env()?;
    if let Some(base) = args.api_base.as_deref() {
        cfg.api_base = parse_base(base)?;
    }
    if let Some(token) = args.token.as_deref() {
        let token = token.trim();
        cfg.session_token = (!token.is_empty()).then(|| token.to_string());
    }
    if let Some(dir) = args.store_dir.clone() {
        cfg.store_dir = dir;
    }
    tracing::debug!(
        api_base = %cfg.api_base,
        store_dir = %cfg.store_dir.display(),
        double_tap_ms = cfg.double_tap_window.as_millis() as u64,
        "config loaded"
    );
    Ok(cfg)
}

/// The heart starts filled when the item is in the local cache.
fn register(controls: &ControlMap, feed: &CliFeed, item: &str, count: i64) -> Arc<LikeButton> {
    let heart = if feed.engine().is_liked(item) {
        HeartState::Liked
    } else {
        HeartState::Unliked
    };
    let button = Arc::new(LikeButton::new(item, count, heart));
    controls.register(button.clone());
    button
}

fn report_toggle(item: &str, outcome: &ToggleOutcome) {
    match outcome {
        ToggleOutcome::Liked { count } => eprintln!("{item}: liked ({count})"),
        ToggleOutcome::Unliked { count } => eprintln!("{item}: unliked ({count})"),
        ToggleOutcome::Failed(e) => eprintln!("{item}: failed: {e}"),
        other => eprintln!("{item}: {other:?}"),
    }
}

fn print_events(mut rx: broadcast::Receiver<FeedEvent>) -> anyhow::Result<()> {
    loop {
        match rx.try_recv() {
            Ok(ev) => println!("{}", serde_json::to_string(&ev)?),
            Err(broadcast::error::TryRecvError::Lagged(n)) => eprintln!("({n} events dropped)"),
            Err(_) => return Ok(()),
        }
    }
}
