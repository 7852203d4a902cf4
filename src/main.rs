//! matrixfeed: feed-the-matrix arcade mini-game in the terminal.

mod app;
mod grid;
mod highscores;
mod input;
mod layout;
mod scheduler;
mod session;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use highscores::{FileStore, HighScores, MemoryStore, ScoreStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Options derived from CLI that affect game behaviour.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub tick_period: Duration,
    pub breakpoint: u32,
    pub cell_px: u32,
    pub animate: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = &args.log_file {
        init_logging(path)?;
    }
    let theme = theme::Theme::load(args.theme.as_deref()).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "theme not loaded, using default");
        theme::Theme::default()
    });
    let scores = HighScores::load(score_store(&args));
    let config = GameConfig {
        tick_period: Duration::from_millis(args.tick_ms.max(1)),
        breakpoint: args.breakpoint,
        cell_px: args.cell_px.max(1),
        animate: !args.no_animation,
    };
    let (term_cols, _) = crossterm::terminal::size().unwrap_or((80, 24));
    let mut app = App::new(config, theme, scores, term_cols);
    app.run()?;
    Ok(())
}

/// The terminal owns stdout, so logs only go to a file when asked for.
fn init_logging(path: &std::path::Path) -> Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_writer(Arc::new(file))
        .init();
    Ok(())
}

fn score_store(args: &Args) -> Box<dyn ScoreStore> {
    if args.no_persist {
        return Box::new(MemoryStore::default());
    }
    let path = match &args.scores_file {
        Some(p) => p.clone(),
        None => match highscores::default_path() {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, "no place for the high score, keeping it in memory");
                return Box::new(MemoryStore::default());
            }
        },
    };
    let store = FileStore::new(path);
    tracing::debug!(path = %store.path().display(), "high score file");
    Box::new(store)
}

/// Feed-the-matrix arcade mini-game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "matrixfeed",
    version,
    about = "Feed the matrix: draw cells on the grid before the scanline sweeps them. Hits heal, full columns pay a bonus, health always drains.",
    long_about = "matrixfeed is a terminal arcade mini-game.\n\n\
        Hold the left mouse button and drag across the grid to light cells. A scanline sweeps \
        one column every tick, consuming lit cells: 10 points and 3 health each, plus 500 points \
        and 20 health when the whole column was lit. Health drains by 2.5 every tick; at zero \
        the system fails.\n\n\
        CONTROLS:\n  Mouse drag   Light cells    Enter/Space  Start / reboot\n  R            Restart        Q / Esc      Quit\n\n\
        The grid has 16 columns on wide terminals and 8 on narrow ones; crossing the breakpoint \
        resets the game."
)]
pub struct Args {
    /// Scanline period in milliseconds.
    #[arg(long, default_value_t = scheduler::TICK_PERIOD.as_millis() as u64, value_name = "MS")]
    pub tick_ms: u64,

    /// Viewport width (in pixels) at which the grid switches from 8 to 16 columns.
    #[arg(long, default_value = "640", value_name = "PX")]
    pub breakpoint: u32,

    /// Pixels assumed per terminal column when comparing against the breakpoint.
    #[arg(long, default_value = "8", value_name = "PX")]
    pub cell_px: u32,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses the built-in palette if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// High score file. Defaults to $XDG_CONFIG_HOME/matrixfeed/highscore.
    #[arg(long, value_name = "FILE")]
    pub scores_file: Option<PathBuf>,

    /// Keep the high score in memory only.
    #[arg(long, conflicts_with = "scores_file")]
    pub no_persist: bool,

    /// Disable the column flash when the scanline consumes cells.
    #[arg(long)]
    pub no_animation: bool,

    /// Write logs to this file (filter with RUST_LOG, default info).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}
