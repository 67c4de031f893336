//! Mergetui — 2048-style tile-merging puzzle in the terminal.

mod app;
mod board;
mod error;
mod grid;
mod headless;
mod highscores;
mod input;
mod logging;
mod rank;
mod score;
mod theme;
mod tile;
mod ui;

use anyhow::Result;
use app::App;
use board::BoardConfig;
use clap::{Parser, ValueEnum};
use rank::RankTable;
use std::path::PathBuf;
use tracing::info;

/// Options derived from CLI that affect game behaviour (board shape, seed, settle timing).
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub board: BoardConfig,
    pub seed: u64,
    pub settle_ms: u64,
    pub no_animation: bool,
    pub frame_rate: f64,
    /// Where the best score is kept between sessions; `None` disables saving.
    pub best_file: Option<PathBuf>,
}

impl GameConfig {
    fn from_args(args: &Args) -> Result<Self> {
        let seed = args.seed.unwrap_or_else(rand::random);
        Ok(Self {
            board: BoardConfig {
                width: usize::from(args.width),
                height: usize::from(args.height),
                start_tiles: args.start_tiles,
                ranks: RankTable::powers_of_two(args.max_rank)?,
            },
            seed,
            settle_ms: args.settle_ms,
            no_animation: args.no_animation,
            frame_rate: args.frame_rate,
            best_file: (!args.no_save).then(highscores::default_path),
        })
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.log_file.as_deref(), &args.log_level)?;
    let config = GameConfig::from_args(&args)?;
    info!(seed = config.seed, width = args.width, height = args.height, "starting");

    if let Some(moves) = args.moves.as_deref() {
        return headless::run(&config, moves, args.layout.as_deref());
    }

    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    let mut app = App::new(config, theme)?;
    app.run()?;
    Ok(())
}

/// 2048-style sliding tile puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "mergetui",
    version,
    about = "2048-style sliding tile puzzle in the terminal. Slide tiles; equal tiles merge; reach 2048.",
    long_about = "Mergetui is a terminal take on 2048.\n\n\
        Every move slides all tiles as far as they go in one direction. Two tiles of the same \
        value that collide merge into one of twice the value, and each tile merges at most once \
        per move. After every move that changes the board a new 2 appears. The game ends when \
        the board is full and no neighbours match.\n\n\
        CONTROLS:\n  Arrows / WASD / hjkl  Slide    r  New game    q / Esc  Quit\n\n\
        Use --moves to play a scripted game without a terminal (e.g. --moves LLURDD --seed 7)."
)]
pub struct Args {
    /// Board width in cells.
    #[arg(long, default_value = "4", value_name = "COLS", value_parser = clap::value_parser!(u16).range(1..=8))]
    pub width: u16,

    /// Board height in cells.
    #[arg(long, default_value = "4", value_name = "ROWS", value_parser = clap::value_parser!(u16).range(1..=8))]
    pub height: u16,

    /// Random seed for tile spawns. Same seed + same moves = same game. Random if unset.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Settle interval in ms between a move and the next spawn (slide animation time).
    #[arg(long, default_value = "100", value_name = "MS")]
    pub settle_ms: u64,

    /// Tiles placed when a game starts.
    #[arg(long, default_value = "2", value_name = "N")]
    pub start_tiles: usize,

    /// Number of tile values (2, 4, 8, ...). Merging two tiles of the last value keeps that value.
    #[arg(long, default_value = "17", value_name = "N", value_parser = clap::value_parser!(u8).range(1..=31))]
    pub max_rank: u8,

    /// Path to theme file (btop-style theme[key]=\"value\"). Classic colours if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Disable slide animation and effects (spawn happens on the next frame).
    #[arg(long)]
    pub no_animation: bool,

    /// Do not load or save the best score.
    #[arg(long)]
    pub no_save: bool,

    /// Target render frames per second.
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Headless: apply these moves (U/D/L/R letters) and print the final board.
    #[arg(long, value_name = "MOVES")]
    pub moves: Option<String>,

    /// Headless: starting board instead of random tiles; rows separated by '/',
    /// one character per cell ('.' empty, 0-9/a-v rank).
    #[arg(long, value_name = "ROWS", requires = "moves")]
    pub layout: Option<String>,

    /// Write logs to this file.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log filter (e.g. info, debug, mergetui=trace).
    #[arg(long, default_value = "info", value_name = "FILTER")]
    pub log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}
