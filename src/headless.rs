//! Scripted play without a terminal: apply a move string, print the result.

use crate::GameConfig;
use crate::board::{Board, BoardConfig, MoveStatus, RejectReason};
use crate::error::BoardError;
use crate::grid::{Coord, Direction};
use crate::rank::Rank;
use crate::score::Scoreboard;
use anyhow::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    pub accepted: usize,
    pub rejected: usize,
    pub game_over: bool,
}

pub fn run(config: &GameConfig, moves: &str, layout: Option<&str>) -> Result<()> {
    let directions = Direction::parse_sequence(moves)?;
    let mut scoreboard = Scoreboard::new();
    let mut board = match layout {
        Some(rows) => board_from_layout(&config.board, config.seed, rows)?,
        None => {
            let mut board = Board::new(&config.board, config.seed)?;
            scoreboard.apply(&board.new_game());
            board
        }
    };
    let summary = play(&mut board, &mut scoreboard, &directions)?;

    let moves: String = directions.iter().map(|d| d.letter()).collect();
    print!("{}", render(&board));
    println!(
        "seed {}  moves {}  accepted {}  rejected {}",
        config.seed, moves, summary.accepted, summary.rejected
    );
    println!(
        "score {}  merges {}  game over: {}",
        scoreboard.score,
        scoreboard.merges,
        if summary.game_over { "yes" } else { "no" }
    );
    Ok(())
}

/// Apply each move and settle it immediately. Stops at game over.
pub fn play(
    board: &mut Board,
    scoreboard: &mut Scoreboard,
    directions: &[Direction],
) -> Result<Summary, BoardError> {
    let mut summary = Summary::default();
    for &direction in directions {
        let outcome = board.request_move(direction);
        scoreboard.apply(&outcome.events);
        if outcome.is_accepted() {
            summary.accepted += 1;
            scoreboard.record_move();
            let settle = board.complete_settle()?;
            scoreboard.apply(&settle.events);
            if settle.game_over {
                break;
            }
        } else {
            summary.rejected += 1;
            if outcome.status == MoveStatus::Rejected(RejectReason::GameOver) {
                break;
            }
        }
    }
    summary.game_over = scoreboard.game_over;
    Ok(summary)
}

/// Build a board whose size and tiles come from `rows` ("01../..2./...."),
/// keeping the rank table and start tiles of `base`.
pub fn board_from_layout(base: &BoardConfig, seed: u64, rows: &str) -> Result<Board, BoardError> {
    let grid: Vec<Vec<Option<Rank>>> = rows
        .split('/')
        .map(|row| row.trim().chars().map(parse_cell).collect())
        .collect::<Result<_, _>>()?;
    let height = grid.len();
    let width = grid.first().map_or(0, Vec::len);
    if grid.iter().any(|row| row.len() != width) {
        return Err(BoardError::InvalidLayout(format!(
            "rows must all be {width} cells wide"
        )));
    }

    let config = BoardConfig {
        width,
        height,
        ..base.clone()
    };
    let mut board = Board::new(&config, seed)?;
    for (y, row) in grid.iter().enumerate() {
        for (x, cell) in row.iter().enumerate() {
            if let Some(rank) = cell {
                board.place_tile(Coord::new(x, y), *rank)?;
            }
        }
    }
    Ok(board)
}

fn parse_cell(c: char) -> Result<Option<Rank>, BoardError> {
    if c == '.' {
        return Ok(None);
    }
    c.to_digit(32)
        .map(|r| Some(Rank::new(r as u8)))
        .ok_or_else(|| BoardError::InvalidLayout(format!("unexpected cell '{c}'")))
}

/// Board as right-aligned tile values, one row per line.
pub fn render(board: &Board) -> String {
    let (width, _) = board.board_dimensions();
    let widest = board.ranks().descriptor(board.ranks().max_rank()).value;
    let pad = widest.to_string().len().max(4) + 1;
    let mut out = String::new();
    for row in board.snapshot().chunks(width) {
        for cell in row {
            let label = cell
                .map(|rank| board.ranks().descriptor(rank).value.to_string())
                .unwrap_or_else(|| ".".to_string());
            out.push_str(&format!("{label:>pad$}"));
        }
        out.push('\n');
    }
    out
}
