//! Layout and drawing: board, tiles (sliding during settle), sidebar, game over.

use crate::app::Screen;
use crate::board::{Board, BoardEvent};
use crate::grid::Coord;
use crate::rank::Rank;
use crate::score::Scoreboard;
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

/// Tile size in terminal cells.
const TILE_WIDTH: u16 = 7;
const TILE_HEIGHT: u16 = 3;
/// Gap between tiles.
const GAP: u16 = 1;
const SIDEBAR_WIDTH: u16 = 24;

/// Fade-in of a freshly spawned tile.
const SPAWN_FADE_MS: u32 = 160;
/// Fade-in of the game-over overlay.
const GAME_OVER_FADE_MS: u32 = 500;

/// A tile travelling from one cell to another during the settle interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Motion {
    pub from: Coord,
    pub to: Coord,
    pub rank: Rank,
    /// Source of a merge; the target stays put on `to`.
    pub merge: bool,
}

/// Motions described by a move's events: slides and merge sources.
pub fn motions(events: &[BoardEvent]) -> Vec<Motion> {
    events
        .iter()
        .filter_map(|event| match *event {
            BoardEvent::TileSlid { rank, from, to, .. } => Some(Motion {
                from,
                to,
                rank,
                merge: false,
            }),
            BoardEvent::TileMerged {
                rank,
                from,
                target_cell,
                ..
            } => Some(Motion {
                from,
                to: target_cell,
                rank,
                merge: true,
            }),
            _ => None,
        })
        .collect()
}

/// Running TachyonFX effects and the time they were last processed.
#[derive(Default)]
pub struct Effects {
    pub spawn: Option<(Coord, Effect)>,
    pub game_over: Option<Effect>,
    last_process: Option<Instant>,
}

impl Effects {
    pub fn clear(&mut self) {
        self.spawn = None;
        self.game_over = None;
        self.last_process = None;
    }

    pub fn start_spawn(&mut self, cell: Coord, theme: &Theme) {
        let effect = fx::fade_from(
            theme.empty,
            theme.empty,
            (SPAWN_FADE_MS, Interpolation::QuadOut),
        );
        self.spawn = Some((cell, effect));
    }

    pub fn start_game_over(&mut self, theme: &Theme) {
        self.game_over = Some(fx::fade_from(
            theme.bg,
            theme.bg,
            (GAME_OVER_FADE_MS, Interpolation::SineOut),
        ));
    }

    fn delta(&mut self, now: Instant) -> TfxDuration {
        let delta = self
            .last_process
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or(std::time::Duration::ZERO);
        self.last_process = Some(now);
        TfxDuration::from_millis(delta.as_millis().min(u32::MAX as u128) as u32)
    }
}

/// Tiles in flight and how far along they are (0.0..=1.0).
#[derive(Debug, Clone, Copy)]
pub struct SettleView<'a> {
    pub progress: f32,
    pub motions: &'a [Motion],
}

/// Outer board size (border + tiles + gaps) for a `width x height` grid.
pub fn board_pixel_size(width: usize, height: usize) -> (u16, u16) {
    let w = width as u16 * (TILE_WIDTH + GAP) + GAP + 2;
    let h = height as u16 * (TILE_HEIGHT + GAP) + GAP + 2;
    (w, h)
}

/// Board rect centred in `area` next to the sidebar.
fn board_rect(area: Rect, board: &Board) -> Rect {
    let (width, height) = board.board_dimensions();
    let (bw, bh) = board_pixel_size(width, height);
    let total_w = bw + SIDEBAR_WIDTH;
    Rect {
        x: area.x + area.width.saturating_sub(total_w) / 2,
        y: area.y + area.height.saturating_sub(bh) / 2,
        width: bw.min(area.width),
        height: bh.min(area.height),
    }
}

/// Top-left of a tile in float terminal coordinates, relative to the board rect.
fn cell_origin(coord: Coord) -> (f32, f32) {
    (
        f32::from(1 + GAP) + coord.x as f32 * f32::from(TILE_WIDTH + GAP),
        f32::from(1 + GAP) + coord.y as f32 * f32::from(TILE_HEIGHT + GAP),
    )
}

/// Tile rect at `progress` between `from` and `to`, clipped to `board`.
fn tile_rect(board: Rect, from: Coord, to: Coord, progress: f32) -> Rect {
    let (fx0, fy0) = cell_origin(from);
    let (tx0, ty0) = cell_origin(to);
    let t = progress.clamp(0.0, 1.0);
    let x = (fx0 + (tx0 - fx0) * t).round() as u16;
    let y = (fy0 + (ty0 - fy0) * t).round() as u16;
    let rect = Rect {
        x: board.x + x,
        y: board.y + y,
        width: TILE_WIDTH,
        height: TILE_HEIGHT,
    };
    rect.intersection(board)
}

fn cell_rect(board: Rect, coord: Coord) -> Rect {
    tile_rect(board, coord, coord, 0.0)
}

/// Draw the current screen. During settle, tiles in `settle` are drawn
/// between their cells; effects are advanced by the time since the last frame.
pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    board: &Board,
    scoreboard: &Scoreboard,
    theme: &Theme,
    settle: Option<SettleView<'_>>,
    effects: &mut Effects,
    now: Instant,
) {
    let area = frame.area();
    frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), area);

    let board_area = board_rect(area, board);
    draw_board(frame, board, theme, board_area, settle);
    draw_sidebar(frame, board, scoreboard, theme, area, board_area);

    let delta = effects.delta(now);
    if let Some((cell, effect)) = effects.spawn.as_mut() {
        frame.render_effect(effect, cell_rect(board_area, *cell), delta);
        if effect.done() {
            effects.spawn = None;
        }
    }

    if screen == Screen::GameOver {
        let overlay = draw_game_over(frame, scoreboard, theme, board_area);
        if let Some(effect) = effects.game_over.as_mut() {
            frame.render_effect(effect, overlay, delta);
        }
    }
}

fn draw_board(
    frame: &mut Frame,
    board: &Board,
    theme: &Theme,
    area: Rect,
    settle: Option<SettleView<'_>>,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .style(Style::default().bg(theme.bg));
    frame.render_widget(block, area);

    let arriving = |coord: Coord, merge: bool| {
        settle.and_then(|s| s.motions.iter().find(|m| m.merge == merge && m.to == coord))
    };

    for cell in board.grid().cells() {
        let rect = cell_rect(area, cell.coord);
        match board.tile_at(cell.coord) {
            Some(tile) if arriving(cell.coord, false).is_none() => {
                // Merge targets keep their old value until the source lands.
                let rank = match arriving(cell.coord, true) {
                    Some(m) if tile.locked => m.rank,
                    _ => tile.rank,
                };
                draw_tile(frame, theme, rect, board, rank);
            }
            _ => frame.render_widget(Block::default().style(Style::default().bg(theme.empty)), rect),
        }
    }

    if let Some(settle) = settle {
        for motion in settle.motions {
            let rect = tile_rect(area, motion.from, motion.to, settle.progress);
            draw_tile(frame, theme, rect, board, motion.rank);
        }
    }
}

fn draw_tile(frame: &mut Frame, theme: &Theme, rect: Rect, board: &Board, rank: Rank) {
    if rect.width == 0 || rect.height == 0 {
        return;
    }
    let (bg, fg) = theme.tile_colors(rank.index());
    let value = board.ranks().descriptor(rank).value;
    let mut lines = vec![Line::from(""); usize::from(rect.height / 2)];
    lines.push(Line::from(Span::styled(
        value.to_string(),
        Style::default().fg(fg).bold(),
    )));
    let tile = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().bg(bg).fg(fg));
    frame.render_widget(tile, rect);
}

fn draw_sidebar(
    frame: &mut Frame,
    board: &Board,
    scoreboard: &Scoreboard,
    theme: &Theme,
    area: Rect,
    board_area: Rect,
) {
    let x = board_area.x + board_area.width + 1;
    let rect = Rect {
        x,
        y: board_area.y,
        width: SIDEBAR_WIDTH
            .saturating_sub(1)
            .min((area.x + area.width).saturating_sub(x)),
        height: board_area.height.max(14).min(area.height),
    };
    if rect.width == 0 {
        return;
    }

    let label = Style::default().fg(theme.inactive_fg);
    let value = Style::default().fg(theme.main_fg).bold();
    let highest = board
        .highest_rank()
        .map(|r| board.ranks().descriptor(r).value)
        .unwrap_or(0);
    let best_style = if scoreboard.new_best {
        Style::default().fg(theme.title).bold()
    } else {
        value
    };
    let lines = vec![
        Line::from(Span::styled(" SCORE", label)),
        Line::from(Span::styled(format!(" {}", scoreboard.score), value)),
        Line::from(Span::styled(" BEST", label)),
        Line::from(Span::styled(format!(" {}", scoreboard.best), best_style)),
        Line::from(""),
        Line::from(vec![
            Span::styled(" moves  ", label),
            Span::styled(scoreboard.moves.to_string(), value),
        ]),
        Line::from(vec![
            Span::styled(" merges ", label),
            Span::styled(scoreboard.merges.to_string(), value),
        ]),
        Line::from(vec![
            Span::styled(" tile   ", label),
            Span::styled(highest.to_string(), value),
        ]),
        Line::from(""),
        Line::from(Span::styled(" ←↓↑→ / wasd / hjkl", label)),
        Line::from(Span::styled(" r  new game", label)),
        Line::from(Span::styled(" q  quit", label)),
    ];
    let sidebar = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(" 2048 ", Style::default().fg(theme.title).bold()))
            .border_style(Style::default().fg(theme.div_line)),
    );
    frame.render_widget(sidebar, rect);
}

/// Draw the game-over popup over the board; returns its rect.
fn draw_game_over(frame: &mut Frame, scoreboard: &Scoreboard, theme: &Theme, board: Rect) -> Rect {
    let w = 22u16.min(board.width);
    let h = 6u16.min(board.height);
    let popup = Rect {
        x: board.x + board.width.saturating_sub(w) / 2,
        y: board.y + board.height.saturating_sub(h) / 2,
        width: w,
        height: h,
    };
    let mut lines = vec![
        Line::from(Span::styled("GAME OVER", Style::default().fg(theme.title).bold())),
        Line::from(Span::styled(
            format!("score {}", scoreboard.score),
            Style::default().fg(theme.main_fg),
        )),
    ];
    if scoreboard.new_best {
        lines.push(Line::from(Span::styled(
            "new best!",
            Style::default().fg(theme.title),
        )));
    }
    lines.push(Line::from(Span::styled(
        "r: retry  q: quit",
        Style::default().fg(theme.inactive_fg),
    )));
    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.div_line))
                .style(Style::default().bg(theme.bg)),
        ),
        popup,
    );
    popup
}
