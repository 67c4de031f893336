//! App: terminal init, main loop, settle timing and key handling.

use crate::GameConfig;
use crate::board::{Board, BoardEvent};
use crate::grid::Direction;
use crate::highscores;
use crate::input::{Action, key_to_action};
use crate::score::Scoreboard;
use crate::theme::Theme;
use crate::ui::{self, Effects, Motion, SettleView};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Playing,
    GameOver,
}

/// A resolved move waiting for the settle interval to run out.
#[derive(Debug, Clone)]
struct Settle {
    started: Instant,
    motions: Vec<Motion>,
}

impl Settle {
    fn view(&self, now: Instant, total: Duration) -> SettleView<'_> {
        let total = total.as_secs_f32();
        let progress = if total > 0.0 {
            now.saturating_duration_since(self.started).as_secs_f32() / total
        } else {
            1.0
        };
        SettleView {
            progress: progress.min(1.0),
            motions: &self.motions,
        }
    }
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    board: Board,
    scoreboard: Scoreboard,
    screen: Screen,
    settle: Option<Settle>,
    effects: Effects,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme) -> Result<Self> {
        let board = Board::new(&config.board, config.seed)?;
        let mut scoreboard = Scoreboard::new();
        if let Some(path) = &config.best_file {
            scoreboard.best = highscores::load_best(path);
            debug!(best = scoreboard.best, path = %path.display(), "loaded best score");
        }
        let mut app = Self {
            config,
            theme,
            board,
            scoreboard,
            screen: Screen::Playing,
            settle: None,
            effects: Effects::default(),
        };
        app.new_game();
        Ok(app)
    }

    fn settle_duration(&self) -> Duration {
        if self.config.no_animation {
            Duration::ZERO
        } else {
            Duration::from_millis(self.config.settle_ms)
        }
    }

    /// Write the best score if this game raised it.
    fn save_best(&self) {
        let Some(path) = &self.config.best_file else {
            return;
        };
        if !self.scoreboard.new_best {
            return;
        }
        if let Err(err) = highscores::save_best(path, self.scoreboard.best) {
            warn!(%err, path = %path.display(), "could not save best score");
        }
    }

    fn new_game(&mut self) {
        self.save_best();
        self.settle = None;
        self.effects.clear();
        self.scoreboard.new_game();
        self.screen = Screen::Playing;
        let events = self.board.new_game();
        self.apply_events(&events);
    }

    fn apply_events(&mut self, events: &[BoardEvent]) {
        self.scoreboard.apply(events);
        if events.contains(&BoardEvent::GameOver) {
            self.screen = Screen::GameOver;
            info!(score = self.scoreboard.score, moves = self.scoreboard.moves, "game over");
            self.save_best();
            if !self.config.no_animation {
                self.effects.start_game_over(&self.theme);
            }
        }
    }

    fn request_move(&mut self, direction: Direction, now: Instant) {
        let outcome = self.board.request_move(direction);
        if outcome.is_accepted() {
            debug!(
                ?direction,
                points = outcome.points(),
                merges = outcome.merges(),
                "move accepted"
            );
            self.scoreboard.record_move();
            self.settle = Some(Settle {
                started: now,
                motions: ui::motions(&outcome.events),
            });
        } else {
            debug!(?direction, status = ?outcome.status, "move not taken");
        }
        self.apply_events(&outcome.events);
    }

    /// Run the spawn / game-over step once the settle interval has elapsed.
    fn tick_settle(&mut self, now: Instant) -> Result<()> {
        let Some(settle) = &self.settle else {
            return Ok(());
        };
        if now.saturating_duration_since(settle.started) < self.settle_duration() {
            return Ok(());
        }
        self.settle = None;
        let outcome = self.board.complete_settle()?;
        match outcome.spawned() {
            Some(cell) if !self.config.no_animation => self.effects.start_spawn(cell, &self.theme),
            _ => {}
        }
        self.apply_events(&outcome.events);
        Ok(())
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;
        terminal.hide_cursor()?;

        let result = self.run_loop(&mut terminal);
        self.save_best();

        // Restore
        let _ = terminal.show_cursor();
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let frame_duration = Duration::from_secs_f64(1.0 / self.config.frame_rate.max(1.0));
        loop {
            let now = Instant::now();
            self.tick_settle(now)?;

            let total = self.settle_duration();
            let settle = self.settle.as_ref().map(|s| s.view(now, total));
            terminal.draw(|f| {
                ui::draw(
                    f,
                    self.screen,
                    &self.board,
                    &self.scoreboard,
                    &self.theme,
                    settle,
                    &mut self.effects,
                    now,
                )
            })?;

            let timeout = frame_duration.saturating_sub(now.elapsed());
            if !event::poll(timeout)? {
                continue;
            }
            while event::poll(Duration::ZERO)? {
                let Event::Key(key) = event::read()? else {
                    continue;
                };
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key_to_action(key) {
                    Action::Quit => return Ok(()),
                    Action::NewGame => self.new_game(),
                    Action::Move(direction) => self.request_move(direction, Instant::now()),
                    Action::None => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{BoardConfig, BoardState};
    use crate::grid::Coord;
    use crate::rank::Rank;

    fn config(no_animation: bool) -> GameConfig {
        GameConfig {
            board: BoardConfig::default(),
            seed: 9,
            settle_ms: 100,
            no_animation,
            frame_rate: 60.0,
            best_file: None,
        }
    }

    #[test]
    fn test_new_app_starts_with_two_tiles() {
        let app = App::new(config(false), Theme::classic()).unwrap();
        assert_eq!(app.board.tile_count(), 2);
        assert_eq!(app.screen, Screen::Playing);
        assert_eq!(app.scoreboard.score, 0);
    }

    #[test]
    fn test_settle_waits_for_interval() {
        let mut app = App::new(config(false), Theme::classic()).unwrap();
        let start = Instant::now();
        let moved = Direction::ALL.into_iter().any(|d| {
            app.request_move(d, start);
            app.settle.is_some()
        });
        assert!(moved);
        assert_eq!(app.board.state(), BoardState::Settling);

        app.tick_settle(start + Duration::from_millis(10)).unwrap();
        assert_eq!(app.board.state(), BoardState::Settling);
        let view = app
            .settle
            .as_ref()
            .unwrap()
            .view(start + Duration::from_millis(50), app.settle_duration());
        assert!((view.progress - 0.5).abs() < 0.01);

        let before = app.board.tile_count();
        app.tick_settle(start + Duration::from_millis(100)).unwrap();
        assert!(app.settle.is_none());
        assert_eq!(app.board.tile_count(), before + 1);
        assert_eq!(app.scoreboard.moves, 1);
    }

    #[test]
    fn test_merge_scores_through_app() {
        let mut app = App::new(config(true), Theme::classic()).unwrap();
        let mut board = Board::new(&BoardConfig::default(), 1).unwrap();
        board.place_tile(Coord::new(2, 3), Rank::ZERO).unwrap();
        board.place_tile(Coord::new(3, 3), Rank::ZERO).unwrap();
        app.board = board;

        let now = Instant::now();
        app.request_move(Direction::Right, now);
        assert_eq!(app.scoreboard.score, 4);
        app.tick_settle(now).unwrap();
        assert_eq!(app.board.state(), BoardState::Idle);
        assert_eq!(app.board.tile_count(), 2);
    }

    #[test]
    fn test_best_score_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mergetui").join("highscores");
        highscores::save_best(&path, 100).unwrap();

        let mut cfg = config(true);
        cfg.best_file = Some(path.clone());
        let mut app = App::new(cfg.clone(), Theme::classic()).unwrap();
        assert_eq!(app.scoreboard.best, 100);

        app.scoreboard.apply(&[BoardEvent::ScoreAwarded { points: 256 }]);
        assert!(app.scoreboard.new_best);
        app.new_game();
        assert_eq!(highscores::load_best(&path), 256);

        let app = App::new(cfg, Theme::classic()).unwrap();
        assert_eq!(app.scoreboard.best, 256);
        assert_eq!(app.scoreboard.score, 0);
    }

    #[test]
    fn test_lower_score_does_not_overwrite_best() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("highscores");
        highscores::save_best(&path, 1000).unwrap();

        let mut cfg = config(true);
        cfg.best_file = Some(path.clone());
        let mut app = App::new(cfg, Theme::classic()).unwrap();
        app.scoreboard.apply(&[BoardEvent::ScoreAwarded { points: 8 }]);
        app.new_game();
        assert_eq!(highscores::load_best(&path), 1000);
    }
}
