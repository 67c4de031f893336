//! Score keeping: consumes board events, tracks the session best.

use crate::board::BoardEvent;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scoreboard {
    pub score: u32,
    pub best: u32,
    pub game_over: bool,
    pub moves: u32,
    pub merges: u32,
    /// Set when `best` was raised during the current game.
    pub new_best: bool,
}

impl Scoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset per-game counters; the best score survives.
    pub fn new_game(&mut self) {
        self.score = 0;
        self.game_over = false;
        self.moves = 0;
        self.merges = 0;
        self.new_best = false;
    }

    pub fn record_move(&mut self) {
        self.moves += 1;
    }

    pub fn apply(&mut self, events: &[BoardEvent]) {
        for event in events {
            match event {
                BoardEvent::ScoreAwarded { points } => self.add(*points),
                BoardEvent::TileMerged { .. } => self.merges += 1,
                BoardEvent::GameOver => self.game_over = true,
                _ => {}
            }
        }
    }

    fn add(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
        if self.score > self.best {
            self.best = self.score;
            self.new_best = true;
        }
    }
}
