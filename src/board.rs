//! Board engine: one turn = `request_move` (slide + merge sweep) followed by
//! `complete_settle` (unlock, spawn, game-over check) once the host's settle
//! interval has elapsed.

use crate::error::BoardError;
use crate::grid::{Cell, Coord, Direction, Grid};
use crate::rank::{Rank, RankTable};
use crate::tile::{TileId, Tiles};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{debug, info};

/// Engine settings derived from CLI options.
#[derive(Debug, Clone)]
pub struct BoardConfig {
    pub width: usize,
    pub height: usize,
    /// Tiles placed by `new_game`.
    pub start_tiles: usize,
    pub ranks: RankTable,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            width: 4,
            height: 4,
            start_tiles: 2,
            ranks: RankTable::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardState {
    Idle,
    /// A move was resolved; waiting for `complete_settle`.
    Settling,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Nothing could slide or merge in that direction.
    NoChange,
    Settling,
    GameOver,
}

/// What happened on the board, in the order it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardEvent {
    TileSpawned {
        tile: TileId,
        cell: Coord,
        rank: Rank,
    },
    TileSlid {
        tile: TileId,
        rank: Rank,
        from: Coord,
        to: Coord,
    },
    /// `source` (of `rank`) left `from` and disappeared into the tile on `target_cell`.
    TileMerged {
        source: TileId,
        rank: Rank,
        from: Coord,
        target_cell: Coord,
        new_rank: Rank,
    },
    ScoreAwarded {
        points: u32,
    },
    GameOver,
    MoveRejected {
        reason: RejectReason,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStatus {
    /// Tiles moved; call `complete_settle` after the settle interval.
    PendingSettle,
    Rejected(RejectReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveOutcome {
    pub status: MoveStatus,
    pub events: Vec<BoardEvent>,
}

impl MoveOutcome {
    pub fn is_accepted(&self) -> bool {
        self.status == MoveStatus::PendingSettle
    }

    /// Sum of all `ScoreAwarded` points.
    pub fn points(&self) -> u32 {
        self.events
            .iter()
            .map(|e| match e {
                BoardEvent::ScoreAwarded { points } => *points,
                _ => 0,
            })
            .sum()
    }

    pub fn merges(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, BoardEvent::TileMerged { .. }))
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettleOutcome {
    pub events: Vec<BoardEvent>,
    pub game_over: bool,
}

impl SettleOutcome {
    pub fn spawned(&self) -> Option<Coord> {
        self.events.iter().find_map(|e| match e {
            BoardEvent::TileSpawned { cell, .. } => Some(*cell),
            _ => None,
        })
    }
}

/// Read-only view of one tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileSnapshot {
    pub rank: Rank,
    pub locked: bool,
}

/// Cells visited by a sweep towards `direction`: outer loop over columns,
/// inner over rows, tiles nearest the destination edge first. The edge line
/// itself is skipped since nothing there can move further.
pub fn scan_order(width: usize, height: usize, direction: Direction) -> Vec<Coord> {
    let mut order = Vec::with_capacity(width * height);
    match direction {
        Direction::Up => {
            for x in 0..width {
                for y in 1..height {
                    order.push(Coord::new(x, y));
                }
            }
        }
        Direction::Down => {
            for x in 0..width {
                for y in (0..height.saturating_sub(1)).rev() {
                    order.push(Coord::new(x, y));
                }
            }
        }
        Direction::Left => {
            for x in 1..width {
                for y in 0..height {
                    order.push(Coord::new(x, y));
                }
            }
        }
        Direction::Right => {
            for x in (0..width.saturating_sub(1)).rev() {
                for y in 0..height {
                    order.push(Coord::new(x, y));
                }
            }
        }
    }
    order
}

/// The board engine. Owns the grid, the live tiles and the random source.
#[derive(Debug, Clone)]
pub struct Board {
    grid: Grid,
    tiles: Tiles,
    ranks: RankTable,
    start_tiles: usize,
    state: BoardState,
    rng: SmallRng,
}

impl Board {
    /// Empty board in `Idle`. Call `new_game` to place the starting tiles.
    pub fn new(config: &BoardConfig, seed: u64) -> Result<Self, BoardError> {
        Ok(Self {
            grid: Grid::new(config.width, config.height)?,
            tiles: Tiles::new(),
            ranks: config.ranks.clone(),
            start_tiles: config.start_tiles,
            state: BoardState::Idle,
            rng: SmallRng::seed_from_u64(seed),
        })
    }

    #[inline]
    pub fn state(&self) -> BoardState {
        self.state
    }

    #[inline]
    pub fn board_dimensions(&self) -> (usize, usize) {
        (self.grid.width(), self.grid.height())
    }

    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[inline]
    pub fn ranks(&self) -> &RankTable {
        &self.ranks
    }

    #[inline]
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn tile_at(&self, coord: Coord) -> Option<TileSnapshot> {
        let id = self.grid.cell(coord)?.occupant()?;
        let tile = self.tiles.get(id)?;
        Some(TileSnapshot {
            rank: tile.rank(),
            locked: tile.locked,
        })
    }

    /// Row-major ranks of every cell.
    pub fn snapshot(&self) -> Vec<Option<Rank>> {
        self.grid
            .cells()
            .map(|cell| self.tile_at(cell.coord).map(|t| t.rank))
            .collect()
    }

    pub fn highest_rank(&self) -> Option<Rank> {
        self.tiles.iter().map(|t| t.rank()).max()
    }

    /// Clear the board and place the starting tiles.
    pub fn new_game(&mut self) -> Vec<BoardEvent> {
        self.tiles.clear(&mut self.grid);
        self.state = BoardState::Idle;
        let mut events = Vec::with_capacity(self.start_tiles + 1);
        for _ in 0..self.start_tiles {
            if let Some(event) = self.spawn_tile() {
                events.push(event);
            }
        }
        info!(
            width = self.grid.width(),
            height = self.grid.height(),
            tiles = self.tiles.len(),
            "new game"
        );
        self.evaluate_game_over(&mut events);
        events
    }

    /// Place a tile directly (setups and tests). Rank is clamped to the table.
    pub fn place_tile(&mut self, coord: Coord, rank: Rank) -> Result<TileId, BoardError> {
        let cell = self.grid.cell(coord).ok_or(BoardError::OutOfBounds {
            x: coord.x,
            y: coord.y,
        })?;
        if cell.is_occupied() {
            return Err(BoardError::CellOccupied {
                x: coord.x,
                y: coord.y,
            });
        }
        let rank = rank.min(self.ranks.max_rank());
        Ok(self.tiles.create(&mut self.grid, coord, rank))
    }

    /// Resolve a move. Only accepted in `Idle`; an accepted move leaves the
    /// board in `Settling` until `complete_settle`.
    pub fn request_move(&mut self, direction: Direction) -> MoveOutcome {
        match self.state {
            BoardState::Settling => return Self::rejected(RejectReason::Settling, Vec::new()),
            BoardState::GameOver => return Self::rejected(RejectReason::GameOver, Vec::new()),
            BoardState::Idle => {}
        }

        let (width, height) = self.board_dimensions();
        let mut events = Vec::new();
        let mut changed = false;
        for coord in scan_order(width, height, direction) {
            if let Some(id) = self.grid.cell(coord).and_then(Cell::occupant) {
                changed |= self.move_tile(id, direction, &mut events);
            }
        }

        if !changed {
            let mut events = Vec::new();
            if self.evaluate_game_over(&mut events) {
                return Self::rejected(RejectReason::GameOver, events);
            }
            debug!(?direction, "move rejected: no change");
            return Self::rejected(RejectReason::NoChange, events);
        }

        debug_assert_eq!(self.tiles.len(), self.grid.occupied_count());
        self.state = BoardState::Settling;
        debug!(?direction, events = events.len(), "move resolved");
        MoveOutcome {
            status: MoveStatus::PendingSettle,
            events,
        }
    }

    /// Finish the pending turn: unlock every tile, spawn one tile if there is
    /// room, then check for game over.
    pub fn complete_settle(&mut self) -> Result<SettleOutcome, BoardError> {
        if self.state != BoardState::Settling {
            return Err(BoardError::NotSettling);
        }
        self.tiles.unlock_all();
        self.state = BoardState::Idle;

        let mut events = Vec::with_capacity(2);
        if self.tiles.len() != self.grid.size() {
            if let Some(event) = self.spawn_tile() {
                events.push(event);
            }
        }
        let game_over = self.evaluate_game_over(&mut events);
        Ok(SettleOutcome { events, game_over })
    }

    /// Full board with no orthogonal pair that could merge.
    pub fn is_game_over(&self) -> bool {
        if !self.grid.is_full() {
            return false;
        }
        !self.tiles.iter().any(|tile| {
            let Some(coord) = tile.cell() else {
                return false;
            };
            Direction::ALL.iter().any(|&direction| {
                self.grid
                    .adjacent_cell(coord, direction)
                    .and_then(Cell::occupant)
                    .is_some_and(|neighbour| self.can_merge(tile.rank(), neighbour))
            })
        })
    }

    fn rejected(reason: RejectReason, mut events: Vec<BoardEvent>) -> MoveOutcome {
        events.push(BoardEvent::MoveRejected { reason });
        MoveOutcome {
            status: MoveStatus::Rejected(reason),
            events,
        }
    }

    fn evaluate_game_over(&mut self, events: &mut Vec<BoardEvent>) -> bool {
        if !self.is_game_over() {
            return false;
        }
        if self.state != BoardState::GameOver {
            self.state = BoardState::GameOver;
            info!(
                highest = ?self.highest_rank().map(|r| self.ranks.descriptor(r).value),
                "game over"
            );
            events.push(BoardEvent::GameOver);
        }
        true
    }

    fn spawn_tile(&mut self) -> Option<BoardEvent> {
        let cell = self.grid.random_empty_cell(&mut self.rng)?;
        let tile = self.tiles.create(&mut self.grid, cell, Rank::ZERO);
        debug!(%tile, %cell, "spawned tile");
        Some(BoardEvent::TileSpawned {
            tile,
            cell,
            rank: Rank::ZERO,
        })
    }

    fn can_merge(&self, rank: Rank, other: TileId) -> bool {
        self.tiles
            .get(other)
            .is_some_and(|t| t.rank() == rank && !t.locked)
    }

    /// Walk `id` towards `direction` until blocked; merge into an equal,
    /// unlocked tile or slide to the furthest empty cell. True if it moved.
    fn move_tile(&mut self, id: TileId, direction: Direction, events: &mut Vec<BoardEvent>) -> bool {
        let Some(tile) = self.tiles.get(id) else {
            return false;
        };
        let Some(start) = tile.cell() else {
            return false;
        };
        let rank = tile.rank();

        let mut furthest = None;
        let mut next = self.grid.adjacent_cell(start, direction).copied();
        while let Some(cell) = next {
            if let Some(occupant) = cell.occupant() {
                if self.can_merge(rank, occupant) {
                    self.merge_tiles(id, rank, occupant, cell.coord, events);
                    return true;
                }
                break;
            }
            furthest = Some(cell.coord);
            next = self.grid.adjacent_cell(cell.coord, direction).copied();
        }

        match furthest {
            Some(to) => {
                let from = self.tiles.slide_to(&mut self.grid, id, to).unwrap_or(start);
                events.push(BoardEvent::TileSlid {
                    tile: id,
                    rank,
                    from,
                    to,
                });
                true
            }
            None => false,
        }
    }

    fn merge_tiles(
        &mut self,
        source: TileId,
        rank: Rank,
        target: TileId,
        target_cell: Coord,
        events: &mut Vec<BoardEvent>,
    ) {
        let from = self.tiles.merge_into(&mut self.grid, source, target_cell);
        self.tiles.remove(source);

        let new_rank = self.ranks.next(rank);
        self.tiles.set_rank(target, new_rank);

        events.push(BoardEvent::TileMerged {
            source,
            rank,
            from: from.unwrap_or(target_cell),
            target_cell,
            new_rank,
        });
        events.push(BoardEvent::ScoreAwarded {
            points: self.ranks.descriptor(new_rank).points,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config(width: usize, height: usize) -> BoardConfig {
        BoardConfig {
            width,
            height,
            ..BoardConfig::default()
        }
    }

    /// Build a board from rows of rank digits; `.` is empty.
    fn board_from(rows: &[&str]) -> Board {
        let height = rows.len();
        let width = rows[0].len();
        let mut board = Board::new(&config(width, height), 1).unwrap();
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                if let Some(r) = c.to_digit(10) {
                    board
                        .place_tile(Coord::new(x, y), Rank::new(r as u8))
                        .unwrap();
                }
            }
        }
        board
    }

    fn rank_at(board: &Board, x: usize, y: usize) -> Option<u8> {
        board
            .tile_at(Coord::new(x, y))
            .map(|t| t.rank.index() as u8)
    }

    fn id_at(board: &Board, x: usize, y: usize) -> Option<TileId> {
        board.grid().get_cell(x, y).and_then(Cell::occupant)
    }

    fn row(board: &Board, y: usize) -> Vec<Option<u8>> {
        (0..board.board_dimensions().0)
            .map(|x| rank_at(board, x, y))
            .collect()
    }

    #[test]
    fn test_scan_order_leading_edge_first() {
        let up = scan_order(2, 3, Direction::Up);
        assert_eq!(
            up,
            vec![
                Coord::new(0, 1),
                Coord::new(0, 2),
                Coord::new(1, 1),
                Coord::new(1, 2)
            ]
        );
        let right = scan_order(3, 1, Direction::Right);
        assert_eq!(right, vec![Coord::new(1, 0), Coord::new(0, 0)]);
        let down = scan_order(1, 3, Direction::Down);
        assert_eq!(down, vec![Coord::new(0, 1), Coord::new(0, 0)]);
        assert_eq!(scan_order(4, 4, Direction::Left).len(), 12);
    }

    #[test]
    fn test_merge_pair_left() {
        let mut board = board_from(&["00..", "....", "....", "...."]);
        let outcome = board.request_move(Direction::Left);
        assert!(outcome.is_accepted());
        assert_eq!(row(&board, 0), vec![Some(1), None, None, None]);
        assert!(outcome.events.contains(&BoardEvent::ScoreAwarded { points: 4 }));
        assert_eq!(outcome.points(), 4);
        assert_eq!(board.state(), BoardState::Settling);
        assert_eq!(board.tile_count(), 1);

        let settle = board.complete_settle().unwrap();
        assert!(!settle.game_over);
        assert_eq!(board.tile_count(), 2);
        let spawned = settle.spawned().unwrap();
        assert_ne!(spawned, Coord::new(0, 0));
        assert_eq!(board.tile_at(spawned).unwrap().rank, Rank::ZERO);
        assert_eq!(board.state(), BoardState::Idle);
    }

    #[test]
    fn test_locked_target_does_not_merge_twice() {
        let mut board = board_from(&["112"]);
        let outcome = board.request_move(Direction::Left);
        assert_eq!(row(&board, 0), vec![Some(2), Some(2), None]);
        assert_eq!(outcome.merges(), 1);
        assert!(board.tile_at(Coord::new(0, 0)).unwrap().locked);
        board.complete_settle().unwrap();
        assert!(!board.tile_at(Coord::new(0, 0)).unwrap().locked);
    }

    #[test]
    fn test_four_equal_make_two_pairs() {
        let mut board = board_from(&["0000"]);
        board.request_move(Direction::Left);
        assert_eq!(row(&board, 0), vec![Some(1), Some(1), None, None]);

        let mut board = board_from(&["0000"]);
        board.request_move(Direction::Right);
        assert_eq!(row(&board, 0), vec![None, None, Some(1), Some(1)]);
    }

    #[test]
    fn test_slide_up_cascades_column() {
        let mut board = board_from(&["..", "1.", ".0", "10"]);
        let outcome = board.request_move(Direction::Up);
        assert!(outcome.is_accepted());
        assert_eq!(rank_at(&board, 0, 0), Some(2));
        assert_eq!(rank_at(&board, 0, 1), None);
        assert_eq!(rank_at(&board, 1, 0), Some(1));
        assert_eq!(rank_at(&board, 1, 1), None);
        assert!(outcome.events.contains(&BoardEvent::TileSlid {
            tile: id_at(&board, 0, 0).unwrap(),
            rank: Rank::new(1),
            from: Coord::new(0, 1),
            to: Coord::new(0, 0),
        }));
    }

    #[test]
    fn test_merge_clamps_at_max_rank() {
        let mut board = Board::new(
            &BoardConfig {
                width: 2,
                height: 1,
                start_tiles: 2,
                ranks: RankTable::powers_of_two(3).unwrap(),
            },
            3,
        )
        .unwrap();
        board.place_tile(Coord::new(0, 0), Rank::new(2)).unwrap();
        board.place_tile(Coord::new(1, 0), Rank::new(9)).unwrap();
        let outcome = board.request_move(Direction::Left);
        assert_eq!(rank_at(&board, 0, 0), Some(2));
        assert_eq!(outcome.points(), 8);
    }

    #[test]
    fn test_no_op_move_is_rejected_without_spawn() {
        let mut board = board_from(&["01..", "....", "....", "...."]);
        let before = board.snapshot();
        let outcome = board.request_move(Direction::Left);
        assert_eq!(outcome.status, MoveStatus::Rejected(RejectReason::NoChange));
        assert_eq!(
            outcome.events,
            vec![BoardEvent::MoveRejected {
                reason: RejectReason::NoChange
            }]
        );
        assert_eq!(board.snapshot(), before);
        assert_eq!(board.state(), BoardState::Idle);
        assert_eq!(board.complete_settle(), Err(BoardError::NotSettling));
    }

    #[test]
    fn test_moves_rejected_while_settling() {
        let mut board = board_from(&["0.", ".."]);
        assert!(board.request_move(Direction::Right).is_accepted());
        let outcome = board.request_move(Direction::Left);
        assert_eq!(outcome.status, MoveStatus::Rejected(RejectReason::Settling));
        assert_eq!(rank_at(&board, 1, 0), Some(0));
    }

    #[test]
    fn test_full_board_without_pairs_is_game_over() {
        let mut board = board_from(&["0101", "1010", "0101", "1010"]);
        assert!(board.is_game_over());
        for direction in Direction::ALL {
            let outcome = board.request_move(direction);
            assert!(!outcome.is_accepted());
            assert!(
                outcome
                    .events
                    .contains(&BoardEvent::MoveRejected {
                        reason: RejectReason::GameOver
                    })
            );
            assert_eq!(board.state(), BoardState::GameOver);
        }
    }

    #[test]
    fn test_full_board_with_pair_is_not_game_over() {
        let board = board_from(&["0101", "1010", "0101", "1011"]);
        assert!(!board.is_game_over());
        let board = board_from(&["01", ".0"]);
        assert!(!board.is_game_over());
    }

    #[test]
    fn test_settle_into_game_over() {
        let mut board = board_from(&["00", "12"]);
        board.request_move(Direction::Left);
        let settle = board.complete_settle().unwrap();
        // [1, 0] over [1, 2]: the spawned rank-0 tile lands at (1, 0); column 0 still pairs.
        assert!(!settle.game_over);
        assert_eq!(rank_at(&board, 1, 0), Some(0));

        let mut board = board_from(&["00", "21"]);
        board.request_move(Direction::Left);
        let settle = board.complete_settle().unwrap();
        assert!(settle.game_over);
        assert!(settle.events.contains(&BoardEvent::GameOver));
        assert_eq!(board.state(), BoardState::GameOver);
    }

    #[test]
    fn test_new_game_spawns_start_tiles() {
        let mut board = Board::new(&BoardConfig::default(), 42).unwrap();
        let events = board.new_game();
        assert_eq!(events.len(), 2);
        assert_eq!(board.tile_count(), 2);
        assert_eq!(board.state(), BoardState::Idle);
        board.new_game();
        assert_eq!(board.tile_count(), 2);
    }

    #[test]
    fn test_tiny_board_is_born_terminal() {
        let mut board = Board::new(&config(1, 1), 0).unwrap();
        let events = board.new_game();
        assert_eq!(board.tile_count(), 1);
        assert!(events.contains(&BoardEvent::GameOver));
        assert_eq!(board.state(), BoardState::GameOver);
    }

    #[test]
    fn test_place_tile_errors() {
        let mut board = board_from(&["0."]);
        assert_eq!(
            board.place_tile(Coord::new(0, 0), Rank::ZERO),
            Err(BoardError::CellOccupied { x: 0, y: 0 })
        );
        assert_eq!(
            board.place_tile(Coord::new(5, 0), Rank::ZERO),
            Err(BoardError::OutOfBounds { x: 5, y: 0 })
        );
    }

    /// Textbook 2048 line resolution towards index 0.
    fn resolve_line(line: &[Option<u8>], max: u8) -> Vec<Option<u8>> {
        let mut packed: Vec<u8> = Vec::new();
        let mut merged_last = false;
        for r in line.iter().flatten() {
            match packed.last_mut() {
                Some(top) if *top == *r && !merged_last => {
                    *top = (*top + 1).min(max);
                    merged_last = true;
                }
                _ => {
                    packed.push(*r);
                    merged_last = false;
                }
            }
        }
        let mut out: Vec<Option<u8>> = packed.into_iter().map(Some).collect();
        out.resize(line.len(), None);
        out
    }

    fn reference_move(
        cells: &[Option<u8>],
        w: usize,
        h: usize,
        d: Direction,
        max: u8,
    ) -> Vec<Option<u8>> {
        let mut out = vec![None; w * h];
        let lines: Vec<Vec<usize>> = match d {
            Direction::Left => (0..h).map(|y| (0..w).map(|x| y * w + x).collect()).collect(),
            Direction::Right => (0..h).map(|y| (0..w).rev().map(|x| y * w + x).collect()).collect(),
            Direction::Up => (0..w).map(|x| (0..h).map(|y| y * w + x).collect()).collect(),
            Direction::Down => (0..w).map(|x| (0..h).rev().map(|y| y * w + x).collect()).collect(),
        };
        for line in lines {
            let values: Vec<Option<u8>> = line.iter().map(|&i| cells[i]).collect();
            for (i, v) in line.iter().zip(resolve_line(&values, max)) {
                out[*i] = v;
            }
        }
        out
    }

    fn layout() -> impl Strategy<Value = Vec<Option<u8>>> {
        prop::collection::vec(prop::option::weighted(0.7, 0u8..4), 16)
    }

    fn board_with(cells: &[Option<u8>], seed: u64) -> Board {
        let mut board = Board::new(&config(4, 4), seed).unwrap();
        for (i, cell) in cells.iter().enumerate() {
            if let Some(r) = cell {
                board
                    .place_tile(Coord::new(i % 4, i / 4), Rank::new(*r))
                    .unwrap();
            }
        }
        board
    }

    fn ranks_of(board: &Board) -> Vec<Option<u8>> {
        board
            .snapshot()
            .into_iter()
            .map(|r| r.map(|r| r.index() as u8))
            .collect()
    }

    fn direction() -> impl Strategy<Value = Direction> {
        prop::sample::select(Direction::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn sweep_matches_line_reference(cells in layout(), d in direction()) {
            let mut board = board_with(&cells, 0);
            let max = board.ranks().max_rank().index() as u8;
            board.request_move(d);
            prop_assert_eq!(ranks_of(&board), reference_move(&cells, 4, 4, d, max));
        }

        #[test]
        fn tile_count_is_conserved(cells in layout(), d in direction(), seed in any::<u64>()) {
            let mut board = board_with(&cells, seed);
            let before = board.tile_count();
            let outcome = board.request_move(d);
            if outcome.is_accepted() {
                prop_assert_eq!(board.tile_count(), before - outcome.merges());
                let settle = board.complete_settle().unwrap();
                let spawned = usize::from(settle.spawned().is_some());
                prop_assert_eq!(board.tile_count(), before - outcome.merges() + spawned);
                prop_assert_eq!(spawned, 1);
            } else {
                prop_assert_eq!(board.tile_count(), before);
            }
            prop_assert_eq!(board.tile_count(), board.grid().occupied_count());
        }

        #[test]
        fn ranks_never_decrease_and_targets_merge_once(cells in layout(), d in direction()) {
            let mut board = board_with(&cells, 0);
            let before: Vec<(TileId, Rank)> = board
                .grid()
                .cells()
                .filter_map(|c| Some((c.occupant()?, board.tile_at(c.coord)?.rank)))
                .collect();
            let outcome = board.request_move(d);

            let mut targets: Vec<Coord> = outcome
                .events
                .iter()
                .filter_map(|e| match e {
                    BoardEvent::TileMerged { target_cell, .. } => Some(*target_cell),
                    _ => None,
                })
                .collect();
            let merges = targets.len();
            targets.sort();
            targets.dedup();
            prop_assert_eq!(targets.len(), merges);

            for cell in board.grid().cells() {
                if let (Some(id), Some(now)) = (cell.occupant(), board.tile_at(cell.coord)) {
                    let (_, old) = before.iter().find(|(prev, _)| *prev == id).copied().unwrap();
                    prop_assert!(now.rank >= old);
                    if now.locked {
                        prop_assert_eq!(now.rank, board.ranks().next(old));
                    } else {
                        prop_assert_eq!(now.rank, old);
                    }
                }
            }
        }

        #[test]
        fn no_op_leaves_board_untouched(cells in layout(), d in direction()) {
            let mut board = board_with(&cells, 0);
            let before = ranks_of(&board);
            let outcome = board.request_move(d);
            if !outcome.is_accepted() {
                prop_assert_eq!(ranks_of(&board), before);
                prop_assert!(board.complete_settle().is_err());
            } else {
                prop_assert_ne!(ranks_of(&board), before);
            }
        }

        #[test]
        fn game_over_iff_full_without_equal_neighbours(cells in prop::collection::vec(0u8..3, 16)) {
            let cells: Vec<Option<u8>> = cells.into_iter().map(Some).collect();
            let board = board_with(&cells, 0);
            let has_pair = (0..16).any(|i| {
                let (x, y) = (i % 4, i / 4);
                (x + 1 < 4 && cells[i] == cells[i + 1]) || (y + 1 < 4 && cells[i] == cells[i + 4])
            });
            prop_assert_eq!(board.is_game_over(), !has_pair);
        }

        #[test]
        fn same_seed_same_game(seed in any::<u64>(), moves in prop::collection::vec(direction(), 1..40)) {
            let mut a = Board::new(&BoardConfig::default(), seed).unwrap();
            let mut b = Board::new(&BoardConfig::default(), seed).unwrap();
            a.new_game();
            b.new_game();
            for d in moves {
                let oa = a.request_move(d);
                let ob = b.request_move(d);
                prop_assert_eq!(&oa, &ob);
                if oa.is_accepted() {
                    prop_assert_eq!(a.complete_settle().unwrap(), b.complete_settle().unwrap());
                }
                prop_assert_eq!(a.snapshot(), b.snapshot());
            }
        }
    }
}
