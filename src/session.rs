//! Game session: IDLE / PLAYING / GAMEOVER, score, health, scanline.

use crate::grid::{CellPos, Grid, ROWS};
use crate::highscores::HighScores;
use crate::scheduler::Ticker;
use std::time::{Duration, Instant};

pub const MAX_HEALTH: f64 = 100.0;
/// Health lost every tick, hit or not.
pub const HEALTH_DECAY: f64 = 2.5;

const POINTS_PER_HIT: u32 = 10;
const FULL_COLUMN_POINTS: u32 = 500;
const HEALTH_PER_HIT: f64 = 3.0;
const FULL_COLUMN_HEALTH: f64 = 20.0;

/// Observable state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Playing,
    GameOver,
}

/// The ticker only exists while playing.
#[derive(Debug, Clone)]
enum Phase {
    Idle,
    Playing(Ticker),
    GameOver,
}

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutcome {
    /// Column swept by this tick.
    pub column: usize,
    pub hits: usize,
    pub full: bool,
    pub game_over: bool,
}

#[derive(Debug, Clone)]
pub struct Session {
    grid: Grid,
    phase: Phase,
    score: u32,
    health: f64,
    scan_column: usize,
    period: Duration,
    /// Last game over beat the stored best.
    new_record: bool,
}

impl Session {
    pub fn new(columns: usize, period: Duration) -> Self {
        Self {
            grid: Grid::new(columns, ROWS),
            phase: Phase::Idle,
            score: 0,
            health: MAX_HEALTH,
            scan_column: 0,
            period,
            new_record: false,
        }
    }

    pub fn state(&self) -> State {
        match self.phase {
            Phase::Idle => State::Idle,
            Phase::Playing(_) => State::Playing,
            Phase::GameOver => State::GameOver,
        }
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        matches!(self.phase, Phase::Playing(_))
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn health(&self) -> f64 {
        self.health
    }

    pub fn scan_column(&self) -> usize {
        self.scan_column
    }

    pub fn columns(&self) -> usize {
        self.grid.columns()
    }

    pub fn rows(&self) -> usize {
        self.grid.rows()
    }

    pub fn new_record(&self) -> bool {
        self.new_record
    }

    /// Time until the next tick, if playing.
    pub fn until_next_tick(&self, now: Instant) -> Option<Duration> {
        match &self.phase {
            Phase::Playing(ticker) => Some(ticker.until_next(now)),
            _ => None,
        }
    }

    /// Fresh game from any state. Any previous ticker is dropped and a new one bound here.
    pub fn start(&mut self, now: Instant) {
        let (columns, rows) = (self.grid.columns(), self.grid.rows());
        self.grid.reset(columns, rows);
        self.score = 0;
        self.health = MAX_HEALTH;
        self.scan_column = 0;
        self.new_record = false;
        self.phase = Phase::Playing(Ticker::new(now, self.period));
        tracing::info!(columns, rows, "session started");
    }

    /// Column count changed: discard whatever was going on. Returns false if nothing changed.
    pub fn relayout(&mut self, columns: usize) -> bool {
        if columns == self.grid.columns() {
            return false;
        }
        let was = self.state();
        tracing::info!(
            columns,
            previous = ?was,
            discarded = self.grid.active_count(),
            score = self.score,
            "layout changed, session reset"
        );
        self.grid.reset(columns, ROWS);
        self.phase = Phase::Idle;
        self.score = 0;
        self.health = MAX_HEALTH;
        self.scan_column = 0;
        self.new_record = false;
        true
    }

    /// Player input. Ignored unless playing and for positions off the grid;
    /// returns whether a cell was newly lit.
    pub fn activate(&mut self, pos: CellPos) -> bool {
        if !self.is_playing() || self.grid.is_active(pos.row, pos.col) {
            return false;
        }
        self.grid.activate_at(pos)
    }

    /// Apply every tick that is due at `now`.
    pub fn advance(&mut self, now: Instant, scores: &mut HighScores) -> Vec<TickOutcome> {
        let due = match &mut self.phase {
            Phase::Playing(ticker) => ticker.poll(now),
            _ => return Vec::new(),
        };
        let mut outcomes = Vec::with_capacity(due as usize);
        for _ in 0..due {
            let Some(outcome) = self.tick(scores) else {
                break;
            };
            outcomes.push(outcome);
            if outcome.game_over {
                break;
            }
        }
        outcomes
    }

    /// One scanline step. `None` when not playing.
    pub fn tick(&mut self, scores: &mut HighScores) -> Option<TickOutcome> {
        if !self.is_playing() {
            return None;
        }
        self.scan_column = (self.scan_column + 1) % self.grid.columns();
        let consumed = self.grid.consume_column(self.scan_column);
        if consumed.hits > 0 {
            let hits = consumed.hits as u32;
            let bonus = if consumed.full { FULL_COLUMN_POINTS } else { 0 };
            self.score = self.score.saturating_add(hits * POINTS_PER_HIT + bonus);
            let gain = f64::from(hits) * HEALTH_PER_HIT
                + if consumed.full { FULL_COLUMN_HEALTH } else { 0.0 };
            self.health = (self.health + gain).min(MAX_HEALTH);
        }
        self.health -= HEALTH_DECAY;
        let game_over = self.health <= 0.0;
        if game_over {
            self.stop(scores);
        }
        Some(TickOutcome {
            column: self.scan_column,
            hits: consumed.hits,
            full: consumed.full,
            game_over,
        })
    }

    fn stop(&mut self, scores: &mut HighScores) {
        let ticks = match &self.phase {
            Phase::Playing(ticker) => ticker.fired(),
            _ => 0,
        };
        self.health = 0.0;
        self.phase = Phase::GameOver;
        self.new_record = scores.submit(self.score);
        tracing::info!(score = self.score, ticks, new_record = self.new_record, "game over");
    }
}
