//! App: terminal init, main loop, tick, key, mouse and resize handling.

use crate::GameConfig;
use crate::highscores::HighScores;
use crate::input::{Action, DrawGesture, Pointer, key_to_action, mouse_to_pointer};
use crate::layout::{GridGeometry, LayoutAdapter};
use crate::session::{Session, State};
use crate::theme::Theme;
use crate::ui::{self, ColumnFlash};
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};

/// Render cadence; ticks are polled at least this often.
const FRAME: Duration = Duration::from_millis(16);

/// Runs `restore` when dropped, so every exit path out of `run` puts the terminal back.
struct RestoreGuard<F: FnMut()> {
    restore: F,
}

impl<F: FnMut()> Drop for RestoreGuard<F> {
    fn drop(&mut self) {
        (self.restore)();
    }
}

fn restore_terminal() {
    use crossterm::{
        event::{DisableFocusChange, DisableMouseCapture},
        execute,
        terminal::{LeaveAlternateScreen, disable_raw_mode},
    };
    let mut stdout = std::io::stdout();
    let _ = execute!(stdout, DisableFocusChange);
    if let Err(e) = execute!(stdout, DisableMouseCapture, LeaveAlternateScreen) {
        tracing::warn!(error = %e, "leaving alternate screen failed");
    }
    if let Err(e) = disable_raw_mode() {
        tracing::warn!(error = %e, "disabling raw mode failed");
    }
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    layout: LayoutAdapter,
    session: Session,
    scores: HighScores,
    gesture: DrawGesture,
    /// Where the last frame put the grid.
    geometry: GridGeometry,
    flash: Option<ColumnFlash>,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme, scores: HighScores, term_cols: u16) -> Self {
        let layout = LayoutAdapter::new(config.breakpoint, config.cell_px, term_cols);
        let session = Session::new(layout.columns(), config.tick_period);
        Self {
            config,
            theme,
            layout,
            session,
            scores,
            gesture: DrawGesture::default(),
            geometry: GridGeometry::default(),
            flash: None,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{EnableFocusChange, EnableMouseCapture},
            execute,
            terminal::{EnterAlternateScreen, enable_raw_mode},
        };

        enable_raw_mode()?;
        let _restore = RestoreGuard {
            restore: restore_terminal,
        };
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        // Not every terminal reports focus; drawing still ends on release.
        let _ = execute!(stdout, EnableFocusChange);

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;
        tracing::info!(columns = self.session.columns(), best = self.scores.best(), "started");

        self.run_loop(&mut terminal)
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            terminal.draw(|f| {
                self.geometry = ui::draw(
                    f,
                    &self.session,
                    self.scores.best(),
                    &self.theme,
                    &mut self.flash,
                    self.gesture.is_drawing(),
                    now,
                );
            })?;

            if self.flash.as_ref().is_some_and(ColumnFlash::done) {
                self.flash = None;
            }

            // Wake for the next tick if it comes before the next frame.
            let frame_left = FRAME.saturating_sub(now.elapsed());
            let timeout = self
                .session
                .until_next_tick(Instant::now())
                .map_or(frame_left, |d| d.min(frame_left));

            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if self.handle_event(event::read()?) {
                        return Ok(());
                    }
                }
            }

            // Input read above is applied before the tick sees the grid.
            self.tick(Instant::now());
        }
    }

    /// Returns true when the app should quit.
    fn handle_event(&mut self, event: Event) -> bool {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                return self.apply_action(key_to_action(key));
            }
            Event::Mouse(mouse) => {
                if let Some(pointer) = mouse_to_pointer(mouse) {
                    self.gesture
                        .handle(pointer, &self.geometry, &mut self.session);
                }
            }
            Event::FocusLost => {
                self.gesture
                    .handle(Pointer::Leave, &self.geometry, &mut self.session);
            }
            Event::Resize(cols, _) => self.resize(cols),
            _ => {}
        }
        false
    }

    fn apply_action(&mut self, action: Action) -> bool {
        match action {
            Action::Quit => return true,
            Action::Start if self.session.state() != State::Playing => self.start(),
            Action::Restart => self.start(),
            Action::Start | Action::None => {}
        }
        false
    }

    fn start(&mut self) {
        self.flash = None;
        self.gesture.cancel();
        self.session.start(Instant::now());
    }

    /// Width change: a different column count discards the session.
    fn resize(&mut self, term_cols: u16) {
        if let Some(columns) = self.layout.observe(term_cols) {
            self.session.relayout(columns);
            self.gesture.cancel();
            self.flash = None;
            // Stale until the next draw.
            self.geometry = GridGeometry::default();
        }
    }

    fn tick(&mut self, now: Instant) {
        for outcome in self.session.advance(now, &mut self.scores) {
            if outcome.hits > 0 && self.config.animate {
                self.flash = Some(ColumnFlash::new(outcome.column));
            }
            if outcome.game_over {
                self.gesture.cancel();
                self.flash = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{CellPos, ROWS};
    use crate::highscores::MemoryStore;
    use crate::layout::{BREAKPOINT, CELL_PX};
    use crate::scheduler::TICK_PERIOD;

    fn app(term_cols: u16) -> App {
        let config = GameConfig {
            tick_period: TICK_PERIOD,
            breakpoint: BREAKPOINT,
            cell_px: CELL_PX,
            animate: true,
        };
        let scores = HighScores::load(Box::new(MemoryStore::default()));
        App::new(config, Theme::default(), scores, term_cols)
    }

    #[test]
    fn test_restore_runs_on_early_return() {
        use std::cell::Cell;

        fn setup(restored: &Cell<u32>, fail: bool) -> Result<()> {
            let _restore = RestoreGuard {
                restore: || restored.set(restored.get() + 1),
            };
            if fail {
                anyhow::bail!("terminal init failed");
            }
            Ok(())
        }

        let restored = Cell::new(0);
        assert!(setup(&restored, true).is_err());
        assert_eq!(restored.get(), 1);
        assert!(setup(&restored, false).is_ok());
        assert_eq!(restored.get(), 2);
    }

    #[test]
    fn test_initial_columns_follow_terminal_width() {
        assert_eq!(app(120).session.columns(), 16);
        assert_eq!(app(60).session.columns(), 8);
    }

    #[test]
    fn test_start_key_only_from_idle_or_game_over() {
        let mut a = app(120);
        assert!(!a.apply_action(Action::Start));
        assert_eq!(a.session.state(), State::Playing);
        a.session.activate(CellPos { row: 0, col: 5 });
        // Start while playing does not wipe the board.
        a.apply_action(Action::Start);
        assert_eq!(a.session.grid().active_count(), 1);
        a.apply_action(Action::Restart);
        assert_eq!(a.session.grid().active_count(), 0);
        assert!(a.apply_action(Action::Quit));
    }

    #[test]
    fn test_resize_across_breakpoint_resets() {
        let mut a = app(120);
        a.apply_action(Action::Start);
        a.session.activate(CellPos { row: 0, col: 12 });
        a.resize(100);
        assert_eq!(a.session.state(), State::Playing);
        a.resize(70);
        assert_eq!(a.session.state(), State::Idle);
        assert_eq!(a.session.columns(), 8);
        assert_eq!(a.session.grid().active_count(), 0);
    }

    #[test]
    fn test_tick_flashes_consumed_column() {
        let mut a = app(120);
        a.apply_action(Action::Start);
        for row in 0..ROWS {
            a.session.activate(CellPos { row, col: 1 });
        }
        a.tick(Instant::now() + TICK_PERIOD);
        assert_eq!(a.session.score(), 600);
        assert!(a.flash.is_some());
    }

    #[test]
    fn test_mouse_draws_through_geometry() {
        use crossterm::event::{KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
        let mut a = app(120);
        a.geometry = GridGeometry::fit(0, 0, 63, 20, 16, ROWS);
        a.apply_action(Action::Start);
        let press = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 4,
            row: 0,
            modifiers: KeyModifiers::NONE,
        };
        assert!(!a.handle_event(Event::Mouse(press)));
        assert!(a.session.grid().is_active(0, 1));
        a.handle_event(Event::FocusLost);
        assert!(!a.gesture.is_drawing());
    }
}
