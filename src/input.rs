//! Key bindings and the pointer draw gesture.

use crate::layout::GridGeometry;
use crate::session::Session;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Start from idle, reboot after game over.
    Start,
    /// New game from any state.
    Restart,
    Quit,
    None,
}

/// Map key event to game action.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => Action::Quit,
        KeyCode::Enter | KeyCode::Char(' ') => Action::Start,
        KeyCode::Char('r' | 'R') => Action::Restart,
        _ => Action::None,
    }
}

/// Pointer input reduced to what the gesture cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pointer {
    Press { x: u16, y: u16 },
    Move { x: u16, y: u16 },
    Release,
    /// Pointer left the surface (focus lost).
    Leave,
}

/// Left-button press, drag and release; other buttons and scrolls are ignored.
pub fn mouse_to_pointer(mouse: MouseEvent) -> Option<Pointer> {
    let (x, y) = (mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => Some(Pointer::Press { x, y }),
        MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => {
            Some(Pointer::Move { x, y })
        }
        MouseEventKind::Up(MouseButton::Left) => Some(Pointer::Release),
        _ => None,
    }
}

/// Press-to-release draw session. Only ever adds fuel: cells are lit, never cleared.
#[derive(Debug, Clone, Copy, Default)]
pub struct DrawGesture {
    drawing: bool,
}

impl DrawGesture {
    #[inline]
    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    /// Feed one pointer event. Returns whether a cell was newly activated.
    pub fn handle(&mut self, pointer: Pointer, geometry: &GridGeometry, session: &mut Session) -> bool {
        match pointer {
            Pointer::Press { x, y } => {
                self.drawing = true;
                paint(x, y, geometry, session)
            }
            Pointer::Move { x, y } if self.drawing => paint(x, y, geometry, session),
            Pointer::Move { .. } => false,
            Pointer::Release | Pointer::Leave => {
                self.drawing = false;
                false
            }
        }
    }

    pub fn cancel(&mut self) {
        self.drawing = false;
    }
}

fn paint(x: u16, y: u16, geometry: &GridGeometry, session: &mut Session) -> bool {
    geometry
        .cell_at(x, y)
        .is_some_and(|pos| session.activate(pos))
}
