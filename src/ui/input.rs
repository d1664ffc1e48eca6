//! Keyboard input tracker.
//!
//! Collects the keys pressed since the previous frame. Every action in the
//! game is one-shot (a slide, a new game, quit), so only Press events are
//! recorded; Repeat and Release are dropped. Terminals without keyboard
//! enhancement report auto-repeat as plain presses, which the settle window
//! absorbs.

use std::time::Duration;

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::grid::Direction;

pub const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W'), KeyCode::Char('k')];
pub const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S'), KeyCode::Char('j')];
pub const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A'), KeyCode::Char('h')];
pub const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D'), KeyCode::Char('l')];

/// Map a key to a slide direction.
pub fn direction_for(code: KeyCode) -> Option<Direction> {
    if KEYS_UP.contains(&code) {
        Some(Direction::Up)
    } else if KEYS_DOWN.contains(&code) {
        Some(Direction::Down)
    } else if KEYS_LEFT.contains(&code) {
        Some(Direction::Left)
    } else if KEYS_RIGHT.contains(&code) {
        Some(Direction::Right)
    } else {
        None
    }
}

pub struct InputState {
    /// Keys pressed during the most recent `drain_events()` call, in order.
    presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for modifier checks.
    raw_events: Vec<KeyEvent>,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
        }
    }

    /// Drain all pending terminal events without blocking.
    /// Call this once per frame, before the simulation advances.
    pub fn drain_events(&mut self) {
        self.presses.clear();
        self.raw_events.clear();

        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.record(key);
            }
        }
    }

    fn record(&mut self, key: KeyEvent) {
        self.raw_events.push(key);
        if key.kind == KeyEventKind::Press {
            self.presses.push(key.code);
        }
    }

    /// Convenience: was any of these keys pressed this frame?
    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        self.presses.iter().any(|c| codes.contains(c))
    }

    /// First slide direction pressed this frame. Later presses in the same
    /// frame are dropped; the world would ignore them while settling anyway.
    pub fn direction_pressed(&self) -> Option<Direction> {
        self.presses.iter().find_map(|&c| direction_for(c))
    }

    /// Check if any raw event this frame has Ctrl+C
    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode, kind: KeyEventKind, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent { code, modifiers, kind, state: KeyEventState::NONE }
    }

    #[test]
    fn arrows_wasd_and_vi_keys_map_to_directions() {
        assert_eq!(direction_for(KeyCode::Up), Some(Direction::Up));
        assert_eq!(direction_for(KeyCode::Char('S')), Some(Direction::Down));
        assert_eq!(direction_for(KeyCode::Char('h')), Some(Direction::Left));
        assert_eq!(direction_for(KeyCode::Char('l')), Some(Direction::Right));
        assert_eq!(direction_for(KeyCode::Char('r')), None);
    }

    #[test]
    fn only_presses_count() {
        let mut input = InputState::new();
        input.record(key(KeyCode::Left, KeyEventKind::Release, KeyModifiers::NONE));
        input.record(key(KeyCode::Left, KeyEventKind::Repeat, KeyModifiers::NONE));
        assert_eq!(input.direction_pressed(), None);

        input.record(key(KeyCode::Right, KeyEventKind::Press, KeyModifiers::NONE));
        input.record(key(KeyCode::Up, KeyEventKind::Press, KeyModifiers::NONE));
        assert_eq!(input.direction_pressed(), Some(Direction::Right));
    }

    #[test]
    fn ctrl_c_detected_from_modifiers() {
        let mut input = InputState::new();
        input.record(key(KeyCode::Char('c'), KeyEventKind::Press, KeyModifiers::NONE));
        assert!(!input.ctrl_c_pressed());
        input.record(key(KeyCode::Char('c'), KeyEventKind::Press, KeyModifiers::CONTROL));
        assert!(input.ctrl_c_pressed());
    }
}
