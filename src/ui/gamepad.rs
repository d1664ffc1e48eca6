//! Gamepad input tracker using gilrs.
//!
//! Button mapping is loaded from config.toml via `load_button_config()`.
//! Default mapping:
//!   D-pad / Left Stick    →  Move (one slide per press)
//!   Start                 →  New game
//!   Select                →  Quit
//!
//! Without the `gamepad` feature this compiles to an inert tracker that
//! never reports a press.

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;
use crate::domain::grid::Direction;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.5;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,
    R1,
    Start,
    Select,
}

const BTN_COUNT: usize = 8;

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH"  => Some(Btn::A),
            "B" | "EAST"   => Some(Btn::B),
            "X" | "WEST"   => Some(Btn::X),
            "Y" | "NORTH"  => Some(Btn::Y),
            "L1" | "LB" => Some(Btn::L1),
            "R1" | "RB" => Some(Btn::R1),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South => Some(Btn::A),
            Button::East  => Some(Btn::B),
            Button::West  => Some(Btn::X),
            Button::North => Some(Btn::Y),
            Button::LeftTrigger  => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::Start  => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            _ => None,
        }
    }
}

#[cfg(feature = "gamepad")]
fn dpad_direction(btn: Button) -> Option<Direction> {
    match btn {
        Button::DPadUp    => Some(Direction::Up),
        Button::DPadDown  => Some(Direction::Down),
        Button::DPadLeft  => Some(Direction::Left),
        Button::DPadRight => Some(Direction::Right),
        _ => None,
    }
}

fn dir_index(dir: Direction) -> usize {
    match dir {
        Direction::Up => 0,
        Direction::Down => 1,
        Direction::Left => 2,
        Direction::Right => 3,
    }
}

/// Per-button state: held (continuous) and just_pressed (edge).
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    held: bool,
    just_pressed: bool,
}

/// Action-to-button mapping (loaded from config).
struct ActionMap {
    confirm: Vec<Btn>,
    cancel: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            confirm: vec![Btn::Start],
            cancel:  vec![Btn::Select],
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    buttons: [BtnState; BTN_COUNT],
    /// D-pad, indexed by `dir_index`.
    dpad: [BtnState; 4],
    /// Left stick folded to four digital directions.
    stick: [BtnState; 4],
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    stick_x: f32,
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    stick_y: f32,

    action_map: ActionMap,

    #[allow(dead_code)]
    pub connected: bool,
}

impl GamepadState {
    pub fn new() -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs_opt, connected) = match Gilrs::new() {
            Ok(g) => {
                let has_pad = g.gamepads().next().is_some();
                (Some(g), has_pad)
            }
            Err(_) => (None, false),
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: gilrs_opt,
            buttons: [BtnState::default(); BTN_COUNT],
            dpad: [BtnState::default(); 4],
            stick: [BtnState::default(); 4],
            stick_x: 0.0,
            stick_y: 0.0,
            action_map: ActionMap::default(),
            connected,
        }
    }

    /// Load button mapping from config. Unknown names are skipped; an
    /// action with no recognised buttons keeps its default.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse_list(names: &[String]) -> Vec<Btn> {
            names.iter().filter_map(|s| Btn::from_name(s)).collect()
        }
        let cf = parse_list(&cfg.confirm);
        if !cf.is_empty() { self.action_map.confirm = cf; }
        let ca = parse_list(&cfg.cancel);
        if !ca.is_empty() { self.action_map.cancel = ca; }
    }

    pub fn update(&mut self) {
        self.clear_just_pressed();

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, true);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, false);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    match axis {
                        Axis::LeftStickX => self.stick_x = value,
                        Axis::LeftStickY => self.stick_y = value,
                        _ => {}
                    }
                }
                EventType::Connected => { self.connected = true; }
                EventType::Disconnected => {
                    self.connected = false;
                    self.release_all();
                }
                _ => {}
            }
        }

        // Stick Y is positive upward in gilrs.
        let now = [
            self.stick_y > STICK_DEADZONE,
            self.stick_y < -STICK_DEADZONE,
            self.stick_x < -STICK_DEADZONE,
            self.stick_x > STICK_DEADZONE,
        ];
        for (state, held) in self.stick.iter_mut().zip(now) {
            if held && !state.held { state.just_pressed = true; }
            state.held = held;
        }
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool) {
        let state = if let Some(dir) = dpad_direction(gilrs_btn) {
            &mut self.dpad[dir_index(dir)]
        } else if let Some(btn) = Btn::from_gilrs(gilrs_btn) {
            &mut self.buttons[btn as usize]
        } else {
            return;
        };
        if held && !state.held { state.just_pressed = true; }
        state.held = held;
    }

    // ── Action queries (config-driven) ──

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[b as usize].just_pressed)
    }

    pub fn confirm_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.confirm)
    }

    pub fn cancel_pressed(&self) -> bool {
        self.any_just_pressed(&self.action_map.cancel)
    }

    /// Direction freshly pressed on the D-pad or stick this frame.
    pub fn direction_pressed(&self) -> Option<Direction> {
        Direction::ALL.into_iter().find(|&d| {
            let i = dir_index(d);
            self.dpad[i].just_pressed || self.stick[i].just_pressed
        })
    }

    // ── Internal ──

    fn clear_just_pressed(&mut self) {
        for b in self.buttons.iter_mut().chain(&mut self.dpad).chain(&mut self.stick) {
            b.just_pressed = false;
        }
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        for b in self.buttons.iter_mut().chain(&mut self.dpad).chain(&mut self.stick) {
            *b = BtnState::default();
        }
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pad() -> GamepadState {
        // Construct without touching gilrs so tests run headless.
        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: None,
            buttons: [BtnState::default(); BTN_COUNT],
            dpad: [BtnState::default(); 4],
            stick: [BtnState::default(); 4],
            stick_x: 0.0,
            stick_y: 0.0,
            action_map: ActionMap::default(),
            connected: false,
        }
    }

    #[test]
    fn button_names_are_case_insensitive_with_aliases() {
        assert_eq!(Btn::from_name("start"), Some(Btn::Start));
        assert_eq!(Btn::from_name("Back"), Some(Btn::Select));
        assert_eq!(Btn::from_name("south"), Some(Btn::A));
        assert_eq!(Btn::from_name("Turbo"), None);
    }

    #[test]
    fn config_overrides_only_recognised_buttons() {
        let mut gp = pad();
        gp.load_button_config(&GamepadConfig {
            confirm: vec!["A".into(), "Bogus".into()],
            cancel: vec!["Bogus".into()],
        });
        assert_eq!(gp.action_map.confirm, vec![Btn::A]);
        assert_eq!(gp.action_map.cancel, vec![Btn::Select]);

        gp.buttons[Btn::A as usize].just_pressed = true;
        assert!(gp.confirm_pressed());
        assert!(!gp.cancel_pressed());
    }

    #[test]
    fn direction_press_is_edge_triggered() {
        let mut gp = pad();
        gp.dpad[dir_index(Direction::Left)] = BtnState { held: true, just_pressed: true };
        assert_eq!(gp.direction_pressed(), Some(Direction::Left));
        gp.clear_just_pressed();
        assert_eq!(gp.direction_pressed(), None);
    }

    #[cfg(feature = "gamepad")]
    #[test]
    fn held_dpad_does_not_retrigger_until_released() {
        let mut gp = pad();
        gp.set_button(Button::DPadUp, true);
        assert_eq!(gp.direction_pressed(), Some(Direction::Up));

        gp.clear_just_pressed();
        gp.set_button(Button::DPadUp, true);
        assert_eq!(gp.direction_pressed(), None);

        gp.set_button(Button::DPadUp, false);
        gp.set_button(Button::DPadUp, true);
        assert_eq!(gp.direction_pressed(), Some(Direction::Up));
    }
}
