//! Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use config::GameConfig;
use domain::rules::MergeKind;
use domain::spawn::{RandomSource, SeededRandom};
use sim::event::GameEvent;
use sim::turn;
use sim::world::WorldState;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

const KEYS_QUIT: &[KeyCode] = &[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')];
const KEYS_NEW_GAME: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char('r'), KeyCode::Char('R')];

fn main() {
    let config = GameConfig::load();

    let rng: Box<dyn RandomSource> = match config.seed {
        Some(seed) => Box::new(SeededRandom::new(seed)),
        None => Box::new(SeededRandom::from_entropy()),
    };
    let mut world = WorldState::new(&config, rng);
    let sound = SoundEngine::new();
    let opening = turn::new_game(&mut world);

    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }
    process_sound_events(sound.as_ref(), &opening);

    let result = game_loop(&mut world, &mut renderer, sound.as_ref(), &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Final Score: {}   Best: {}   Moves: {}", world.score, world.best_score, world.moves);
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let mut clock = TickClock::new(Duration::from_millis(config.turn.tick_rate_ms), Instant::now());

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() || kb.any_pressed(KEYS_QUIT) || gp.cancel_pressed() {
            break;
        }

        if kb.any_pressed(KEYS_NEW_GAME) || gp.confirm_pressed() {
            let events = turn::new_game(world);
            process_sound_events(sound, &events);
        } else if let Some(dir) = kb.direction_pressed().or_else(|| gp.direction_pressed()) {
            let was_settling = world.is_settling();
            let events = turn::submit_move(world, dir);
            process_sound_events(sound, &events);
            // The settle window starts at the move, not at the last tick.
            if world.is_settling() && !was_settling {
                clock.restart(Instant::now());
            }
        }

        if let Some(elapsed_ms) = clock.poll(Instant::now()) {
            let events = turn::advance(world, elapsed_ms);
            process_sound_events(sound, &events);

            world.tick_message();
        }

        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Fixed-rate tick source for the settle clock and message timer.
struct TickClock {
    rate: Duration,
    last: Instant,
}

impl TickClock {
    fn new(rate: Duration, now: Instant) -> Self {
        TickClock { rate, last: now }
    }

    /// Start counting from `now`; time before it no longer reaches `poll`.
    fn restart(&mut self, now: Instant) {
        self.last = now;
    }

    /// Milliseconds since the previous tick, once at least `rate` has passed.
    fn poll(&mut self, now: Instant) -> Option<u64> {
        let elapsed = now.saturating_duration_since(self.last);
        if elapsed < self.rate {
            return None;
        }
        self.last = now;
        Some(elapsed.as_millis() as u64)
    }
}

/// Sound effect chosen for one batch of events.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Cue {
    GameOver,
    Milestone,
    Merge(u32),
    Doubler,
    Halver,
    Slide,
}

/// One sound per batch: the most significant event wins.
fn cue_for(events: &[GameEvent]) -> Option<Cue> {
    let mut slid = false;
    let mut merged: Option<(MergeKind, u32)> = None;
    for event in events {
        match event {
            GameEvent::GameOver { .. } => return Some(Cue::GameOver),
            GameEvent::MilestoneReached { .. } => return Some(Cue::Milestone),
            GameEvent::TilesMerged { kind, value, .. } => {
                let best = merged.map_or(0, |(_, v)| v);
                if *value >= best { merged = Some((*kind, *value)); }
            }
            GameEvent::TileSlid { .. } => slid = true,
            GameEvent::TileDestroyed { .. } | GameEvent::TileSpawned { .. } => {}
        }
    }
    match merged {
        Some((MergeKind::Combined, value)) => Some(Cue::Merge(value)),
        Some((MergeKind::Doubled, _)) => Some(Cue::Doubler),
        Some((MergeKind::Halved, _)) => Some(Cue::Halver),
        None if slid => Some(Cue::Slide),
        None => None,
    }
}

fn process_sound_events(sound: Option<&SoundEngine>, events: &[GameEvent]) {
    let (Some(sfx), Some(cue)) = (sound, cue_for(events)) else { return };
    match cue {
        Cue::GameOver => sfx.play_game_over(),
        Cue::Milestone => sfx.play_milestone(),
        Cue::Merge(value) => sfx.play_merge(value),
        Cue::Doubler => sfx.play_doubler(),
        Cue::Halver => sfx.play_halver(),
        Cue::Slide => sfx.play_slide(),
    }
}
