//! Terminal front end for raster3d: a half-block presenter and keyboard camera control
use std::io::{self, stdout};
use std::time::Duration;

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute, terminal,
};
use raster3d_core::{Camera, Engine, InputSource};

pub mod renderer;

pub use renderer::TerminalPresenter;

/// Keyboard camera control.
///
/// Terminals report key presses and repeats but not releases, so every
/// event moves the camera by a fixed step instead of a held-key velocity.
#[derive(Debug, Clone, Copy)]
pub struct TerminalInput {
    /// World units per key event
    pub move_step: f64,
    /// Radians per key event
    pub turn_step: f64,
}

impl Default for TerminalInput {
    fn default() -> Self {
        Self {
            move_step: 0.25,
            turn_step: 0.05,
        }
    }
}

impl TerminalInput {
    /// Apply one key to the camera. Returns `false` for the quit keys.
    pub fn handle_key(&self, camera: &mut Camera, code: KeyCode) -> bool {
        let (step, turn) = (self.move_step, self.turn_step);
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Char('w') => camera.translate_local(step, 0.0, 0.0),
            KeyCode::Char('s') => camera.translate_local(-step, 0.0, 0.0),
            KeyCode::Char('a') => camera.translate_local(0.0, -step, 0.0),
            KeyCode::Char('d') => camera.translate_local(0.0, step, 0.0),
            KeyCode::Char(' ') => camera.translate_local(0.0, 0.0, step),
            KeyCode::Char('c') => camera.translate_local(0.0, 0.0, -step),
            // Increasing yaw swings the view toward screen right
            KeyCode::Left => camera.rotate(-turn, 0.0),
            KeyCode::Right => camera.rotate(turn, 0.0),
            KeyCode::Up => camera.rotate(0.0, turn),
            KeyCode::Down => camera.rotate(0.0, -turn),
            _ => {}
        }
        true
    }
}

impl InputSource for TerminalInput {
    fn poll(&mut self, camera: &mut Camera, _delta: f64) -> io::Result<bool> {
        // Drain everything queued since the last frame without blocking
        while event::poll(Duration::ZERO)? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                if kind != KeyEventKind::Release && !self.handle_key(camera, code) {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }
}

/// Run `engine` in the alternate screen until the user quits.
///
/// The terminal is restored even when the frame loop fails.
pub fn run(engine: &mut Engine) -> raster3d_core::Result<()> {
    terminal::enable_raw_mode()?;
    execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

    let mut presenter = TerminalPresenter::new(stdout());
    let result = engine.run(&mut presenter, &mut TerminalInput::default());

    // Cleanup
    let raw_mode = terminal::disable_raw_mode();
    let screen = execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show);

    first_error(result, [raw_mode, screen])
}

/// The frame loop's own error wins over cleanup failures
fn first_error(
    frame_loop: raster3d_core::Result<()>,
    cleanup: [io::Result<()>; 2],
) -> raster3d_core::Result<()> {
    frame_loop?;
    for step in cleanup {
        step?;
    }
    Ok(())
}
