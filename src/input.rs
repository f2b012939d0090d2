use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::orientation::InputAction;

impl InputAction {
    /// The action bound to a physical key, if any.
    ///
    /// Arrow keys and WASD both steer the sphere.
    pub fn from_key(key: KeyCode) -> Option<Self> {
        match key {
            KeyCode::ArrowUp | KeyCode::KeyW => Some(InputAction::Up),
            KeyCode::ArrowDown | KeyCode::KeyS => Some(InputAction::Down),
            KeyCode::ArrowLeft | KeyCode::KeyA => Some(InputAction::Left),
            KeyCode::ArrowRight | KeyCode::KeyD => Some(InputAction::Right),
            _ => None,
        }
    }
}

/// Turns key presses into queued [`InputAction`]s.
///
/// Every press of a bound key queues one action, including the repeats the
/// OS generates while a key is held. Queued actions are drained once per
/// frame by the renderer.
#[derive(Debug, Default)]
pub struct Input {
    actions: Vec<InputAction>,
}

impl Input {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the action bound to a keyboard event, if any.
    pub fn handle_event(&mut self, event: &WindowEvent) {
        if let WindowEvent::KeyboardInput { event, .. } = event {
            if let PhysicalKey::Code(key) = event.physical_key {
                self.handle_key(key, event.state);
            }
        }
    }

    /// Records a key transition. Only presses queue actions.
    pub fn handle_key(&mut self, key: KeyCode, state: ElementState) {
        if state == ElementState::Pressed {
            if let Some(action) = InputAction::from_key(key) {
                self.actions.push(action);
            }
        }
    }

    /// Takes all actions queued since the last call, oldest first.
    pub fn drain_actions(&mut self) -> std::vec::Drain<'_, InputAction> {
        self.actions.drain(..)
    }
}
