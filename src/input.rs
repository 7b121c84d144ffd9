//! Keyboard bindings for the demo window.

use std::collections::{HashMap, HashSet};

use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    CyclePreset,
    ToggleRotation,
    Quit,
}

/// Maps keys to [`Action`]s and reports each action once per key press.
///
/// Held keys and OS auto-repeat do not trigger an action again until the key
/// is released.
#[derive(Debug)]
pub struct Controls {
    bindings: HashMap<KeyCode, Action>,
    held: HashSet<KeyCode>,
    triggered: Vec<Action>,
}

impl Default for Controls {
    fn default() -> Self {
        Self::new()
            .bind(KeyCode::KeyA, Action::CyclePreset)
            .bind(KeyCode::Space, Action::ToggleRotation)
            .bind(KeyCode::Escape, Action::Quit)
    }
}

impl Controls {
    /// Controls with no bindings.
    pub fn new() -> Self {
        Self {
            bindings: HashMap::new(),
            held: HashSet::new(),
            triggered: Vec::new(),
        }
    }

    pub fn bind(mut self, key: KeyCode, action: Action) -> Self {
        self.bindings.insert(key, action);
        self
    }

    pub fn handle_event(&mut self, event: &WindowEvent) {
        if let WindowEvent::KeyboardInput { event, .. } = event
            && let PhysicalKey::Code(key) = event.physical_key
        {
            self.handle_key(key, event.state);
        }
    }

    pub fn handle_key(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if self.held.insert(key)
                    && let Some(&action) = self.bindings.get(&key)
                {
                    self.triggered.push(action);
                }
            }
            ElementState::Released => {
                self.held.remove(&key);
            }
        }
    }

    /// Actions triggered since the last call, in press order.
    pub fn drain(&mut self) -> std::vec::Drain<'_, Action> {
        self.triggered.drain(..)
    }
}
