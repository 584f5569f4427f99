//! Arrow-key tracking and translation into movement commands

use macroquad::prelude::*;
use shared::{ClientMessage, Direction};
use std::collections::HashSet;

/// Key transitions observed during one display frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTransition {
    Pressed(Direction),
    Released(Direction),
}

/// Tracks held directional keys and decides which command each transition sends
pub struct InputManager {
    held: HashSet<Direction>,
    last_sent: Option<Direction>,
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            held: HashSet::new(),
            last_sent: None,
        }
    }

    /// Every fresh press re-sends a move, so the most recent press wins
    /// regardless of what else is held.
    pub fn key_down(&mut self, direction: Direction) -> Option<ClientMessage> {
        if !self.held.insert(direction) {
            return None;
        }

        self.last_sent = Some(direction);
        Some(ClientMessage::Move { direction })
    }

    pub fn key_up(&mut self, direction: Direction) -> Option<ClientMessage> {
        self.held.remove(&direction);

        if self.held.is_empty() {
            self.last_sent = None;
            Some(ClientMessage::Stop)
        } else {
            None
        }
    }

    pub fn is_held(&self, direction: Direction) -> bool {
        self.held.contains(&direction)
    }

    /// Direction of the last move command still in effect
    pub fn last_sent(&self) -> Option<Direction> {
        self.last_sent
    }

    /// Samples the arrow keys from the window for this frame
    pub fn poll_transitions() -> Vec<KeyTransition> {
        let mut transitions = Vec::new();

        for direction in Direction::ALL {
            let key = key_for(direction);
            if is_key_pressed(key) {
                transitions.push(KeyTransition::Pressed(direction));
            }
            if is_key_released(key) {
                transitions.push(KeyTransition::Released(direction));
            }
        }

        transitions
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

fn key_for(direction: Direction) -> KeyCode {
    match direction {
        Direction::Up => KeyCode::Up,
        Direction::Down => KeyCode::Down,
        Direction::Left => KeyCode::Left,
        Direction::Right => KeyCode::Right,
    }
}
