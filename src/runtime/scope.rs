//! Lexical scope stack.

use std::collections::HashMap;

use super::value::Value;

/// Name bindings, innermost last. The global frame is never popped.
#[derive(Debug)]
pub struct Scopes {
    frames: Vec<HashMap<String, Value>>,
}

impl Scopes {
    pub fn new() -> Self {
        Self {
            frames: vec![HashMap::new()],
        }
    }

    pub fn push(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Innermost-first lookup.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    /// Bind in the innermost frame, shadowing any outer binding.
    pub fn assign(&mut self, name: impl Into<String>, value: Value) {
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.into(), value);
        }
    }
}

impl Default for Scopes {
    fn default() -> Self {
        Self::new()
    }
}
