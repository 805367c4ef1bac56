//! Start/stop key bindings
//!
//! The host reports input once per tick. Bindings fire on the tick a key goes
//! down, never again while it is held.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Host key name, compared case-insensitively ("F9", "f9")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct KeyId(String);

impl KeyId {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An empty name never matches a press
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for KeyId {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<&str> for KeyId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<KeyId> for String {
    fn from(key: KeyId) -> Self {
        key.0
    }
}

impl std::fmt::Display for KeyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-tick key press query
pub trait KeyInput {
    /// True only on the tick `key` went down
    fn was_just_pressed(&self, key: &KeyId) -> bool;
}

/// No keys pressed
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInput;

impl KeyInput for NoInput {
    fn was_just_pressed(&self, _key: &KeyId) -> bool {
        false
    }
}

/// A list of keys the host already reports as newly pressed
impl KeyInput for [KeyId] {
    fn was_just_pressed(&self, key: &KeyId) -> bool {
        self.contains(key)
    }
}

/// Turns "keys currently held" snapshots into edge-triggered presses
#[derive(Debug, Clone, Default)]
pub struct KeyEdges {
    held: HashSet<KeyId>,
    pressed: HashSet<KeyId>,
}

impl KeyEdges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record this tick's held keys
    pub fn update<I>(&mut self, held: I)
    where
        I: IntoIterator<Item = KeyId>,
    {
        let now: HashSet<KeyId> = held.into_iter().collect();
        self.pressed = now.difference(&self.held).cloned().collect();
        self.held = now;
    }
}

impl KeyInput for KeyEdges {
    fn was_just_pressed(&self, key: &KeyId) -> bool {
        self.pressed.contains(key)
    }
}

/// What the configured bindings ask for this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    Start,
    Stop,
    /// Start and stop share a key
    Toggle,
}

/// Resolve bindings against this tick's input. Start is checked before stop.
pub fn commands<I>(input: &I, start: Option<&KeyId>, stop: Option<&KeyId>) -> Vec<KeyCommand>
where
    I: KeyInput + ?Sized,
{
    let pressed = |key: Option<&KeyId>| key.map_or(false, |k| !k.is_empty() && input.was_just_pressed(k));

    if start.is_some() && start == stop {
        return if pressed(start) { vec![KeyCommand::Toggle] } else { Vec::new() };
    }

    let mut out = Vec::new();
    if pressed(start) {
        out.push(KeyCommand::Start);
    }
    if pressed(stop) {
        out.push(KeyCommand::Stop);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names_case_insensitive() {
        assert_eq!(KeyId::new("f9"), KeyId::new(" F9 "));
        let key: KeyId = serde_json::from_str(r#""LeftShift""#).unwrap();
        assert_eq!(key.as_str(), "LEFTSHIFT");
    }

    #[test]
    fn test_edges_fire_once_per_press() {
        let f9 = KeyId::new("F9");
        let mut edges = KeyEdges::new();

        edges.update([f9.clone()]);
        assert!(edges.was_just_pressed(&f9));

        // Still held
        edges.update([f9.clone()]);
        assert!(!edges.was_just_pressed(&f9));

        // Released, then pressed again
        edges.update(Vec::<KeyId>::new());
        assert!(!edges.was_just_pressed(&f9));
        edges.update([f9.clone()]);
        assert!(edges.was_just_pressed(&f9));
    }

    #[test]
    fn test_commands() {
        let start = KeyId::new("F9");
        let stop = KeyId::new("F10");
        let both = [start.clone(), stop.clone()];

        assert_eq!(
            commands(&both[..], Some(&start), Some(&stop)),
            vec![KeyCommand::Start, KeyCommand::Stop]
        );
        assert!(commands(&NoInput, Some(&start), Some(&stop)).is_empty());
        assert!(commands(&both[..], None, None).is_empty());
        assert_eq!(commands(&both[..], Some(&start), Some(&start)), vec![KeyCommand::Toggle]);
    }

    #[test]
    fn test_empty_binding_never_fires() {
        let empty = KeyId::new("");
        assert!(commands(&[empty.clone()][..], Some(&empty), None).is_empty());
    }
}
