//! Keyboard shortcut registry
//!
//! A generic chord-to-handler map. Chords are parsed from strings like
//! `"ctrl+shift+f"`. Matching is suppressed while focus sits in an editable
//! control so chords never hijack native editing behavior.

use std::collections::HashMap;

use crate::{Error, Result};

/// A keyboard event as delivered by the host UI layer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyEvent {
    /// Lowercase key name ("v", "slash", "control", "meta", ...)
    pub key: String,
    /// Ctrl held
    pub ctrl: bool,
    /// Alt held
    pub alt: bool,
    /// Shift held
    pub shift: bool,
    /// Meta/command held
    pub meta: bool,
    /// Focus is inside a text field or other editable control
    pub editable_target: bool,
}

/// A parsed modifier+key chord
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Chord {
    /// Requires Ctrl
    pub ctrl: bool,
    /// Requires Alt
    pub alt: bool,
    /// Requires Shift
    pub shift: bool,
    /// Requires Meta
    pub meta: bool,
    /// The non-modifier key
    pub key: String,
}

impl Chord {
    /// Parse a chord string like `"ctrl+shift+f"`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the string has no non-modifier key or
    /// names an unknown modifier.
    pub fn parse(spec: &str) -> Result<Self> {
        let mut chord = Self {
            ctrl: false,
            alt: false,
            shift: false,
            meta: false,
            key: String::new(),
        };

        for part in spec.split('+') {
            match part.trim().to_lowercase().as_str() {
                "ctrl" | "control" => chord.ctrl = true,
                "alt" | "option" => chord.alt = true,
                "shift" => chord.shift = true,
                "meta" | "cmd" | "command" | "super" => chord.meta = true,
                "" => return Err(Error::Config(format!("empty segment in chord: {spec}"))),
                key => {
                    if !chord.key.is_empty() {
                        return Err(Error::Config(format!(
                            "chord has multiple keys: {spec}"
                        )));
                    }
                    chord.key = key.to_string();
                }
            }
        }

        if chord.key.is_empty() {
            return Err(Error::Config(format!("chord has no key: {spec}")));
        }
        Ok(chord)
    }

    /// True when a keydown event matches this chord exactly
    #[must_use]
    pub fn matches(&self, event: &KeyEvent) -> bool {
        event.key == self.key
            && event.ctrl == self.ctrl
            && event.alt == self.alt
            && event.shift == self.shift
            && event.meta == self.meta
    }

    /// True when a keyup event releases any defining key of this chord.
    /// Either the letter or a required modifier counts, tolerating partial
    /// key-up ordering.
    #[must_use]
    pub fn releases(&self, key: &str) -> bool {
        if key == self.key {
            return true;
        }
        match key {
            "ctrl" | "control" => self.ctrl,
            "alt" | "option" => self.alt,
            "shift" => self.shift,
            "meta" | "cmd" | "command" | "super" => self.meta,
            _ => false,
        }
    }
}

/// Registered chord handlers, looked up per keydown
pub struct ShortcutRegistry<Id> {
    entries: Vec<(Chord, Id)>,
}

impl<Id> ShortcutRegistry<Id> {
    /// Create an empty registry
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a chord for a handler id
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the chord string cannot be parsed or
    /// is already registered.
    pub fn register(&mut self, spec: &str, id: Id) -> Result<()> {
        let chord = Chord::parse(spec)?;
        if self.entries.iter().any(|(c, _)| *c == chord) {
            return Err(Error::Config(format!("chord already registered: {spec}")));
        }
        self.entries.push((chord, id));
        Ok(())
    }

    /// Resolve a keydown event to a handler id. Events targeting editable
    /// controls never match.
    #[must_use]
    pub fn lookup(&self, event: &KeyEvent) -> Option<&Id> {
        if event.editable_target {
            return None;
        }
        self.entries
            .iter()
            .find(|(chord, _)| chord.matches(event))
            .map(|(_, id)| id)
    }

    /// All registered chords as a map for display purposes
    #[must_use]
    pub fn bindings(&self) -> HashMap<String, &Id> {
        self.entries
            .iter()
            .map(|(chord, id)| {
                let mut parts = Vec::new();
                if chord.ctrl {
                    parts.push("ctrl");
                }
                if chord.alt {
                    parts.push("alt");
                }
                if chord.shift {
                    parts.push("shift");
                }
                if chord.meta {
                    parts.push("meta");
                }
                parts.push(&chord.key);
                (parts.join("+"), id)
            })
            .collect()
    }
}

impl<Id> Default for ShortcutRegistry<Id> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keydown(key: &str, ctrl: bool) -> KeyEvent {
        KeyEvent {
            key: key.to_string(),
            ctrl,
            ..KeyEvent::default()
        }
    }

    #[test]
    fn parses_chords() {
        let chord = Chord::parse("ctrl+shift+f").unwrap();
        assert!(chord.ctrl && chord.shift && !chord.meta);
        assert_eq!(chord.key, "f");

        assert!(Chord::parse("ctrl+").is_err());
        assert!(Chord::parse("ctrl+a+b").is_err());
        assert!(Chord::parse("ctrl").is_err());
    }

    #[test]
    fn exact_modifier_match_required() {
        let chord = Chord::parse("ctrl+v").unwrap();
        assert!(chord.matches(&keydown("v", true)));
        assert!(!chord.matches(&keydown("v", false)));

        let mut with_shift = keydown("v", true);
        with_shift.shift = true;
        assert!(!chord.matches(&with_shift));
    }

    #[test]
    fn release_tolerates_either_key() {
        let chord = Chord::parse("ctrl+v").unwrap();
        assert!(chord.releases("v"));
        assert!(chord.releases("control"));
        assert!(!chord.releases("shift"));
        assert!(!chord.releases("x"));
    }

    #[test]
    fn editable_focus_suppresses_lookup() {
        let mut registry = ShortcutRegistry::new();
        registry.register("ctrl+k", "focus-search").unwrap();

        let mut event = keydown("k", true);
        assert_eq!(registry.lookup(&event), Some(&"focus-search"));

        event.editable_target = true;
        assert_eq!(registry.lookup(&event), None);
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut registry = ShortcutRegistry::new();
        registry.register("ctrl+k", 1).unwrap();
        assert!(registry.register("control+k", 2).is_err());
    }
}
