//! Username color assignment.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{PoisonError, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UsernameColor {
    Cyan,
    Green,
    Yellow,
    Magenta,
    Blue,
    Red,
}

impl UsernameColor {
    pub const PALETTE: [Self; 6] = [
        Self::Cyan,
        Self::Green,
        Self::Yellow,
        Self::Magenta,
        Self::Blue,
        Self::Red,
    ];

    #[must_use]
    pub fn ansi(self) -> &'static str {
        match self {
            Self::Cyan => "\x1b[36m",
            Self::Green => "\x1b[32m",
            Self::Yellow => "\x1b[33m",
            Self::Magenta => "\x1b[35m",
            Self::Blue => "\x1b[34m",
            Self::Red => "\x1b[31m",
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Cyan => "cyan",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Magenta => "magenta",
            Self::Blue => "blue",
            Self::Red => "red",
        }
    }
}

/// Memoized display-name to palette mapping, stable for the life of the
/// assigner.
#[derive(Debug, Default)]
pub struct ColorAssigner {
    cache: RwLock<HashMap<String, UsernameColor>>,
}

impl ColorAssigner {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn color_for(&self, name: &str) -> UsernameColor {
        if let Some(color) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            return *color;
        }

        let color = palette_color(name);
        *self
            .cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name.to_string())
            .or_insert(color)
    }
}

fn palette_color(name: &str) -> UsernameColor {
    let mut hasher = DefaultHasher::new();
    name.hash(&mut hasher);
    let index = (hasher.finish() % UsernameColor::PALETTE.len() as u64) as usize;
    UsernameColor::PALETTE[index]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_is_stable_across_calls() {
        let colors = ColorAssigner::new();
        let first = colors.color_for("alice");
        for _ in 0..10 {
            assert_eq!(colors.color_for("alice"), first);
        }
    }

    #[test]
    fn every_name_maps_into_the_palette() {
        let colors = ColorAssigner::new();
        for name in ["", "alice", "bob", "User-12345678", "日本語"] {
            assert!(UsernameColor::PALETTE.contains(&colors.color_for(name)));
        }
    }

    #[test]
    fn separate_assigners_agree_within_a_process() {
        assert_eq!(
            ColorAssigner::new().color_for("carol"),
            ColorAssigner::new().color_for("carol")
        );
    }
}
