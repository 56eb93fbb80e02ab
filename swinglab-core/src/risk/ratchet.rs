//! Ratchet invariant enforcement for long stop levels.
//!
//! **Core rule:** stops may rise, never fall — even if ATR expansion or a
//! lower pyramided fill would push the recomputed stop down.

/// Stop-level ratchet for a long position.
///
/// Tracks the high-water mark of proposed stop levels; `apply` returns the
/// effective stop after enforcing the invariant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StopRatchet {
    current_level: Option<f64>,
}

impl StopRatchet {
    pub fn new() -> Self {
        Self {
            current_level: None,
        }
    }

    /// Create a ratchet with an initial level.
    pub fn with_initial_level(initial_level: f64) -> Self {
        Self {
            current_level: Some(initial_level),
        }
    }

    /// Apply the ratchet to a proposed stop level.
    ///
    /// Returns the ratcheted level: max of the current level and the
    /// proposal. The first proposal initializes the level.
    pub fn apply(&mut self, proposed: f64) -> f64 {
        let ratcheted = match self.current_level {
            None => proposed,
            Some(current) => current.max(proposed),
        };
        self.current_level = Some(ratcheted);
        ratcheted
    }

    pub fn current_level(&self) -> Option<f64> {
        self.current_level
    }
}
