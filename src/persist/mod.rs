//! Save scheduling for content edits.
//!
//! `SaveThrottle` combines a throttle and a trailing debounce:
//! - at most one immediate save per throttle window while edits keep arriving
//! - a trailing save a debounce interval after the last edit of a burst, so the
//!   final content is always written
//!
//! It owns no timers. Callers arm a timer for every `TrailingTimer` they get back
//! and report it through `on_trailing`; superseded timers are recognized by their
//! generation and ignored.

use crate::config::SaveTiming;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrailingTimer {
    pub generation: u64,
    pub delay_ms: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EditStep {
    /// Save right now.
    pub save_now: bool,
    /// Timer to arm; replaces any earlier one.
    pub trailing: TrailingTimer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrailingOutcome {
    Skip,
    Save,
}

#[derive(Clone, Debug)]
pub struct SaveThrottle {
    timing: SaveTiming,
    last_save_ms: Option<f64>,
    generation: u64,
    dirty: bool,
}

impl SaveThrottle {
    pub fn new(timing: SaveTiming) -> Self {
        Self {
            timing,
            last_save_ms: None,
            generation: 0,
            dirty: false,
        }
    }

    fn window_open(&self, now_ms: f64) -> bool {
        match self.last_save_ms {
            None => true,
            Some(last) => now_ms - last >= f64::from(self.timing.throttle_ms),
        }
    }

    pub fn on_edit(&mut self, now_ms: f64) -> EditStep {
        self.generation += 1;

        let save_now = self.window_open(now_ms);
        if save_now {
            self.last_save_ms = Some(now_ms);
            self.dirty = false;
        } else {
            self.dirty = true;
        }

        EditStep {
            save_now,
            trailing: TrailingTimer {
                generation: self.generation,
                delay_ms: self.timing.debounce_ms,
            },
        }
    }

    pub fn on_trailing(&mut self, generation: u64, now_ms: f64) -> TrailingOutcome {
        // A newer edit owns the trailing save.
        if generation != self.generation || !self.dirty {
            return TrailingOutcome::Skip;
        }

        self.last_save_ms = Some(now_ms);
        self.dirty = false;
        TrailingOutcome::Save
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}
