//! Session countdown timer
//!
//! Driven by the caller with elapsed milliseconds; it has no clock of its own.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timer {
    time_ms: u32,
    duration_ms: u32,
    running: bool,
    paused: bool,
}

impl Timer {
    pub fn new(duration_ms: u32) -> Self {
        Self {
            duration_ms,
            ..Self::default()
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Reset and set a new duration
    pub fn setup(&mut self, duration_ms: u32) {
        self.reset();
        self.duration_ms = duration_ms;
    }

    pub fn start(&mut self) {
        self.running = true;
        self.paused = false;
        self.time_ms = 0;
    }

    /// Stop and jump to the end
    pub fn stop(&mut self) {
        self.running = false;
        self.paused = false;
        self.time_ms = self.duration_ms;
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Advance by `delta_ms`. Returns true on the update that runs out the clock.
    pub fn update(&mut self, delta_ms: u32) -> bool {
        if !self.running || self.paused {
            return false;
        }
        self.time_ms = self.time_ms.saturating_add(delta_ms);
        if self.time_ms >= self.duration_ms {
            self.stop();
            return true;
        }
        false
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn time_ms(&self) -> u32 {
        self.time_ms
    }

    pub fn duration_ms(&self) -> u32 {
        self.duration_ms
    }

    pub fn remaining_ms(&self) -> u32 {
        self.duration_ms.saturating_sub(self.time_ms)
    }
}
