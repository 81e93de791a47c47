pub use std::time::Instant;

/// Frame delta source for the update loop.
#[derive(Clone, Copy, Debug)]
pub struct FrameClock {
    last_frame: Option<Instant>,
    elapsed: f64,
    max_delta: f32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub const DEFAULT_MAX_DELTA: f32 = 0.1;

    pub fn new() -> Self {
        Self::with_max_delta(Self::DEFAULT_MAX_DELTA)
    }

    /// Deltas are clamped to `max_delta` seconds.
    pub fn with_max_delta(max_delta: f32) -> Self {
        Self {
            last_frame: None,
            elapsed: 0.0,
            max_delta,
        }
    }

    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    /// Seconds since the previous tick; zero on the first one.
    pub fn tick_at(&mut self, now: Instant) -> f32 {
        let delta = match self.last_frame {
            Some(last) => now.saturating_duration_since(last).as_secs_f32(),
            None => 0.0,
        };
        self.last_frame = Some(now);

        let delta = delta.min(self.max_delta);
        self.elapsed += delta as f64;
        delta
    }

    /// Total simulated time in seconds.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }
}
