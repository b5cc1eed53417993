use scrollkit_common::{Error, Result};

/// Fixed-step game clock.
///
/// Frame time is accumulated and paid out as whole update ticks; the leftover
/// fraction of a tick is the interpolation value handed to presentation code
/// such as camera interpolation.
#[derive(Debug, Clone)]
pub struct GameClock {
    step: f32,
    accumulator: f32,
    tick: u64,
    /// Upper bound on ticks paid out by a single `advance`; excess time is dropped.
    pub max_ticks_per_frame: u32,
}

impl GameClock {
    /// Create a clock running `ticks_per_second` updates per second.
    pub fn new(ticks_per_second: f32) -> Result<Self> {
        if !(ticks_per_second.is_finite() && ticks_per_second > 0.0) {
            return Err(Error::invalid(format!(
                "ticks_per_second must be positive, got {ticks_per_second}"
            )));
        }
        Ok(Self {
            step: 1.0 / ticks_per_second,
            accumulator: 0.0,
            tick: 0,
            max_ticks_per_frame: 5,
        })
    }

    /// Length of one tick in seconds.
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Total ticks paid out so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Feed `frame_dt` seconds of wall time. Returns how many update ticks
    /// the caller should run this frame.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        self.accumulator += frame_dt.max(0.0);
        let mut due = (self.accumulator / self.step).floor() as u32;
        if due > self.max_ticks_per_frame {
            tracing::warn!(
                due,
                max = self.max_ticks_per_frame,
                "clock falling behind, dropping ticks"
            );
            due = self.max_ticks_per_frame;
            self.accumulator = self.step * due as f32;
        }
        self.accumulator -= self.step * due as f32;
        self.tick += u64::from(due);
        due
    }

    /// How far the clock is between the last tick and the next, in `0.0..=1.0`.
    pub fn interpolation(&self) -> f32 {
        (self.accumulator / self.step).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_rate() {
        assert!(GameClock::new(0.0).is_err());
        assert!(GameClock::new(-30.0).is_err());
        assert!(GameClock::new(f32::NAN).is_err());
    }

    #[test]
    fn pays_out_whole_ticks() {
        let mut clock = GameClock::new(10.0).unwrap();
        assert_eq!(clock.advance(0.25), 2);
        assert_eq!(clock.tick(), 2);
        assert!((clock.interpolation() - 0.5).abs() < 1e-4);
        assert_eq!(clock.advance(0.06), 1);
        assert!(clock.interpolation() < 0.2);
    }

    #[test]
    fn caps_ticks_per_frame() {
        let mut clock = GameClock::new(100.0).unwrap();
        clock.max_ticks_per_frame = 3;
        assert_eq!(clock.advance(1.0), 3);
        assert_eq!(clock.tick(), 3);
        assert!(clock.interpolation() < 1e-3);
    }

    #[test]
    fn negative_dt_is_ignored() {
        let mut clock = GameClock::new(60.0).unwrap();
        assert_eq!(clock.advance(-1.0), 0);
        assert_eq!(clock.interpolation(), 0.0);
    }
}
