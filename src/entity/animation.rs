/// A looping cycle of frames, each shown for its own duration (seconds).
///
/// The frame index is a pure function of time spent in the cycle, so the
/// result does not depend on how the time was split into ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Animation {
    frames: &'static [f32],
    period: f32,
    timer: f32,
    current_frame: u8,
}

impl Animation {
    pub fn new(frames: &'static [f32]) -> Self {
        let period = frames.iter().sum();
        Self {
            frames,
            period,
            timer: 0.0,
            current_frame: 0,
        }
    }

    /// Advances the cycle timer by `dt`, wrapping on the cycle period.
    pub fn tick(&mut self, dt: f32) {
        if self.period <= 0.0 {
            return;
        }
        self.timer = (self.timer + dt).rem_euclid(self.period);
        self.current_frame = self.frame_at(self.timer);
    }

    /// Restarts the cycle from its first frame.
    pub fn restart(&mut self) {
        self.timer = 0.0;
        self.current_frame = 0;
    }

    /// The frame shown `elapsed` seconds into the cycle.
    pub fn frame_at(&self, elapsed: f32) -> u8 {
        if self.period <= 0.0 {
            return 0;
        }

        let mut remaining = elapsed.rem_euclid(self.period);
        for (index, duration) in self.frames.iter().enumerate() {
            if remaining < *duration {
                return index as u8;
            }
            remaining -= duration;
        }
        self.frames.len().saturating_sub(1) as u8
    }

    pub fn current_frame(&self) -> u8 {
        self.current_frame
    }

    pub fn timer(&self) -> f32 {
        self.timer
    }

    pub fn period(&self) -> f32 {
        self.period
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}
