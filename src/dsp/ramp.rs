/// A value that moves to its target in a straight line over a fixed time.
///
/// Used where an instant jump would click, e.g. the oscillator frequency
/// on a legato retrigger.
#[derive(Debug, Clone)]
pub struct LinearRamp {
    current: f32,
    target: f32,
    increment: f32,
    samples_remaining: u32,
    ramp_samples: u32,
}

impl LinearRamp {
    /// A ramp resting at `initial` that takes `ramp_time` seconds per transition.
    pub fn new(initial: f32, sample_rate: f32, ramp_time: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            increment: 0.0,
            samples_remaining: 0,
            ramp_samples: (ramp_time * sample_rate).round().max(0.0) as u32,
        }
    }

    /// Start a transition from the current value towards `target`.
    pub fn set_target(&mut self, target: f32) {
        if target == self.target {
            return;
        }
        self.target = target;

        if self.ramp_samples == 0 {
            self.set_immediate(target);
        } else {
            self.increment = (target - self.current) / self.ramp_samples as f32;
            self.samples_remaining = self.ramp_samples;
        }
    }

    /// Jump straight to `value`, cancelling any transition.
    pub fn set_immediate(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.increment = 0.0;
        self.samples_remaining = 0;
    }

    #[inline]
    pub fn advance(&mut self) -> f32 {
        if self.samples_remaining > 0 {
            self.current += self.increment;
            self.samples_remaining -= 1;
            if self.samples_remaining == 0 {
                self.current = self.target;
            }
        }
        self.current
    }

    #[inline]
    pub fn current(&self) -> f32 {
        self.current
    }

    #[inline]
    pub fn target(&self) -> f32 {
        self.target
    }

    #[inline]
    pub fn is_settled(&self) -> bool {
        self.samples_remaining == 0
    }
}
