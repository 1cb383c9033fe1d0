//! Linear parameter ramps for click-free gain changes.
//!
//! ```
//! use ensemble_core::SmoothedValue;
//!
//! let mut gain = SmoothedValue::new(1.0, 0.010);
//! gain.prepare(48000.0);
//! gain.set_target(0.0);
//!
//! let mut block = [1.0f32; 64];
//! gain.apply(&mut block);
//! assert!(block[63] < block[0]);
//! ```

/// A value that moves linearly towards its target over a fixed ramp time.
///
/// The ramp length in samples is derived from the sample rate passed to
/// [`prepare`](SmoothedValue::prepare); before that, targets are applied
/// immediately.
#[derive(Debug, Clone)]
pub struct SmoothedValue {
    current: f32,
    target: f32,
    step: f32,
    remaining: u32,
    ramp_secs: f32,
    ramp_samples: u32,
}

impl SmoothedValue {
    pub fn new(initial: f32, ramp_secs: f32) -> Self {
        Self {
            current: initial,
            target: initial,
            step: 0.0,
            remaining: 0,
            ramp_secs: ramp_secs.max(0.0),
            ramp_samples: 0,
        }
    }

    pub fn prepare(&mut self, sample_rate: f64) {
        self.ramp_samples = (self.ramp_secs as f64 * sample_rate).round() as u32;
        self.snap();
    }

    #[inline]
    pub fn set_target(&mut self, target: f32) {
        if target == self.target {
            return;
        }
        self.target = target;
        if self.ramp_samples == 0 {
            self.snap();
            return;
        }
        self.remaining = self.ramp_samples;
        self.step = (self.target - self.current) / self.remaining as f32;
    }

    /// Jump straight to the target.
    #[inline]
    pub fn snap(&mut self) {
        self.current = self.target;
        self.step = 0.0;
        self.remaining = 0;
    }

    #[inline]
    pub fn next(&mut self) -> f32 {
        if self.remaining > 0 {
            self.remaining -= 1;
            self.current = if self.remaining == 0 {
                self.target
            } else {
                self.current + self.step
            };
        }
        self.current
    }

    /// Multiply `samples` by the ramp, advancing it once per sample.
    #[inline]
    pub fn apply(&mut self, samples: &mut [f32]) {
        if !self.is_ramping() {
            let gain = self.current;
            if gain != 1.0 {
                samples.iter_mut().for_each(|s| *s *= gain);
            }
            return;
        }
        for s in samples.iter_mut() {
            *s *= self.next();
        }
    }

    /// Fill `gains` with consecutive ramp values.
    #[inline]
    pub fn fill(&mut self, gains: &mut [f32]) {
        for g in gains.iter_mut() {
            *g = self.next();
        }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_ramping(&self) -> bool {
        self.remaining > 0
    }
}

impl Default for SmoothedValue {
    fn default() -> Self {
        Self::new(0.0, 0.005)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_unprepared_value_jumps() {
        let mut value = SmoothedValue::new(1.0, 0.01);
        value.set_target(0.25);
        assert!(!value.is_ramping());
        assert_eq!(value.next(), 0.25);
    }

    #[test]
    fn test_ramp_reaches_target_exactly() {
        let mut value = SmoothedValue::new(0.0, 0.001);
        value.prepare(10000.0);
        value.set_target(1.0);

        let mut last = 0.0;
        for _ in 0..10 {
            let v = value.next();
            assert!(v >= last);
            last = v;
        }
        assert_eq!(last, 1.0);
        assert!(!value.is_ramping());
    }

    #[test]
    fn test_apply_constant_gain() {
        let mut value = SmoothedValue::new(0.5, 0.01);
        value.prepare(48000.0);
        let mut block = [1.0f32; 8];
        value.apply(&mut block);
        for s in block {
            assert_relative_eq!(s, 0.5);
        }
    }

    #[test]
    fn test_retarget_mid_ramp() {
        let mut value = SmoothedValue::new(0.0, 0.001);
        value.prepare(8000.0);
        value.set_target(1.0);
        for _ in 0..4 {
            value.next();
        }
        value.set_target(0.0);
        let mut gains = [0.0f32; 8];
        value.fill(&mut gains);
        assert_eq!(value.current(), 0.0);
        assert!(gains[0] < 0.5);
    }
}
