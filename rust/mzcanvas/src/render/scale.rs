/// Affine map from a data domain onto a pixel range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> (f64, f64) {
        self.domain
    }

    pub fn range(&self) -> (f64, f64) {
        self.range
    }

    pub fn set_domain(&mut self, domain: (f64, f64)) {
        self.domain = domain;
    }

    /// Data to pixels. A degenerate domain maps everything onto the middle
    /// of the range.
    pub fn apply(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = d1 - d0;
        if span == 0.0 || !span.is_finite() {
            return (r0 + r1) / 2.0;
        }
        r0 + (value - d0) / span * (r1 - r0)
    }

    /// Pixels to data.
    pub fn invert(&self, pixel: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        let span = r1 - r0;
        if span == 0.0 {
            return d0;
        }
        d0 + (pixel - r0) / span * (d1 - d0)
    }

    /// Roughly `count` round-valued ticks covering the domain.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        let (mut start, mut stop) = self.domain;
        if !start.is_finite() || !stop.is_finite() {
            return Vec::new();
        }
        if start == stop {
            return vec![start];
        }
        if stop < start {
            std::mem::swap(&mut start, &mut stop);
        }
        let step = tick_step(start, stop, count);
        if step <= 0.0 || !step.is_finite() {
            return Vec::new();
        }
        let first = (start / step).ceil() as i64;
        let last = (stop / step).floor() as i64;
        (first..=last).map(|i| i as f64 * step).collect()
    }
}

/// Step between ticks, a power of ten times 1, 2 or 5.
pub fn tick_step(start: f64, stop: f64, count: usize) -> f64 {
    let raw = (stop - start) / count.max(1) as f64;
    let base = 10f64.powf(raw.log10().floor());
    let error = raw / base;
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    factor * base
}

/// Label for a tick, with as many decimals as the step needs. Large values
/// switch to exponent notation.
pub fn format_tick(value: f64, step: f64) -> String {
    if value.abs() >= 1e5 {
        return format!("{:.1e}", value);
    }
    let decimals = if step > 0.0 && step < 1.0 {
        (-step.log10().floor()) as usize
    } else {
        0
    };
    format!("{:.*}", decimals, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_and_invert() {
        let scale = LinearScale::new((100.0, 1100.0), (0.0, 1000.0));
        assert_eq!(scale.apply(600.0), 500.0);
        assert_eq!(scale.invert(250.0), 350.0);
    }

    #[test]
    fn test_inverted_range() {
        // Test: Vertical axes map the domain maximum to pixel 0
        let scale = LinearScale::new((0.0, 100.0), (400.0, 0.0));
        assert_eq!(scale.apply(100.0), 0.0);
        assert_eq!(scale.apply(25.0), 300.0);
        assert_eq!(scale.invert(0.0), 100.0);
    }

    #[test]
    fn test_degenerate_domain() {
        let scale = LinearScale::new((5.0, 5.0), (0.0, 10.0));
        assert_eq!(scale.apply(5.0), 5.0);
    }

    #[test]
    fn test_ticks_are_round() {
        let scale = LinearScale::new((50.0, 1050.0), (0.0, 1000.0));
        let ticks = scale.ticks(10);
        assert_eq!(ticks.first(), Some(&100.0));
        assert_eq!(ticks.last(), Some(&1000.0));
        assert_eq!(ticks.len(), 10);
    }

    #[test]
    fn test_format_tick() {
        assert_eq!(format_tick(1500.0, 500.0), "1500");
        assert_eq!(format_tick(0.25, 0.05), "0.25");
        assert_eq!(format_tick(250000.0, 50000.0), "2.5e5");
    }
}
