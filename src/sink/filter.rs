// ABOUTME: Second-order biquad filter stage for the device sink
// ABOUTME: RBJ cookbook coefficients, Direct Form I, one instance per channel

use crate::config::{FilterParams, FilterType};
use std::f32::consts::PI;

/// A second-order (12 dB/octave) filter using Direct Form I.
#[derive(Debug, Clone, Copy)]
pub struct Biquad {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32, // a0 is normalized to 1
    a2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl Biquad {
    /// Build a filter from pass-through parameters at the given sample rate.
    ///
    /// Frequency is clamped below Nyquist and Q kept positive so degenerate
    /// configurations stay stable instead of blowing up the feedback path.
    pub fn new(params: &FilterParams, sample_rate: u32) -> Self {
        let sample_rate = sample_rate.max(1) as f32;
        let frequency = params
            .detuned_frequency()
            .clamp(10.0, sample_rate * 0.499);
        let q = params.q.max(0.01);

        // Audio EQ Cookbook (Robert Bristow-Johnson).
        let a = 10f32.powf(params.gain_db / 40.0);
        let omega = 2.0 * PI * frequency / sample_rate;
        let sn = omega.sin();
        let cs = omega.cos();
        let alpha = sn / (2.0 * q);

        let (b0, b1, b2, a0, a1, a2) = match params.filter_type {
            FilterType::LowPass => {
                let b1 = 1.0 - cs;
                (b1 / 2.0, b1, b1 / 2.0, 1.0 + alpha, -2.0 * cs, 1.0 - alpha)
            }
            FilterType::HighPass => {
                let b1 = -(1.0 + cs);
                (-b1 / 2.0, b1, -b1 / 2.0, 1.0 + alpha, -2.0 * cs, 1.0 - alpha)
            }
            FilterType::BandPass => {
                (alpha, 0.0, -alpha, 1.0 + alpha, -2.0 * cs, 1.0 - alpha)
            }
            FilterType::Notch => {
                (1.0, -2.0 * cs, 1.0, 1.0 + alpha, -2.0 * cs, 1.0 - alpha)
            }
            FilterType::Peaking => (
                1.0 + alpha * a,
                -2.0 * cs,
                1.0 - alpha * a,
                1.0 + alpha / a,
                -2.0 * cs,
                1.0 - alpha / a,
            ),
            FilterType::LowShelf => {
                let beta = 2.0 * a.sqrt() * alpha;
                (
                    a * ((a + 1.0) - (a - 1.0) * cs + beta),
                    2.0 * a * ((a - 1.0) - (a + 1.0) * cs),
                    a * ((a + 1.0) - (a - 1.0) * cs - beta),
                    (a + 1.0) + (a - 1.0) * cs + beta,
                    -2.0 * ((a - 1.0) + (a + 1.0) * cs),
                    (a + 1.0) + (a - 1.0) * cs - beta,
                )
            }
            FilterType::HighShelf => {
                let beta = 2.0 * a.sqrt() * alpha;
                (
                    a * ((a + 1.0) + (a - 1.0) * cs + beta),
                    -2.0 * a * ((a - 1.0) + (a + 1.0) * cs),
                    a * ((a + 1.0) + (a - 1.0) * cs - beta),
                    (a + 1.0) - (a - 1.0) * cs + beta,
                    2.0 * ((a - 1.0) - (a + 1.0) * cs),
                    (a + 1.0) - (a - 1.0) * cs - beta,
                )
            }
        };

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Filter one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;
        output
    }

    /// Clear delay-line state.
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(filter_type: FilterType, frequency: f32) -> FilterParams {
        FilterParams::builder()
            .filter_type(filter_type)
            .frequency(frequency)
            .build()
    }

    fn settle_on_dc(filter: &mut Biquad) -> f32 {
        let mut out = 0.0;
        for _ in 0..4000 {
            out = filter.process(1.0);
        }
        out
    }

    #[test]
    fn test_lowpass_passes_dc() {
        let mut filter = Biquad::new(&params(FilterType::LowPass, 1000.0), 48_000);
        let out = settle_on_dc(&mut filter);
        assert!((out - 1.0).abs() < 1e-3, "DC gain {out} should be ~1");
    }

    #[test]
    fn test_highpass_blocks_dc() {
        let mut filter = Biquad::new(&params(FilterType::HighPass, 1000.0), 48_000);
        let out = settle_on_dc(&mut filter);
        assert!(out.abs() < 1e-3, "DC gain {out} should be ~0");
    }

    #[test]
    fn test_bandpass_blocks_dc() {
        let mut filter = Biquad::new(&params(FilterType::BandPass, 1000.0), 48_000);
        let out = settle_on_dc(&mut filter);
        assert!(out.abs() < 1e-2, "DC gain {out} should be ~0");
    }

    #[test]
    fn test_notch_passes_dc() {
        let mut filter = Biquad::new(&params(FilterType::Notch, 1000.0), 48_000);
        let out = settle_on_dc(&mut filter);
        assert!((out - 1.0).abs() < 1e-2, "DC gain {out} should be ~1");
    }

    #[test]
    fn test_lowshelf_boosts_dc() {
        let p = FilterParams::builder()
            .filter_type(FilterType::LowShelf)
            .frequency(1000.0)
            .gain_db(6.0)
            .build();
        let mut filter = Biquad::new(&p, 48_000);
        let out = settle_on_dc(&mut filter);
        let expected = 10f32.powf(6.0 / 20.0);
        assert!(
            (out - expected).abs() < 0.05,
            "low-shelf DC gain {out}, expected ~{expected}"
        );
    }

    #[test]
    fn test_reset_clears_state() {
        let mut filter = Biquad::new(&params(FilterType::LowPass, 1000.0), 48_000);
        for _ in 0..100 {
            filter.process(1.0);
        }
        filter.reset();
        let first = filter.process(0.0);
        assert_eq!(first, 0.0);
    }

    #[test]
    fn test_degenerate_frequency_is_stable() {
        // Frequency above Nyquist gets clamped; output must stay finite.
        let mut filter = Biquad::new(&params(FilterType::LowPass, 100_000.0), 8000);
        let mut peak = 0.0f32;
        for i in 0..1000 {
            let x = if i % 2 == 0 { 1.0 } else { -1.0 };
            peak = peak.max(filter.process(x).abs());
        }
        assert!(peak.is_finite() && peak < 100.0);
    }
}
