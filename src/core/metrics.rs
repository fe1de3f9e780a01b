//! Derived physiological metrics over a sample window.
//!
//! Every metric is optional: a window that is too short, too sparse, or
//! numerically degenerate yields `None` for the affected metric rather than a
//! placeholder value. Downstream consumers must treat absence as a normal
//! state, not an error.
//!
//! HRV metrics operate on inter-beat intervals reconstructed from the heart
//! rate channel (`ibi_ms = 60_000 / hr`). The LF/HF ratio comes from a
//! windowed FFT power spectrum of the IBI series, linearly resampled onto a
//! uniform grid first because sensor timestamps are irregular.

use crate::config::{AffectWeights, MetricConfig, NormProfile};
use crate::core::buffer::SampleWindow;
use num_complex::Complex;
use rustfft::FftPlanner;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Affect scores are clamped to this many standard deviations.
const AFFECT_CLAMP: f64 = 3.0;

/// Below this total HF power the LF/HF ratio is numerically meaningless.
const MIN_BAND_POWER: f64 = 1e-12;

/// One computation cycle's worth of derived metrics.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricSnapshot {
    /// Mean heart rate over the window (bpm)
    pub hr_mean: Option<f64>,
    /// Mean respiration rate over the window (breaths/min)
    pub br_mean: Option<f64>,
    /// Standard deviation of inter-beat intervals (ms)
    pub sdnn: Option<f64>,
    /// Root mean square of successive IBI differences (ms)
    pub rmssd: Option<f64>,
    /// Low-frequency / high-frequency spectral power ratio
    pub lf_hf: Option<f64>,
    /// Pleasantness score in [-3, 3]
    pub valence: Option<f64>,
    /// Activation score in [-3, 3]
    pub arousal: Option<f64>,
}

impl MetricSnapshot {
    /// The all-absent snapshot, published before any data arrives.
    pub fn absent() -> Self {
        Self::default()
    }
}

/// Compute all metrics for the given window.
pub fn compute(
    window: &SampleWindow,
    cfg: &MetricConfig,
    weights: &AffectWeights,
    norms: &NormProfile,
) -> MetricSnapshot {
    let hr_mean = finite_or_none(window.heart_rates().iter().mean());
    let br_mean = finite_or_none(window.respiration_rates().iter().mean());

    let ibi = ibi_series(window);

    let (sdnn, rmssd) = if ibi.len() >= cfg.min_hrv_samples {
        let intervals: Vec<f64> = ibi.iter().map(|&(_, v)| v).collect();
        (
            finite_or_none(intervals.iter().population_std_dev()),
            finite_or_none(rmssd_of(&intervals)),
        )
    } else {
        (None, None)
    };

    let lf_hf = if window.span_secs() >= cfg.min_spectral_secs {
        lf_hf_ratio(&ibi, cfg)
    } else {
        None
    };

    let (valence, arousal) = affect_scores(hr_mean, br_mean, sdnn, lf_hf, weights, norms);

    MetricSnapshot {
        hr_mean,
        br_mean,
        sdnn,
        rmssd,
        lf_hf,
        valence,
        arousal,
    }
}

/// IBI series as (seconds since window start, interval in ms).
fn ibi_series(window: &SampleWindow) -> Vec<(f64, f64)> {
    let samples = window.samples();
    let Some(first) = samples.first() else {
        return Vec::new();
    };
    samples
        .iter()
        .map(|s| {
            let t = (s.timestamp - first.timestamp).num_milliseconds() as f64 / 1000.0;
            (t, 60_000.0 / s.heart_rate)
        })
        .collect()
}

fn rmssd_of(intervals: &[f64]) -> f64 {
    let diffs: Vec<f64> = intervals.windows(2).map(|w| w[1] - w[0]).collect();
    if diffs.is_empty() {
        return f64::NAN;
    }
    (diffs.iter().map(|d| d * d).sum::<f64>() / diffs.len() as f64).sqrt()
}

/// LF/HF ratio from a Hamming-windowed FFT of the resampled IBI series.
fn lf_hf_ratio(ibi: &[(f64, f64)], cfg: &MetricConfig) -> Option<f64> {
    let series = resample_uniform(ibi, cfg.resample_hz)?;
    let n = series.len();
    if n < 4 {
        return None;
    }

    let mean = series.iter().mean();
    let mut buffer: Vec<Complex<f64>> = series
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let w = 0.54
                - 0.46 * (2.0 * std::f64::consts::PI * i as f64 / (n - 1) as f64).cos();
            Complex::new((v - mean) * w, 0.0)
        })
        .collect();

    let mut planner = FftPlanner::new();
    planner.plan_fft_forward(n).process(&mut buffer);

    let mut lf_power = 0.0;
    let mut hf_power = 0.0;
    // One-sided spectrum; DC carries no rhythm information
    for (i, bin) in buffer.iter().enumerate().take(n / 2 + 1).skip(1) {
        let freq = i as f64 * cfg.resample_hz / n as f64;
        let power = bin.norm_sqr();
        if freq >= cfg.lf_band.0 && freq < cfg.lf_band.1 {
            lf_power += power;
        } else if freq >= cfg.hf_band.0 && freq < cfg.hf_band.1 {
            hf_power += power;
        }
    }

    if hf_power <= MIN_BAND_POWER {
        return None;
    }
    finite_or_none(lf_power / hf_power)
}

/// Linear interpolation of an irregular series onto a uniform grid.
fn resample_uniform(series: &[(f64, f64)], hz: f64) -> Option<Vec<f64>> {
    if series.len() < 2 || hz <= 0.0 {
        return None;
    }
    let span = series.last()?.0 - series.first()?.0;
    let count = (span * hz).floor() as usize + 1;

    let mut out = Vec::with_capacity(count);
    let mut seg = 0;
    for k in 0..count {
        let t = series[0].0 + k as f64 / hz;
        while seg + 2 < series.len() && series[seg + 1].0 <= t {
            seg += 1;
        }
        let (t0, v0) = series[seg];
        let (t1, v1) = series[seg + 1];
        let frac = if t1 > t0 { ((t - t0) / (t1 - t0)).clamp(0.0, 1.0) } else { 0.0 };
        out.push(v0 + frac * (v1 - v0));
    }
    Some(out)
}

/// Valence and arousal from normalized deviations against the active profile.
///
/// Both scores require the heart rate level, respiration level, and SDNN to be
/// present. LF/HF contributes a small arousal term only when available, so a
/// short-but-sufficient HRV window still yields a classifiable state.
fn affect_scores(
    hr_mean: Option<f64>,
    br_mean: Option<f64>,
    sdnn: Option<f64>,
    lf_hf: Option<f64>,
    weights: &AffectWeights,
    norms: &NormProfile,
) -> (Option<f64>, Option<f64>) {
    let (Some(hr), Some(br), Some(sdnn)) = (hr_mean, br_mean, sdnn) else {
        return (None, None);
    };

    let hr_dev = norms.hr.z(hr);
    let br_dev = norms.br.z(br);
    let sdnn_dev = norms.sdnn.z(sdnn);
    let lfhf_dev = lf_hf.map(|v| norms.lf_hf.z(v)).unwrap_or(0.0);

    let arousal = weights.hr_arousal * hr_dev
        + weights.lfhf_arousal * lfhf_dev
        + weights.sdnn_arousal * (-sdnn_dev);
    let valence = weights.br_valence * (-br_dev) + weights.sdnn_valence * sdnn_dev;

    (
        finite_or_none(valence).map(|v| v.clamp(-AFFECT_CLAMP, AFFECT_CLAMP)),
        finite_or_none(arousal).map(|a| a.clamp(-AFFECT_CLAMP, AFFECT_CLAMP)),
    )
}

fn finite_or_none(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::core::buffer::SampleBuffer;
    use crate::link::types::VitalSample;
    use chrono::{DateTime, Duration, Utc};

    fn window_from(rates: &[(f64, f64)], interval_ms: i64) -> SampleWindow {
        let base = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let mut buffer = SampleBuffer::new(3600);
        for (i, &(hr, br)) in rates.iter().enumerate() {
            let ts = base + Duration::milliseconds(i as i64 * interval_ms);
            buffer.push(VitalSample::new(ts, hr, br)).unwrap();
        }
        buffer.snapshot()
    }

    fn test_config() -> Config {
        Config::default()
    }

    #[test]
    fn test_empty_window_is_all_absent() {
        let cfg = test_config();
        let snap = compute(
            &SampleWindow::default(),
            &cfg.metrics,
            &cfg.weights,
            &cfg.norms().unwrap(),
        );
        assert_eq!(snap, MetricSnapshot::absent());
    }

    #[test]
    fn test_short_window_has_means_but_no_hrv() {
        let cfg = test_config();
        let rates: Vec<(f64, f64)> = (0..5).map(|_| (70.0, 14.0)).collect();
        let snap = compute(
            &window_from(&rates, 1000),
            &cfg.metrics,
            &cfg.weights,
            &cfg.norms().unwrap(),
        );

        assert!((snap.hr_mean.unwrap() - 70.0).abs() < 1e-9);
        assert!((snap.br_mean.unwrap() - 14.0).abs() < 1e-9);
        assert!(snap.sdnn.is_none());
        assert!(snap.valence.is_none());
        assert!(snap.arousal.is_none());
    }

    #[test]
    fn test_hrv_present_with_oscillating_heart_rate() {
        let cfg = test_config();
        // 25 one-second samples alternating between two rates
        let rates: Vec<(f64, f64)> = (0..25)
            .map(|i| (if i % 2 == 0 { 65.0 } else { 75.0 }, 14.0))
            .collect();
        let snap = compute(
            &window_from(&rates, 1000),
            &cfg.metrics,
            &cfg.weights,
            &cfg.norms().unwrap(),
        );

        assert!(snap.sdnn.unwrap() > 0.0);
        assert!(snap.rmssd.unwrap() > 0.0);
        // 24 s span is below the spectral minimum
        assert!(snap.lf_hf.is_none());
        // Affect scores do not wait for the spectral metric
        assert!(snap.valence.is_some());
        assert!(snap.arousal.is_some());
    }

    #[test]
    fn test_constant_heart_rate_has_zero_variability() {
        let cfg = test_config();
        let rates: Vec<(f64, f64)> = (0..30).map(|_| (70.0, 14.0)).collect();
        let snap = compute(
            &window_from(&rates, 1000),
            &cfg.metrics,
            &cfg.weights,
            &cfg.norms().unwrap(),
        );

        assert!(snap.sdnn.unwrap().abs() < 1e-9);
        assert!(snap.rmssd.unwrap().abs() < 1e-9);
    }

    #[test]
    fn test_lf_dominant_rhythm_yields_high_ratio() {
        let cfg = test_config();
        // 0.1 Hz modulation sits squarely in the LF band
        let rates: Vec<(f64, f64)> = (0..180)
            .map(|i| {
                let t = i as f64;
                let hr = 70.0
                    + 8.0 * (2.0 * std::f64::consts::PI * 0.1 * t).sin()
                    + 0.5 * (2.0 * std::f64::consts::PI * 0.3 * t).sin();
                (hr, 14.0)
            })
            .collect();
        let snap = compute(
            &window_from(&rates, 1000),
            &cfg.metrics,
            &cfg.weights,
            &cfg.norms().unwrap(),
        );

        assert!(snap.lf_hf.unwrap() > 1.0);
    }

    #[test]
    fn test_affect_scores_are_clamped() {
        let cfg = test_config();
        // Extreme bradypnea pushes raw valence far beyond the clamp
        let rates: Vec<(f64, f64)> = (0..30)
            .map(|i| (if i % 2 == 0 { 40.0 } else { 200.0 }, 1.0))
            .collect();
        let snap = compute(
            &window_from(&rates, 1000),
            &cfg.metrics,
            &cfg.weights,
            &cfg.norms().unwrap(),
        );

        let valence = snap.valence.unwrap();
        let arousal = snap.arousal.unwrap();
        assert!((-3.0..=3.0).contains(&valence));
        assert!((-3.0..=3.0).contains(&arousal));
    }
}
