use serde::{Deserialize, Serialize};

use crate::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricKind {
    /// `baseline / variant`
    Speedup,
    /// Percentage slowdown of the variant relative to the baseline
    OverheadPct,
    /// First-order error of the speedup, baseline error is ignored
    PropagatedStd,
}

/// Derived metric of `variant` against `baseline`.
///
/// A missing record on either side yields 0, as does a zero denominator. Plots
/// render these as empty bars instead of aborting the report.
pub fn derived_metric(
    kind: MetricKind,
    baseline: Option<&Record>,
    variant: Option<&Record>,
) -> f64 {
    let (Some(baseline), Some(variant)) = (baseline, variant) else {
        return 0.0;
    };
    match kind {
        MetricKind::Speedup => speedup(baseline.mean_time, variant.mean_time),
        MetricKind::OverheadPct => overhead_pct(baseline.mean_time, variant.mean_time),
        MetricKind::PropagatedStd => {
            propagated_std(baseline.mean_time, variant.mean_time, variant.std_dev)
        }
    }
}

pub fn speedup(baseline_time: f64, time: f64) -> f64 {
    if time > 0.0 { baseline_time / time } else { 0.0 }
}

pub fn overhead_pct(baseline_time: f64, time: f64) -> f64 {
    if baseline_time > 0.0 {
        (time - baseline_time) / baseline_time * 100.0
    } else {
        0.0
    }
}

pub fn propagated_std(baseline_time: f64, time: f64, std_dev: f64) -> f64 {
    if time > 0.0 {
        speedup(baseline_time, time) * std_dev / time
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq() -> Record {
        Record::new("seq", 1000, 1, 0.002, 0.0001)
    }

    fn simd() -> Record {
        Record::new("simd", 1000, 1, 0.0005, 0.00002)
    }

    #[test]
    fn speedup_of_simd_over_seq() {
        let value = derived_metric(MetricKind::Speedup, Some(&seq()), Some(&simd()));
        assert!((value - 4.0).abs() < 1e-12);
    }

    #[test]
    fn zero_time_saturates() {
        let zero = Record::new("simd", 1000, 1, 0.0, 0.0);
        assert_eq!(derived_metric(MetricKind::Speedup, Some(&seq()), Some(&zero)), 0.0);
        assert_eq!(
            derived_metric(MetricKind::PropagatedStd, Some(&seq()), Some(&zero)),
            0.0
        );
        assert_eq!(
            derived_metric(MetricKind::OverheadPct, Some(&zero), Some(&seq())),
            0.0
        );
    }

    #[test]
    fn missing_records_yield_zero() {
        for kind in [
            MetricKind::Speedup,
            MetricKind::OverheadPct,
            MetricKind::PropagatedStd,
        ] {
            assert_eq!(derived_metric(kind, None, Some(&simd())), 0.0);
            assert_eq!(derived_metric(kind, Some(&seq()), None), 0.0);
        }
    }

    #[test]
    fn overhead_is_relative_to_baseline() {
        let fixed = Record::new("arrumada", 1000, 4, 0.002, 0.0);
        let naive = Record::new("ingenua", 1000, 4, 0.003, 0.0);
        let value = derived_metric(MetricKind::OverheadPct, Some(&fixed), Some(&naive));
        assert!((value - 50.0).abs() < 1e-9);
        let value = derived_metric(MetricKind::OverheadPct, Some(&naive), Some(&fixed));
        assert!((value + 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn propagated_error_scales_with_relative_std() {
        // speedup 4, relative std 0.04
        let value = derived_metric(MetricKind::PropagatedStd, Some(&seq()), Some(&simd()));
        assert!((value - 0.16).abs() < 1e-12);
    }
}
