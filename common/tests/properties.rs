use std::{collections::BTreeSet, io::Write};

use common::{
    Record,
    loader::load_records,
    metrics::{MetricKind, derived_metric, speedup},
    query::{Criteria, baseline, filter, unique_values},
};
use proptest::prelude::*;

const VERSIONS: &[&str] = &["seq", "simd", "parallel_simd", "ingenua", "arrumada"];

fn record_strategy() -> impl Strategy<Value = Record> {
    (
        prop::sample::select(VERSIONS),
        prop::sample::select(vec![1_000u64, 100_000, 1_000_000, 10_000_000]),
        prop::sample::select(vec![1u32, 2, 4, 8, 16]),
        0.0f64..10.0,
        0.0f64..1.0,
    )
        .prop_map(|(version, n, threads, mean_time, std_dev)| {
            Record::new(version, n, threads, mean_time, std_dev)
        })
}

fn records_strategy() -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec(record_strategy(), 0..40)
}

proptest! {
    #[test]
    fn unique_values_sorted_without_duplicates(records in records_strategy()) {
        let ns = unique_values(&records, |r| r.n);
        prop_assert!(ns.windows(2).all(|w| w[0] < w[1]));

        let expected = records.iter().map(|r| r.n).collect::<BTreeSet<_>>();
        prop_assert_eq!(ns, expected.into_iter().collect::<Vec<_>>());
    }

    #[test]
    fn empty_filter_is_identity(records in records_strategy()) {
        let all = filter(&records, &Criteria::default());
        prop_assert_eq!(all, records.iter().collect::<Vec<_>>());
    }

    #[test]
    fn filter_keeps_only_matches_in_order(
        records in records_strategy(),
        version in prop::sample::select(VERSIONS),
        threads in prop::sample::select(vec![1u32, 2, 4, 8, 16]),
    ) {
        let criteria = Criteria::new().version(version).threads(threads);
        let matched = filter(&records, &criteria);
        let expected = records
            .iter()
            .filter(|r| r.version == version && r.threads == threads)
            .collect::<Vec<_>>();
        prop_assert_eq!(matched, expected);
    }

    #[test]
    fn speedup_matches_definition(base in record_strategy(), variant in record_strategy()) {
        let value = derived_metric(MetricKind::Speedup, Some(&base), Some(&variant));
        if variant.mean_time > 0.0 {
            prop_assert_eq!(value, base.mean_time / variant.mean_time);
        } else {
            prop_assert_eq!(value, 0.0);
        }
        prop_assert_eq!(value, speedup(base.mean_time, variant.mean_time));
    }

    #[test]
    fn groups_without_baseline_degrade_to_zero(records in records_strategy()) {
        let records = records
            .into_iter()
            .filter(|r| !r.is_baseline())
            .collect::<Vec<_>>();
        for n in unique_values(&records, |r| r.n) {
            let seq = baseline(&records, n).ok();
            prop_assert!(seq.is_none());
            for variant in filter(&records, &Criteria::new().n(n)) {
                for kind in [MetricKind::Speedup, MetricKind::OverheadPct, MetricKind::PropagatedStd] {
                    prop_assert_eq!(derived_metric(kind, seq, Some(variant)), 0.0);
                }
            }
        }
    }

    #[test]
    fn loaded_sizes_match_file(records in records_strategy()) {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "versao,n,threads,tempo_medio,desvio_padrao").unwrap();
        for r in &records {
            writeln!(file, "{},{},{},{},{}", r.version, r.n, r.threads, r.mean_time, r.std_dev).unwrap();
        }
        file.flush().unwrap();

        let loaded = load_records(file.path()).unwrap();
        prop_assert_eq!(loaded.len(), records.len());
        prop_assert_eq!(
            unique_values(&loaded, |r| r.n),
            records.iter().map(|r| r.n).collect::<BTreeSet<_>>().into_iter().collect::<Vec<_>>()
        );
    }
}

#[test]
fn simd_example_speedup() {
    let records = vec![
        Record::new("seq", 1000, 1, 0.002, 0.0001),
        Record::new("simd", 1000, 1, 0.0005, 0.00002),
    ];
    let seq = filter(&records, &Criteria::new().version("seq").n(1000));
    assert_eq!(seq.len(), 1);

    let simd = filter(&records, &Criteria::new().version("simd").n(1000));
    let value = derived_metric(MetricKind::Speedup, Some(seq[0]), Some(simd[0]));
    assert!((value - 4.0).abs() < 1e-12);
}
