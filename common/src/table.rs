use itertools::Itertools;

use crate::{
    Record,
    metrics::speedup,
    query::{Criteria, filter, try_baseline, unique_values},
    util::group_thousands,
};

const HEADER: &str = "| Version | N | Threads | Mean Time (ms) | Std Dev (ms) | Speedup |";
const SEPARATOR: &str = "|---------|---|---------|----------------|--------------|---------|";

/// Markdown-style summary of every record, grouped by problem size.
///
/// Speedups are against the sequential record of the same size, and are 0 when
/// that record is missing.
pub fn summary_table(records: &[Record], num_runs: usize) -> String {
    let version_width = records
        .iter()
        .map(|r| r.version.len())
        .max()
        .unwrap_or(0)
        .max("Version".len());

    let mut lines = vec![
        format!("=== Summary table (mean of {num_runs} runs) ==="),
        String::new(),
        HEADER.to_owned(),
        SEPARATOR.to_owned(),
    ];

    for n in unique_values(records, |r| r.n) {
        let data_n = filter(records, &Criteria::new().n(n));
        let seq_time = try_baseline(data_n.iter().copied(), n).map(|seq| seq.mean_time);

        lines.extend(
            data_n
                .into_iter()
                .sorted_by(|a, b| (&a.version, a.threads).cmp(&(&b.version, b.threads)))
                .map(|row| {
                    format!(
                        "| {:version_width$} | {} | {:2} | {:12.4} | {:13.4} | {:6.2}x |",
                        row.version,
                        group_thousands(row.n),
                        row.threads,
                        row.mean_time_ms(),
                        row.std_dev_ms(),
                        seq_time.map_or(0.0, |t| speedup(t, row.mean_time)),
                    )
                }),
        );
        lines.push(SEPARATOR.to_owned());
    }

    lines.into_iter().map(|line| line + "\n").collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_by_size_and_sorts_rows() {
        let records = vec![
            Record::new("simd", 1000, 1, 0.0005, 0.00002),
            Record::new("seq", 1000, 1, 0.002, 0.0001),
            Record::new("parallel_simd", 1000, 4, 0.00025, 0.00001),
            Record::new("parallel_simd", 1000, 2, 0.0004, 0.00001),
            Record::new("seq", 10, 1, 0.00002, 0.0),
        ];
        let table = summary_table(&records, 5);
        let lines = table.lines().collect::<Vec<_>>();

        assert_eq!(lines[0], "=== Summary table (mean of 5 runs) ===");
        assert_eq!(lines[2], HEADER);
        assert_eq!(lines[3], SEPARATOR);
        assert!(lines[4].starts_with("| seq           | 10 |  1 |"));
        assert_eq!(lines[5], SEPARATOR);
        assert!(lines[6].starts_with("| parallel_simd | 1,000 |  2 |"));
        assert!(lines[7].starts_with("| parallel_simd | 1,000 |  4 |"));
        assert!(lines[8].starts_with("| seq           | 1,000 |  1 |"));
        assert_eq!(
            lines[9],
            "| simd          | 1,000 |  1 |       0.5000 |        0.0200 |   4.00x |"
        );
        assert_eq!(lines[10], SEPARATOR);
        assert_eq!(lines.len(), 11);
    }

    #[test]
    fn every_line_is_newline_terminated() {
        let empty = summary_table(&[], 5);
        assert_eq!(
            empty,
            format!("=== Summary table (mean of 5 runs) ===\n\n{HEADER}\n{SEPARATOR}\n")
        );

        let table = summary_table(&[Record::new("seq", 10, 1, 0.001, 0.0)], 5);
        assert!(table.ends_with(&format!("|   1.00x |\n{SEPARATOR}\n")));
    }

    #[test]
    fn missing_baseline_reports_zero_speedup() {
        let records = vec![Record::new("ingenua", 100, 2, 0.001, 0.0)];
        let table = summary_table(&records, 3);
        assert!(table.contains("|   0.00x |"));
        assert!(table.starts_with("=== Summary table (mean of 3 runs) ==="));
    }
}
