//! Performance benchmarks for diary parsing
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use symptom_tracker::normalizer::normalize;
use symptom_tracker::parser::RecordParser;

const BUCKETS: [(&str, &str); 4] = [
    ("08:00", "RANO"),
    ("12:30", "POŁUDNIE"),
    ("16:00", "POPOŁUDNIE"),
    ("21:00", "WIECZÓR"),
];

/// Generate diary lines; every tenth line is invalid when `include_errors` is set
fn generate_diary(num_lines: usize, include_errors: bool) -> String {
    let mut lines = Vec::with_capacity(num_lines);

    for i in 0..num_lines {
        let (time, bucket) = BUCKETS[i % BUCKETS.len()];
        let day = i / BUCKETS.len() % 28 + 1;
        let month = i / (BUCKETS.len() * 28) % 12 + 1;

        if include_errors && i % 10 == 5 {
            // Anxiety out of range
            lines.push(format!(
                "{:02}/{:02}/2024,{},7,8,14,3,4,6,7,{},-,-,-,-,-",
                day, month, time, bucket
            ));
        } else if i % 7 == 3 {
            // Notes with commas force column repair
            lines.push(format!(
                "{:02}/{:02}/2024,{},7,8,{},3,4,6,7,{},slept badly, woke at {}, tired,TAK(70MG),07:30,-,-",
                day,
                month,
                time,
                i % 10 + 1,
                bucket,
                i % 5
            ));
        } else {
            lines.push(format!(
                "{:02}/{:02}/2024,{},7,7.5,{},{},4,6,7,{},-,TAK(70MG),07:30,TAK(150MG),20:00,NIE,-",
                day,
                month,
                time,
                i % 10 + 1,
                (i * 3) % 10 + 1,
                bucket
            ));
        }
    }

    lines.join("\n")
}

fn benchmark_parser(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_parser");

    for size in [10, 100, 1000, 10000].iter() {
        let diary = generate_diary(*size, false);

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            let parser = RecordParser::new();
            b.iter(|| parser.parse(black_box(&diary)));
        });
    }

    group.finish();
}

fn benchmark_error_handling(c: &mut Criterion) {
    let mut group = c.benchmark_group("error_handling");

    // 10% rejected lines
    let diary = generate_diary(1000, true);

    group.bench_function("parser_with_errors", |b| {
        let parser = RecordParser::new();
        b.iter(|| parser.parse(black_box(&diary)));
    });

    group.finish();
}

fn benchmark_normalize(c: &mut Criterion) {
    let parser = RecordParser::new();
    let validated: Vec<_> = generate_diary(1000, false)
        .lines()
        .enumerate()
        .filter_map(|(i, line)| parser.parse_line(line, i + 1).ok())
        .collect();

    c.bench_function("normalize_1000", |b| {
        b.iter(|| {
            validated
                .iter()
                .map(|record| normalize(black_box(record)))
                .count()
        });
    });
}

criterion_group!(benches, benchmark_parser, benchmark_error_handling, benchmark_normalize);
criterion_main!(benches);
