use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use censo_validator::layout::{layout_for, Phase};
use censo_validator::{validate_bytes, validate_document, RulesProfile};

fn record(phase: Phase, code: &str, fields: &[String]) -> String {
    let count = layout_for(phase)
        .record(code)
        .map_or(fields.len() + 1, |spec| spec.field_count);
    let mut line = vec![code.to_string()];
    line.extend(fields.iter().cloned());
    line.resize(count, "0".to_string());
    line.join("|")
}

/// Enrollment file with `schools` active schools of `classes` classes each
fn generate_enrollment(schools: usize, classes: usize, scenario: &str) -> String {
    let mut lines = Vec::new();

    for s in 0..schools {
        let key = format!("{:08}", 11_000_000 + s);
        let status = if scenario == "inactive" && s % 4 == 0 { "2" } else { "1" };
        lines.push(record(Phase::Enrollment, "00", &[key.clone(), status.to_string()]));
        lines.push(record(Phase::Enrollment, "10", &[key.clone()]));
        for c in 0..classes {
            lines.push(record(Phase::Enrollment, "20", &[key.clone(), format!("T{}", c)]));
        }
        for p in 0..classes * 2 {
            lines.push(record(Phase::Enrollment, "30", &[key.clone(), format!("P{}", p)]));
        }
        lines.push(record(Phase::Enrollment, "40", &[key.clone()]));
        for c in 0..classes {
            let class = format!("T{}", c);
            let fields = [key.clone(), format!("P{}", c), String::new(), class];
            lines.push(record(Phase::Enrollment, "50", &fields));
        }
        for c in 0..classes {
            // Leave every third class without students in the unlinked scenario
            if scenario == "unlinked" && c % 3 == 0 {
                continue;
            }
            let class = format!("T{}", c);
            let fields = [key.clone(), format!("P{}", classes + c), String::new(), class];
            lines.push(record(Phase::Enrollment, "60", &fields));
        }
    }

    if scenario == "lowercase" {
        for line in lines.iter_mut().step_by(10) {
            line.push('x');
        }
    }

    if scenario != "no_terminal" {
        lines.push("99".to_string());
    }
    lines.join("\n")
}

fn generate_situation(schools: usize, students: usize) -> String {
    let mut lines = Vec::new();
    for s in 0..schools {
        let key = format!("{:08}", 35_000_000 + s);
        lines.push(record(Phase::Situation, "89", &[key.clone()]));
        for p in 0..students {
            lines.push(record(Phase::Situation, "90", &[key.clone(), format!("{}", p)]));
        }
    }
    lines.push("99".to_string());
    lines.join("\n")
}

/// Benchmark validation of files with different kinds of findings
fn bench_validation_scenarios(c: &mut Criterion) {
    let profile = RulesProfile::default();
    let scenarios = ["all_valid", "inactive", "unlinked", "lowercase", "no_terminal"];

    let mut group = c.benchmark_group("validation_scenarios");

    for scenario in scenarios {
        let content = generate_enrollment(200, 10, scenario);

        group.throughput(Throughput::Elements(content.lines().count() as u64));
        group.bench_with_input(
            BenchmarkId::new("scenario", scenario),
            &content,
            |b, content| {
                b.iter(|| {
                    let report = validate_document(
                        black_box(content),
                        Some(Phase::Enrollment),
                        black_box(&profile),
                    );
                    black_box(report)
                })
            },
        );
    }

    group.finish();
}

/// Benchmark validation scalability with the number of schools
fn bench_validation_scalability(c: &mut Criterion) {
    let profile = RulesProfile::default();
    let school_counts = [10, 100, 1_000, 5_000];

    let mut group = c.benchmark_group("validation_scalability");
    group.sample_size(20);

    for &schools in &school_counts {
        let content = generate_enrollment(schools, 5, "all_valid");

        group.throughput(Throughput::Bytes(content.len() as u64));
        group.bench_with_input(BenchmarkId::new("schools", schools), &content, |b, content| {
            b.iter(|| {
                let report = validate_bytes(black_box(content.as_bytes()), None, &profile);
                black_box(report)
            })
        });
    }

    group.finish();
}

/// Benchmark the situation phase, where the strict character rule runs per field
fn bench_situation_phase(c: &mut Criterion) {
    let profile = RulesProfile::default();
    let content = generate_situation(500, 50);

    let mut group = c.benchmark_group("situation_phase");
    group.throughput(Throughput::Elements(content.lines().count() as u64));
    group.bench_function("500_schools", |b| {
        b.iter(|| {
            let report = validate_document(black_box(&content), None, &profile);
            black_box(report)
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_validation_scenarios,
    bench_validation_scalability,
    bench_situation_phase
);
criterion_main!(benches);
