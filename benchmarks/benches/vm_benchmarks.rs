use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use golfin::lexer::Lexer;
use golfin::runner::{Runner, SharedBuffer};

fn run(source: &str) {
    let mut runner = Runner::with_input("", SharedBuffer::new());
    runner.run(source).unwrap();
}

// ============================================================================
// Lexer Benchmarks
// ============================================================================

fn benchmark_lexer(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer");

    let simple = "1 2+3*";
    group.bench_with_input(BenchmarkId::new("simple_expr", "1 2+3*"), &simple, |b, src| {
        b.iter(|| {
            let mut lexer = Lexer::new(black_box(src));
            lexer.tokenize().unwrap()
        });
    });

    // Nested blocks are lexed once per level for validation
    let nested = "[1 2 3]{[4 5]{{1+}%}~+}%{\"}\"+}*";
    group.bench_with_input(BenchmarkId::new("nested_blocks", "map"), &nested, |b, src| {
        b.iter(|| {
            let mut lexer = Lexer::new(black_box(src));
            lexer.tokenize().unwrap()
        });
    });

    let large: String = (0..1000).map(|i| format!("{i} :A; \"s{i}\" ")).collect();
    group.bench_with_input(BenchmarkId::new("large_input", "1000_items"), &large, |b, src| {
        b.iter(|| {
            let mut lexer = Lexer::new(black_box(src));
            lexer.tokenize().unwrap()
        });
    });

    group.finish();
}

// ============================================================================
// Array Operation Benchmarks
// ============================================================================

fn benchmark_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort");

    for size in [100, 1000] {
        let natural = format!("{size},{{7*{size}%}}%$");
        group.bench_with_input(BenchmarkId::new("natural", size), &natural, |b, src| {
            b.iter(|| run(black_box(src)));
        });

        let comparator = format!("{size},{{7*{size}%}}%{{>}}$");
        group.bench_with_input(BenchmarkId::new("comparator_block", size), &comparator, |b, src| {
            b.iter(|| run(black_box(src)));
        });
    }

    group.finish();
}

fn benchmark_fold(c: &mut Criterion) {
    let mut group = c.benchmark_group("fold");

    for size in [100, 10_000] {
        let source = format!("{size},{{+}}*");
        group.bench_with_input(BenchmarkId::new("sum", size), &source, |b, src| {
            b.iter(|| run(black_box(src)));
        });
    }

    group.finish();
}

fn benchmark_map(c: &mut Criterion) {
    let mut group = c.benchmark_group("map");

    for size in [100, 10_000] {
        let source = format!("{size},{{_*}}%");
        group.bench_with_input(BenchmarkId::new("square", size), &source, |b, src| {
            b.iter(|| run(black_box(src)));
        });

        let filter = format!("{size},{{3%}},");
        group.bench_with_input(BenchmarkId::new("filter", size), &filter, |b, src| {
            b.iter(|| run(black_box(src)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_lexer,
    benchmark_sort,
    benchmark_fold,
    benchmark_map
);
criterion_main!(benches);
