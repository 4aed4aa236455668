use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use railroad_rs_renderer::backend::{Recorder, SvgSurface, TikzSurface};
use railroad_rs_renderer::config::Config;
use railroad_rs_renderer::layout::compute_layout;
use railroad_rs_renderer::parser::parse_grammar;
use railroad_rs_renderer::render::render_layout;
use std::hint::black_box;

/// Synthetic grammar: `rules` productions, each a long alternation of
/// sequences that reference the next rule.
fn wide_grammar_source(rules: usize, width: usize) -> String {
    let mut out = String::new();
    for i in 0..rules {
        out.push_str(&format!("r{} = ", i));
        for j in 0..width {
            if j > 0 {
                out.push_str(" | ");
            }
            let next = (i + 1) % rules.max(1);
            out.push_str(&format!("\"t{}_{}\" [ r{} ] {{ \",\" ?item? }}", i, j, next));
        }
        out.push_str(" .\n");
    }
    out
}

fn fixture(name: &str) -> &'static str {
    match name {
        "arithmetic" => include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/arithmetic.ebnf"
        )),
        "json" => include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/json.ebnf"
        )),
        "nested" => include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/nested.ebnf"
        )),
        "pl0" => include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/fixtures/pl0.ebnf"
        )),
        _ => panic!("unknown fixture {name}"),
    }
}

fn inputs() -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = ["arithmetic", "json", "nested", "pl0"]
        .iter()
        .map(|name| (name.to_string(), fixture(name).to_string()))
        .collect();
    for (rules, width) in [(10, 4), (50, 8)] {
        out.push((
            format!("wide_{}x{}", rules, width),
            wide_grammar_source(rules, width),
        ));
    }
    out
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for (name, input) in inputs() {
        group.bench_with_input(BenchmarkId::from_parameter(&name), &input, |b, data| {
            b.iter(|| {
                let grammar = parse_grammar(black_box(data)).expect("parse failed");
                black_box(grammar.len());
            });
        });
    }
    group.finish();
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    let config = Config::default();
    for (name, input) in inputs() {
        let grammar = parse_grammar(&input).expect("parse failed");
        group.bench_with_input(BenchmarkId::from_parameter(&name), &grammar, |b, data| {
            b.iter(|| {
                let layout = compute_layout(black_box(data), &config.layout).expect("layout failed");
                black_box(layout.width);
            });
        });
    }
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    let config = Config::default();
    for (name, input) in inputs() {
        let grammar = parse_grammar(&input).expect("parse failed");
        let layout = compute_layout(&grammar, &config.layout).expect("layout failed");
        group.bench_with_input(BenchmarkId::new("recorder", &name), &layout, |b, data| {
            b.iter(|| {
                let mut surface = Recorder::new();
                render_layout(&mut surface, &grammar, black_box(data), &config)
                    .expect("render failed");
                black_box(surface.calls().len());
            });
        });
        group.bench_with_input(BenchmarkId::new("svg", &name), &layout, |b, data| {
            b.iter(|| {
                let mut surface = SvgSurface::new(&config.theme, &config.render);
                render_layout(&mut surface, &grammar, black_box(data), &config)
                    .expect("render failed");
                black_box(surface.into_documents());
            });
        });
        group.bench_with_input(BenchmarkId::new("tikz", &name), &layout, |b, data| {
            b.iter(|| {
                let mut surface = TikzSurface::new();
                render_layout(&mut surface, &grammar, black_box(data), &config)
                    .expect("render failed");
                black_box(surface.into_documents());
            });
        });
    }
    group.finish();
}

fn bench_end_to_end(c: &mut Criterion) {
    let mut group = c.benchmark_group("end_to_end");
    for (name, input) in inputs() {
        group.bench_with_input(BenchmarkId::from_parameter(&name), &input, |b, data| {
            b.iter(|| {
                let svg = railroad_rs_renderer::render(black_box(data)).expect("render failed");
                black_box(svg.len());
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_parse,
    bench_layout,
    bench_render,
    bench_end_to_end
);
criterion_main!(benches);
