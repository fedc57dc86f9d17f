//! Benchmarks for the diagnosis pipeline and scenario trees.
//!
//! Run:
//! - cargo bench

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;

use sixlines::oracle::diagnosis::{DiagnosisRequest, Diagnoser, Normalization};
use sixlines::oracle::profile::Category;
use sixlines::oracle::reference::EmptyReference;
use sixlines::oracle::scenario::{ScenarioParams, ScenarioTreeGenerator};
use sixlines::oracle::transition::LineState;
use sixlines::oracle::trigram::TraitVector;

const INPUTS: [(&str, [f64; 8]); 3] = [
    ("flat", [10.0; 8]),
    ("mixed", [9.0, 2.0, 3.0, 4.0, 1.0, 0.0, 2.0, 5.0]),
    ("peaked", [100.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0]),
];

fn bench_diagnose(c: &mut Criterion) {
    let diagnoser = Diagnoser::default();
    let mut group = c.benchmark_group("diagnose");
    for (name, values) in INPUTS {
        let traits = TraitVector::new(values).unwrap();
        for (mode, normalization) in [
            ("relu", Normalization::Relu),
            ("softmax", Normalization::Softmax { temperature: None }),
        ] {
            let mut request = DiagnosisRequest::new(traits, Category::Engine);
            request.normalization = normalization;
            let mut rng = StdRng::seed_from_u64(7);
            group.bench_with_input(BenchmarkId::new(mode, name), &request, |b, req| {
                b.iter(|| {
                    diagnoser
                        .diagnose(black_box(req), &mut rng, &EmptyReference)
                        .unwrap()
                });
            });
        }
    }
    group.finish();
}

fn bench_tree(c: &mut Criterion) {
    let generator = ScenarioTreeGenerator::new(&EmptyReference, ScenarioParams::default());
    let start = LineState::new(11, 5).unwrap();
    c.bench_function("scenario_tree", |b| b.iter(|| generator.generate(black_box(start))));
}

criterion_group!(diagnosis, bench_diagnose, bench_tree);
criterion_main!(diagnosis);
