use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array2;

use bondcrab::predict::Batch;
use bondcrab::{
    enumerate_fragments, FeaturizeOptions, ModelOutput, Molecule, PredictOptions, Predictor, Preprocessor, Result,
};

const INPUTS: &[&str] = &[
    "CCO",
    "CCCCCOC",
    "Cn1cnc2c1c(=O)n(C)c(=O)n2C",
    "CC(C)c1c(C(=O)Nc2ccccc2)c(-c2ccccc2)c(-c2ccc(F)cc2)n1CC[C@@H](O)C[C@@H](O)CC(=O)O",
    "CC(=O)OCC1=C\\CC/C(C)=C/CC[C@@]2(C)CC[C@@](C(C)C)(/C=C/1)O2",
];

fn flat(batch: &Batch) -> Result<ModelOutput> {
    let bde = Array2::from_elem((batch.len(), batch.required_columns()), 90.0);
    Ok(ModelOutput {
        bdfe: bde.clone(),
        bde,
    })
}

fn trained() -> Preprocessor {
    let mut p = Preprocessor::default();
    p.fit(INPUTS.iter().copied()).unwrap();
    p
}

fn bench_fragments(c: &mut Criterion) {
    let mut group = c.benchmark_group("fragments");
    for (i, smiles) in INPUTS.iter().enumerate() {
        let molecule = Molecule::new(smiles).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(i), &molecule, |b, m| {
            b.iter(|| black_box(enumerate_fragments(black_box(m), true).unwrap()))
        });
    }
    group.finish();
}

fn bench_featurize(c: &mut Criterion) {
    let mut preprocessor = trained();
    let opts = FeaturizeOptions::default();
    let mut group = c.benchmark_group("featurize");
    for (i, smiles) in INPUTS.iter().enumerate() {
        let molecule = Molecule::new(smiles).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(i), &molecule, |b, m| {
            b.iter(|| black_box(preprocessor.featurize(black_box(m), &opts).unwrap()))
        });
    }
    group.finish();
}

fn bench_predict(c: &mut Criterion) {
    let mut predictor = Predictor::new(flat, trained());
    let mut group = c.benchmark_group("predict");
    for batch_size in [1, 8] {
        let opts = PredictOptions {
            batch_size,
            ..PredictOptions::default()
        };
        group.bench_with_input(BenchmarkId::new("batch", batch_size), &opts, |b, opts| {
            b.iter(|| black_box(predictor.predict(black_box(INPUTS), opts).unwrap()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_fragments, bench_featurize, bench_predict);
criterion_main!(benches);
