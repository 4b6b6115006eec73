use criterion::{black_box, criterion_group, criterion_main, Criterion};

use bondcrab::hydrogen::add_hs;
use bondcrab::smiles::{from_smiles, to_canonical_smiles, to_smiles};
use bondcrab::Molecule;

const INPUTS: &[(&str, &str)] = &[
    ("ethanol", "CCO"),
    ("caffeine", "Cn1cnc2c1c(=O)n(C)c(=O)n2C"),
    (
        "atorvastatin",
        "CC(C)c1c(C(=O)Nc2ccccc2)c(-c2ccccc2)c(-c2ccc(F)cc2)n1CC[C@@H](O)C[C@@H](O)CC(=O)O",
    ),
    ("macrocycle", "CC(=O)OCC1=C\\CC/C(C)=C/CC[C@@]2(C)CC[C@@](C(C)C)(/C=C/1)O2"),
];

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for &(name, smiles) in INPUTS {
        group.bench_function(name, |b| b.iter(|| black_box(from_smiles(black_box(smiles)).unwrap())));
    }
    group.finish();
}

fn bench_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("write");
    for &(name, smiles) in INPUTS {
        let mol = from_smiles(smiles).unwrap();
        group.bench_function(name, |b| b.iter(|| black_box(to_smiles(black_box(&mol)))));
    }
    group.finish();
}

fn bench_canonical(c: &mut Criterion) {
    let mut group = c.benchmark_group("canonical");
    for &(name, smiles) in INPUTS {
        let mol = from_smiles(smiles).unwrap();
        group.bench_function(name, |b| b.iter(|| black_box(to_canonical_smiles(black_box(&mol)))));
    }
    group.finish();
}

fn bench_hydrogens(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_hs");
    for &(name, smiles) in INPUTS {
        let mol = from_smiles(smiles).unwrap();
        group.bench_function(name, |b| b.iter(|| black_box(add_hs(black_box(&mol)))));
    }
    group.finish();
}

fn bench_molecule(c: &mut Criterion) {
    let mut group = c.benchmark_group("molecule");
    for &(name, smiles) in INPUTS {
        group.bench_function(name, |b| b.iter(|| black_box(Molecule::new(black_box(smiles)).unwrap())));
    }
    group.finish();
}

criterion_group!(benches, bench_parse, bench_write, bench_canonical, bench_hydrogens, bench_molecule);
criterion_main!(benches);
