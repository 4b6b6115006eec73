use std::fs::{self, File};
use std::io::Write;

use approx::assert_relative_eq;
use flate2::write::GzEncoder;
use flate2::Compression;
use ndarray::Array2;

use bondcrab::predict::Batch;
use bondcrab::{
    Error, FeatureSet, FeaturizeOptions, ModelOutput, Molecule, PredictOptions, Predictor, Preprocessor,
    PreprocessorConfig, ReferenceTable, Result, VocabularyError,
};

fn constant(batch: &Batch) -> Result<ModelOutput> {
    let bde = Array2::from_elem((batch.len(), batch.required_columns()), 95.0);
    Ok(ModelOutput {
        bdfe: bde.clone(),
        bde,
    })
}

#[test]
fn saved_preprocessor_featurizes_identically() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("preprocessor.json");

    let mut original = Preprocessor::new(PreprocessorConfig {
        atom_features: FeatureSet::Basic,
        ..PreprocessorConfig::default()
    });
    original.fit(["CCO", "c1ccccc1N", "CC(=O)O"]).unwrap();
    original.save(&path).unwrap();

    let mut loaded = Preprocessor::from_json_file(&path).unwrap();
    assert_eq!(loaded.config(), original.config());
    assert_eq!(loaded.atom_classes(), original.atom_classes());
    assert_eq!(loaded.bond_classes(), original.bond_classes());

    let opts = FeaturizeOptions::default();
    for smiles in ["OCC", "Nc1ccccc1", "CCCl"] {
        let a = original.featurize(smiles, &opts).unwrap();
        let b = loaded.featurize(smiles, &opts).unwrap();
        assert_eq!(a, b, "{smiles}");
    }
}

#[test]
fn persisted_file_is_readable_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("preprocessor.json");
    let mut p = Preprocessor::default();
    p.fit(["C"]).unwrap();
    p.save(&path).unwrap();

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["version"], 1);
    assert_eq!(value["atom_features"], "extended");
    assert_eq!(value["explicit_hs"], true);
    assert!(value.get("train").is_none());
    let atoms = value["atom_tokenizer"]["vocabulary"].as_array().unwrap();
    assert_eq!(atoms.len(), p.atom_classes() - 1);
}

#[test]
fn loading_errors() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        Preprocessor::from_json_file(dir.path().join("missing.json")),
        Err(Error::Io(_))
    ));

    let path = dir.path().join("future.json");
    let json = Preprocessor::default().to_json().unwrap().replace("\"version\": 1", "\"version\": 7");
    fs::write(&path, json).unwrap();
    assert!(matches!(
        Preprocessor::from_json_file(&path),
        Err(Error::Vocabulary(VocabularyError::Version { found: 7, .. }))
    ));
}

#[test]
fn gzipped_reference_table_joins_onto_predictions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reference.csv.gz");
    let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
    // ethanol written non-canonically; bond 0 is the O-C bond
    writeln!(encoder, "molecule,bond_index,bde,bdfe,set").unwrap();
    writeln!(encoder, "OCC,0,94.1,83.0,train").unwrap();
    writeln!(encoder, "not a smiles,0,1.0,1.0,train").unwrap();
    encoder.finish().unwrap();

    let table = ReferenceTable::from_csv_path(&path).unwrap();
    assert_eq!(table.len(), 1);

    let mut preprocessor = Preprocessor::default();
    preprocessor.fit(["CCO"]).unwrap();
    let mut predictor = Predictor::new(constant, preprocessor).with_reference(table);
    let rows = predictor.predict(&["CCO"], &PredictOptions::default()).unwrap();

    let ethanol = Molecule::new("CCO").unwrap();
    let joined: Vec<_> = rows.iter().filter(|r| r.bde.is_some()).collect();
    assert_eq!(joined.len(), 1);
    let row = joined[0];
    assert_eq!(row.fragment.molecule, ethanol.smiles());
    assert_eq!(row.fragment.bond_type, "C-O");
    assert_relative_eq!(row.bde.unwrap(), 94.1);
    assert_eq!(row.set.as_deref(), Some("train"));
    assert!(rows.iter().all(|r| r.bde_pred == 95.0));
}
