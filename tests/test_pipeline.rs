//! Integration test: full pipeline end-to-end

use polars::prelude::*;
use shapboard::prelude::*;

/// Heart-style dataset with numeric and categorical features and a target
/// correlated with age and exercise-induced angina.
fn heart_df(n: usize) -> DataFrame {
    let age: Vec<f64> = (0..n).map(|i| 35.0 + (i % 25) as f64 * 1.6).collect();
    let resting_bp: Vec<f64> = (0..n).map(|i| 110.0 + (i % 9) as f64 * 5.0).collect();
    let cholesterol: Vec<f64> = (0..n).map(|i| 170.0 + (i % 12) as f64 * 12.0).collect();
    let sex: Vec<&str> = (0..n).map(|i| if i % 5 < 3 { "M" } else { "F" }).collect();
    let angina: Vec<&str> = (0..n).map(|i| if i % 4 == 0 { "Y" } else { "N" }).collect();
    let target: Vec<i64> = (0..n)
        .map(|i| {
            let old = 35.0 + (i % 25) as f64 * 1.6 > 58.0;
            let exertional = i % 4 == 0;
            i64::from(old || exertional)
        })
        .collect();

    df!(
        "Age" => age,
        "RestingBP" => resting_bp,
        "Cholesterol" => cholesterol,
        "Sex" => sex,
        "ExerciseAngina" => angina,
        "HeartDisease" => target,
    )
    .unwrap()
}

fn config() -> PipelineConfig {
    PipelineConfig {
        data_path: String::new(),
        target: "HeartDisease".to_string(),
        seed: 1,
        eval_fraction: 0.3,
        n_trees: 30,
        max_depth: Some(8),
    }
}

#[test]
fn test_pipeline_builds_all_artifacts() {
    let artifacts = PipelineArtifacts::build_from_frame(&heart_df(60), &config()).unwrap();

    assert_eq!(artifacts.x_eval.nrows(), 18); // ceil(60 * 0.3)
    assert_eq!(artifacts.y_eval.len(), 18);
    assert_eq!(
        artifacts.feature_names,
        vec!["Age", "RestingBP", "Cholesterol", "Sex_M", "ExerciseAngina_Y"]
    );
    assert_eq!(artifacts.expected_value.len(), 2);
    assert_eq!(artifacts.shap_eval.dim(), (2, 18, 5));
    assert_eq!(artifacts.summary_all.bars.len(), 5);
    assert_eq!(artifacts.summary_negative.bars.len(), 5);
    assert!(artifacts.report.accuracy > 0.5);
}

#[test]
fn test_pipeline_is_deterministic() {
    let df = heart_df(60);
    let a = PipelineArtifacts::build_from_frame(&df, &config()).unwrap();
    let b = PipelineArtifacts::build_from_frame(&df, &config()).unwrap();

    assert_eq!(a.y_eval, b.y_eval);
    assert_eq!(a.expected_value, b.expected_value);
    assert_eq!(a.shap_eval, b.shap_eval);
    assert_eq!(a.report.accuracy, b.report.accuracy);
}

#[test]
fn test_split_membership_matches_seed() {
    let split_a = train_eval_split(60, 0.3, 1).unwrap();
    let split_b = train_eval_split(60, 0.3, 1).unwrap();
    assert_eq!(split_a, split_b);

    // No row in both partitions, no row lost.
    let mut all: Vec<usize> = split_a
        .train
        .iter()
        .chain(split_a.eval.iter())
        .copied()
        .collect();
    all.sort_unstable();
    assert_eq!(all, (0..60).collect::<Vec<_>>());
}

#[test]
fn test_five_row_scenario() {
    // 5 rows, 2 numeric + 1 binary categorical feature: the encoding adds
    // exactly one indicator column and the 70/30 split yields 3 train / 2 eval.
    let df = df!(
        "a" => &[1.0, 2.0, 3.0, 4.0, 5.0],
        "b" => &[5.0, 4.0, 3.0, 2.0, 1.0],
        "flag" => &["N", "Y", "N", "Y", "N"],
        "target" => &[0i64, 1, 0, 1, 0],
    )
    .unwrap();

    let schema = TableSchema::from_dataframe(&df, "target").unwrap();
    let encoder = OneHotEncoder::from_schema(&schema);
    assert_eq!(encoder.column_names(), vec!["a", "b", "flag_Y"]);

    let split = train_eval_split(5, 0.3, 1).unwrap();
    assert_eq!(split.train.len(), 3);
    assert_eq!(split.eval.len(), 2);
}

#[test]
fn test_encoding_is_stable_between_frame_and_record() {
    let df = heart_df(30);
    let schema = TableSchema::from_dataframe(&df, "HeartDisease").unwrap();
    let encoder = OneHotEncoder::from_schema(&schema);
    let matrix = encoder.encode_frame(&df).unwrap();

    // Rebuild row 7 as an interactive record; its encoding must be identical.
    let row = 7;
    let mut record = InputRecord::new();
    for name in ["Age", "RestingBP", "Cholesterol"] {
        let v = df.column(name).unwrap().f64().unwrap().get(row).unwrap();
        record.insert(name.to_string(), FeatureValue::Number(v));
    }
    for name in ["Sex", "ExerciseAngina"] {
        let v = df
            .column(name)
            .unwrap()
            .str()
            .unwrap()
            .get(row)
            .unwrap()
            .to_string();
        record.insert(name.to_string(), FeatureValue::Category(v));
    }

    let encoded = encoder.encode_record(&schema, &record).unwrap();
    assert_eq!(encoded.len(), matrix.ncols());
    for j in 0..matrix.ncols() {
        assert_eq!(encoded[j], matrix[[row, j]], "column {} differs", j);
    }
}

#[test]
fn test_pipeline_from_csv_file() {
    use std::io::Write;

    let df = heart_df(40);
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "Age,RestingBP,Cholesterol,Sex,ExerciseAngina,HeartDisease").unwrap();
    for i in 0..df.height() {
        writeln!(
            file,
            "{},{},{},{},{},{}",
            df.column("Age").unwrap().f64().unwrap().get(i).unwrap(),
            df.column("RestingBP").unwrap().f64().unwrap().get(i).unwrap(),
            df.column("Cholesterol").unwrap().f64().unwrap().get(i).unwrap(),
            df.column("Sex").unwrap().str().unwrap().get(i).unwrap(),
            df.column("ExerciseAngina").unwrap().str().unwrap().get(i).unwrap(),
            df.column("HeartDisease").unwrap().i64().unwrap().get(i).unwrap(),
        )
        .unwrap();
    }
    file.flush().unwrap();

    let mut cfg = config();
    cfg.data_path = file.path().to_str().unwrap().to_string();
    let artifacts = PipelineArtifacts::build(&cfg).unwrap();
    assert_eq!(artifacts.x_eval.nrows(), 12); // ceil(40 * 0.3)
}

#[test]
fn test_missing_target_column_fails() {
    let df = heart_df(20);
    let mut cfg = config();
    cfg.target = "Outcome".to_string();
    let result = PipelineArtifacts::build_from_frame(&df, &cfg);
    assert!(matches!(result, Err(ShapboardError::SchemaError(_))));
}
