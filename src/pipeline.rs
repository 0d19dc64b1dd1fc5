//! The end-to-end pipeline: load, encode, split, fit, explain
//!
//! Everything a dashboard session needs is built once into an immutable
//! [`PipelineArtifacts`] value and consumed read-only afterwards, both by the
//! batch summaries and by interactive record explanations.

use crate::config::PipelineConfig;
use crate::data::{
    train_eval_split, DataLoader, FeatureKind, InputRecord, OneHotEncoder, TableSchema,
};
use crate::error::{Result, ShapboardError};
use crate::explain::{AttributionSummary, TreeExplainer};
use crate::model::{classification_report, ClassificationReport, RandomForestClassifier};
use crate::render::{DecisionPlot, ForcePlot, SummaryChart};
use ndarray::{Array1, Array2, Array3, Axis};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

/// Index of the positive class in the binary target
pub const POSITIVE_CLASS: usize = 1;

/// Prediction and explanation for one interactive input record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputExplanation {
    /// Predicted class label (0 or 1)
    pub label: usize,
    /// Predicted probability of the positive class
    pub probability: f64,
    /// Additive breakdown anchored to the positive-class baseline
    pub force: ForcePlot,
    /// Cumulative breakdown anchored to the positive-class baseline
    pub decision: DecisionPlot,
}

/// Everything produced by one pipeline run
pub struct PipelineArtifacts {
    pub schema: TableSchema,
    pub encoder: OneHotEncoder,
    /// Encoded column names, matrix order
    pub feature_names: Vec<String>,
    /// Mean of each numeric feature over the evaluation rows, for widget defaults
    pub numeric_defaults: HashMap<String, f64>,
    pub x_eval: Array2<f64>,
    pub y_eval: Array1<usize>,
    pub forest: RandomForestClassifier,
    pub report: ClassificationReport,
    /// Per-class baseline expected output
    pub expected_value: Vec<f64>,
    /// Attributions for the evaluation partition, `(n_classes, n_records, n_features)`
    pub shap_eval: Array3<f64>,
    /// Ranking across all evaluation records and both classes
    pub summary_all: SummaryChart,
    /// Ranking restricted to the negative class
    pub summary_negative: SummaryChart,
}

impl PipelineArtifacts {
    /// Load the configured dataset and run the full pipeline
    pub fn build(config: &PipelineConfig) -> Result<Self> {
        config.validate()?;
        let df = DataLoader::new().load_csv(&config.data_path)?;
        info!(
            path = %config.data_path,
            rows = df.height(),
            columns = df.width(),
            "Loaded dataset"
        );
        Self::build_from_frame(&df, config)
    }

    /// Run the full pipeline on an already loaded DataFrame
    pub fn build_from_frame(df: &DataFrame, config: &PipelineConfig) -> Result<Self> {
        config.validate()?;

        let schema = TableSchema::from_dataframe(df, &config.target)?;
        let encoder = OneHotEncoder::from_schema(&schema);
        let feature_names = encoder.column_names();
        info!(
            original_features = schema.n_features(),
            encoded_columns = feature_names.len(),
            "Derived schema and encoding layout"
        );

        let x = encoder.encode_frame(df)?;
        let y = Array1::from_vec(schema.target_values(df)?);

        let split = train_eval_split(df.height(), config.eval_fraction, config.seed)?;
        let x_train = x.select(Axis(0), &split.train);
        let y_train = Array1::from_vec(split.train.iter().map(|&i| y[i]).collect());
        let x_eval = x.select(Axis(0), &split.eval);
        let y_eval: Array1<usize> =
            Array1::from_vec(split.eval.iter().map(|&i| y[i]).collect());
        info!(
            train_rows = split.train.len(),
            eval_rows = split.eval.len(),
            seed = config.seed,
            "Split dataset"
        );

        let mut forest = RandomForestClassifier::new(config.n_trees)
            .with_random_state(config.seed);
        if let Some(depth) = config.max_depth {
            forest = forest.with_max_depth(depth);
        }
        forest.fit(&x_train, &y_train)?;
        info!(n_trees = config.n_trees, "Fitted forest");

        let y_pred = forest.predict(&x_eval)?;
        let report = classification_report(&y_eval, &y_pred, forest.n_classes())?;
        info!(accuracy = report.accuracy, "Evaluated model");

        let explainer = TreeExplainer::new(&forest)?;
        let expected_value = explainer.expected_value().to_vec();
        let shap_eval = explainer.shap_values(&x_eval)?;
        let summary_all = SummaryChart::from_summary(
            "all classes",
            &AttributionSummary::across_classes(&shap_eval, &feature_names)?,
        );
        let summary_negative = SummaryChart::from_summary(
            "negative class",
            &AttributionSummary::for_class(&shap_eval, 0, &feature_names)?,
        );
        info!(eval_rows = x_eval.nrows(), "Computed batch attributions");

        let numeric_defaults = Self::numeric_means(df, &schema, &split.eval)?;

        Ok(Self {
            schema,
            encoder,
            feature_names,
            numeric_defaults,
            x_eval,
            y_eval,
            forest,
            report,
            expected_value,
            shap_eval,
            summary_all,
            summary_negative,
        })
    }

    /// Validate, encode, predict and explain one interactive input record
    pub fn explain_input(&self, record: &InputRecord) -> Result<InputExplanation> {
        let row = self.encoder.encode_record(&self.schema, record)?;
        self.explain_encoded_row(&row)
    }

    /// Explain one evaluation-partition record by its row index
    pub fn explain_eval_record(&self, idx: usize) -> Result<InputExplanation> {
        if idx >= self.x_eval.nrows() {
            return Err(ShapboardError::ValidationError(format!(
                "evaluation row {} out of range ({} rows)",
                idx,
                self.x_eval.nrows()
            )));
        }
        let row = self.x_eval.row(idx).to_owned();
        self.explain_encoded_row(&row)
    }

    fn explain_encoded_row(&self, row: &Array1<f64>) -> Result<InputExplanation> {
        let x = row.clone().insert_axis(Axis(0));
        let proba = self.forest.predict_proba(&x)?;
        let probability = proba[[0, POSITIVE_CLASS]];
        let label = self.forest.predict(&x)?[0];

        let explainer = TreeExplainer::new(&self.forest)?;
        let phi = explainer.explain_record(row.view())?;
        let positive = phi.row(POSITIVE_CLASS).to_vec();
        let base = explainer.expected_value()[POSITIVE_CLASS];

        let values = row.to_vec();
        let force = ForcePlot::new(base, &self.feature_names, &values, &positive);
        let decision = DecisionPlot::new(base, &self.feature_names, &positive);

        Ok(InputExplanation {
            label,
            probability,
            force,
            decision,
        })
    }

    fn numeric_means(
        df: &DataFrame,
        schema: &TableSchema,
        eval_indices: &[usize],
    ) -> Result<HashMap<String, f64>> {
        let mut means = HashMap::new();
        for spec in &schema.features {
            if spec.kind != FeatureKind::Numeric {
                continue;
            }
            let series = df
                .column(&spec.name)
                .map_err(|_| ShapboardError::FeatureNotFound(spec.name.clone()))?
                .as_materialized_series()
                .cast(&DataType::Float64)
                .map_err(|e| ShapboardError::DataError(e.to_string()))?;
            let ca = series
                .f64()
                .map_err(|e| ShapboardError::DataError(e.to_string()))?;

            let mut sum = 0.0;
            let mut count = 0usize;
            for &i in eval_indices {
                if let Some(v) = ca.get(i) {
                    sum += v;
                    count += 1;
                }
            }
            if count > 0 {
                means.insert(spec.name.clone(), sum / count as f64);
            }
        }
        Ok(means)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::FeatureValue;

    fn sample_df() -> DataFrame {
        let n = 40;
        let age: Vec<f64> = (0..n).map(|i| 35.0 + (i % 20) as f64 * 2.0).collect();
        let chol: Vec<f64> = (0..n).map(|i| 180.0 + (i % 10) as f64 * 15.0).collect();
        let angina: Vec<&str> = (0..n).map(|i| if i % 3 == 0 { "Y" } else { "N" }).collect();
        // Older rows with angina carry the positive label.
        let target: Vec<i64> = (0..n)
            .map(|i| i64::from(35.0 + (i % 20) as f64 * 2.0 > 55.0 || i % 3 == 0))
            .collect();
        df!(
            "Age" => age,
            "Cholesterol" => chol,
            "ExerciseAngina" => angina,
            "HeartDisease" => target,
        )
        .unwrap()
    }

    fn sample_config() -> PipelineConfig {
        PipelineConfig {
            data_path: String::new(),
            target: "HeartDisease".to_string(),
            seed: 1,
            eval_fraction: 0.3,
            n_trees: 25,
            max_depth: Some(6),
        }
    }

    #[test]
    fn test_build_from_frame() {
        let artifacts = PipelineArtifacts::build_from_frame(&sample_df(), &sample_config()).unwrap();
        assert_eq!(artifacts.x_eval.nrows(), 12); // ceil(40 * 0.3)
        assert_eq!(artifacts.feature_names, vec!["Age", "Cholesterol", "ExerciseAngina_Y"]);
        assert_eq!(artifacts.expected_value.len(), 2);
        assert!(artifacts.numeric_defaults.contains_key("Age"));
        assert!(!artifacts.summary_all.bars.is_empty());
    }

    #[test]
    fn test_explain_input_matches_eval_record() {
        let df = sample_df();
        let config = sample_config();
        let artifacts = PipelineArtifacts::build_from_frame(&df, &config).unwrap();

        // Reconstruct the first evaluation row as an interactive record.
        let split = train_eval_split(df.height(), config.eval_fraction, config.seed).unwrap();
        let source_row = split.eval[0];
        let age = df.column("Age").unwrap().f64().unwrap().get(source_row).unwrap();
        let chol = df
            .column("Cholesterol")
            .unwrap()
            .f64()
            .unwrap()
            .get(source_row)
            .unwrap();
        let angina = df
            .column("ExerciseAngina")
            .unwrap()
            .str()
            .unwrap()
            .get(source_row)
            .unwrap()
            .to_string();

        let mut record = InputRecord::new();
        record.insert("Age".to_string(), FeatureValue::Number(age));
        record.insert("Cholesterol".to_string(), FeatureValue::Number(chol));
        record.insert("ExerciseAngina".to_string(), FeatureValue::Category(angina));

        let interactive = artifacts.explain_input(&record).unwrap();
        let batch = artifacts.explain_eval_record(0).unwrap();

        assert_eq!(interactive.label, batch.label);
        assert!((interactive.probability - batch.probability).abs() < 1e-12);
        assert!((interactive.force.output_value - batch.force.output_value).abs() < 1e-12);
    }

    #[test]
    fn test_explanation_additivity_through_payloads() {
        let artifacts = PipelineArtifacts::build_from_frame(&sample_df(), &sample_config()).unwrap();
        let explanation = artifacts.explain_eval_record(3).unwrap();

        // Both payloads must land on the predicted positive-class probability.
        assert!((explanation.force.output_value - explanation.probability).abs() < 1e-9);
        assert!((explanation.decision.output_value - explanation.probability).abs() < 1e-9);
        assert!((0.0..=1.0).contains(&explanation.probability));
        assert!(explanation.label == 0 || explanation.label == 1);
        assert_eq!(
            explanation.label == 1,
            explanation.probability > 0.5,
            "label must agree with the 0.5 threshold"
        );
    }

    #[test]
    fn test_eval_row_out_of_range() {
        let artifacts = PipelineArtifacts::build_from_frame(&sample_df(), &sample_config()).unwrap();
        assert!(artifacts.explain_eval_record(999).is_err());
    }
}
