//! Serializable payloads the dashboard renders
//!
//! The server sends numbers, not pixels: each payload carries exactly the
//! values a front-end needs to draw the corresponding chart.

use crate::explain::AttributionSummary;
use serde::{Deserialize, Serialize};

/// One bar of a feature-importance summary chart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryBar {
    pub feature: String,
    pub mean_abs_attribution: f64,
}

/// Ranked feature-importance chart over a batch of records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryChart {
    /// Which slice of the attributions this chart aggregates
    pub scope: String,
    /// Bars in descending order of magnitude
    pub bars: Vec<SummaryBar>,
}

impl SummaryChart {
    /// Build a chart from a summary, bars ranked by magnitude
    pub fn from_summary(scope: impl Into<String>, summary: &AttributionSummary) -> Self {
        let bars = summary
            .ranking()
            .into_iter()
            .map(|(idx, value)| SummaryBar {
                feature: summary.feature_names[idx].clone(),
                mean_abs_attribution: value,
            })
            .collect();
        Self {
            scope: scope.into(),
            bars,
        }
    }
}

/// One feature's entry in a force-style additive breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForceEntry {
    pub feature: String,
    /// The record's encoded value for this feature
    pub value: f64,
    pub attribution: f64,
}

/// Additive breakdown of one prediction: baseline plus signed pushes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForcePlot {
    pub base_value: f64,
    pub output_value: f64,
    /// Entries in descending attribution order (strongest positive first)
    pub entries: Vec<ForceEntry>,
}

impl ForcePlot {
    pub fn new(
        base_value: f64,
        feature_names: &[String],
        values: &[f64],
        attributions: &[f64],
    ) -> Self {
        let output_value = base_value + attributions.iter().sum::<f64>();
        let mut entries: Vec<ForceEntry> = feature_names
            .iter()
            .zip(values.iter())
            .zip(attributions.iter())
            .map(|((feature, &value), &attribution)| ForceEntry {
                feature: feature.clone(),
                value,
                attribution,
            })
            .collect();
        entries.sort_by(|a, b| {
            b.attribution
                .partial_cmp(&a.attribution)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Self {
            base_value,
            output_value,
            entries,
        }
    }
}

/// One step of a cumulative decision-style breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionStep {
    pub feature: String,
    pub attribution: f64,
    /// Running total from the baseline after applying this feature
    pub cumulative: f64,
}

/// Cumulative path from the baseline to the model output, least important
/// feature first so the path ends on the strongest movers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionPlot {
    pub base_value: f64,
    pub output_value: f64,
    pub steps: Vec<DecisionStep>,
}

impl DecisionPlot {
    pub fn new(base_value: f64, feature_names: &[String], attributions: &[f64]) -> Self {
        let mut order: Vec<usize> = (0..attributions.len()).collect();
        order.sort_by(|&a, &b| {
            attributions[a]
                .abs()
                .partial_cmp(&attributions[b].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut cumulative = base_value;
        let steps = order
            .into_iter()
            .map(|idx| {
                cumulative += attributions[idx];
                DecisionStep {
                    feature: feature_names[idx].clone(),
                    attribution: attributions[idx],
                    cumulative,
                }
            })
            .collect();

        Self {
            base_value,
            output_value: cumulative,
            steps,
        }
    }
}
