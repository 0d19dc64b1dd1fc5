//! Application state shared across handlers

use crate::pipeline::PipelineArtifacts;

/// Read-only state: the artifacts of one pipeline run.
///
/// Built on startup, dropped on shutdown. Handlers never mutate it, so no
/// locking is involved.
pub struct AppState {
    pub artifacts: PipelineArtifacts,
}

impl AppState {
    pub fn new(artifacts: PipelineArtifacts) -> Self {
        Self { artifacts }
    }
}
