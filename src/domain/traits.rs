// ============================================================
// Layer 3 - Core Traits (Abstractions)
// ============================================================
// The orchestration code talks to the experiment tracker only
// through this trait, so the local filesystem tracker used by
// the CLI can be replaced by a recording fake in tests (or by a
// hosted backend) without touching the training loop.
//
// The lifecycle mirrors a typical tracking client:
//
//   init(spec) → log_metrics(..)* → save(file)* → finish()
//
// Exactly one run is active at a time. Each fold opens and
// closes its own run; the final submission gets a last run.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use std::path::Path;

/// Identity and metadata of one tracked run.
#[derive(Debug, Clone)]
pub struct RunSpec {
    /// Project the run belongs to
    pub project:  String,
    /// Runs of the same experiment share a group (the experiment name)
    pub group:    String,
    /// What kind of work the run does, e.g. "k-fold training"
    pub job_type: String,
    /// Display name, e.g. "fold=3"
    pub name:     Option<String>,
    /// Snapshot of the resolved configuration
    pub config:   serde_json::Value,
}

impl RunSpec {
    pub fn new(
        project:  impl Into<String>,
        group:    impl Into<String>,
        job_type: impl Into<String>,
    ) -> Self {
        Self {
            project:  project.into(),
            group:    group.into(),
            job_type: job_type.into(),
            name:     None,
            config:   serde_json::Value::Null,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = config;
        self
    }
}

/// Records run metadata, scalar metrics and artifact files.
pub trait ExperimentTracker {
    /// Start a new run. Fails if a run is already active.
    fn init(&mut self, spec: RunSpec) -> Result<()>;

    /// Record scalar metrics at a given step of the active run
    fn log_metrics(&mut self, step: usize, metrics: &[(&str, f64)]) -> Result<()>;

    /// Attach a file to the active run
    fn save(&mut self, path: &Path) -> Result<()>;

    /// Close the active run
    fn finish(&mut self) -> Result<()>;
}
