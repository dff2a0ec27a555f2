// ============================================================
// Layer 6 - Local Experiment Tracker
// ============================================================
// A filesystem-backed ExperimentTracker. Every run gets its own
// directory, laid out by project / group / job type / name:
//
//   logs/contradictory-my-dear-watson/
//     bert-baseline/                    ← group (exp_name)
//       k-fold training/
//         fold=0/
//           run.json                    ← metadata + status
//           metrics.jsonl               ← one JSON object per log call
//           files/                      ← copies of saved artifacts
//             nli_epoch=3-...mpk.gz
//       save final prediction/
//         final/
//           run.json
//           files/submission.csv
//
// run.json is rewritten on init (status "running") and on finish
// (status "finished", with the list of saved files), so a run
// that crashed mid-way is recognisable by its status.
//
// Only one run is active at a time; calling init twice without
// finish, or logging with no active run, is an error.

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use crate::domain::traits::{ExperimentTracker, RunSpec};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Finished,
}

/// Contents of run.json
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub project:     String,
    pub group:       String,
    pub job_type:    String,
    pub name:        String,
    pub status:      RunStatus,
    pub started_at:  u64,
    pub finished_at: Option<u64>,
    pub files:       Vec<String>,
    pub config:      serde_json::Value,
}

struct ActiveRun {
    dir:    PathBuf,
    record: RunRecord,
}

pub struct LocalTracker {
    root:   PathBuf,
    active: Option<ActiveRun>,
}

impl LocalTracker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), active: None }
    }

    /// Directory of the active run
    pub fn run_dir(&self) -> Option<&Path> {
        self.active.as_ref().map(|r| r.dir.as_path())
    }

    fn active_mut(&mut self) -> Result<&mut ActiveRun> {
        self.active
            .as_mut()
            .ok_or_else(|| anyhow!("no active tracker run; call init first"))
    }
}

impl ActiveRun {
    fn write_record(&self) -> Result<()> {
        let path = self.dir.join("run.json");
        fs::write(&path, serde_json::to_string_pretty(&self.record)?)
            .with_context(|| format!("Cannot write '{}'", path.display()))
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl ExperimentTracker for LocalTracker {
    fn init(&mut self, spec: RunSpec) -> Result<()> {
        if let Some(run) = &self.active {
            bail!("tracker run '{}' is still active", run.record.name);
        }

        let name = spec.name.clone().unwrap_or_else(|| "run".to_string());
        let dir  = self
            .root
            .join(&spec.project)
            .join(&spec.group)
            .join(&spec.job_type)
            .join(&name);

        // A rerun of the same fold starts from a clean run directory
        if dir.exists() {
            fs::remove_dir_all(&dir)
                .with_context(|| format!("Cannot clear old run '{}'", dir.display()))?;
        }
        fs::create_dir_all(dir.join("files"))
            .with_context(|| format!("Cannot create run dir '{}'", dir.display()))?;

        let run = ActiveRun {
            dir,
            record: RunRecord {
                project:     spec.project,
                group:       spec.group,
                job_type:    spec.job_type,
                name,
                status:      RunStatus::Running,
                started_at:  unix_now(),
                finished_at: None,
                files:       Vec::new(),
                config:      spec.config,
            },
        };
        run.write_record()?;

        tracing::info!("Tracker run started: {}", run.dir.display());
        self.active = Some(run);
        Ok(())
    }

    fn log_metrics(&mut self, step: usize, metrics: &[(&str, f64)]) -> Result<()> {
        let run = self.active_mut()?;

        let mut line = serde_json::Map::new();
        line.insert("step".to_string(), serde_json::json!(step));
        for (key, value) in metrics {
            line.insert((*key).to_string(), serde_json::json!(value));
        }

        let path = run.dir.join("metrics.jsonl");
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Cannot open '{}'", path.display()))?;
        writeln!(f, "{}", serde_json::Value::Object(line))?;
        Ok(())
    }

    fn save(&mut self, path: &Path) -> Result<()> {
        let run = self.active_mut()?;

        let file_name = path
            .file_name()
            .ok_or_else(|| anyhow!("cannot save '{}': not a file path", path.display()))?;
        let dest = run.dir.join("files").join(file_name);
        fs::copy(path, &dest).with_context(|| {
            format!("Cannot copy '{}' into tracker run", path.display())
        })?;

        run.record.files.push(file_name.to_string_lossy().into_owned());
        run.write_record()?;
        tracing::debug!("Tracker saved '{}'", dest.display());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let mut run = self
            .active
            .take()
            .ok_or_else(|| anyhow!("no active tracker run to finish"))?;
        run.record.status      = RunStatus::Finished;
        run.record.finished_at = Some(unix_now());
        run.write_record()?;
        tracing::info!("Tracker run finished: {}", run.dir.display());
        Ok(())
    }
}

/// Tracker used when tracking is disabled in the config
pub struct NoopTracker;

impl ExperimentTracker for NoopTracker {
    fn init(&mut self, _spec: RunSpec) -> Result<()> {
        Ok(())
    }

    fn log_metrics(&mut self, _step: usize, _metrics: &[(&str, f64)]) -> Result<()> {
        Ok(())
    }

    fn save(&mut self, _path: &Path) -> Result<()> {
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}
