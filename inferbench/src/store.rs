//! Durable JSON artifacts: one well-known file per run, plus timestamped
//! aggregate and report files produced by the comparison path.

use inferbench_core::{HarnessError, RunResult, RUN_ARTIFACT_FILE};
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use time::format_description::FormatItem;
use time::macros::format_description;
use time::OffsetDateTime;
#[allow(unused)]
use tracing::{debug, info};

const FILE_STAMP: &[FormatItem<'static>] =
    format_description!("[year][month][day]_[hour][minute][second]");

pub struct ResultStore {
    dir: PathBuf,
}

impl ResultStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Writes the run artifact to the fixed well-known path, overwriting
    /// any prior artifact there.
    pub fn save(&self, result: &RunResult) -> Result<PathBuf, HarnessError> {
        let path = self.dir.join(RUN_ARTIFACT_FILE);
        self.write_json(&path, result)?;
        Ok(path)
    }

    /// Strict reload of a prior run artifact; unknown or missing fields
    /// are rejected rather than defaulted.
    pub fn load(path: impl AsRef<Path>) -> Result<RunResult, HarnessError> {
        let raw = fs::read(path)?;
        Ok(serde_json::from_slice(&raw)?)
    }

    /// One mapping from deployment id to its RunResult, written once all
    /// deployments under test have been gathered.
    pub fn save_aggregate(
        &self,
        results: &BTreeMap<String, RunResult>,
        generated_at: OffsetDateTime,
    ) -> Result<PathBuf, HarnessError> {
        let path = self
            .dir
            .join(format!("all_results_{}.json", file_stamp(generated_at)));
        self.write_json(&path, results)?;
        Ok(path)
    }

    pub fn load_aggregate(
        path: impl AsRef<Path>,
    ) -> Result<BTreeMap<String, RunResult>, HarnessError> {
        let raw = fs::read(path)?;
        Ok(serde_json::from_slice(&raw)?)
    }

    pub fn save_report(
        &self,
        body: &str,
        generated_at: OffsetDateTime,
    ) -> Result<PathBuf, HarnessError> {
        fs::create_dir_all(&self.dir)?;
        let path = self
            .dir
            .join(format!("benchmark_report_{}.txt", file_stamp(generated_at)));
        fs::write(&path, body)?;
        Ok(path)
    }

    fn write_json<T: serde::Serialize>(&self, path: &Path, value: &T) -> Result<(), HarnessError> {
        fs::create_dir_all(&self.dir)?;
        let file = fs::File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()?;
        Ok(())
    }
}

fn file_stamp(at: OffsetDateTime) -> String {
    at.format(&FILE_STAMP).unwrap_or_default()
}
