// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `ReportStore`: on-disk persistence for reports, their progress sidecars,
//! the crash-recovery temp copy, and the directory-level index.
//!
//! Every write goes through [`ReportStore::write_atomic`]: serialize to
//! `<path>.tmp`, then `fs::rename` over the destination. A reader never
//! observes a partially written file, and a crash between the two steps
//! leaves either the old file or a harmless orphaned `.tmp` behind.

use crate::error::ReportError;
use std::path::{Path, PathBuf};
use syncoor_core::{Index, IndexEntry, Report, RunId};
use tokio::fs;

pub struct ReportStore {
    base_dir: PathBuf,
}

impl ReportStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn main_filename(run_id: &RunId, report_base: &str) -> String {
        format!("{run_id}-{report_base}.main.json")
    }

    pub fn progress_filename(run_id: &RunId, report_base: &str) -> String {
        format!("{run_id}-{report_base}.progress.json")
    }

    /// Pure function of `(network, el_type, cl_type)` — not `run_id` — so a
    /// freshly started process with a new `run_id` can still find the temp
    /// copy a previous process for the same client pair left behind.
    fn temp_filename(report_base: &str) -> String {
        format!("sync-temp-{report_base}.tmp.json")
    }

    fn index_filename() -> &'static str {
        "index.json"
    }

    async fn write_atomic(&self, relative: &str, bytes: &[u8]) -> Result<(), ReportError> {
        fs::create_dir_all(&self.base_dir)
            .await
            .map_err(|source| ReportError::Io {
                path: self.base_dir.display().to_string(),
                source,
            })?;
        let dest = self.base_dir.join(relative);
        let tmp = self.base_dir.join(format!("{relative}.tmp"));
        fs::write(&tmp, bytes)
            .await
            .map_err(|source| ReportError::Io {
                path: tmp.display().to_string(),
                source,
            })?;
        fs::rename(&tmp, &dest)
            .await
            .map_err(|source| ReportError::Io {
                path: dest.display().to_string(),
                source,
            })?;
        Ok(())
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        &self,
        relative: &str,
    ) -> Result<Option<T>, ReportError> {
        let path = self.base_dir.join(relative);
        match fs::read(&path).await {
            Ok(bytes) => {
                let value = serde_json::from_slice(&bytes).map_err(|source| {
                    ReportError::Deserialize {
                        path: path.display().to_string(),
                        source,
                    }
                })?;
                Ok(Some(value))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ReportError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    /// Persist the in-progress report so a crashed orchestrator can resume.
    /// Overwrites any previous temp copy for this `(network, el, cl)` triple.
    pub async fn save_temp_report(
        &self,
        report: &Report,
        report_base: &str,
    ) -> Result<(), ReportError> {
        let bytes =
            serde_json::to_vec_pretty(report).map_err(|source| ReportError::Serialize {
                run_id: report.run_id.clone(),
                source,
            })?;
        self.write_atomic(&Self::temp_filename(report_base), &bytes)
            .await
    }

    pub async fn load_temp_report(&self, report_base: &str) -> Result<Option<Report>, ReportError> {
        self.read_json(&Self::temp_filename(report_base)).await
    }

    /// Restore a temp report into a resumable state; returns `None` if no
    /// temp copy exists (fresh run, or recovery already completed). Keyed by
    /// `(network, el_type, cl_type)` so it is discoverable across process
    /// restarts, where `run_id` is freshly generated each time.
    pub async fn restore_run_state(&self, report_base: &str) -> Result<Option<Report>, ReportError> {
        self.load_temp_report(report_base).await
    }

    pub async fn remove_temp_report(&self, report_base: &str) -> Result<(), ReportError> {
        let path = self.base_dir.join(Self::temp_filename(report_base));
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ReportError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    /// Split a finished report into its main and progress files, write both
    /// atomically, and remove the temp copy. Returns the main file's name
    /// (not full path) for use in an index entry.
    pub async fn finalize(&self, report: &Report, report_base: &str) -> Result<String, ReportError> {
        let run_id = RunId::new(&report.run_id);
        let progress_name = Self::progress_filename(&run_id, report_base);
        let main_name = Self::main_filename(&run_id, report_base);

        let progress_bytes = serde_json::to_vec_pretty(&report.progress).map_err(|source| {
            ReportError::Serialize {
                run_id: report.run_id.clone(),
                source,
            }
        })?;
        self.write_atomic(&progress_name, &progress_bytes).await?;

        let mut finalized = report.clone_for_finalize();
        finalized.sync_status.sync_progress_file = Some(progress_name);
        let main_bytes =
            serde_json::to_vec_pretty(&finalized).map_err(|source| ReportError::Serialize {
                run_id: report.run_id.clone(),
                source,
            })?;
        self.write_atomic(&main_name, &main_bytes).await?;

        self.remove_temp_report(report_base).await?;
        Ok(main_name)
    }

    /// Scan the store directory for `*.main.json` files and project each into
    /// an index entry. `generated_at` is supplied by the caller (via
    /// [`syncoor_core::Clock`]) so the result stays deterministic in tests.
    pub async fn generate_index(&self, generated_at: i64) -> Result<Index, ReportError> {
        let mut entries = Vec::new();
        let mut dir = match fs::read_dir(&self.base_dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Index {
                    generated: generated_at,
                    entries,
                });
            }
            Err(source) => {
                return Err(ReportError::Io {
                    path: self.base_dir.display().to_string(),
                    source,
                })
            }
        };
        while let Some(dir_entry) = dir.next_entry().await.map_err(|source| ReportError::Io {
            path: self.base_dir.display().to_string(),
            source,
        })? {
            let file_name = dir_entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if !name.ends_with(".main.json") {
                continue;
            }
            let Some(report) = self.read_json::<Report>(name).await? else {
                continue;
            };
            entries.push(IndexEntry::from_report(&report, name));
        }
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(Index {
            generated: generated_at,
            entries,
        })
    }

    pub async fn save_index(&self, index: &Index) -> Result<(), ReportError> {
        let bytes = serde_json::to_vec_pretty(index).map_err(|source| ReportError::Serialize {
            run_id: "index".to_string(),
            source,
        })?;
        self.write_atomic(Self::index_filename(), &bytes).await
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
