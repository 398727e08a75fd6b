// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `CoordinatorStore`: the in-memory mirror of every run the coordinator
//! currently knows about.
//!
//! Writer operations take the `parking_lot::RwLock` in write mode, which
//! both serializes writers and means no reader ever observes a
//! partially-applied update. Reader operations return owned clones so
//! callers can never mutate shared state through a returned reference.

use crate::error::StoreError;
use chrono::Duration as ChronoDuration;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use syncoor_core::{Clock, CompleteRequest, Keepalive, ProgressEntry, RunId, TestData};

#[derive(Debug, Clone, Copy)]
pub struct StoreConfig {
    pub max_history: usize,
    pub orphan_threshold: ChronoDuration,
    pub cleanup_threshold: ChronoDuration,
    pub max_age: ChronoDuration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_history: 1000,
            orphan_threshold: ChronoDuration::minutes(10),
            cleanup_threshold: ChronoDuration::minutes(20),
            max_age: ChronoDuration::hours(24),
        }
    }
}

pub struct CoordinatorStore {
    tests: RwLock<HashMap<RunId, TestData>>,
    config: StoreConfig,
    clock: Arc<dyn Clock>,
}

impl CoordinatorStore {
    pub fn new(config: StoreConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            tests: RwLock::new(HashMap::new()),
            config,
            clock,
        }
    }

    pub fn create_test(&self, keepalive: Keepalive) -> Result<TestData, StoreError> {
        let run_id = keepalive.run_id.clone();
        let mut tests = self.tests.write();
        if tests.contains_key(&run_id) {
            return Err(StoreError::TestData(
                syncoor_core::TestDataError::AlreadyExists,
            ));
        }
        let now = self.clock.now();
        let data = TestData::from_keepalive(keepalive, now, self.config.max_history);
        tests.insert(run_id, data.clone());
        Ok(data)
    }

    pub fn update_keepalive(&self, run_id: &RunId) -> Result<(), StoreError> {
        let now = self.clock.now();
        let mut tests = self.tests.write();
        let test = tests
            .get_mut(run_id)
            .ok_or_else(|| StoreError::NotFound(run_id.to_string()))?;
        test.apply_keepalive(now).map_err(StoreError::from)
    }

    pub fn update_progress(
        &self,
        run_id: &RunId,
        entry: ProgressEntry,
    ) -> Result<(), StoreError> {
        let now = self.clock.now();
        let mut tests = self.tests.write();
        let test = tests
            .get_mut(run_id)
            .ok_or_else(|| StoreError::NotFound(run_id.to_string()))?;
        test.apply_progress(entry, now).map_err(StoreError::from)
    }

    pub fn complete_test(
        &self,
        run_id: &RunId,
        complete: CompleteRequest,
    ) -> Result<(), StoreError> {
        let now = self.clock.now();
        let mut tests = self.tests.write();
        let test = tests
            .get_mut(run_id)
            .ok_or_else(|| StoreError::NotFound(run_id.to_string()))?;
        test.apply_complete(complete, now).map_err(StoreError::from)
    }

    /// Mark running tests stale past the orphan threshold. Returns how many
    /// were newly orphaned.
    pub fn mark_orphaned_tests(&self) -> usize {
        let now = self.clock.now();
        let mut tests = self.tests.write();
        let mut marked = 0;
        for test in tests.values_mut() {
            if test.is_running && test.is_stale(now, self.config.orphan_threshold) {
                test.mark_orphaned();
                marked += 1;
            }
        }
        marked
    }

    /// Remove not-running tests stale past the cleanup threshold. Returns
    /// how many were removed.
    pub fn cleanup_orphaned_tests(&self) -> usize {
        let now = self.clock.now();
        let mut tests = self.tests.write();
        let before = tests.len();
        tests.retain(|_, test| test.is_running || !test.is_stale(now, self.config.cleanup_threshold));
        before - tests.len()
    }

    /// Evict anything older than `max_age`. Returns how many were removed.
    pub fn cleanup(&self) -> usize {
        let now = self.clock.now();
        let mut tests = self.tests.write();
        let before = tests.len();
        tests.retain(|_, test| now - test.start_time <= self.config.max_age);
        before - tests.len()
    }

    pub fn get(&self, run_id: &RunId) -> Result<TestData, StoreError> {
        self.tests
            .read()
            .get(run_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(run_id.to_string()))
    }

    pub fn list(&self, active: Option<bool>) -> Vec<TestData> {
        self.tests
            .read()
            .values()
            .filter(|test| match active {
                Some(want_active) => test.is_running == want_active,
                None => true,
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
