// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the coordinator store and HTTP surface.

use syncoor_core::TestDataError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    TestData(#[from] TestDataError),
    #[error("run {0} not found")]
    NotFound(String),
}

impl StoreError {
    /// Structured error code surfaced in the `{error: {code, ...}}` envelope.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::TestData(TestDataError::AlreadyExists) => "already_exists",
            StoreError::TestData(TestDataError::AlreadyComplete) => "already_complete",
            StoreError::TestData(TestDataError::NotFound) | StoreError::NotFound(_) => "not_found",
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            StoreError::TestData(TestDataError::AlreadyExists)
            | StoreError::TestData(TestDataError::AlreadyComplete) => 409,
            StoreError::TestData(TestDataError::NotFound) | StoreError::NotFound(_) => 404,
        }
    }
}
