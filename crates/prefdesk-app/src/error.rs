// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use thiserror::Error;

/// Failures of a single form action.
///
/// Collaborator errors are flattened to their rendered chain so the value
/// can be cloned across the worker channel and compared in tests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreferenceError {
    #[error("please enter a name")]
    Validation,
    #[error("error fetching existing data: {0}")]
    Lookup(String),
    #[error("error updating preferences: {0}")]
    Update(String),
    #[error("error fetching search results: {0}")]
    Search(String),
    /// The request never reached the remote table.
    #[error("could not start request: {0}")]
    Dispatch(String),
}

impl PreferenceError {
    pub fn lookup(error: &anyhow::Error) -> Self {
        Self::Lookup(format!("{error:#}"))
    }

    pub fn update(error: &anyhow::Error) -> Self {
        Self::Update(format!("{error:#}"))
    }

    pub fn search(error: &anyhow::Error) -> Self {
        Self::Search(format!("{error:#}"))
    }

    pub fn dispatch(error: &anyhow::Error) -> Self {
        Self::Dispatch(format!("{error:#}"))
    }
}
