// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use prefdesk_app::{
    PreferenceError, PreferenceRecord, RemoteTable, SubmitOutcome, SubmitRequest, search_records,
    submit_preferences,
};
use prefdesk_tui::{AppRuntime, InternalEvent};
use std::sync::mpsc::Sender;
use std::thread;

/// Runs form actions against a remote table, one worker thread per request.
pub struct RemoteRuntime<T> {
    table: T,
}

impl<T> RemoteRuntime<T>
where
    T: RemoteTable + Clone + Send + 'static,
{
    pub fn new(table: T) -> Self {
        Self { table }
    }
}

impl<T> AppRuntime for RemoteRuntime<T>
where
    T: RemoteTable + Clone + Send + 'static,
{
    fn submit_preferences(
        &mut self,
        request: &SubmitRequest,
    ) -> Result<SubmitOutcome, PreferenceError> {
        submit_preferences(&self.table, request)
    }

    fn search_records(&mut self, query: &str) -> Result<Vec<PreferenceRecord>, PreferenceError> {
        search_records(&self.table, query)
    }

    fn spawn_submit(&mut self, request: SubmitRequest, tx: Sender<InternalEvent>) -> Result<()> {
        let table = self.table.clone();
        thread::Builder::new()
            .name("prefdesk-submit".to_owned())
            .spawn(move || {
                let result = submit_preferences(&table, &request);
                let _ = tx.send(InternalEvent::SubmitSettled(result));
            })
            .context("spawn submit worker")?;
        Ok(())
    }

    fn spawn_search(&mut self, query: String, tx: Sender<InternalEvent>) -> Result<()> {
        let table = self.table.clone();
        thread::Builder::new()
            .name("prefdesk-search".to_owned())
            .spawn(move || {
                let result = search_records(&table, &query);
                let _ = tx.send(InternalEvent::SearchSettled(result));
            })
            .context("spawn search worker")?;
        Ok(())
    }
}
