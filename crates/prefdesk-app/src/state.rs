// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{
    FlagKind, PreferenceError, PreferenceFlags, PreferenceRecord, SearchResults, SubmitOutcome,
    SubmitRequest,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// A message the user has to acknowledge before continuing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormState {
    pub name: String,
    pub flags: PreferenceFlags,
    pub search_query: String,
    pub results: SearchResults,
    pub notice: Option<Notice>,
    pub status_line: Option<String>,
    pub submit_in_flight: bool,
    pub search_in_flight: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormCommand {
    SetName(String),
    ToggleFlag(FlagKind),
    SetFlag(FlagKind, bool),
    SetSearchQuery(String),
    Submit,
    Search,
    SubmitSettled(Result<SubmitOutcome, PreferenceError>),
    SearchSettled(Result<Vec<PreferenceRecord>, PreferenceError>),
    DismissNotice,
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    NameChanged,
    FlagChanged(FlagKind, bool),
    SearchQueryChanged,
    /// The runtime should run this submit and report back with
    /// [`FormCommand::SubmitSettled`].
    SubmitRequested(SubmitRequest),
    SubmitIgnored,
    /// The runtime should run this search and report back with
    /// [`FormCommand::SearchSettled`].
    SearchRequested(String),
    SearchIgnored,
    ResultsChanged,
    NoticeRaised(Notice),
    NoticeDismissed,
    StatusUpdated(String),
    StatusCleared,
}

impl FormState {
    pub fn dispatch(&mut self, command: FormCommand) -> Vec<FormEvent> {
        match command {
            FormCommand::SetName(name) => {
                self.name = name;
                vec![FormEvent::NameChanged]
            }
            FormCommand::ToggleFlag(kind) => {
                let value = self.flags.toggle(kind);
                vec![FormEvent::FlagChanged(kind, value)]
            }
            FormCommand::SetFlag(kind, value) => {
                self.flags.set(kind, value);
                vec![FormEvent::FlagChanged(kind, value)]
            }
            FormCommand::SetSearchQuery(query) => {
                self.search_query = query;
                vec![FormEvent::SearchQueryChanged]
            }
            FormCommand::Submit => self.begin_submit(),
            FormCommand::Search => self.begin_search(),
            FormCommand::SubmitSettled(result) => self.settle_submit(result),
            FormCommand::SearchSettled(result) => self.settle_search(result),
            FormCommand::DismissNotice => {
                if self.notice.take().is_some() {
                    vec![FormEvent::NoticeDismissed]
                } else {
                    Vec::new()
                }
            }
            FormCommand::ClearStatus => {
                self.status_line = None;
                vec![FormEvent::StatusCleared]
            }
        }
    }

    fn begin_submit(&mut self) -> Vec<FormEvent> {
        if self.submit_in_flight {
            return vec![FormEvent::SubmitIgnored];
        }

        match SubmitRequest::new(&self.name, self.flags) {
            Ok(request) => {
                self.submit_in_flight = true;
                vec![
                    self.set_status("updating preferences"),
                    FormEvent::SubmitRequested(request),
                ]
            }
            Err(err) => vec![self.raise(Notice::error(err.to_string()))],
        }
    }

    fn settle_submit(&mut self, result: Result<SubmitOutcome, PreferenceError>) -> Vec<FormEvent> {
        self.submit_in_flight = false;
        let notice = match result {
            Ok(outcome @ SubmitOutcome::Updated { .. }) => Notice::info(outcome.message()),
            Ok(outcome @ SubmitOutcome::NotFound { .. }) => Notice::error(outcome.message()),
            Err(err) => Notice::error(err.to_string()),
        };
        vec![self.raise(notice)]
    }

    fn begin_search(&mut self) -> Vec<FormEvent> {
        if self.search_in_flight {
            return vec![FormEvent::SearchIgnored];
        }
        if self.search_query.trim().is_empty() {
            self.results = SearchResults::NotSearched;
            return vec![FormEvent::ResultsChanged];
        }

        self.search_in_flight = true;
        vec![
            self.set_status("searching"),
            FormEvent::SearchRequested(self.search_query.clone()),
        ]
    }

    fn settle_search(
        &mut self,
        result: Result<Vec<PreferenceRecord>, PreferenceError>,
    ) -> Vec<FormEvent> {
        self.search_in_flight = false;
        match result {
            Ok(records) => {
                let count = records.len();
                self.results = SearchResults::from_records(records);
                let label = match count {
                    1 => "1 match".to_owned(),
                    n => format!("{n} matches"),
                };
                vec![FormEvent::ResultsChanged, self.set_status(label)]
            }
            Err(_) => {
                self.results = SearchResults::NoMatches;
                vec![FormEvent::ResultsChanged, self.set_status("search failed")]
            }
        }
    }

    fn raise(&mut self, notice: Notice) -> FormEvent {
        self.notice = Some(notice.clone());
        FormEvent::NoticeRaised(notice)
    }

    fn set_status(&mut self, message: impl Into<String>) -> FormEvent {
        let message = message.into();
        self.status_line = Some(message.clone());
        FormEvent::StatusUpdated(message)
    }
}
