// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use prefdesk_app::{
    FormCommand, FormEvent, FormState, PreferenceError, PreferenceFlags, SearchResults,
    SubmitOutcome, SubmitRequest, search_records, submit_preferences,
};
use prefdesk_testkit::{MemoryTable, Operation};

fn all_on() -> PreferenceFlags {
    PreferenceFlags {
        sub_dom: true,
        roleplay: true,
        pictures: true,
        videos: true,
        challenges: true,
    }
}

/// Drives a form the way the UI runtime does: dispatch, then execute any
/// requested remote call synchronously and feed the result back.
fn drive(state: &mut FormState, table: &MemoryTable, command: FormCommand) -> Vec<FormEvent> {
    let events = state.dispatch(command);
    let mut follow_ups = Vec::new();
    for event in &events {
        match event {
            FormEvent::SubmitRequested(request) => {
                let result = submit_preferences(table, request);
                follow_ups.extend(state.dispatch(FormCommand::SubmitSettled(result)));
            }
            FormEvent::SearchRequested(query) => {
                let result = search_records(table, query);
                follow_ups.extend(state.dispatch(FormCommand::SearchSettled(result)));
            }
            _ => {}
        }
    }
    events.into_iter().chain(follow_ups).collect()
}

#[test]
fn blank_name_never_reaches_the_table() {
    let table = MemoryTable::new();
    table.insert("Alice", PreferenceFlags::default());

    for name in ["", " ", "\t"] {
        let mut state = FormState {
            name: name.to_owned(),
            ..FormState::default()
        };
        drive(&mut state, &table, FormCommand::Submit);
        assert_eq!(
            state.notice.as_ref().map(|notice| notice.message.as_str()),
            Some("please enter a name")
        );
    }
    assert_eq!(table.calls().total(), 0);
}

#[test]
fn unknown_name_reports_not_found_and_leaves_table_unchanged() -> Result<()> {
    let table = MemoryTable::new();
    table.insert("Alice", PreferenceFlags::default());
    let before = table.records();

    let request = SubmitRequest::new("Bob", all_on())?;
    let outcome = submit_preferences(&table, &request)?;

    assert_eq!(
        outcome,
        SubmitOutcome::NotFound {
            name: "Bob".to_owned()
        }
    );
    assert_eq!(table.records(), before);
    assert_eq!(table.calls().lookups, 1);
    assert_eq!(table.calls().updates, 0);
    Ok(())
}

#[test]
fn matching_name_gets_exactly_one_update_with_local_flags() -> Result<()> {
    let table = MemoryTable::new();
    table.insert("Alice", PreferenceFlags::default());

    let flags = PreferenceFlags {
        sub_dom: true,
        videos: true,
        ..PreferenceFlags::default()
    };
    let request = SubmitRequest::new("Alice", flags)?;
    let outcome = submit_preferences(&table, &request)?;

    assert_eq!(
        outcome,
        SubmitOutcome::Updated {
            name: "Alice".to_owned()
        }
    );
    assert_eq!(table.calls().lookups, 1);
    assert_eq!(table.calls().updates, 1);
    assert_eq!(table.record("Alice").map(|record| record.flags), Some(flags));
    Ok(())
}

#[test]
fn repeated_submit_is_idempotent() -> Result<()> {
    let table = MemoryTable::new();
    table.insert("Alice", PreferenceFlags::default());
    let request = SubmitRequest::new("Alice", all_on())?;

    submit_preferences(&table, &request)?;
    let after_first = table.records();
    submit_preferences(&table, &request)?;

    assert_eq!(table.records(), after_first);
    Ok(())
}

#[test]
fn lookup_failure_skips_update() -> Result<()> {
    let table = MemoryTable::new();
    table.insert("Alice", PreferenceFlags::default());
    table.fail_next(Operation::Lookup);

    let request = SubmitRequest::new("Alice", all_on())?;
    let error = submit_preferences(&table, &request).expect_err("lookup should fail");

    assert!(matches!(error, PreferenceError::Lookup(_)));
    assert_eq!(table.calls().updates, 0);
    assert_eq!(
        table.record("Alice").map(|record| record.flags),
        Some(PreferenceFlags::default())
    );
    Ok(())
}

#[test]
fn update_failure_is_surfaced_without_retry() -> Result<()> {
    let table = MemoryTable::new();
    table.insert("Alice", PreferenceFlags::default());
    table.fail_next(Operation::Update);

    let mut state = FormState {
        name: "Alice".to_owned(),
        flags: all_on(),
        ..FormState::default()
    };
    drive(&mut state, &table, FormCommand::Submit);

    let notice = state.notice.expect("failure should raise a notice");
    assert!(notice.message.starts_with("error updating preferences"));
    assert_eq!(table.calls().updates, 1);
    assert!(!state.submit_in_flight);
    Ok(())
}

#[test]
fn empty_query_means_no_search_performed() {
    let table = MemoryTable::new();
    let mut state = FormState::default();

    drive(&mut state, &table, FormCommand::Search);

    assert_eq!(state.results, SearchResults::NotSearched);
    assert_eq!(table.calls().searches, 0);
}

#[test]
fn unmatched_query_yields_empty_results() {
    let table = MemoryTable::new();
    table.insert("Alice", PreferenceFlags::default());
    let mut state = FormState {
        search_query: "zed".to_owned(),
        ..FormState::default()
    };

    drive(&mut state, &table, FormCommand::Search);

    assert_eq!(state.results, SearchResults::NoMatches);
}

#[test]
fn search_matches_case_insensitive_substrings() {
    let table = MemoryTable::new();
    table.insert("Alice", PreferenceFlags::default());
    table.insert("Bob", PreferenceFlags::default());

    for query in ["ali", "ALICE", "lic"] {
        let mut state = FormState {
            search_query: query.to_owned(),
            ..FormState::default()
        };
        drive(&mut state, &table, FormCommand::Search);
        let names = state
            .results
            .records()
            .iter()
            .map(|record| record.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Alice"], "query {query}");
    }
}

#[test]
fn search_failure_clears_to_empty_results() {
    let table = MemoryTable::new();
    table.insert("Alice", PreferenceFlags::default());
    table.fail_next(Operation::Search);
    let mut state = FormState {
        search_query: "ali".to_owned(),
        results: SearchResults::NotSearched,
        ..FormState::default()
    };

    drive(&mut state, &table, FormCommand::Search);

    assert_eq!(state.results, SearchResults::NoMatches);
    assert!(state.notice.is_none());
}

#[test]
fn submit_then_search_reflects_new_flags() {
    let table = MemoryTable::new();
    table.insert("Alice", PreferenceFlags::default());
    let mut state = FormState {
        name: "Alice".to_owned(),
        flags: all_on(),
        search_query: "alice".to_owned(),
        ..FormState::default()
    };

    drive(&mut state, &table, FormCommand::Submit);
    drive(&mut state, &table, FormCommand::Search);

    assert_eq!(state.results.records().len(), 1);
    assert_eq!(state.results.records()[0].flags, all_on());
}
