// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow, bail};
use prefdesk_app::{PreferenceFlags, PreferenceRecord, RecordId, RemoteTable};
use std::sync::{Arc, Mutex, MutexGuard};

const FIRST_NAMES: [&str; 16] = [
    "Avery", "Jordan", "Taylor", "Riley", "Morgan", "Casey", "Alex", "Quinn", "Parker", "Drew",
    "Kai", "Elliot", "Robin", "Cameron", "Hayden", "Rowan",
];
const LAST_NAMES: [&str; 18] = [
    "Walker", "Martin", "Hill", "Evans", "Lopez", "Gray", "Ward", "Young", "Diaz", "Reed",
    "Campbell", "Turner", "Flores", "Bennett", "Price", "Morris", "Foster", "Brooks",
];

const DEMO_SEED: u64 = 7;
const DEMO_RECORDS: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Lookup,
    Update,
    Search,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CallCounts {
    pub lookups: usize,
    pub updates: usize,
    pub searches: usize,
}

impl CallCounts {
    pub const fn total(&self) -> usize {
        self.lookups + self.updates + self.searches
    }
}

#[derive(Debug, Default)]
struct Inner {
    rows: Vec<PreferenceRecord>,
    calls: CallCounts,
    failures: Vec<Operation>,
}

/// In-process stand-in for the remote table.
///
/// Clones share rows, call counts, and armed failures, so a test can hand
/// one clone to the code under test and inspect another.
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = PreferenceRecord>) -> Self {
        let table = Self::new();
        table.lock().rows.extend(records);
        table
    }

    /// Table populated with the records used by `prefdesk --demo`.
    pub fn demo() -> Self {
        let mut faker = PreferenceFaker::new(DEMO_SEED);
        Self::with_records(faker.records(DEMO_RECORDS))
    }

    pub fn insert(&self, name: &str, flags: PreferenceFlags) -> RecordId {
        let mut inner = self.lock();
        let id = RecordId::from(inner.rows.len() as i64 + 1);
        inner.rows.push(PreferenceRecord {
            id: id.clone(),
            name: name.to_owned(),
            flags,
        });
        id
    }

    pub fn records(&self) -> Vec<PreferenceRecord> {
        self.lock().rows.clone()
    }

    pub fn record(&self, name: &str) -> Option<PreferenceRecord> {
        self.lock().rows.iter().find(|row| row.name == name).cloned()
    }

    pub fn calls(&self) -> CallCounts {
        self.lock().calls
    }

    /// Makes the next call of `operation` fail with a transport-style error.
    pub fn fail_next(&self, operation: Operation) {
        self.lock().failures.push(operation);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Inner {
    fn take_failure(&mut self, operation: Operation) -> Result<()> {
        if let Some(index) = self.failures.iter().position(|armed| *armed == operation) {
            self.failures.remove(index);
            return Err(anyhow!("injected {operation:?} failure"));
        }
        Ok(())
    }
}

impl RemoteTable for MemoryTable {
    fn lookup_by_exact_name(&self, name: &str) -> Result<Option<PreferenceRecord>> {
        let mut inner = self.lock();
        inner.calls.lookups += 1;
        inner.take_failure(Operation::Lookup)?;

        let mut matches = inner.rows.iter().filter(|row| row.name == name);
        let first = matches.next().cloned();
        if matches.next().is_some() {
            bail!("multiple rows named {name:?}");
        }
        Ok(first)
    }

    fn update_flags(&self, name: &str, flags: &PreferenceFlags) -> Result<()> {
        let mut inner = self.lock();
        inner.calls.updates += 1;
        inner.take_failure(Operation::Update)?;

        for row in inner.rows.iter_mut().filter(|row| row.name == name) {
            row.flags = *flags;
        }
        Ok(())
    }

    fn search_by_name_substring(&self, query: &str) -> Result<Vec<PreferenceRecord>> {
        let mut inner = self.lock();
        inner.calls.searches += 1;
        inner.take_failure(Operation::Search)?;

        let needle = query.to_lowercase();
        Ok(inner
            .rows
            .iter()
            .filter(|row| row.name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }
}

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Seeded generator of plausible preference rows.
#[derive(Debug, Clone)]
pub struct PreferenceFaker {
    rng: DeterministicRng,
    next_id: i64,
}

impl PreferenceFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            next_id: 1,
        }
    }

    pub fn name(&mut self) -> String {
        let first = FIRST_NAMES[self.rng.int_n(FIRST_NAMES.len())];
        let last = LAST_NAMES[self.rng.int_n(LAST_NAMES.len())];
        format!("{first} {last}")
    }

    pub fn flags(&mut self) -> PreferenceFlags {
        PreferenceFlags {
            sub_dom: self.rng.bool(),
            roleplay: self.rng.bool(),
            pictures: self.rng.bool(),
            videos: self.rng.bool(),
            challenges: self.rng.bool(),
        }
    }

    pub fn record(&mut self) -> PreferenceRecord {
        let id = RecordId::from(self.next_id);
        self.next_id += 1;
        PreferenceRecord {
            id,
            name: self.name(),
            flags: self.flags(),
        }
    }

    /// `count` records with distinct names.
    pub fn records(&mut self, count: usize) -> Vec<PreferenceRecord> {
        let mut out: Vec<PreferenceRecord> = Vec::with_capacity(count);
        let limit = count.min(FIRST_NAMES.len() * LAST_NAMES.len());
        while out.len() < limit {
            let record = self.record();
            if out.iter().all(|existing| existing.name != record.name) {
                out.push(record);
            }
        }
        out
    }
}
