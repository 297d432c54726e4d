// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;

use crate::{PreferenceFlags, PreferenceRecord};

/// Remote storage for preference records.
///
/// Implementations own transport and concurrency control; callers issue at
/// most one request per method call and never retry.
pub trait RemoteTable {
    /// Returns the single row whose name equals `name` exactly.
    fn lookup_by_exact_name(&self, name: &str) -> Result<Option<PreferenceRecord>>;

    /// Replaces all five flags on the row named `name`.
    fn update_flags(&self, name: &str, flags: &PreferenceFlags) -> Result<()>;

    /// Returns rows whose name contains `query`, ignoring case, in
    /// whatever order the service produces.
    fn search_by_name_substring(&self, query: &str) -> Result<Vec<PreferenceRecord>>;
}

impl<T: RemoteTable + ?Sized> RemoteTable for &T {
    fn lookup_by_exact_name(&self, name: &str) -> Result<Option<PreferenceRecord>> {
        (**self).lookup_by_exact_name(name)
    }

    fn update_flags(&self, name: &str, flags: &PreferenceFlags) -> Result<()> {
        (**self).update_flags(name, flags)
    }

    fn search_by_name_substring(&self, query: &str) -> Result<Vec<PreferenceRecord>> {
        (**self).search_by_name_substring(query)
    }
}
