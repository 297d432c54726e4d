// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use tracing::{debug, error, info, warn};

use crate::{PreferenceError, PreferenceFlags, PreferenceRecord, RemoteTable};

/// A submit that has passed validation.
///
/// The only way to build one is [`SubmitRequest::new`], so holding a value
/// proves the name is non-blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
    name: String,
    flags: PreferenceFlags,
}

impl SubmitRequest {
    /// The name is kept exactly as typed; trimming is only used to reject
    /// blank input.
    pub fn new(name: &str, flags: PreferenceFlags) -> Result<Self, PreferenceError> {
        if name.trim().is_empty() {
            return Err(PreferenceError::Validation);
        }
        Ok(Self {
            name: name.to_owned(),
            flags,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn flags(&self) -> PreferenceFlags {
        self.flags
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Updated { name: String },
    NotFound { name: String },
}

impl SubmitOutcome {
    pub fn message(&self) -> String {
        match self {
            Self::Updated { name } => format!("successfully updated preferences for {name}"),
            Self::NotFound { name } => format!("user {name} not found"),
        }
    }
}

/// Looks the record up by exact name and, when it exists, replaces its
/// flags. Issues one lookup and at most one update.
pub fn submit_preferences<T: RemoteTable + ?Sized>(
    table: &T,
    request: &SubmitRequest,
) -> Result<SubmitOutcome, PreferenceError> {
    let name = request.name();
    debug!(record = name, "looking up preference record");
    let existing = table.lookup_by_exact_name(name).map_err(|err| {
        error!(record = name, error = %format!("{err:#}"), "preference lookup failed");
        PreferenceError::lookup(&err)
    })?;

    if existing.is_none() {
        warn!(record = name, "no preference record to update");
        return Ok(SubmitOutcome::NotFound {
            name: name.to_owned(),
        });
    }

    table.update_flags(name, &request.flags()).map_err(|err| {
        error!(record = name, error = %format!("{err:#}"), "preference update failed");
        PreferenceError::update(&err)
    })?;

    info!(record = name, flags = ?request.flags(), "updated preference record");
    Ok(SubmitOutcome::Updated {
        name: name.to_owned(),
    })
}

/// Case-insensitive substring search. Callers handle the blank-query case
/// themselves since it never reaches the service.
pub fn search_records<T: RemoteTable + ?Sized>(
    table: &T,
    query: &str,
) -> Result<Vec<PreferenceRecord>, PreferenceError> {
    debug!(query, "searching preference records");
    let records = table.search_by_name_substring(query).map_err(|err| {
        error!(query, error = %format!("{err:#}"), "preference search failed");
        PreferenceError::search(&err)
    })?;
    debug!(query, matches = records.len(), "search complete");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::{SubmitOutcome, SubmitRequest};
    use crate::{PreferenceError, PreferenceFlags};

    #[test]
    fn blank_names_are_rejected() {
        for name in ["", "   ", "\t\n"] {
            assert_eq!(
                SubmitRequest::new(name, PreferenceFlags::default()),
                Err(PreferenceError::Validation),
                "name {name:?}"
            );
        }
    }

    #[test]
    fn name_is_kept_as_typed() -> Result<(), PreferenceError> {
        let request = SubmitRequest::new(" Alice ", PreferenceFlags::default())?;
        assert_eq!(request.name(), " Alice ");
        Ok(())
    }

    #[test]
    fn outcome_messages_name_the_record() {
        let updated = SubmitOutcome::Updated {
            name: "Alice".to_owned(),
        };
        let missing = SubmitOutcome::NotFound {
            name: "Zed".to_owned(),
        };
        assert_eq!(updated.message(), "successfully updated preferences for Alice");
        assert_eq!(missing.message(), "user Zed not found");
    }
}
