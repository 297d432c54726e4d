// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Deserializer, Serialize};

use crate::ids::RecordId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlagKind {
    SubDom,
    Roleplay,
    Pictures,
    Videos,
    Challenges,
}

impl FlagKind {
    pub const ALL: [Self; 5] = [
        Self::SubDom,
        Self::Roleplay,
        Self::Pictures,
        Self::Videos,
        Self::Challenges,
    ];

    /// Column name in the remote table.
    pub const fn column(self) -> &'static str {
        match self {
            Self::SubDom => "sub_dom",
            Self::Roleplay => "roleplay",
            Self::Pictures => "pictures",
            Self::Videos => "videos",
            Self::Challenges => "challenges",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::SubDom => "Sub Dom",
            Self::Roleplay => "Roleplay",
            Self::Pictures => "Pictures",
            Self::Videos => "Videos",
            Self::Challenges => "Challenges",
        }
    }

    /// Text shown for a stored value in search results.
    pub const fn value_label(self, value: bool) -> &'static str {
        match (self, value) {
            (Self::SubDom, true) => "Dom",
            (Self::SubDom, false) => "Sub",
            (_, true) => "True",
            (_, false) => "False",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PreferenceFlags {
    #[serde(default, deserialize_with = "null_as_false")]
    pub sub_dom: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub roleplay: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub pictures: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub videos: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub challenges: bool,
}

// Nullable boolean columns read as unset.
fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

impl PreferenceFlags {
    pub const fn get(&self, kind: FlagKind) -> bool {
        match kind {
            FlagKind::SubDom => self.sub_dom,
            FlagKind::Roleplay => self.roleplay,
            FlagKind::Pictures => self.pictures,
            FlagKind::Videos => self.videos,
            FlagKind::Challenges => self.challenges,
        }
    }

    pub fn set(&mut self, kind: FlagKind, value: bool) {
        let slot = match kind {
            FlagKind::SubDom => &mut self.sub_dom,
            FlagKind::Roleplay => &mut self.roleplay,
            FlagKind::Pictures => &mut self.pictures,
            FlagKind::Videos => &mut self.videos,
            FlagKind::Challenges => &mut self.challenges,
        };
        *slot = value;
    }

    /// Flips one flag and returns its new value.
    pub fn toggle(&mut self, kind: FlagKind) -> bool {
        let next = !self.get(kind);
        self.set(kind, next);
        next
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceRecord {
    pub id: RecordId,
    pub name: String,
    #[serde(flatten)]
    pub flags: PreferenceFlags,
}

impl PreferenceRecord {
    /// Columns requested from the remote table for a full record.
    pub const SELECT_COLUMNS: &'static str = "id,name,sub_dom,roleplay,pictures,videos,challenges";
}

/// Outcome of the most recent search.
///
/// `NotSearched` and `NoMatches` are distinct: the first renders nothing,
/// the second renders an explicit empty-result message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchResults {
    #[default]
    NotSearched,
    NoMatches,
    Matches(Vec<PreferenceRecord>),
}

impl SearchResults {
    pub fn from_records(records: Vec<PreferenceRecord>) -> Self {
        if records.is_empty() {
            Self::NoMatches
        } else {
            Self::Matches(records)
        }
    }

    pub fn records(&self) -> &[PreferenceRecord] {
        match self {
            Self::Matches(records) => records,
            Self::NotSearched | Self::NoMatches => &[],
        }
    }

    pub const fn searched(&self) -> bool {
        !matches!(self, Self::NotSearched)
    }
}

#[cfg(test)]
mod tests {
    use super::{FlagKind, PreferenceFlags, PreferenceRecord, SearchResults};
    use crate::RecordId;

    #[test]
    fn sub_dom_uses_dom_sub_labels() {
        assert_eq!(FlagKind::SubDom.value_label(true), "Dom");
        assert_eq!(FlagKind::SubDom.value_label(false), "Sub");
        for kind in &FlagKind::ALL[1..] {
            assert_eq!(kind.value_label(true), "True");
            assert_eq!(kind.value_label(false), "False");
        }
    }

    #[test]
    fn toggle_flips_only_the_requested_flag() {
        let mut flags = PreferenceFlags::default();
        assert!(flags.toggle(FlagKind::Videos));
        assert_eq!(
            flags,
            PreferenceFlags {
                videos: true,
                ..PreferenceFlags::default()
            }
        );
        assert!(!flags.toggle(FlagKind::Videos));
        assert_eq!(flags, PreferenceFlags::default());
    }

    #[test]
    fn columns_match_select_list() {
        for kind in FlagKind::ALL {
            assert!(PreferenceRecord::SELECT_COLUMNS.contains(kind.column()));
        }
    }

    #[test]
    fn record_reads_flat_row() -> serde_json::Result<()> {
        let record: PreferenceRecord = serde_json::from_str(
            r#"{"id":3,"name":"Alice","sub_dom":true,"roleplay":false,"pictures":true,"videos":false,"challenges":true}"#,
        )?;
        assert_eq!(record.id, RecordId::from(3));
        assert_eq!(record.name, "Alice");
        assert!(record.flags.sub_dom);
        assert!(record.flags.pictures);
        assert!(record.flags.challenges);
        assert!(!record.flags.roleplay);
        Ok(())
    }

    #[test]
    fn null_flags_read_as_false() -> serde_json::Result<()> {
        let record: PreferenceRecord = serde_json::from_str(
            r#"{"id":"a1","name":"Bo","sub_dom":null,"roleplay":true,"pictures":null,"videos":null}"#,
        )?;
        assert!(!record.flags.sub_dom);
        assert!(record.flags.roleplay);
        assert!(!record.flags.challenges);
        Ok(())
    }

    #[test]
    fn empty_search_is_distinct_from_not_searched() {
        let empty = SearchResults::from_records(Vec::new());
        assert_eq!(empty, SearchResults::NoMatches);
        assert!(empty.searched());
        assert!(!SearchResults::NotSearched.searched());
        assert!(empty.records().is_empty());
    }
}
