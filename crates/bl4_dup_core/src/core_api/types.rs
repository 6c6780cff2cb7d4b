use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Sizes of the two `stats.challenge` partitions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChallengeCounts {
    pub base: usize,
    pub uvh: usize,
}

/// Read-only view of the fields the duplicator touches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub char_name: Option<String>,
    pub char_guid: Option<String>,
    pub total_playtime: Option<i64>,
    pub challenges: ChallengeCounts,
    pub highest_unlocked_vault_hunter_level: Option<i64>,
    pub vault_hunter_level: Option<i64>,
}

/// What to change on the copy.
///
/// `char_name` is trimmed before use. The copy is renamed only when the trimmed
/// name is non-empty and differs from the source's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DuplicateOptions {
    pub char_name: Option<String>,
    pub randomize_guid: bool,
    pub reset_playtime: bool,
    pub reset_challenges: bool,
    pub reset_uvh_challenges: bool,
}

impl Default for DuplicateOptions {
    fn default() -> Self {
        Self {
            char_name: None,
            randomize_guid: true,
            reset_playtime: false,
            reset_challenges: false,
            reset_uvh_challenges: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppliedEdits {
    pub guid_randomized: bool,
    pub name_changed: bool,
    pub playtime_reset: bool,
    /// Entries removed by the base challenge reset, `None` when it did not run.
    pub challenges_removed: Option<usize>,
    pub uvh_challenges_removed: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateReport {
    pub destination: PathBuf,
    pub before: Snapshot,
    pub after: Snapshot,
    pub applied: AppliedEdits,
}
