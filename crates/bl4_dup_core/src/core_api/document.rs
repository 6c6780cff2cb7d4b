use rand::Rng;

use crate::grammar;
use crate::node::{Node, NodeMap};

use super::error::{CoreError, CoreErrorCode};
use super::types::{ChallengeCounts, Snapshot};

pub const GUID_LEN: usize = 32;
const GUID_ALPHABET: &[u8; 16] = b"0123456789ABCDEF";
const UVH_MARKER: &str = "uvh";

const STATE: &str = "state";
const STATS: &str = "stats";
const GLOBALS: &str = "globals";
const CHAR_NAME: &str = "char_name";
const CHAR_GUID: &str = "char_guid";
const TOTAL_PLAYTIME: &str = "total_playtime";
const CHALLENGE: &str = "challenge";
const HIGHEST_VH_LEVEL: &str = "highest_unlocked_vault_hunter_level";
const VH_LEVEL: &str = "vault_hunter_level";

/// A decoded character save.
///
/// The root of the tree is always a map. The account key id is fixed when the
/// document is created and travels with every clone.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveDocument {
    root: NodeMap,
    account_key_id: String,
}

impl SaveDocument {
    /// Parses decoded plaintext into a document bound to `account_key_id`.
    pub fn parse(plaintext: &[u8], account_key_id: impl Into<String>) -> Result<Self, CoreError> {
        let tree = grammar::parse_bytes(plaintext).map_err(|e| {
            CoreError::new(CoreErrorCode::Parse, format!("failed to parse save: {e}"))
        })?;

        match tree {
            Node::Map(root) => Ok(Self {
                root,
                account_key_id: account_key_id.into(),
            }),
            other => Err(CoreError::new(
                CoreErrorCode::Parse,
                format!("save root must be a map, found {}", other.kind()),
            )),
        }
    }

    pub fn account_key_id(&self) -> &str {
        &self.account_key_id
    }

    pub fn root(&self) -> &NodeMap {
        &self.root
    }

    pub fn to_yaml(&self) -> Result<String, CoreError> {
        grammar::serialize_map(&self.root).map_err(|e| {
            CoreError::new(CoreErrorCode::Encode, format!("failed to serialize save: {e}"))
        })
    }

    pub fn char_name(&self) -> Result<Option<&str>, CoreError> {
        string_field(self.section(STATE)?, "state.char_name", CHAR_NAME)
    }

    pub fn set_char_name(&mut self, name: &str) -> Result<(), CoreError> {
        let state = self.section_or_insert(STATE)?;
        string_field(Some(&*state), "state.char_name", CHAR_NAME)?;
        state.insert(CHAR_NAME, Node::from(name));
        Ok(())
    }

    pub fn char_guid(&self) -> Result<Option<&str>, CoreError> {
        string_field(self.section(STATE)?, "state.char_guid", CHAR_GUID)
    }

    /// Assigns a fresh 32-digit uppercase hex GUID and returns it.
    pub fn randomize_char_guid(&mut self) -> Result<String, CoreError> {
        self.randomize_char_guid_with(&mut rand::thread_rng())
    }

    pub fn randomize_char_guid_with<R: Rng>(&mut self, rng: &mut R) -> Result<String, CoreError> {
        let state = self.section_or_insert(STATE)?;
        string_field(Some(&*state), "state.char_guid", CHAR_GUID)?;

        let guid: String = (0..GUID_LEN)
            .map(|_| GUID_ALPHABET[rng.gen_range(0..GUID_ALPHABET.len())] as char)
            .collect();
        state.insert(CHAR_GUID, Node::from(guid.clone()));
        Ok(guid)
    }

    pub fn playtime(&self) -> Result<Option<i64>, CoreError> {
        int_field(self.section(STATE)?, "state.total_playtime", TOTAL_PLAYTIME)
    }

    pub fn reset_playtime(&mut self) -> Result<(), CoreError> {
        let state = self.section_or_insert(STATE)?;
        int_field(Some(&*state), "state.total_playtime", TOTAL_PLAYTIME)?;
        state.insert(TOTAL_PLAYTIME, Node::Integer(0));
        Ok(())
    }

    /// Removes every challenge outside the UVH partition and returns how many
    /// entries were dropped.
    pub fn reset_challenges(&mut self) -> Result<usize, CoreError> {
        self.remove_challenges(|id| !is_uvh_challenge(id))
    }

    /// Removes every UVH challenge and drops both vault hunter levels back to 1
    /// when the highest unlocked level is above 1.
    pub fn reset_uvh_challenges(&mut self) -> Result<usize, CoreError> {
        // Validate the level fields first so a shape error leaves the tree untouched.
        let lower_levels = match self.section(GLOBALS)? {
            Some(globals) => {
                int_field(Some(globals), "globals.vault_hunter_level", VH_LEVEL)?;
                let highest = int_field(
                    Some(globals),
                    "globals.highest_unlocked_vault_hunter_level",
                    HIGHEST_VH_LEVEL,
                )?;
                highest.is_some_and(|level| level > 1)
            }
            None => false,
        };

        let removed = self.remove_challenges(is_uvh_challenge)?;

        if lower_levels {
            if let Some(globals) = self.section_mut(GLOBALS)? {
                globals.insert(HIGHEST_VH_LEVEL, Node::Integer(1));
                globals.insert(VH_LEVEL, Node::Integer(1));
            }
        }
        Ok(removed)
    }

    pub fn challenge_counts(&self) -> Result<ChallengeCounts, CoreError> {
        let mut counts = ChallengeCounts::default();
        if let Some(challenges) = self.challenges()? {
            for id in challenges.keys() {
                if is_uvh_challenge(id) {
                    counts.uvh += 1;
                } else {
                    counts.base += 1;
                }
            }
        }
        Ok(counts)
    }

    pub fn vault_hunter_levels(&self) -> Result<(Option<i64>, Option<i64>), CoreError> {
        let globals = self.section(GLOBALS)?;
        Ok((
            int_field(
                globals,
                "globals.highest_unlocked_vault_hunter_level",
                HIGHEST_VH_LEVEL,
            )?,
            int_field(globals, "globals.vault_hunter_level", VH_LEVEL)?,
        ))
    }

    pub fn snapshot(&self) -> Result<Snapshot, CoreError> {
        let (highest, current) = self.vault_hunter_levels()?;
        Ok(Snapshot {
            char_name: self.char_name()?.map(str::to_string),
            char_guid: self.char_guid()?.map(str::to_string),
            total_playtime: self.playtime()?,
            challenges: self.challenge_counts()?,
            highest_unlocked_vault_hunter_level: highest,
            vault_hunter_level: current,
        })
    }

    fn section(&self, name: &str) -> Result<Option<&NodeMap>, CoreError> {
        match self.root.get(name) {
            None | Some(Node::Null) => Ok(None),
            Some(Node::Map(map)) => Ok(Some(map)),
            Some(other) => Err(CoreError::shape(name, "a map", other.kind())),
        }
    }

    fn section_mut(&mut self, name: &str) -> Result<Option<&mut NodeMap>, CoreError> {
        match self.root.get_mut(name) {
            None | Some(Node::Null) => Ok(None),
            Some(Node::Map(map)) => Ok(Some(map)),
            Some(other) => Err(CoreError::shape(name, "a map", other.kind())),
        }
    }

    fn section_or_insert(&mut self, name: &str) -> Result<&mut NodeMap, CoreError> {
        let node = self.root.get_or_insert_with(name, || Node::Map(NodeMap::new()));
        if matches!(node, Node::Null) {
            *node = Node::Map(NodeMap::new());
        }
        let kind = node.kind();
        node.as_map_mut()
            .ok_or_else(|| CoreError::shape(name, "a map", kind))
    }

    fn challenges(&self) -> Result<Option<&NodeMap>, CoreError> {
        let Some(stats) = self.section(STATS)? else {
            return Ok(None);
        };
        match stats.get(CHALLENGE) {
            None | Some(Node::Null) => Ok(None),
            Some(Node::Map(map)) => Ok(Some(map)),
            Some(other) => Err(CoreError::shape("stats.challenge", "a map", other.kind())),
        }
    }

    fn remove_challenges<F>(&mut self, mut drop_id: F) -> Result<usize, CoreError>
    where
        F: FnMut(&str) -> bool,
    {
        let Some(stats) = self.section_mut(STATS)? else {
            return Ok(0);
        };
        let challenges = match stats.get_mut(CHALLENGE) {
            None | Some(Node::Null) => return Ok(0),
            Some(Node::Map(map)) => map,
            Some(other) => {
                return Err(CoreError::shape("stats.challenge", "a map", other.kind()));
            }
        };

        let before = challenges.len();
        challenges.retain(|id, _| !drop_id(id));
        Ok(before - challenges.len())
    }
}

pub fn is_uvh_challenge(id: &str) -> bool {
    id.contains(UVH_MARKER)
}

fn string_field<'a>(
    section: Option<&'a NodeMap>,
    path: &str,
    key: &str,
) -> Result<Option<&'a str>, CoreError> {
    match section.and_then(|s| s.get(key)) {
        None | Some(Node::Null) => Ok(None),
        Some(Node::String(s)) => Ok(Some(s)),
        Some(other) => Err(CoreError::shape(path, "a string", other.kind())),
    }
}

fn int_field(section: Option<&NodeMap>, path: &str, key: &str) -> Result<Option<i64>, CoreError> {
    match section.and_then(|s| s.get(key)) {
        None | Some(Node::Null) => Ok(None),
        Some(Node::Integer(n)) => Ok(Some(*n)),
        Some(other) => Err(CoreError::shape(path, "an integer", other.kind())),
    }
}
