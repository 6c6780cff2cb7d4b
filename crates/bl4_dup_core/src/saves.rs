use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

pub const PROFILE_SAVE_NAME: &str = "profile.sav";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CharacterSave {
    pub account_key_id: String,
    pub path: PathBuf,
}

/// `<Documents>/My Games/Borderlands 4/Saved/SaveGames`, when the platform has
/// a documents directory.
pub fn default_save_root() -> Option<PathBuf> {
    dirs::document_dir().map(|docs| {
        docs.join("My Games")
            .join("Borderlands 4")
            .join("Saved")
            .join("SaveGames")
    })
}

/// True for the account-wide profile save, which holds no character.
pub fn is_profile_save(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.eq_ignore_ascii_case(PROFILE_SAVE_NAME))
}

/// Lists `<root>/<id>/Profiles/client/*.sav`, skipping the profile save.
pub fn list_character_saves(root: &Path) -> io::Result<Vec<CharacterSave>> {
    let mut out = Vec::new();
    for account in fs::read_dir(root)?.flatten() {
        let account_dir = account.path();
        if !account_dir.is_dir() {
            continue;
        }
        let Some(account_key_id) = account_dir.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Ok(entries) = fs::read_dir(account_dir.join("Profiles").join("client")) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let is_sav = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("sav"));
            if path.is_file() && is_sav && !is_profile_save(&path) {
                out.push(CharacterSave {
                    account_key_id: account_key_id.to_string(),
                    path,
                });
            }
        }
    }
    out.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(out)
}
