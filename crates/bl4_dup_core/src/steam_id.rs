use crate::core_api::{CoreError, CoreErrorCode};

const SAVE_ROOT_DIR: &str = "SaveGames/";
const CLIENT_DIR: &str = "/Profiles/client/";
const SAVE_EXTENSION: &str = ".sav";

/// Returns the account key id for a save.
///
/// A non-empty `hint` wins unchanged. Otherwise the id is read from the
/// standard layout `.../SaveGames/<id>/Profiles/client/<file>.sav`.
pub fn resolve(path: &str, hint: &str) -> Result<String, CoreError> {
    if !hint.is_empty() {
        return Ok(hint.to_string());
    }

    id_from_save_path(path).map(str::to_string).ok_or_else(|| {
        CoreError::new(
            CoreErrorCode::IdentifierResolution,
            format!("Steam ID could not be determined from file path: {path}"),
        )
    })
}

fn id_from_save_path(path: &str) -> Option<&str> {
    // Only separators change, so byte offsets into `normalized` are valid in `path`.
    let normalized = path.replace('\\', "/");
    if !normalized.ends_with(SAVE_EXTENSION) {
        return None;
    }

    let client_at = normalized.rfind(CLIENT_DIR)?;
    let head = &normalized[..client_at];
    let root_at = head.rfind(SAVE_ROOT_DIR)?;
    let id_start = root_at + SAVE_ROOT_DIR.len();
    if id_start >= client_at {
        return None;
    }

    let file_name = &normalized[client_at + CLIENT_DIR.len()..];
    if file_name.len() <= SAVE_EXTENSION.len() {
        return None;
    }

    Some(&path[id_start..client_at])
}
