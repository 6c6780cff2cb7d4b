use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::codec::{Bl4Codec, SaveCodec};
use crate::steam_id;

use super::document::SaveDocument;
use super::error::{CoreError, CoreErrorCode};
use super::types::{AppliedEdits, DuplicateOptions, DuplicateReport};

/// Load/persist pipelines over a [`SaveCodec`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Engine<C = Bl4Codec> {
    codec: C,
}

impl Engine {
    pub fn new() -> Self {
        Self { codec: Bl4Codec }
    }
}

impl<C: SaveCodec> Engine<C> {
    pub fn with_codec(codec: C) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Resolves the account key id, then reads, decodes and parses `path`.
    ///
    /// The source file is only ever read.
    pub fn load(&self, path: &Path, hint: &str) -> Result<SaveDocument, CoreError> {
        let key_id = steam_id::resolve(&path.to_string_lossy(), hint)?;
        debug!(path = %path.display(), key_id = %key_id, "reading save container");

        let bytes = fs::read(path).map_err(|e| {
            CoreError::new(
                CoreErrorCode::Io,
                format!("failed to read {}: {e}", path.display()),
            )
        })?;
        self.open_bytes(&bytes, key_id)
    }

    pub fn open_bytes(
        &self,
        container: &[u8],
        account_key_id: impl Into<String>,
    ) -> Result<SaveDocument, CoreError> {
        let account_key_id = account_key_id.into();
        let plaintext = self.codec.decode(container, &account_key_id).map_err(|e| {
            CoreError::new(CoreErrorCode::Decode, format!("failed to decrypt save: {e}"))
        })?;
        debug!(bytes = plaintext.len(), "decoded save container");

        SaveDocument::parse(&plaintext, account_key_id)
    }

    /// Serializes and encodes `doc` without touching the filesystem.
    pub fn encode(&self, doc: &SaveDocument) -> Result<Vec<u8>, CoreError> {
        let yaml = doc.to_yaml()?;
        self.codec
            .encode(yaml.as_bytes(), doc.account_key_id())
            .map_err(|e| {
                CoreError::new(CoreErrorCode::Encode, format!("failed to encrypt save: {e}"))
            })
    }

    /// Encodes `doc` and atomically replaces `dest` with the result.
    ///
    /// On error `dest` is left exactly as it was.
    pub fn persist(&self, doc: &SaveDocument, dest: &Path) -> Result<(), CoreError> {
        let container = self.encode(doc)?;
        write_atomic(dest, &container)?;
        info!(dest = %dest.display(), bytes = container.len(), "wrote save");
        Ok(())
    }

    /// Clones `source`, applies `options` to the copy and persists it to `dest`.
    ///
    /// `source` is never modified; the report compares it against the copy.
    pub fn duplicate(
        &self,
        source: &SaveDocument,
        options: &DuplicateOptions,
        dest: &Path,
    ) -> Result<DuplicateReport, CoreError> {
        let before = source.snapshot()?;
        let mut copy = source.clone();
        let mut applied = AppliedEdits::default();

        if options.randomize_guid {
            let guid = copy.randomize_char_guid()?;
            debug!(%guid, "randomized character guid");
            applied.guid_randomized = true;
        }
        let name = options
            .char_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());
        if let Some(name) = name {
            if before.char_name.as_deref() != Some(name) {
                copy.set_char_name(name)?;
                applied.name_changed = true;
            }
        }
        if options.reset_playtime {
            copy.reset_playtime()?;
            applied.playtime_reset = true;
        }
        if options.reset_challenges {
            applied.challenges_removed = Some(copy.reset_challenges()?);
        }
        if options.reset_uvh_challenges {
            applied.uvh_challenges_removed = Some(copy.reset_uvh_challenges()?);
        }

        self.persist(&copy, dest)?;
        info!(
            dest = %dest.display(),
            guid_randomized = applied.guid_randomized,
            name_changed = applied.name_changed,
            "duplicated character"
        );

        Ok(DuplicateReport {
            destination: PathBuf::from(dest),
            before,
            after: copy.snapshot()?,
            applied,
        })
    }
}

fn write_atomic(dest: &Path, bytes: &[u8]) -> Result<(), CoreError> {
    let persist_err = |e: std::io::Error| {
        CoreError::new(
            CoreErrorCode::Persist,
            format!("failed to write {}: {e}", dest.display()),
        )
    };

    // The temp file must share a filesystem with `dest` for the rename to be atomic.
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(persist_err)?;
    tmp.write_all(bytes).map_err(persist_err)?;
    tmp.as_file().sync_all().map_err(persist_err)?;
    tmp.persist(dest).map_err(|e| persist_err(e.error))?;
    Ok(())
}
