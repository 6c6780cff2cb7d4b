mod document;
mod engine;
mod error;
mod types;

pub use document::{GUID_LEN, SaveDocument, is_uvh_challenge};
pub use engine::Engine;
pub use error::{CoreError, CoreErrorCode};
pub use types::{AppliedEdits, ChallengeCounts, DuplicateOptions, DuplicateReport, Snapshot};
