use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreErrorCode {
    IdentifierResolution,
    Io,
    Decode,
    Parse,
    Shape,
    Encode,
    Persist,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code:?}: {message}")]
pub struct CoreError {
    pub code: CoreErrorCode,
    pub message: String,
}

impl CoreError {
    pub fn new(code: CoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub(crate) fn shape(path: &str, expected: &str, found: crate::node::NodeKind) -> Self {
        Self::new(
            CoreErrorCode::Shape,
            format!("`{path}` should be {expected}, found {found}"),
        )
    }
}
