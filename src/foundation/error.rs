pub type SceneryResult<T> = Result<T, SceneryError>;

/// Errors surfaced by the engine.
///
/// Most paint-time problems never reach callers: they are logged and contained to the node that
/// caused them. Construction-time misuse (bad interpolation ranges, stale node handles) is what
/// comes back as an `Err`.
#[derive(thiserror::Error, Debug)]
pub enum SceneryError {
    /// Interpolation breakpoints are empty, mismatched, non-finite or decreasing.
    #[error("invalid range: {0}")]
    InvalidRange(String),

    /// A style value the layout solver or style parser cannot express.
    #[error("style value error: `{key}` = {value}")]
    StyleValue {
        /// Style or solver property name.
        key: String,
        /// Rendered offending value.
        value: String,
    },

    /// A touch move/end arrived for an identifier with no recorded target.
    #[error("unknown touch identifier: {0}")]
    UnknownTouchIdentifier(u64),

    /// Stale handle or structurally invalid tree operation.
    #[error("tree error: {0}")]
    Tree(String),

    /// Surface allocation or sizing failure.
    #[error("surface error: {0}")]
    Surface(String),

    /// Failure reported by the layout solver.
    #[error("layout error: {0}")]
    Layout(String),

    /// Invalid engine configuration.
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SceneryError {
    pub fn invalid_range(msg: impl Into<String>) -> Self {
        Self::InvalidRange(msg.into())
    }

    pub fn style_value(key: impl Into<String>, value: impl std::fmt::Display) -> Self {
        Self::StyleValue {
            key: key.into(),
            value: value.to_string(),
        }
    }

    pub fn tree(msg: impl Into<String>) -> Self {
        Self::Tree(msg.into())
    }

    pub fn surface(msg: impl Into<String>) -> Self {
        Self::Surface(msg.into())
    }

    pub fn layout(msg: impl Into<String>) -> Self {
        Self::Layout(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<taffy::TaffyError> for SceneryError {
    fn from(err: taffy::TaffyError) -> Self {
        Self::Layout(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
