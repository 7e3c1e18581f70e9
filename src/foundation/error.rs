/// Convenience result type used across nyangseng.
pub type NyangResult<T> = Result<T, NyangError>;

/// Which compositor input failed to load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetRole {
    /// The result photo drawn at the top of the card.
    Source,
    /// The branding logo drawn in the footer.
    Logo,
}

impl std::fmt::Display for AssetRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Source => f.write_str("source image"),
            Self::Logo => f.write_str("footer logo"),
        }
    }
}

/// Top-level error taxonomy used by quiz, matching and compositor APIs.
#[derive(thiserror::Error, Debug)]
pub enum NyangError {
    /// Malformed catalog data or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// The requested question has not been resolved yet; show a loading state.
    #[error("not ready: question {0} is not loaded")]
    NotReady(u32),

    /// A route referenced a question that does not exist; redirect to the entry screen.
    #[error("invalid question id: {0}")]
    InvalidQuestionId(u32),

    /// A compositor input could not be read or decoded. Aborts only the compose pipeline.
    #[error("asset load failure: {role} '{reference}': {source}")]
    AssetLoad {
        /// Which pipeline input failed.
        role: AssetRole,
        /// Asset reference as written in the catalog or branding.
        reference: String,
        /// Underlying read/decode error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Drawing or encoding the composed image failed.
    #[error("render error: {0}")]
    Render(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl NyangError {
    /// Build a [`NyangError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`NyangError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`NyangError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Build a [`NyangError::AssetLoad`] value.
    pub fn asset_load(
        role: AssetRole,
        reference: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::AssetLoad {
            role,
            reference: reference.into(),
            source: source.into(),
        }
    }

    /// Return `true` for failures the shell must show to the user as a blocking alert.
    pub fn is_user_visible(&self) -> bool {
        matches!(self, Self::AssetLoad { .. } | Self::Render(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
