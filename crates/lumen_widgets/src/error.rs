//! Widget layer errors

use lumen_core::ObservableError;
use lumen_view::ViewError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WidgetError {
    #[error(transparent)]
    View(#[from] ViewError),

    #[error("no component registered under `{name}`")]
    UnknownComponent { name: String },

    #[error("component `{name}` is already registered")]
    DuplicateComponent { name: String },

    #[error("view is already in the balloon")]
    BalloonDuplicate,

    #[error("view is not in the balloon")]
    BalloonMissing,

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl WidgetError {
    /// Stable diagnostic code
    pub fn code(&self) -> &'static str {
        match self {
            Self::View(err) => err.code(),
            Self::UnknownComponent { .. } => "componentfactory-item-missing",
            Self::DuplicateComponent { .. } => "componentfactory-item-exists",
            Self::BalloonDuplicate => "contextualballoon-add-view-exist",
            Self::BalloonMissing => "contextualballoon-remove-view-not-exist",
            Self::Config(_) => "ui-config-invalid",
        }
    }
}

impl From<ObservableError> for WidgetError {
    fn from(err: ObservableError) -> Self {
        WidgetError::View(err.into())
    }
}

pub type Result<T> = std::result::Result<T, WidgetError>;
