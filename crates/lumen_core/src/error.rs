//! Observable errors
//!
//! Every variant carries a stable machine-readable code (see
//! [`ObservableError::code`]) and maps onto a coarse [`ErrorKind`].

use thiserror::Error;

/// Coarse classification of binding-layer failures
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    AttributeCollision,
    Binding,
    BindingLength,
    MissingAttribute,
    Chain,
    CallbackType,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObservableError {
    #[error("cannot override member `{name}` with an attribute")]
    AttributeCollision { name: String },

    #[error("invalid attribute names passed to bind()")]
    InvalidBindNames,

    #[error("attribute `{name}` listed more than once in bind()")]
    DuplicateBindNames { name: String },

    #[error("attribute `{name}` is already bound")]
    Rebind { name: String },

    #[error("invalid attribute names passed to to()")]
    InvalidToNames,

    #[error("{bound} bound attribute(s) cannot be bound to {sources} source attribute(s)")]
    BindingLength { bound: usize, sources: usize },

    #[error("source has no attribute `{name}`")]
    MissingAttribute { name: String },

    #[error("cannot bind multiple attributes to more than one source")]
    Chain,

    #[error("as() expects a callback")]
    CallbackType,

    #[error("invalid attribute names passed to unbind()")]
    InvalidUnbindNames,
}

impl ObservableError {
    /// Stable diagnostic code
    pub fn code(&self) -> &'static str {
        match self {
            Self::AttributeCollision { .. } => "observable-set-cannot-override",
            Self::InvalidBindNames => "observable-bind-wrong-attrs",
            Self::DuplicateBindNames { .. } => "observable-bind-duplicate-attrs",
            Self::Rebind { .. } => "observable-bind-rebind",
            Self::InvalidToNames => "observable-bind-to-wrong-attrs",
            Self::BindingLength { .. } => "observable-bind-to-attrs-length",
            Self::MissingAttribute { .. } => "observable-bind-to-missing-attr",
            Self::Chain => "observable-bind-to-chain-multiple-attrs",
            Self::CallbackType => "observable-bind-as-wrong-callback",
            Self::InvalidUnbindNames => "observable-unbind-wrong-attrs",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AttributeCollision { .. } => ErrorKind::AttributeCollision,
            Self::InvalidBindNames
            | Self::DuplicateBindNames { .. }
            | Self::Rebind { .. }
            | Self::InvalidToNames
            | Self::InvalidUnbindNames => ErrorKind::Binding,
            Self::BindingLength { .. } => ErrorKind::BindingLength,
            Self::MissingAttribute { .. } => ErrorKind::MissingAttribute,
            Self::Chain => ErrorKind::Chain,
            Self::CallbackType => ErrorKind::CallbackType,
        }
    }
}

pub type Result<T> = std::result::Result<T, ObservableError>;
