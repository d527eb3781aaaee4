//! View layer errors

use lumen_core::{ErrorKind, ObservableError};
use thiserror::Error;

use crate::dom::{DomError, MarkupError, SelectorError};

/// Operation a region or child lookup failed in
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegionOp {
    Register,
    AddChild,
    RemoveChild,
    GetChild,
}

impl RegionOp {
    fn as_str(self) -> &'static str {
        match self {
            RegionOp::Register => "register",
            RegionOp::AddChild => "addchild",
            RegionOp::RemoveChild => "removechild",
            RegionOp::GetChild => "getchild",
        }
    }
}

/// Coarse classification of view failures
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewErrorKind {
    Observable(ErrorKind),
    RegionOverride,
    RegionLookup,
    ChildLookup,
    Template,
    Dom,
}

#[derive(Debug, Error)]
pub enum ViewError {
    #[error(transparent)]
    Observable(#[from] ObservableError),

    #[error(transparent)]
    Dom(#[from] DomError),

    #[error(transparent)]
    Markup(#[from] MarkupError),

    #[error("invalid event selector: {0}")]
    EventSelector(#[source] SelectorError),

    #[error("view has no template")]
    NoTemplate,

    #[error("view template cannot change after render")]
    AlreadyRendered,

    #[error("view has been destroyed")]
    Destroyed,

    #[error("region `{name}` already exists")]
    RegionOverride { name: String },

    #[error("invalid region selector: {0}")]
    BadSelector(#[source] SelectorError),

    #[error("{}: region name must not be empty", .op.as_str())]
    BadRegionName { op: RegionOp },

    #[error("{}: no region named `{name}`", .op.as_str())]
    NoRegion { op: RegionOp, name: String },

    #[error("child index {index} out of bounds (len {len})")]
    ChildIndex { index: usize, len: usize },

    #[error("view is already a child of region `{region}`")]
    DuplicateChild { region: String },

    #[error("view is not a child of region `{region}`")]
    ChildNotFound { region: String },

    #[error("view is already in the collection")]
    DuplicateItem,

    #[error("collection index {index} out of bounds (len {len})")]
    ItemIndex { index: usize, len: usize },
}

impl ViewError {
    /// Stable diagnostic code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Observable(err) => err.code(),
            Self::Dom(_) => "ui-dom-error",
            Self::Markup(_) => "ui-markup-error",
            Self::EventSelector(_) => "ui-template-badselector",
            Self::NoTemplate => "ui-view-notemplate",
            Self::AlreadyRendered => "ui-view-template-locked",
            Self::Destroyed => "ui-view-destroyed",
            Self::RegionOverride { .. } => "ui-view-register-override",
            Self::BadSelector(_) => "ui-view-register-badselector",
            Self::BadRegionName { op } => match op {
                RegionOp::Register => "ui-view-register-badrname",
                RegionOp::AddChild => "ui-view-addchild-badrname",
                RegionOp::RemoveChild => "ui-view-removechild-badrname",
                RegionOp::GetChild => "ui-view-getchild-badrname",
            },
            Self::NoRegion { op, .. } => match op {
                RegionOp::Register => "ui-view-register-noreg",
                RegionOp::AddChild => "ui-view-addchild-noreg",
                RegionOp::RemoveChild => "ui-view-removechild-noreg",
                RegionOp::GetChild => "ui-view-getchild-noreg",
            },
            Self::ChildIndex { .. } => "ui-view-addchild-badindex",
            Self::DuplicateChild { .. } => "ui-view-addchild-duplicate",
            Self::ChildNotFound { .. } => "ui-view-removechild-no-view",
            Self::DuplicateItem => "ui-collection-add-item-exists",
            Self::ItemIndex { .. } => "ui-collection-add-item-bad-index",
        }
    }

    pub fn kind(&self) -> ViewErrorKind {
        match self {
            Self::Observable(err) => ViewErrorKind::Observable(err.kind()),
            Self::RegionOverride { .. } => ViewErrorKind::RegionOverride,
            Self::BadSelector(_) | Self::BadRegionName { .. } | Self::NoRegion { .. } => {
                ViewErrorKind::RegionLookup
            }
            Self::ChildIndex { .. }
            | Self::DuplicateChild { .. }
            | Self::ChildNotFound { .. }
            | Self::DuplicateItem
            | Self::ItemIndex { .. } => ViewErrorKind::ChildLookup,
            Self::EventSelector(_) | Self::NoTemplate | Self::AlreadyRendered | Self::Destroyed => {
                ViewErrorKind::Template
            }
            Self::Dom(_) | Self::Markup(_) => ViewErrorKind::Dom,
        }
    }
}

pub type Result<T> = std::result::Result<T, ViewError>;
