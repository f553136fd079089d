use thiserror::Error;

use crate::runtime::IvarKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
    #[error("-[{class} {selector}]: unrecognized selector")]
    SelectorUnresolved { class: String, selector: String },

    #[error("{class} has no ivar named '{name}'")]
    IvarUnresolved { class: String, name: String },

    #[error("ivar '{name}' holds {found}, not {expected}")]
    IvarKindMismatch {
        name: String,
        expected: IvarKind,
        found: IvarKind,
    },

    #[error("class {0} is already registered")]
    DuplicateClass(String),

    #[error("class {class} declares ivar '{name}' twice")]
    DuplicateIvar { class: String, name: String },

    #[error("class {0} belongs to a different runtime")]
    ForeignClass(String),
}

pub type Result<T> = std::result::Result<T, HookError>;
