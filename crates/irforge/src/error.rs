use thiserror::Error;

use crate::diagnostics::{Diagnostic, Severity, Stage};
use crate::ir::DeclId;

pub const INTERNAL_ERROR_CODE: &str = "IRF-INTERNAL-0001";

pub type Result<T> = std::result::Result<T, ToolkitError>;

/// Errors raised by IR transformations.
///
/// Every variant is an internal invariant violation: the caller handed the
/// toolkit an IR shape it cannot work with. They abort the pass for the
/// current unit and are never user-facing diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolkitError {
    #[error("{id} is a {found}, expected a {expected}")]
    WrongDeclarationKind {
        id: DeclId,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{id} has no parent")]
    MissingParent { id: DeclId },

    #[error("{function} already has value parameters")]
    ParametersAlreadyPresent { function: DeclId },

    #[error("{owner} already has a receiver parameter")]
    ReceiverAlreadyPresent { owner: DeclId },

    #[error("{owner} already has type parameters")]
    TypeParametersAlreadyPresent { owner: DeclId },

    #[error("receiver type {found} of {function} is not a subtype of {expected}")]
    ReceiverTypeMismatch {
        function: DeclId,
        expected: String,
        found: String,
    },

    #[error("{container} has no type parameter at index {index}")]
    MissingTypeParameter { container: DeclId, index: usize },

    #[error("super type {ty} of {class} is not a class type")]
    UnsupportedSuperType { class: DeclId, ty: String },

    #[error("return target {target} is not a function")]
    UnknownReturnTarget { target: DeclId },
}

/// Which side broke the contract: the IR handed in, or the caller's request
/// (a slot already filled, a receiver override of the wrong type).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Internal,
    Precondition,
}

impl ToolkitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ToolkitError::ParametersAlreadyPresent { .. }
            | ToolkitError::ReceiverAlreadyPresent { .. }
            | ToolkitError::TypeParametersAlreadyPresent { .. }
            | ToolkitError::ReceiverTypeMismatch { .. } => ErrorKind::Precondition,
            _ => ErrorKind::Internal,
        }
    }

    pub fn wrong_kind(id: DeclId, expected: &'static str, found: &'static str) -> Self {
        ToolkitError::WrongDeclarationKind {
            id,
            expected,
            found,
        }
    }

    /// Surfaces the failure in the internal-error category of the report.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic {
            code: INTERNAL_ERROR_CODE.to_string(),
            severity: Severity::Error,
            stage: Stage::Lower,
            message: format!("internal compiler error: {self}"),
            loc: None,
            notes: Vec::new(),
            related: Vec::new(),
            data: Default::default(),
            quickfix: None,
        }
    }
}
