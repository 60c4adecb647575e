use thiserror::Error;

/// Failures raised while decoding a single class file.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ReadError {
    /// A structural precondition of the class-file layout does not hold.
    #[error("malformed class file at offset {offset}: {reason}")]
    MalformedContainer { offset: usize, reason: String },
    /// A constant pool index is out of range or names an entry of the wrong kind.
    #[error("broken constant pool reference #{index}: expected {expected}")]
    BrokenReference { index: u16, expected: &'static str },
}

impl ReadError {
    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        ReadError::MalformedContainer {
            offset,
            reason: reason.into(),
        }
    }

    pub(crate) fn broken(index: u16, expected: &'static str) -> Self {
        ReadError::BrokenReference { index, expected }
    }
}

pub type ReadResult<T> = Result<T, ReadError>;

/// Failures reported by a [`ClassLocator`](crate::decoder::ClassLocator).
#[derive(Clone, Debug, Error)]
pub enum LocateError {
    #[error("class {0} not found")]
    NotFound(String),
    #[error(transparent)]
    Read(#[from] ReadError),
}

/// An operation was invoked on an expression variant that cannot support it.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{operation} is not applicable to {node}")]
pub struct UnsupportedOperation {
    pub operation: &'static str,
    pub node: &'static str,
}

/// One member whose analysis failed.
#[derive(Debug)]
pub struct MemberFailure {
    pub class_name: String,
    pub method_name: String,
    pub descriptor: String,
    pub error: anyhow::Error,
}

/// Aggregate failure of a whole-class analysis.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("failed to analyse {class_name}: {} member(s) failed", failures.len())]
    MembersFailed {
        class_name: String,
        failures: Vec<MemberFailure>,
    },
}
