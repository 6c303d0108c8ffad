//! The two error channels of spec §7: language-level `throw`able values and
//! host/catastrophic failures that halt execution instead of propagating as
//! a script-visible exception.

use std::fmt;

use crate::value::JsValue;

/// The eight ECMAScript error kinds exposed by the runtime (§7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Error,
    TypeError,
    RangeError,
    ReferenceError,
    SyntaxError,
    UriError,
    EvalError,
    AggregateError,
}

impl ErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Error => "Error",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::RangeError => "RangeError",
            ErrorKind::ReferenceError => "ReferenceError",
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::UriError => "URIError",
            ErrorKind::EvalError => "EvalError",
            ErrorKind::AggregateError => "AggregateError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl ratjs_gc::Finalize for ErrorKind {}
unsafe impl ratjs_gc::Trace for ErrorKind {
    ratjs_gc::empty_trace!();
}

/// Leaf error describing a programmer-error precondition violation caught
/// by a diagnostic assert on the object protocol (§7: "the core should
/// provide diagnostic asserts on the object protocol's preconditions").
#[derive(Debug, thiserror::Error)]
pub enum InvariantError {
    #[error("receiver is not an object")]
    ReceiverNotObject,
    #[error("proxy has been revoked")]
    RevokedProxy,
    #[error("corrupt bytecode: {0}")]
    CorruptBytecode(&'static str),
}

/// The two-channel error type every fallible execution-core operation
/// returns (§7).
///
/// `Throw` carries an ECMAScript value flowing through the pending-error
/// channel — what a bytecode `catch` frame clears and copies. `Fatal`
/// carries a host/catastrophic failure (allocation failure, invariant
/// breach, corrupt bytecode): these are reported via the host log channel
/// and are not supposed to be caught by script-level `catch`.
#[derive(Debug, Clone)]
pub enum JsError {
    Throw(JsValue),
    Fatal(String),
}

impl JsError {
    pub fn fatal(invariant: InvariantError) -> Self {
        tracing::error!(error = %invariant, "host/catastrophic failure");
        JsError::Fatal(invariant.to_string())
    }

    pub fn as_value(&self) -> Option<&JsValue> {
        match self {
            JsError::Throw(value) => Some(value),
            JsError::Fatal(_) => None,
        }
    }
}

impl fmt::Display for JsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsError::Throw(value) => write!(f, "uncaught exception: {value:?}"),
            JsError::Fatal(message) => write!(f, "fatal: {message}"),
        }
    }
}

impl std::error::Error for JsError {}

pub type JsResult<T> = Result<T, JsError>;
