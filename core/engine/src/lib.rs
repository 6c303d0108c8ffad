//! The RatJavaScript execution core: the tagged value representation, the
//! GC-managed object system and its ten internal operations, the
//! lexical-environment hierarchy, the promise/microtask machinery, and the
//! runtime handle that ties them together. Lexing, parsing, bytecode
//! compilation, and the opcode dispatch loop itself are external
//! collaborators this crate only holds state for.

pub mod array_buffer;
pub mod context;
pub mod environment;
pub mod error;
pub mod job;
pub mod object;
pub mod promise;
pub mod property;
pub mod realm;
pub mod runtime;
pub mod value;
pub mod value_stack;

pub use context::{Context, Frame};
pub use error::{ErrorKind, JsError, JsResult};
pub use object::JsObject;
pub use realm::Realm;
pub use runtime::{Runtime, RuntimeOptions};
pub use value::{JsString, JsSymbol, JsValue, PropertyKey};
