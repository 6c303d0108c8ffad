//! The Script/Module artifact consumed by the execution core.
//!
//! This crate models the boundary between an external lexer, parser, and
//! bytecode compiler and the runtime that executes their output: a
//! constant table, binding declaration and reference tables, function
//! records, a bytecode blob with its line table, and — for modules —
//! import/export entries. It intentionally does not model source-level
//! syntax (statements, expressions): lexing, parsing, and bytecode
//! generation live outside this crate entirely.

pub mod binding;
pub mod constant;
pub mod function;
pub mod line_table;
pub mod module;
pub mod script;

pub use binding::{BindingCache, BindingDeclaration, BindingFlags, BindingReference};
pub use constant::Constant;
pub use function::{DeclarationsRef, FunctionFlags, FunctionRecord};
pub use line_table::LineTable;
pub use module::{ExportEntry, ImportEntry, ModuleRecord};
pub use script::Script;

pub use ratjs_interner::{Interner, Sym};
