use std::ops::Range;

use ratjs_interner::Sym;

bitflags::bitflags! {
    /// Flags describing a compiled function (§6.1's `function records`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct FunctionFlags: u16 {
        const STRICT = 0b0000_0001;
        const GENERATOR = 0b0000_0010;
        const ASYNC = 0b0000_0100;
        const ARROW = 0b0000_1000;
        const DERIVED_CONSTRUCTOR = 0b0001_0000;
        const CLASS_CONSTRUCTOR = 0b0010_0000;
    }
}

/// Index into a [`crate::Script`]'s binding-declaration tables, identifying
/// the group of local declarations scoped to one function body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclarationsRef {
    pub lexical: Range<u32>,
    pub var: Range<u32>,
}

/// One entry of the script's function table: everything the runtime needs
/// to construct a callable from this script without re-deriving it from the
/// bytecode (name/arity/flags for `.length`/`.name` and `[[IsClassConstructor]]`
/// checks, the declarations range for environment setup, and the bytecode
/// span to dispatch to when called).
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionRecord {
    pub name: Sym,
    pub flags: FunctionFlags,
    pub param_count: u32,
    pub declarations: DeclarationsRef,
    pub bytecode_range: Range<u32>,
}

impl FunctionRecord {
    pub fn is_strict(&self) -> bool {
        self.flags.contains(FunctionFlags::STRICT)
    }

    pub fn is_constructor(&self) -> bool {
        self.flags.contains(FunctionFlags::CLASS_CONSTRUCTOR)
            || self.flags.contains(FunctionFlags::DERIVED_CONSTRUCTOR)
    }

    pub fn is_arrow(&self) -> bool {
        self.flags.contains(FunctionFlags::ARROW)
    }
}
