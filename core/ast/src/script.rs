use ratjs_interner::{Interner, Sym};

use crate::binding::{BindingDeclaration, BindingReference};
use crate::constant::Constant;
use crate::function::FunctionRecord;
use crate::line_table::LineTable;
use crate::module::ModuleRecord;

/// The artifact an external lexer/parser/bytecode-compiler hands to the
/// execution core (§6.1): everything needed to instantiate a callable
/// top-level script or module without the compiler being present at run
/// time. The core never parses source text itself; it only interprets
/// this record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    pub interner: Interner,
    pub constants: Vec<Constant>,
    pub lexical_declarations: Vec<BindingDeclaration>,
    pub var_declarations: Vec<BindingDeclaration>,
    pub binding_references: Vec<BindingReference>,
    pub functions: Vec<FunctionRecord>,
    pub bytecode: Vec<u8>,
    pub line_table: LineTable,
    /// `Some` when this script was compiled as a module rather than a
    /// classic script.
    pub module: Option<ModuleRecord>,
}

impl Script {
    pub fn new() -> Self {
        Self {
            interner: Interner::new(),
            ..Default::default()
        }
    }

    pub fn is_module(&self) -> bool {
        self.module.is_some()
    }

    pub fn is_strict(&self) -> bool {
        self.functions
            .first()
            .map(FunctionRecord::is_strict)
            .unwrap_or(false)
    }

    /// Resolves an interned name used anywhere in this script's tables.
    pub fn resolve(&self, sym: Sym) -> &str {
        self.interner.resolve(sym)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::BindingFlags;
    use crate::function::{DeclarationsRef, FunctionFlags};

    #[test]
    fn a_script_resolves_names_through_its_own_interner() {
        let mut script = Script::new();
        let name = script.interner.get_or_intern("greeting");
        script
            .var_declarations
            .push(BindingDeclaration::new(name, BindingFlags::VAR));

        assert_eq!(script.resolve(name), "greeting");
        assert!(!script.is_module());
    }

    #[test]
    fn is_strict_reflects_the_top_level_function_record() {
        let mut script = Script::new();
        let name = script.interner.get_or_intern("");
        script.functions.push(FunctionRecord {
            name,
            flags: FunctionFlags::STRICT,
            param_count: 0,
            declarations: DeclarationsRef { lexical: 0..0, var: 0..0 },
            bytecode_range: 0..0,
        });
        assert!(script.is_strict());
    }
}
