use ratjs_interner::Sym;

/// One `import` binding of a module record (§6.1).
///
/// `import_name` is `None` for a default import's local binding name
/// already covering the default slot; it is present for named and
/// namespace (`import * as ns`) imports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportEntry {
    pub request: Sym,
    pub local_name: Sym,
    pub import_name: Option<Sym>,
}

/// One `export` binding of a module record (§6.1). A re-export (`export {
/// x } from "m"`) carries both a `request` and an `import_name`; a local
/// export carries neither.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportEntry {
    pub local_name: Option<Sym>,
    pub import_name: Option<Sym>,
    pub export_name: Option<Sym>,
    pub request: Option<Sym>,
}

/// Module-specific metadata attached to a [`crate::Script`] compiled as a
/// module instead of a classic script.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModuleRecord {
    pub requested_modules: Vec<Sym>,
    pub imports: Vec<ImportEntry>,
    pub exports: Vec<ExportEntry>,
}

impl ModuleRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Export entries that re-export from another module rather than
    /// binding a local name — the ones a module namespace's star-export
    /// resolution (§4.x) must chase into the requested module.
    pub fn star_and_indirect_exports(&self) -> impl Iterator<Item = &ExportEntry> {
        self.exports.iter().filter(|e| e.request.is_some())
    }
}
