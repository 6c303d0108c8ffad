//! Environment records (§3.5, §4.2): the lexical-scope chain bindings
//! resolve through.
//!
//! Mirrors the object model's "enum of kinds behind one set of methods"
//! shape rather than `boa`'s `EnvironmentRecordTrait` object (grounded on
//! `boa/src/environment/*`): a `dyn EnvironmentRecordTrait` would need to be
//! `Gc`-managed and `Trace`, and trait objects can't carry a `#[derive(Trace)]`
//! impl for whatever concrete type fills them in. [`Environment`] is an
//! ordinary enum instead, matching [`crate::object::JsObject`]'s dispatch
//! pattern.

use ratjs_ast::BindingReference;
use ratjs_gc::{Gc, GcCell};
use ratjs_macros::{Finalize, Trace};

use crate::context::Context;
use crate::error::{ErrorKind, JsError, JsResult};
use crate::object::JsObject;
use crate::value::{JsString, JsValue};

/// One declarative binding: immutable/mutable, strict, deletable, and
/// either an ordinary value slot or (for module environments) an indirect
/// reference to another module's export.
#[derive(Debug, Clone, Trace, Finalize)]
pub struct Binding {
    value: Option<JsValue>,
    mutable: bool,
    strict: bool,
    deletable: bool,
    import: Option<ImportBinding>,
}

#[derive(Debug, Clone, Trace, Finalize)]
struct ImportBinding {
    module: Environment,
    export_name: JsString,
}

impl Binding {
    fn mutable(deletable: bool) -> Self {
        Binding {
            value: None,
            mutable: true,
            strict: false,
            deletable,
            import: None,
        }
    }

    fn immutable(strict: bool) -> Self {
        Binding {
            value: None,
            mutable: false,
            strict,
            deletable: false,
            import: None,
        }
    }

    fn is_initialized(&self) -> bool {
        self.value.is_some() || self.import.is_some()
    }
}

/// The ordered name→binding table shared by declarative, function, and
/// module environments. Insertion order is load-bearing: it's the index
/// space the binding cache's `(hops, index)` pair addresses (§4.2).
#[derive(Debug, Default, Trace, Finalize)]
pub struct BindingTable(indexmap::IndexMap<JsString, Binding>);

impl BindingTable {
    fn position(&self, name: &JsString) -> Option<usize> {
        self.0.get_index_of(name)
    }

    fn at(&self, index: usize) -> Option<(&JsString, &Binding)> {
        self.0.get_index(index)
    }

    fn at_mut(&mut self, index: usize) -> Option<&mut Binding> {
        self.0.get_index_mut(index).map(|(_, b)| b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThisState {
    Lexical,
    Uninitialized,
    Initialized,
}

#[derive(Debug, Trace, Finalize)]
pub struct DeclarativeData {
    bindings: BindingTable,
    outer: Option<Environment>,
}

#[derive(Debug, Trace, Finalize)]
pub struct FunctionData {
    declarative: DeclarativeData,
    this_state: ThisState,
    this_value: Option<JsValue>,
    has_super: bool,
    function_object: JsObject,
}

#[derive(Debug, Trace, Finalize)]
pub struct ObjectEnvData {
    outer: Option<Environment>,
    binding_object: JsObject,
    with_environment: bool,
}

#[derive(Debug, Trace, Finalize)]
pub struct GlobalData {
    declarative: DeclarativeData,
    object_record: ObjectEnvData,
    var_names: Vec<JsString>,
}

#[derive(Debug, Trace, Finalize)]
pub enum EnvironmentData {
    Declarative(DeclarativeData),
    Function(FunctionData),
    Object(ObjectEnvData),
    Module(DeclarativeData),
    Global(GlobalData),
}

/// A GC-managed environment record. Cheap to clone, like [`JsObject`].
#[derive(Debug, Clone, Trace, Finalize)]
pub struct Environment(Gc<GcCell<EnvironmentData>>);

impl PartialEq for Environment {
    fn eq(&self, other: &Self) -> bool {
        Gc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for Environment {}

/// Where [`Environment::resolve`] found a name: an indexable declarative
/// table slot, or an Object Environment Record's wrapped object (resolved
/// dynamically, never index-cached).
enum ResolvedBinding {
    Declarative(Environment, usize),
    Object(Environment),
}

fn type_error(ctx: &mut Context, message: &str) -> JsError {
    ctx.throw(ErrorKind::TypeError, message)
}
fn reference_error(ctx: &mut Context, message: &str) -> JsError {
    ctx.throw(ErrorKind::ReferenceError, message)
}

impl Environment {
    fn new(data: EnvironmentData) -> Self {
        Environment(Gc::new(GcCell::new(data)))
    }

    pub fn new_declarative(outer: Option<Environment>) -> Self {
        Environment::new(EnvironmentData::Declarative(DeclarativeData {
            bindings: BindingTable::default(),
            outer,
        }))
    }

    pub fn new_function(outer: Option<Environment>, function_object: JsObject, this_state: ThisState) -> Self {
        Environment::new(EnvironmentData::Function(FunctionData {
            declarative: DeclarativeData {
                bindings: BindingTable::default(),
                outer,
            },
            this_state,
            this_value: None,
            has_super: false,
            function_object,
        }))
    }

    pub fn new_object(outer: Option<Environment>, binding_object: JsObject, with_environment: bool) -> Self {
        Environment::new(EnvironmentData::Object(ObjectEnvData {
            outer,
            binding_object,
            with_environment,
        }))
    }

    pub fn new_module(outer: Option<Environment>) -> Self {
        Environment::new(EnvironmentData::Module(DeclarativeData {
            bindings: BindingTable::default(),
            outer,
        }))
    }

    pub fn new_global(global_object: JsObject) -> Self {
        Environment::new(EnvironmentData::Global(GlobalData {
            declarative: DeclarativeData {
                bindings: BindingTable::default(),
                outer: None,
            },
            object_record: ObjectEnvData {
                outer: None,
                binding_object: global_object,
                with_environment: false,
            },
            var_names: Vec::new(),
        }))
    }

    pub fn outer(&self) -> Option<Environment> {
        match &*self.0.borrow() {
            EnvironmentData::Declarative(d) | EnvironmentData::Module(d) => d.outer.clone(),
            EnvironmentData::Function(f) => f.declarative.outer.clone(),
            EnvironmentData::Object(o) => o.outer.clone(),
            EnvironmentData::Global(_) => None,
        }
    }

    fn with_bindings<R>(&self, f: impl FnOnce(&BindingTable) -> R) -> Option<R> {
        let data = self.0.borrow();
        let table = match &*data {
            EnvironmentData::Declarative(d) | EnvironmentData::Module(d) => &d.bindings,
            EnvironmentData::Function(fd) => &fd.declarative.bindings,
            EnvironmentData::Global(g) => &g.declarative.bindings,
            EnvironmentData::Object(_) => return None,
        };
        Some(f(table))
    }

    fn with_bindings_mut<R>(&self, f: impl FnOnce(&mut BindingTable) -> R) -> Option<R> {
        let mut data = self.0.borrow_mut();
        let table = match &mut *data {
            EnvironmentData::Declarative(d) | EnvironmentData::Module(d) => &mut d.bindings,
            EnvironmentData::Function(fd) => &mut fd.declarative.bindings,
            EnvironmentData::Global(g) => &mut g.declarative.bindings,
            EnvironmentData::Object(_) => return None,
        };
        Some(f(table))
    }

    pub fn has_binding(&self, name: &JsString, ctx: &mut Context) -> JsResult<bool> {
        if let EnvironmentData::Object(o) = &*self.0.borrow() {
            let object = o.binding_object.clone();
            return object.has_property(&name.clone().into(), ctx);
        }
        Ok(self.with_bindings(|b| b.position(name).is_some()).unwrap_or(false))
    }

    pub fn create_mutable_binding(&self, name: JsString, deletable: bool, ctx: &mut Context) -> JsResult<()> {
        if let EnvironmentData::Object(o) = &*self.0.borrow() {
            let object = o.binding_object.clone();
            let desc = crate::property::PropertyDescriptor::data(JsValue::undefined(), true, true, deletable);
            object.define_own_property(&name.into(), desc, ctx)?;
            return Ok(());
        }
        self.with_bindings_mut(|b| {
            b.0.insert(name, Binding::mutable(deletable));
        });
        Ok(())
    }

    pub fn create_immutable_binding(&self, name: JsString, strict: bool) -> JsResult<()> {
        self.with_bindings_mut(|b| {
            b.0.insert(name, Binding::immutable(strict));
        });
        Ok(())
    }

    pub fn initialize_binding(&self, name: &JsString, value: JsValue, ctx: &mut Context) -> JsResult<()> {
        if let EnvironmentData::Object(_) = &*self.0.borrow() {
            return self.set_mutable_binding(name, value, false, ctx);
        }
        self.with_bindings_mut(|b| {
            if let Some(index) = b.position(name) {
                if let Some(binding) = b.at_mut(index) {
                    binding.value = Some(value);
                }
            }
        });
        Ok(())
    }

    pub fn set_mutable_binding(&self, name: &JsString, value: JsValue, strict: bool, ctx: &mut Context) -> JsResult<()> {
        if let EnvironmentData::Object(o) = &*self.0.borrow() {
            let object = o.binding_object.clone();
            let key = name.clone().into();
            let has = object.has_property(&key, ctx)?;
            if !has && strict {
                return Err(reference_error(ctx, &format!("{name} is not defined")));
            }
            let receiver = JsValue::Object(object.clone());
            object.set(&key, value, &receiver, ctx)?;
            return Ok(());
        }

        enum Outcome {
            Assigned,
            NotFound,
            Uninitialized,
            Immutable,
        }

        let outcome = self
            .with_bindings_mut(|b| {
                let Some(index) = b.position(name) else {
                    return Outcome::NotFound;
                };
                let binding = b.at_mut(index).unwrap();
                if !binding.is_initialized() {
                    return Outcome::Uninitialized;
                }
                if !binding.mutable {
                    return Outcome::Immutable;
                }
                binding.value = Some(value.clone());
                Outcome::Assigned
            })
            .unwrap_or(Outcome::NotFound);

        match outcome {
            Outcome::Assigned => Ok(()),
            Outcome::Immutable => Err(type_error(ctx, &format!("Assignment to constant variable '{name}'"))),
            Outcome::Uninitialized => Err(reference_error(ctx, &format!("cannot access '{name}' before initialization"))),
            Outcome::NotFound if strict => Err(reference_error(ctx, &format!("{name} is not defined"))),
            Outcome::NotFound => {
                self.create_mutable_binding(name.clone(), true, ctx)?;
                self.initialize_binding(name, value, ctx)
            }
        }
    }

    /// `strict` only matters for an Object Environment Record with no
    /// matching property: a strict reference throws, a non-strict one
    /// resolves to `undefined` (§4.2; `boa/src/environment/
    /// object_environment_record.rs:94-105`'s `} else if strict { throw } else
    /// { Ok(undefined) }`). Every other uninitialized/missing case throws
    /// `ReferenceError` regardless of `strict`.
    pub fn get_binding_value(&self, name: &JsString, strict: bool, ctx: &mut Context) -> JsResult<JsValue> {
        if let EnvironmentData::Object(o) = &*self.0.borrow() {
            let object = o.binding_object.clone();
            let key = name.clone().into();
            if !object.has_property(&key, ctx)? {
                return if strict {
                    Err(reference_error(ctx, &format!("{name} is not defined")))
                } else {
                    Ok(JsValue::undefined())
                };
            }
            let receiver = JsValue::Object(object.clone());
            return object.get(&key, &receiver, ctx);
        }

        enum Found {
            Import(ImportBinding),
            Value(JsValue),
            Uninitialized,
        }

        let found = self.with_bindings(|b| {
            let (_, binding) = b.position(name).and_then(|i| b.at(i))?;
            Some(match (&binding.import, &binding.value) {
                (Some(import), _) => Found::Import(import.clone()),
                (None, Some(value)) => Found::Value(value.clone()),
                (None, None) => Found::Uninitialized,
            })
        });

        match found {
            Some(Some(Found::Import(import))) => import.module.get_binding_value(&import.export_name, strict, ctx),
            Some(Some(Found::Value(v))) => Ok(v),
            Some(Some(Found::Uninitialized)) => Err(reference_error(ctx, &format!("cannot access '{name}' before initialization"))),
            _ => Err(reference_error(ctx, &format!("{name} is not defined"))),
        }
    }

    // ---- binding-cache-aware resolution (§4.2, §9 "binding cache") ----
    //
    // `get_binding_value`/`set_mutable_binding`/`has_binding` above each act
    // on a single environment record, matching the spec's per-record
    // abstract operations; walking the outer chain to find which record
    // owns a name is `ResolveBinding`'s job, done by whatever calls these
    // (ultimately the bytecode interpreter). The `_by_reference` methods
    // below fold that walk and the per-name-hash `HasBinding` probe at each
    // level into one call, consulting and repopulating the compiled
    // reference's `BindingCache` slot so a call site that resolves the same
    // name from the same lexical position twice only walks the chain once.

    fn at_depth(&self, hops: u16) -> Option<Environment> {
        let mut env = self.clone();
        for _ in 0..hops {
            env = env.outer()?;
        }
        Some(env)
    }

    /// Walks outward from `self` toward the environment that owns `name`.
    /// A hit in a declarative/function/global/module environment's binding
    /// table is index-addressable and gets cached; a hit in an Object
    /// Environment Record's wrapped object is resolved through
    /// `has_property` every time (the object can gain or lose the property
    /// between calls) and is never cached.
    fn resolve(&self, reference: &BindingReference, name: &JsString, ctx: &mut Context) -> JsResult<Option<ResolvedBinding>> {
        if let Some((hops, index)) = reference.cache.get() {
            if let Some(env) = self.at_depth(hops) {
                let still_matches = env
                    .with_bindings(|b| b.at(index as usize).map(|(n, _)| n == name))
                    .flatten()
                    .unwrap_or(false);
                if still_matches {
                    return Ok(Some(ResolvedBinding::Declarative(env, index as usize)));
                }
            }
            reference.cache.invalidate();
        }

        let mut env = self.clone();
        let mut hops: u16 = 0;
        loop {
            let object = match &*env.0.borrow() {
                EnvironmentData::Object(o) => Some(o.binding_object.clone()),
                _ => None,
            };
            if let Some(object) = object {
                if object.has_property(&name.clone().into(), ctx)? {
                    return Ok(Some(ResolvedBinding::Object(env)));
                }
            } else if let Some(index) = env.with_bindings(|b| b.position(name)).flatten() {
                reference.cache.set(hops, index as u16);
                return Ok(Some(ResolvedBinding::Declarative(env, index)));
            }
            match env.outer() {
                Some(next) => {
                    env = next;
                    hops = hops.saturating_add(1);
                }
                None => return Ok(None),
            }
        }
    }

    fn declarative_value_at(&self, index: usize, name: &JsString, strict: bool, ctx: &mut Context) -> JsResult<JsValue> {
        enum Found {
            Import(ImportBinding),
            Value(JsValue),
            Uninitialized,
        }
        let found = self.with_bindings(|b| {
            let (_, binding) = b.at(index)?;
            Some(match (&binding.import, &binding.value) {
                (Some(import), _) => Found::Import(import.clone()),
                (None, Some(value)) => Found::Value(value.clone()),
                (None, None) => Found::Uninitialized,
            })
        });
        match found {
            Some(Some(Found::Import(import))) => import.module.get_binding_value(&import.export_name, strict, ctx),
            Some(Some(Found::Value(v))) => Ok(v),
            Some(Some(Found::Uninitialized)) => Err(reference_error(ctx, &format!("cannot access '{name}' before initialization"))),
            _ => Err(reference_error(ctx, &format!("{name} is not defined"))),
        }
    }

    fn set_declarative_at(&self, index: usize, name: &JsString, value: JsValue, ctx: &mut Context) -> JsResult<()> {
        enum Outcome {
            Assigned,
            Uninitialized,
            Immutable,
        }
        let outcome = self
            .with_bindings_mut(|b| {
                let Some(binding) = b.at_mut(index) else {
                    return Outcome::Uninitialized;
                };
                if !binding.is_initialized() {
                    return Outcome::Uninitialized;
                }
                if !binding.mutable {
                    return Outcome::Immutable;
                }
                binding.value = Some(value.clone());
                Outcome::Assigned
            })
            .unwrap_or(Outcome::Uninitialized);
        match outcome {
            Outcome::Assigned => Ok(()),
            Outcome::Immutable => Err(type_error(ctx, &format!("Assignment to constant variable '{name}'"))),
            Outcome::Uninitialized => Err(reference_error(ctx, &format!("cannot access '{name}' before initialization"))),
        }
    }

    /// `GetBindingValue` folded with `ResolveBinding`'s chain walk (§4.2),
    /// fast-pathed through `reference`'s cache.
    pub fn get_binding_value_by_reference(&self, reference: &BindingReference, name: &JsString, strict: bool, ctx: &mut Context) -> JsResult<JsValue> {
        match self.resolve(reference, name, ctx)? {
            Some(ResolvedBinding::Declarative(env, index)) => env.declarative_value_at(index, name, strict, ctx),
            Some(ResolvedBinding::Object(env)) => env.get_binding_value(name, strict, ctx),
            None => Err(reference_error(ctx, &format!("{name} is not defined"))),
        }
    }

    /// `SetMutableBinding` folded with `ResolveBinding`'s chain walk (§4.2),
    /// fast-pathed through `reference`'s cache. A name missing from the
    /// entire chain creates an implicit global, matching this module's
    /// plain `set_mutable_binding`'s `NotFound` case.
    pub fn set_mutable_binding_by_reference(&self, reference: &BindingReference, name: &JsString, value: JsValue, strict: bool, ctx: &mut Context) -> JsResult<()> {
        match self.resolve(reference, name, ctx)? {
            Some(ResolvedBinding::Declarative(env, index)) => env.set_declarative_at(index, name, value, ctx),
            Some(ResolvedBinding::Object(env)) => env.set_mutable_binding(name, value, strict, ctx),
            None if strict => Err(reference_error(ctx, &format!("{name} is not defined"))),
            None => {
                let mut env = self.clone();
                while let Some(next) = env.outer() {
                    env = next;
                }
                env.create_mutable_binding(name.clone(), true, ctx)?;
                env.initialize_binding(name, value, ctx)
            }
        }
    }

    /// `HasBinding` folded with `ResolveBinding`'s chain walk (§4.2).
    pub fn has_binding_by_reference(&self, reference: &BindingReference, name: &JsString, ctx: &mut Context) -> JsResult<bool> {
        Ok(self.resolve(reference, name, ctx)?.is_some())
    }

    pub fn delete_binding(&self, name: &JsString, ctx: &mut Context) -> JsResult<bool> {
        if let EnvironmentData::Object(o) = &*self.0.borrow() {
            let object = o.binding_object.clone();
            return object.delete(&name.clone().into(), ctx);
        }
        Ok(self
            .with_bindings_mut(|b| {
                let Some(index) = b.position(name) else {
                    return true;
                };
                if b.at(index).unwrap().1.deletable {
                    b.0.shift_remove(name);
                    true
                } else {
                    false
                }
            })
            .unwrap_or(true))
    }

    pub fn has_this_binding(&self) -> bool {
        matches!(
            &*self.0.borrow(),
            EnvironmentData::Function(f) if f.this_state != ThisState::Lexical
        ) || matches!(&*self.0.borrow(), EnvironmentData::Global(_))
    }

    pub fn has_super_binding(&self) -> bool {
        matches!(&*self.0.borrow(), EnvironmentData::Function(f) if f.has_super)
    }

    pub fn with_base_object(&self) -> Option<JsObject> {
        match &*self.0.borrow() {
            EnvironmentData::Object(o) if o.with_environment => Some(o.binding_object.clone()),
            _ => None,
        }
    }

    pub fn get_this_binding(&self, ctx: &mut Context) -> JsResult<JsValue> {
        match &*self.0.borrow() {
            EnvironmentData::Function(f) => match f.this_state {
                ThisState::Lexical => self
                    .outer()
                    .ok_or_else(|| type_error(ctx, "no `this` binding in scope"))
                    .and_then(|outer| outer.get_this_binding(ctx)),
                ThisState::Uninitialized => Err(reference_error(ctx, "must call super constructor before accessing `this`")),
                ThisState::Initialized => Ok(f.this_value.clone().unwrap()),
            },
            EnvironmentData::Global(g) => Ok(JsValue::Object(g.object_record.binding_object.clone())),
            _ => self
                .outer()
                .ok_or_else(|| type_error(ctx, "no `this` binding in scope"))
                .and_then(|outer| outer.get_this_binding(ctx)),
        }
    }

    /// Binds `this` exactly once, transitioning a derived constructor's
    /// function environment out of `Uninitialized` after `super(...)`
    /// returns.
    pub fn bind_this_value(&self, value: JsValue, ctx: &mut Context) -> JsResult<()> {
        let mut data = self.0.borrow_mut();
        let EnvironmentData::Function(f) = &mut *data else {
            return Err(type_error(ctx, "not a function environment"));
        };
        if f.this_state == ThisState::Initialized {
            return Err(reference_error(ctx, "super called twice"));
        }
        f.this_value = Some(value);
        f.this_state = ThisState::Initialized;
        Ok(())
    }

    // ---- global-only operations ----

    pub fn has_var_declaration(&self, name: &JsString) -> bool {
        match &*self.0.borrow() {
            EnvironmentData::Global(g) => g.var_names.contains(name),
            _ => false,
        }
    }

    pub fn has_lexical_declaration(&self, name: &JsString) -> bool {
        match &*self.0.borrow() {
            EnvironmentData::Global(g) => g.declarative.bindings.position(name).is_some(),
            _ => false,
        }
    }

    pub fn create_global_var_binding(&self, name: JsString, deletable: bool, ctx: &mut Context) -> JsResult<()> {
        let object = match &*self.0.borrow() {
            EnvironmentData::Global(g) => g.object_record.binding_object.clone(),
            _ => return Err(type_error(ctx, "not a global environment")),
        };
        let key = name.clone().into();
        if !object.has_own_property(&key, ctx)? {
            let desc = crate::property::PropertyDescriptor::data(JsValue::undefined(), true, true, deletable);
            object.define_own_property(&key, desc, ctx)?;
        }
        if let EnvironmentData::Global(g) = &mut *self.0.borrow_mut() {
            if !g.var_names.contains(&name) {
                g.var_names.push(name);
            }
        }
        Ok(())
    }

    pub fn create_global_function_binding(&self, name: JsString, value: JsValue, deletable: bool, ctx: &mut Context) -> JsResult<()> {
        let object = match &*self.0.borrow() {
            EnvironmentData::Global(g) => g.object_record.binding_object.clone(),
            _ => return Err(type_error(ctx, "not a global environment")),
        };
        let desc = crate::property::PropertyDescriptor::data(value, true, true, deletable);
        object.define_own_property(&name.clone().into(), desc, ctx)?;
        if let EnvironmentData::Global(g) = &mut *self.0.borrow_mut() {
            if !g.var_names.contains(&name) {
                g.var_names.push(name);
            }
        }
        Ok(())
    }

    // ---- module-only operation ----

    pub fn create_import_binding(&self, local_name: JsString, module: Environment, exported_name: JsString) {
        self.with_bindings_mut(|b| {
            b.0.insert(
                local_name,
                Binding {
                    value: None,
                    mutable: false,
                    strict: true,
                    deletable: false,
                    import: Some(ImportBinding { module, export_name: exported_name }),
                },
            );
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectKind;

    fn test_context() -> Context {
        Context::new(JsObject::new(ObjectKind::Ordinary, None), 16)
    }

    #[test]
    fn a_fresh_declarative_binding_is_mutable_and_round_trips_a_value() {
        let mut ctx = test_context();
        let env = Environment::new_declarative(None);
        let name = JsString::from("x");
        env.create_mutable_binding(name.clone(), true, &mut ctx).unwrap();
        env.initialize_binding(&name, JsValue::from(1.0), &mut ctx).unwrap();
        assert_eq!(env.get_binding_value(&name, true, &mut ctx).unwrap().as_number(), Some(1.0));
        env.set_mutable_binding(&name, JsValue::from(2.0), true, &mut ctx).unwrap();
        assert_eq!(env.get_binding_value(&name, true, &mut ctx).unwrap().as_number(), Some(2.0));
    }

    #[test]
    fn reassigning_an_immutable_binding_is_a_type_error() {
        let mut ctx = test_context();
        let env = Environment::new_declarative(None);
        let name = JsString::from("c");
        env.create_immutable_binding(name.clone(), true).unwrap();
        env.initialize_binding(&name, JsValue::from(1.0), &mut ctx).unwrap();
        let err = env.set_mutable_binding(&name, JsValue::from(2.0), true, &mut ctx).unwrap_err();
        assert!(matches!(err.as_value().unwrap(), JsValue::Object(o) if matches!(o.data().kind, ObjectKind::Error { kind: crate::error::ErrorKind::TypeError, .. })));
    }

    #[test]
    fn a_missing_non_strict_assignment_creates_a_global_style_var() {
        let mut ctx = test_context();
        let env = Environment::new_declarative(None);
        let name = JsString::from("implicit");
        env.set_mutable_binding(&name, JsValue::from(7.0), false, &mut ctx).unwrap();
        assert_eq!(env.get_binding_value(&name, true, &mut ctx).unwrap().as_number(), Some(7.0));
    }

    #[test]
    fn a_missing_strict_assignment_is_a_reference_error() {
        let mut ctx = test_context();
        let env = Environment::new_declarative(None);
        let name = JsString::from("nope");
        let err = env.set_mutable_binding(&name, JsValue::from(1.0), true, &mut ctx).unwrap_err();
        assert!(matches!(err.as_value().unwrap(), JsValue::Object(o) if matches!(o.data().kind, ObjectKind::Error { kind: crate::error::ErrorKind::ReferenceError, .. })));
    }

    #[test]
    fn an_outer_chain_is_walked_for_the_global_this_binding() {
        let mut ctx = test_context();
        let global_object = JsObject::new(ObjectKind::Ordinary, None);
        let global = Environment::new_global(global_object.clone());
        let inner = Environment::new_declarative(Some(global));
        let this = inner.get_this_binding(&mut ctx).unwrap();
        assert_eq!(this.as_object(), Some(&global_object));
    }

    #[test]
    fn a_derived_constructors_this_binding_starts_uninitialized_then_initializes_once() {
        let mut ctx = test_context();
        let function_object = JsObject::new(ObjectKind::Ordinary, None);
        let env = Environment::new_function(None, function_object, ThisState::Uninitialized);
        assert!(env.get_this_binding(&mut ctx).is_err());
        env.bind_this_value(JsValue::from(1.0), &mut ctx).unwrap();
        assert_eq!(env.get_this_binding(&mut ctx).unwrap().as_number(), Some(1.0));
        assert!(env.bind_this_value(JsValue::from(2.0), &mut ctx).is_err());
    }

    #[test]
    fn an_object_environment_delegates_has_binding_to_the_wrapped_object() {
        let mut ctx = test_context();
        let binding_object = JsObject::new(ObjectKind::Ordinary, None);
        let env = Environment::new_object(None, binding_object.clone(), true);
        let name = JsString::from("prop");
        assert!(!env.has_binding(&name, &mut ctx).unwrap());
        env.create_mutable_binding(name.clone(), true, &mut ctx).unwrap();
        assert!(env.has_binding(&name, &mut ctx).unwrap());
        assert_eq!(env.with_base_object(), Some(binding_object));
    }

    #[test]
    fn a_missing_object_environment_property_is_undefined_in_sloppy_mode_but_a_reference_error_in_strict_mode() {
        let mut ctx = test_context();
        let binding_object = JsObject::new(ObjectKind::Ordinary, None);
        let env = Environment::new_object(None, binding_object, true);
        let name = JsString::from("absent");
        assert!(env.get_binding_value(&name, false, &mut ctx).unwrap().is_undefined());
        let err = env.get_binding_value(&name, true, &mut ctx).unwrap_err();
        assert!(matches!(err.as_value().unwrap(), JsValue::Object(o) if matches!(o.data().kind, ObjectKind::Error { kind: crate::error::ErrorKind::ReferenceError, .. })));
    }

    #[test]
    fn create_global_var_binding_installs_an_own_property_and_tracks_the_name() {
        let mut ctx = test_context();
        let global_object = JsObject::new(ObjectKind::Ordinary, None);
        let env = Environment::new_global(global_object.clone());
        let name = JsString::from("globalVar");
        env.create_global_var_binding(name.clone(), true, &mut ctx).unwrap();
        assert!(global_object.has_own_property(&name.clone().into(), &mut ctx).unwrap());
        assert!(env.has_var_declaration(&name));
    }

    #[test]
    fn an_import_binding_delegates_to_the_target_modules_export() {
        let mut ctx = test_context();
        let target = Environment::new_module(None);
        let export_name = JsString::from("value");
        target.create_mutable_binding(export_name.clone(), false, &mut ctx).unwrap();
        target.initialize_binding(&export_name, JsValue::from(9.0), &mut ctx).unwrap();

        let importer = Environment::new_module(None);
        let local_name = JsString::from("imported");
        importer.create_import_binding(local_name.clone(), target, export_name);
        assert_eq!(importer.get_binding_value(&local_name, true, &mut ctx).unwrap().as_number(), Some(9.0));
    }
}
