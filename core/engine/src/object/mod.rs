//! The GC-managed object system (§3.2, §3.4, §4.3): ordinary objects and
//! their exotic specializations, unified behind the ten internal
//! operations.
//!
//! Design note §9 ("Virtual object operations") replaces the original's
//! function-pointer vtable with ordinary Rust dispatch: [`JsObject`]'s
//! methods check `ObjectData::kind` and call into the matching exotic
//! module when one overrides the ordinary behavior, falling back to
//! [`internal_methods`] (the free-standing ordinary implementation)
//! otherwise — the "specialized kinds delegate the uninteresting cases"
//! pattern the design notes call for.

pub mod arguments;
pub mod array;
pub mod integer_indexed;
pub mod internal_methods;
pub mod module_namespace;
pub mod proxy;

use std::fmt;

use ratjs_gc::{Finalize, Gc, GcCell, Trace};

use crate::array_buffer::ArrayBufferData;
use crate::context::Context;
use crate::error::{ErrorKind, JsError};
use crate::property::{PropertyDescriptor, PropertyMap};
use crate::value::{JsValue, PropertyKey};

pub use arguments::ArgumentsData;
pub use integer_indexed::{ElementKind, IntegerIndexedData};
pub use module_namespace::ModuleNamespaceData;
pub use proxy::ProxyData;

pub type JsResult<T> = Result<T, JsError>;

pub type NativeFunctionPtr = fn(&JsValue, &[JsValue], &mut Context) -> JsResult<JsValue>;

/// A native function implementation. Wrapped in a newtype (rather than
/// deriving `Trace`/`Finalize` for `NativeFunctionPtr` directly) purely so
/// the empty-trace impl lives next to the type it describes.
#[derive(Clone, Copy)]
pub struct NativeFunctionData(pub NativeFunctionPtr);

impl Finalize for NativeFunctionData {}
unsafe impl ratjs_gc::Trace for NativeFunctionData {
    ratjs_gc::empty_trace!();
}

impl fmt::Debug for NativeFunctionData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<native function>")
    }
}

/// How a function object resolves its `this` binding and dispatches a call.
#[derive(Debug, Clone, Trace, Finalize)]
pub enum FunctionKind {
    /// A `Rust`-implemented built-in.
    Native(NativeFunctionData),
    /// An ECMAScript function compiled to bytecode. Calling it is delegated
    /// to whatever bytecode interpreter the embedder installed via
    /// [`Context::set_interpreter_hook`] — the opcode dispatch loop itself
    /// is an external collaborator per spec.
    Ordinary,
    /// A promise resolve/reject function (§4.6), bound to the promise it
    /// settles. `NativeFunctionPtr` is a bare `fn` pointer with no capture
    /// slots, so (unlike `boa_engine`'s `NativeFunction::from_copy_closure_
    /// with_captures`) the attached state rides along as a dedicated
    /// `FunctionKind` variant instead of a closure capture.
    PromiseResolve { promise: JsObject, reject: bool },
}

#[derive(Debug, Clone, Trace, Finalize)]
pub struct FunctionData {
    pub kind: FunctionKind,
    pub constructable: bool,
    pub name: crate::value::JsString,
    pub length: u32,
}

/// The data this heap object carries in addition to the common
/// prototype/extensible/property-map header — the "subset of gc-things"
/// polymorphism spec §3.2 describes.
#[derive(Debug, Clone, Trace, Finalize)]
pub enum ObjectKind {
    Ordinary,
    Array,
    Function(FunctionData),
    Error { kind: crate::error::ErrorKind, cause: Option<JsValue> },
    Proxy(ProxyData),
    ModuleNamespace(ModuleNamespaceData),
    IntegerIndexed(IntegerIndexedData),
    ArrayBuffer(ArrayBufferData),
    Arguments(ArgumentsData),
    PrimitiveWrapper(JsValue),
    Promise(crate::promise::PromiseData),
}

/// Dense, integer-indexed storage for ordinary arrays and array-likes
/// (§3.4's "array-indexed part"). Holes are represented with `None` rather
/// than a physical attribute bit per slot, since every dense element this
/// engine creates is writable/enumerable/configurable (the common case);
/// a non-default attribute combination demotes the index to the
/// string-keyed property map instead.
pub type IndexedPart = Vec<Option<JsValue>>;

#[derive(Debug, Trace, Finalize)]
pub struct ObjectData {
    pub kind: ObjectKind,
    pub prototype: Option<JsObject>,
    pub extensible: bool,
    pub indexed: IndexedPart,
    pub properties: PropertyMap,
}

impl ObjectData {
    pub fn new(kind: ObjectKind, prototype: Option<JsObject>) -> Self {
        ObjectData {
            kind,
            prototype,
            extensible: true,
            indexed: Vec::new(),
            properties: PropertyMap::default(),
        }
    }
}

/// A GC-managed ECMAScript object (§3.4). Cheap to clone (bumps the root
/// count of the underlying [`Gc`]); all instances referring to the same
/// allocation observe the same mutations through [`GcCell`]'s interior
/// mutability.
#[derive(Debug, Clone, Trace, Finalize)]
pub struct JsObject(Gc<GcCell<ObjectData>>);

impl PartialEq for JsObject {
    fn eq(&self, other: &Self) -> bool {
        Gc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for JsObject {}

impl JsObject {
    pub fn new(kind: ObjectKind, prototype: Option<JsObject>) -> Self {
        JsObject(Gc::new(GcCell::new(ObjectData::new(kind, prototype))))
    }

    pub fn data(&self) -> ratjs_gc::GcCellRef<'_, ObjectData> {
        self.0.borrow()
    }

    pub fn data_mut(&self) -> ratjs_gc::GcCellRefMut<'_, ObjectData> {
        self.0.borrow_mut()
    }

    pub fn is_callable(&self) -> bool {
        matches!(self.data().kind, ObjectKind::Function(_))
    }

    pub fn is_constructor(&self) -> bool {
        matches!(&self.data().kind, ObjectKind::Function(f) if f.constructable)
    }

    pub fn is_proxy(&self) -> bool {
        matches!(self.data().kind, ObjectKind::Proxy(_))
    }

    // ---- the ten internal operations (§4.3) ----
    //
    // Each checks for an exotic override before falling back to the
    // ordinary implementation in `internal_methods`.

    pub fn get_prototype_of(&self, ctx: &mut Context) -> JsResult<Option<JsObject>> {
        if let ObjectKind::Proxy(_) = self.data().kind {
            return proxy::get_prototype_of(self, ctx);
        }
        if let ObjectKind::ModuleNamespace(_) = self.data().kind {
            return Ok(None);
        }
        Ok(internal_methods::ordinary_get_prototype_of(self))
    }

    pub fn set_prototype_of(&self, proto: Option<JsObject>, ctx: &mut Context) -> JsResult<bool> {
        if let ObjectKind::Proxy(_) = self.data().kind {
            return proxy::set_prototype_of(self, proto, ctx);
        }
        if let ObjectKind::ModuleNamespace(_) = self.data().kind {
            return Ok(proto.is_none());
        }
        Ok(internal_methods::ordinary_set_prototype_of(self, proto))
    }

    pub fn is_extensible(&self, ctx: &mut Context) -> JsResult<bool> {
        if let ObjectKind::Proxy(_) = self.data().kind {
            return proxy::is_extensible(self, ctx);
        }
        Ok(self.data().extensible)
    }

    pub fn prevent_extensions(&self, ctx: &mut Context) -> JsResult<bool> {
        if let ObjectKind::Proxy(_) = self.data().kind {
            return proxy::prevent_extensions(self, ctx);
        }
        self.data_mut().extensible = false;
        Ok(true)
    }

    pub fn get_own_property(
        &self,
        key: &PropertyKey,
        ctx: &mut Context,
    ) -> JsResult<Option<PropertyDescriptor>> {
        match &self.data().kind {
            ObjectKind::Proxy(_) => proxy::get_own_property(self, key, ctx),
            ObjectKind::ModuleNamespace(_) => Ok(module_namespace::get_own_property(self, key, ctx)),
            ObjectKind::IntegerIndexed(_) => integer_indexed::get_own_property(self, key, ctx),
            ObjectKind::Arguments(_) => arguments::get_own_property(self, key, ctx),
            _ => Ok(internal_methods::ordinary_get_own_property(self, key)),
        }
    }

    pub fn define_own_property(
        &self,
        key: &PropertyKey,
        desc: PropertyDescriptor,
        ctx: &mut Context,
    ) -> JsResult<bool> {
        match &self.data().kind {
            ObjectKind::Proxy(_) => proxy::define_own_property(self, key, desc, ctx),
            ObjectKind::ModuleNamespace(_) => module_namespace::define_own_property(self, key, desc, ctx),
            ObjectKind::IntegerIndexed(_) => integer_indexed::define_own_property(self, key, desc, ctx),
            ObjectKind::Arguments(_) => arguments::define_own_property(self, key, desc, ctx),
            ObjectKind::Array => array::define_own_property(self, key, desc, ctx),
            _ => internal_methods::ordinary_define_own_property(self, key, desc, ctx),
        }
    }

    pub fn has_property(&self, key: &PropertyKey, ctx: &mut Context) -> JsResult<bool> {
        if let ObjectKind::Proxy(_) = self.data().kind {
            return proxy::has_property(self, key, ctx);
        }
        if self.get_own_property(key, ctx)?.is_some() {
            return Ok(true);
        }
        match self.get_prototype_of(ctx)? {
            Some(parent) => parent.has_property(key, ctx),
            None => Ok(false),
        }
    }

    pub fn get(&self, key: &PropertyKey, receiver: &JsValue, ctx: &mut Context) -> JsResult<JsValue> {
        match &self.data().kind {
            ObjectKind::Proxy(_) => proxy::get(self, key, receiver, ctx),
            ObjectKind::IntegerIndexed(_) => integer_indexed::get(self, key, ctx),
            ObjectKind::ModuleNamespace(_) => module_namespace::get(self, key, ctx),
            ObjectKind::Arguments(_) => arguments::get(self, key, receiver, ctx),
            _ => internal_methods::ordinary_get(self, key, receiver, ctx),
        }
    }

    pub fn set(
        &self,
        key: &PropertyKey,
        value: JsValue,
        receiver: &JsValue,
        ctx: &mut Context,
    ) -> JsResult<bool> {
        match &self.data().kind {
            ObjectKind::Proxy(_) => proxy::set(self, key, value, receiver, ctx),
            ObjectKind::IntegerIndexed(_) => integer_indexed::set(self, key, value, ctx),
            ObjectKind::Arguments(_) => arguments::set(self, key, value, receiver, ctx),
            _ => internal_methods::ordinary_set(self, key, value, receiver, ctx),
        }
    }

    pub fn delete(&self, key: &PropertyKey, ctx: &mut Context) -> JsResult<bool> {
        match &self.data().kind {
            ObjectKind::Proxy(_) => proxy::delete(self, key, ctx),
            ObjectKind::ModuleNamespace(_) => Ok(module_namespace::delete(self, key, ctx)),
            ObjectKind::Arguments(_) => arguments::delete(self, key, ctx),
            _ => Ok(internal_methods::ordinary_delete(self, key)),
        }
    }

    pub fn own_property_keys(&self, ctx: &mut Context) -> JsResult<Vec<PropertyKey>> {
        match &self.data().kind {
            ObjectKind::Proxy(_) => proxy::own_property_keys(self, ctx),
            ObjectKind::ModuleNamespace(_) => Ok(module_namespace::own_property_keys(self, ctx)),
            ObjectKind::IntegerIndexed(_) => Ok(integer_indexed::own_property_keys(self)),
            _ => Ok(internal_methods::ordinary_own_property_keys(self)),
        }
    }

    pub fn call(&self, this: &JsValue, args: &[JsValue], ctx: &mut Context) -> JsResult<JsValue> {
        if let ObjectKind::Proxy(_) = self.data().kind {
            return proxy::call(self, this, args, ctx);
        }
        let ObjectKind::Function(f) = &self.data().kind else {
            return Err(ctx.throw(ErrorKind::TypeError, "value is not callable"));
        };
        match &f.kind {
            FunctionKind::Native(native) => (native.0)(this, args, ctx),
            FunctionKind::Ordinary => ctx.invoke_interpreter(self, this, args),
            FunctionKind::PromiseResolve { promise, reject } => {
                let promise = promise.clone();
                let reject = *reject;
                crate::promise::call_resolving_function(promise, reject, args.first().cloned().unwrap_or_else(JsValue::undefined), ctx)
            }
        }
    }

    pub fn construct(&self, args: &[JsValue], new_target: &JsObject, ctx: &mut Context) -> JsResult<JsObject> {
        if !self.is_constructor() {
            return Err(ctx.throw(ErrorKind::TypeError, "value is not a constructor"));
        }
        let this = JsValue::Object(JsObject::new(ObjectKind::Ordinary, ctx.object_prototype()));
        let result = self.call(&this, args, ctx)?;
        match result {
            JsValue::Object(o) => Ok(o),
            _ => match this {
                JsValue::Object(o) => {
                    let _ = new_target;
                    Ok(o)
                }
                _ => unreachable!("constructed `this` is always an object"),
            },
        }
    }

    // ---- convenience operations (§6.2) ----

    pub fn invoke(&self, name: impl Into<PropertyKey>, args: &[JsValue], ctx: &mut Context) -> JsResult<JsValue> {
        let key = name.into();
        let this = JsValue::Object(self.clone());
        let func = self.get(&key, &this, ctx)?;
        match func.as_object().filter(|o| o.is_callable()) {
            Some(f) => f.call(&this, args, ctx),
            None => Err(ctx.throw(ErrorKind::TypeError, "property is not callable")),
        }
    }

    pub fn has_own_property(&self, key: &PropertyKey, ctx: &mut Context) -> JsResult<bool> {
        Ok(self.get_own_property(key, ctx)?.is_some())
    }

    /// `Object.isSealed`/`seal`/`freeze`/`isFrozen` helpers (§4.3 integrity
    /// levels).
    pub fn set_integrity_level(&self, frozen: bool, ctx: &mut Context) -> JsResult<bool> {
        if !self.prevent_extensions(ctx)? {
            return Ok(false);
        }
        let keys = self.own_property_keys(ctx)?;
        for key in keys {
            let Some(mut desc) = self.get_own_property(&key, ctx)? else {
                continue;
            };
            let mut update = PropertyDescriptor::new();
            if frozen && desc.is_data_descriptor() {
                update.set_writable(false);
            }
            update.set_configurable(false);
            desc = update;
            self.define_own_property(&key, desc, ctx)?;
        }
        Ok(true)
    }

    pub fn test_integrity_level(&self, frozen: bool, ctx: &mut Context) -> JsResult<bool> {
        if self.is_extensible(ctx)? {
            return Ok(false);
        }
        for key in self.own_property_keys(ctx)? {
            let Some(desc) = self.get_own_property(&key, ctx)? else {
                continue;
            };
            if desc.configurable() {
                return Ok(false);
            }
            if frozen && desc.is_data_descriptor() && desc.writable() {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
