//! The runtime handle (§6.2 "Runtime API") and the per-activation stack
//! frame (§3.6).
//!
//! spec.md's §3.6 calls the per-activation record itself a "Context"; this
//! module keeps the name `Context` for the pervasive runtime handle instead
//! (matching `boa::Context`, which every other module in this crate already
//! imports as `crate::context::Context` and threads through nearly every
//! call) and names the stack-frame record [`Frame`]. See DESIGN.md for this
//! naming departure.

use crate::environment::Environment;
use crate::error::{ErrorKind, JsError, JsResult};
use crate::job::{Job, JobQueue};
use crate::object::JsObject;
use crate::property::PropertyDescriptor;
use crate::realm::{Realm, WellKnownSymbols};
use crate::value::{JsValue, PropertyKey};
use crate::value_stack::ValueStack;

/// A GC-managed stack frame (§3.6): outer (bottom) context, realm pointer,
/// executing function, and — for script/function frames — the three
/// environment references and a bytecode instruction pointer. The bytecode
/// interpreter loop that advances `ip` and pushes/pops these is an external
/// collaborator (out of scope here); this only holds the state it reads
/// and writes.
#[derive(Debug, Clone)]
pub struct Frame {
    pub realm: usize,
    pub function: Option<JsObject>,
    pub variable_env: Option<Environment>,
    pub lexical_env: Option<Environment>,
    pub private_env: Option<Environment>,
    pub ip: u32,
    pub suspended: Option<CoroutineState>,
}

/// Suspended generator/async state (§3.6: "Generator and async contexts are
/// subclasses carrying suspended state and a native coroutine stack"). The
/// native coroutine stack itself belongs to whatever host coroutine
/// mechanism backs generators; this only records enough to resume it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoroutineState {
    SuspendedStart,
    SuspendedYield,
    Executing,
    Completed,
}

impl Frame {
    pub fn new(realm: usize, function: Option<JsObject>) -> Self {
        Frame {
            realm,
            function,
            variable_env: None,
            lexical_env: None,
            private_env: None,
            ip: 0,
            suspended: None,
        }
    }
}

/// Installed by the host embedder to run an ordinary (bytecode-compiled)
/// function's body; the opcode dispatch loop itself is out of scope for
/// this crate (spec.md §1: "we specify the state it manipulates").
pub trait InterpreterHook {
    fn invoke(&self, function: &JsObject, this: &JsValue, args: &[JsValue], ctx: &mut Context) -> JsResult<JsValue>;
}

/// The runtime handle (§6.2). Owns the realm set, the frame stack, the
/// value stack, and the job queue; every fallible execution-core operation
/// takes `&mut Context`.
pub struct Context {
    realms: Vec<Realm>,
    current_realm: usize,
    frames: Vec<Frame>,
    pub(crate) value_stack: ValueStack,
    pub(crate) jobs: JobQueue,
    well_known_symbols: WellKnownSymbols,
    next_symbol_id: u64,
    interpreter: Option<Box<dyn InterpreterHook>>,
    object_prototype: Option<JsObject>,
    last_uncaught: Option<JsError>,
}

impl Context {
    /// Builds a runtime around one freshly-created realm. Intrinsics
    /// (`Object.prototype`, the error constructors, ...) are left for the
    /// built-in library surface to install via [`Context::realm_mut`] and
    /// [`Context::set_object_prototype`] — out of scope for this crate.
    pub fn new(global_object: JsObject, value_stack_capacity: usize) -> Self {
        let mut next_symbol_id = 0;
        let well_known_symbols = WellKnownSymbols::new(&mut next_symbol_id);
        Context {
            realms: vec![Realm::new(global_object)],
            current_realm: 0,
            frames: Vec::new(),
            value_stack: ValueStack::new(value_stack_capacity),
            jobs: JobQueue::default(),
            well_known_symbols,
            next_symbol_id,
            interpreter: None,
            object_prototype: None,
            last_uncaught: None,
        }
    }

    pub fn set_interpreter_hook(&mut self, hook: impl InterpreterHook + 'static) {
        self.interpreter = Some(Box::new(hook));
    }

    /// Dispatches a call to an `Ordinary` (bytecode) function body. Fails
    /// fatally if no host interpreter has been installed.
    pub fn invoke_interpreter(&mut self, function: &JsObject, this: &JsValue, args: &[JsValue]) -> JsResult<JsValue> {
        let Some(hook) = self.interpreter.take() else {
            return Err(JsError::fatal(crate::error::InvariantError::CorruptBytecode(
                "no interpreter hook installed",
            )));
        };
        let result = hook.invoke(function, this, args, self);
        self.interpreter = Some(hook);
        result
    }

    pub fn well_known_symbols(&self) -> &WellKnownSymbols {
        &self.well_known_symbols
    }

    /// Mints a fresh local (non-well-known) symbol id.
    pub fn next_symbol_id(&mut self) -> u64 {
        let id = self.next_symbol_id;
        self.next_symbol_id += 1;
        id
    }

    pub fn realm(&self) -> &Realm {
        &self.realms[self.current_realm]
    }

    pub fn realm_mut(&mut self) -> &mut Realm {
        &mut self.realms[self.current_realm]
    }

    pub fn push_realm(&mut self, realm: Realm) -> usize {
        self.realms.push(realm);
        self.realms.len() - 1
    }

    pub fn enter_realm(&mut self, index: usize) -> usize {
        let previous = self.current_realm;
        self.current_realm = index;
        previous
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn push_frame(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn pop_frame(&mut self) -> Option<Frame> {
        self.frames.pop()
    }

    pub fn current_frame(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn current_frame_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    pub fn set_object_prototype(&mut self, prototype: JsObject) {
        self.object_prototype = Some(prototype);
    }

    pub fn object_prototype(&self) -> Option<JsObject> {
        self.object_prototype.clone()
    }

    /// Wraps a primitive in a `PrimitiveWrapper` exotic object for
    /// `ToObject` (§4.1). The wrapper's own constructor-specific prototype
    /// (`String.prototype`, `Number.prototype`, ...) is a built-in-library
    /// concern out of scope here; it gets `Object.prototype` instead.
    pub fn wrap_primitive(&mut self, value: JsValue) -> JsResult<JsObject> {
        Ok(JsObject::new(
            crate::object::ObjectKind::PrimitiveWrapper(value),
            self.object_prototype(),
        ))
    }

    /// Builds and returns (does not throw) an ECMAScript error value of the
    /// given kind, with `message` as its `message` own property.
    pub fn make_error(&mut self, kind: ErrorKind, message: &str) -> JsValue {
        let prototype = self.realm().intrinsic(kind.name()).or_else(|| self.object_prototype());
        let object = JsObject::new(
            crate::object::ObjectKind::Error { kind, cause: None },
            prototype,
        );
        let desc = PropertyDescriptor::data(JsValue::from(message), true, false, true);
        let _ = object.data_mut().properties.insert(PropertyKey::from("message"), desc);
        JsValue::Object(object)
    }

    /// Builds an error value of `kind` and wraps it in the throw channel
    /// (§4.7). The one-stop helper every fallible operation in this crate
    /// calls instead of constructing `JsError::Throw` by hand.
    pub fn throw(&mut self, kind: ErrorKind, message: &str) -> JsError {
        let value = self.make_error(kind, message);
        tracing::debug!(kind = %kind, message, "throwing");
        JsError::Throw(value)
    }

    /// Records an error that escaped the job queue or a top-level script
    /// evaluation without being caught, for `dump_error_stack` (§6.2).
    pub fn record_uncaught(&mut self, error: JsError) {
        tracing::error!(error = %error, "uncaught error");
        self.last_uncaught = Some(error);
    }

    pub fn dump_error_stack(&self, mut out: impl std::io::Write) -> std::io::Result<()> {
        match &self.last_uncaught {
            Some(err) => writeln!(out, "{err}"),
            None => Ok(()),
        }
    }

    pub fn to_property_descriptor(&mut self, value: &JsValue) -> JsResult<PartialPropertyDescriptor> {
        let Some(object) = value.as_object().cloned() else {
            return Err(self.throw(ErrorKind::TypeError, "property descriptor must be an object"));
        };
        let mut desc = PartialPropertyDescriptor::default();
        let this = JsValue::Object(object.clone());
        if object.has_property(&PropertyKey::from("value"), self)? {
            let v = object.get(&PropertyKey::from("value"), &this, self)?;
            desc.value = Some(v);
        }
        if object.has_property(&PropertyKey::from("writable"), self)? {
            let v = object.get(&PropertyKey::from("writable"), &this, self)?;
            desc.writable = Some(v.to_boolean());
        }
        if object.has_property(&PropertyKey::from("get"), self)? {
            let v = object.get(&PropertyKey::from("get"), &this, self)?;
            desc.get = Some(v);
        }
        if object.has_property(&PropertyKey::from("set"), self)? {
            let v = object.get(&PropertyKey::from("set"), &this, self)?;
            desc.set = Some(v);
        }
        if object.has_property(&PropertyKey::from("enumerable"), self)? {
            let v = object.get(&PropertyKey::from("enumerable"), &this, self)?;
            desc.enumerable = Some(v.to_boolean());
        }
        if object.has_property(&PropertyKey::from("configurable"), self)? {
            let v = object.get(&PropertyKey::from("configurable"), &this, self)?;
            desc.configurable = Some(v.to_boolean());
        }
        Ok(desc)
    }

    pub fn from_property_descriptor(&mut self, desc: &PropertyDescriptor) -> JsResult<JsValue> {
        let object = JsObject::new(crate::object::ObjectKind::Ordinary, self.object_prototype());
        let this = JsValue::Object(object.clone());
        if desc.is_accessor_descriptor() {
            let get = desc.get().cloned().unwrap_or_else(JsValue::undefined);
            let set = desc.set_accessor_get().cloned().unwrap_or_else(JsValue::undefined);
            object.set(&PropertyKey::from("get"), get, &this, self)?;
            object.set(&PropertyKey::from("set"), set, &this, self)?;
        } else {
            let value = desc.value().cloned().unwrap_or_else(JsValue::undefined);
            object.set(&PropertyKey::from("value"), value, &this, self)?;
            object.set(&PropertyKey::from("writable"), JsValue::from(desc.writable()), &this, self)?;
        }
        object.set(&PropertyKey::from("enumerable"), JsValue::from(desc.enumerable()), &this, self)?;
        object.set(&PropertyKey::from("configurable"), JsValue::from(desc.configurable()), &this, self)?;
        Ok(JsValue::Object(object))
    }

    /// Builds a dense array object from an iterator of values (used by
    /// `Proxy`'s `ownKeys` trap result coercion and similar internal spots
    /// that need a throwaway array without going through the built-in
    /// `Array` constructor surface).
    pub fn new_array_from_values(&mut self, values: impl Iterator<Item = JsValue>) -> JsResult<JsObject> {
        let array = JsObject::new(crate::object::ObjectKind::Array, self.object_prototype());
        {
            let mut data = array.data_mut();
            data.indexed = values.map(Some).collect();
            let len = data.indexed.len() as u32;
            data.properties.insert(
                PropertyKey::from("length"),
                PropertyDescriptor::data(JsValue::from(len), true, false, false),
            );
        }
        Ok(array)
    }
}

/// The not-yet-completed form `to_property_descriptor` returns: attributes
/// present in the source object only, exactly mirroring its "present" flags
/// before `[[DefineOwnProperty]]` reconciles it against any existing
/// property (§3.3).
#[derive(Debug, Default, Clone)]
pub struct PartialPropertyDescriptor {
    value: Option<JsValue>,
    writable: Option<bool>,
    get: Option<JsValue>,
    set: Option<JsValue>,
    enumerable: Option<bool>,
    configurable: Option<bool>,
}

impl PartialPropertyDescriptor {
    /// Converts to a full [`PropertyDescriptor`] via `CompletePropertyDescriptor`
    /// (§3.3), defaulting whichever attributes this partial form never saw.
    pub fn complete(self) -> PropertyDescriptor {
        let mut desc = PropertyDescriptor::new();
        if let Some(v) = self.value {
            desc.set_value(v);
        }
        if let Some(w) = self.writable {
            desc.set_writable(w);
        }
        if let Some(g) = self.get {
            desc.set_get(g);
        }
        if let Some(s) = self.set {
            desc.set_set(s);
        }
        if let Some(e) = self.enumerable {
            desc.set_enumerable(e);
        }
        if let Some(c) = self.configurable {
            desc.set_configurable(c);
        }
        desc.complete()
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
    fn make_error_sets_a_non_enumerable_message_property() {
        let mut ctx = test_context();
        let err = ctx.make_error(ErrorKind::TypeError, "bad thing");
        let object = err.as_object().unwrap();
        let desc = object.data().properties.get(&PropertyKey::from("message")).cloned().unwrap();
        match desc.value().unwrap() {
            JsValue::String(s) => assert_eq!(s.as_str(), "bad thing"),
            other => panic!("expected a string message, got {other:?}"),
        }
        assert!(!desc.enumerable());
    }

    #[test]
    fn throw_wraps_make_error_in_the_throw_channel() {
        let mut ctx = test_context();
        let err = ctx.throw(ErrorKind::RangeError, "out of range");
        assert!(matches!(err, JsError::Throw(_)));
    }

    #[test]
    fn entering_a_pushed_realm_returns_the_previous_index() {
        let mut ctx = test_context();
        let second = ctx.push_realm(Realm::new(JsObject::new(ObjectKind::Ordinary, None)));
        let previous = ctx.enter_realm(second);
        assert_eq!(previous, 0);
        assert_eq!(ctx.enter_realm(previous), second);
    }

    #[test]
    fn partial_descriptor_completion_marks_both_accessor_sides_present() {
        let mut partial = PartialPropertyDescriptor::default();
        partial.get = Some(JsValue::from(1.0));
        let completed = partial.complete();
        assert!(completed.has_get());
        assert!(completed.has_set());
        assert!(completed.set_accessor_get().unwrap().is_undefined());
    }

    #[test]
    fn partial_descriptor_completion_defaults_a_data_descriptor() {
        let partial = PartialPropertyDescriptor::default();
        let completed = partial.complete();
        assert!(completed.has_value());
        assert!(!completed.writable());
        assert!(!completed.enumerable());
        assert!(!completed.configurable());
    }

    #[test]
    fn from_property_descriptor_round_trips_a_data_descriptor() {
        let mut ctx = test_context();
        let desc = PropertyDescriptor::data(JsValue::from(42.0), true, true, false);
        let value = ctx.from_property_descriptor(&desc).unwrap();
        let object = value.as_object().unwrap();
        let this = value.clone();
        let v = object.get(&PropertyKey::from("value"), &this, &mut ctx).unwrap();
        assert_eq!(v.as_number(), Some(42.0));
    }

    #[test]
    fn new_array_from_values_sets_length() {
        let mut ctx = test_context();
        let array = ctx
            .new_array_from_values(vec![JsValue::from(1.0), JsValue::from(2.0)].into_iter())
            .unwrap();
        let len = array.data().properties.get(&PropertyKey::from("length")).cloned().unwrap();
        assert_eq!(len.value().unwrap().as_number(), Some(2.0));
    }
}
