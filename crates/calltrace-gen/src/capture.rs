//! Native memory to trace values.

use std::collections::HashMap;

use calltrace_api::native::{self, sign_extend};
use calltrace_api::size::Bindings;
use calltrace_api::{
    Api, BoundSize, ExtentKind, Guid, Primitive, ResolvedStruct, SizeHelpers, StringKind, Type,
};
use calltrace_trace::{ObjectTracker, Value, Wrapper};

use crate::hooks::ArgEncoding;
use crate::plan::{ArgPlan, GeneratedApi};
use crate::shader;

/// Pointer chains deeper than this are recorded by address.
const MAX_DEPTH: usize = 16;

/// What to do with object pointers found while reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ObjectMode {
    /// Application-supplied pointers: look up (or register) the identity.
    Identify,
    /// Pointers the real call produced: wrap them and hand the wrapper handle back.
    WrapOut,
}

pub(crate) struct Serializer<'a> {
    pub api: &'a Api,
    pub generated: &'a GeneratedApi,
    pub tracker: &'a ObjectTracker,
    pub vtables: &'a HashMap<String, usize>,
    pub helpers: &'a SizeHelpers,
}

/// Sibling-field words of one struct instance.
struct FieldWords<'a> {
    api: &'a Api,
    base: usize,
    def: &'a ResolvedStruct,
}

impl Bindings for FieldWords<'_> {
    fn word(&self, index: usize) -> Option<u64> {
        let field = self.def.fields.get(index)?;
        let addr = self.base + field.offset;
        // SAFETY: the struct instance was handed to the real call, so its fields are readable.
        unsafe {
            match self.api.scalar(&field.field.ty) {
                Some(prim) => Some(native::read_word(addr, prim)),
                None if field.inline_count.is_none() => Some(native::read_pointer(addr) as u64),
                None => None,
            }
        }
    }
}

impl Serializer<'_> {
    /// Value of one parameter.
    ///
    /// # Safety
    ///
    /// Every pointer reachable from `words[arg.index]` through the declared type and size must
    /// be valid (or null).
    pub unsafe fn capture_arg(&self, arg: &ArgPlan, words: &[u64], mode: ObjectMode) -> Value {
        let word = words.get(arg.index).copied().unwrap_or(0);
        match &arg.encoding {
            ArgEncoding::Custom { encode, .. } => encode(word),
            ArgEncoding::ShaderText(format) => {
                let len = self.extent(arg.size.as_ref(), words);
                if word == 0 {
                    return Value::Null;
                }
                let bytes = native::read_bytes(word as usize, len as usize);
                Value::String(shader::render(*format, &bytes))
            }
            ArgEncoding::ObjectFromIid { riid } => {
                let iid = words.get(*riid).copied().unwrap_or(0) as usize;
                self.queried_object(word as usize, iid, mode)
            }
            ArgEncoding::Default => {
                self.param_value(&arg.ty, word, arg.size.as_ref(), words, mode)
            }
        }
    }

    /// `void **` output whose interface is named by the IID at `iid_addr`. Objects of an
    /// unknown interface are recorded by address and reach the application unwrapped.
    unsafe fn queried_object(&self, slot: usize, iid_addr: usize, mode: ObjectMode) -> Value {
        if slot == 0 {
            return Value::Null;
        }
        let ptr = native::read_pointer(slot);
        if ptr == 0 {
            return Value::Array(vec![Value::Null]);
        }
        let mut iid = Guid([0; 16]);
        if iid_addr != 0 {
            let bytes = native::read_bytes(iid_addr, iid.0.len());
            iid.0.copy_from_slice(&bytes);
        }
        let Some(interface) = self.api.interface_by_iid(&iid) else {
            tracing::warn!(%iid, ptr = format_args!("{ptr:#x}"), "unknown IID, object left unwrapped");
            return Value::Array(vec![Value::Pointer(ptr as u64)]);
        };
        let (value, handle) = self.object_value(ptr, Some(&interface.name), mode);
        if mode == ObjectMode::WrapOut && handle != 0 {
            native::write_pointer(slot, handle);
        }
        Value::Array(vec![value])
    }

    /// Evaluates a bound size. Failures are logged and read as an empty extent.
    unsafe fn extent<B: Bindings + ?Sized>(&self, size: Option<&BoundSize>, bindings: &B) -> u64 {
        let Some(size) = size else {
            return 0;
        };
        match size.expr.evaluate(bindings, self.helpers) {
            Ok(n) => n,
            Err(err) => {
                tracing::warn!(expr = %size.source, %err, "size evaluation failed");
                0
            }
        }
    }

    unsafe fn param_value(
        &self,
        ty: &Type,
        word: u64,
        size: Option<&BoundSize>,
        words: &[u64],
        mode: ObjectMode,
    ) -> Value {
        match ty.canonical() {
            Type::Primitive(_) | Type::Enum(_) | Type::Flags(_) => self.scalar_value(ty, word),
            Type::String(kind) => string_value(*kind, word as usize),
            Type::Object(interface) => {
                // Objects passed by value are never produced by the call itself.
                self.object_value(word as usize, interface.as_deref(), ObjectMode::Identify)
                    .0
            }
            Type::Array { .. } | Type::Blob { .. } => {
                let n = self.extent(size, words);
                self.extent_value(ty, word as usize, n, mode, 0)
            }
            Type::Pointer { target, .. } => {
                if target.is_void() {
                    return Value::Pointer(word);
                }
                if word == 0 {
                    return Value::Null;
                }
                if size.is_some() {
                    // Pointer to a sized span: the span address is stored behind the pointer.
                    let n = self.extent(size, words);
                    let inner = native::read_pointer(word as usize);
                    return self.extent_value(target, inner, n, mode, 1);
                }
                Value::Array(vec![self.read_value(target, word as usize, mode, 1)])
            }
            Type::Struct(_) | Type::Alias { .. } => Value::UInt(word),
        }
    }

    pub fn scalar_value(&self, ty: &Type, word: u64) -> Value {
        match ty.canonical() {
            Type::Primitive(prim) => primitive_value(*prim, word),
            Type::Enum(name) => match self.api.enumeration(name) {
                Some(def) => {
                    let value = sign_extend(word, def.repr);
                    Value::Enum {
                        name: def.name_of(value).map(str::to_owned),
                        value,
                    }
                }
                None => Value::UInt(word),
            },
            Type::Flags(name) => match self.api.flags(name) {
                Some(def) => {
                    let value = mask(word, def.repr);
                    let (names, _) = def.decompose(value);
                    Value::Flags {
                        value,
                        names: names.into_iter().map(str::to_owned).collect(),
                    }
                }
                None => Value::UInt(word),
            },
            _ => Value::UInt(word),
        }
    }

    /// Identity of an object pointer. With [`ObjectMode::WrapOut`] the second element is the
    /// handle the application must see instead of `ptr`.
    pub fn object_value(
        &self,
        ptr: usize,
        interface: Option<&str>,
        mode: ObjectMode,
    ) -> (Value, usize) {
        let shadow = self.generated.shadow_for(interface);
        let wrapper = match mode {
            ObjectMode::Identify => self.tracker.identify(ptr, interface, shadow),
            ObjectMode::WrapOut => self.tracker.wrap(ptr, interface, shadow),
        };
        let Some(wrapper) = wrapper else {
            return (Value::Null, 0);
        };
        if mode == ObjectMode::WrapOut {
            self.upgrade(&wrapper, interface);
        }
        if mode == ObjectMode::WrapOut && wrapper.vtable() == 0 {
            let vtable = wrapper
                .interface()
                .and_then(|name| self.vtables.get(&name).copied());
            if let Some(vtable) = vtable {
                wrapper.install_vtable(vtable);
            }
        }
        (Value::Object(wrapper.id()), wrapper.handle())
    }

    /// Moves a wrapper to a derived interface it was just handed out as, so the derived
    /// methods are dispatched.
    fn upgrade(&self, wrapper: &Wrapper, interface: Option<&str>) {
        let (Some(wanted), Some(current)) = (interface, wrapper.interface()) else {
            return;
        };
        if wanted == current || !self.api.is_derived_from(wanted, &current) {
            return;
        }
        wrapper.set_interface(wanted);
        if let Some(vtable) = self.vtables.get(wanted) {
            wrapper.install_vtable(*vtable);
        }
    }

    /// Reads a sized span. A zero extent never touches `addr`.
    unsafe fn extent_value(
        &self,
        ty: &Type,
        addr: usize,
        n: u64,
        mode: ObjectMode,
        depth: usize,
    ) -> Value {
        let Some((element, kind)) = span_of(ty) else {
            return Value::Pointer(addr as u64);
        };
        match kind {
            ExtentKind::Elements => {
                if n == 0 {
                    return Value::Array(Vec::new());
                }
                if addr == 0 {
                    return Value::Null;
                }
                let Some(layout) = self.api.layout(element) else {
                    return Value::Pointer(addr as u64);
                };
                let stride = layout.size.max(1);
                let items = (0..n as usize)
                    .map(|i| self.read_value(element, addr + i * stride, mode, depth + 1))
                    .collect();
                Value::Array(items)
            }
            ExtentKind::Bytes | ExtentKind::Opaque => {
                if n == 0 {
                    return Value::Blob(Vec::new());
                }
                if addr == 0 {
                    return Value::Null;
                }
                Value::Blob(native::read_bytes(addr, n as usize))
            }
        }
    }

    /// Reads a value of type `ty` stored at `addr`.
    unsafe fn read_value(&self, ty: &Type, addr: usize, mode: ObjectMode, depth: usize) -> Value {
        if depth > MAX_DEPTH {
            return Value::Pointer(addr as u64);
        }
        match ty.canonical() {
            Type::Primitive(Primitive::Void) => Value::Pointer(addr as u64),
            Type::Primitive(_) | Type::Enum(_) | Type::Flags(_) => match scalar_prim(self.api, ty) {
                Some(prim) => self.scalar_value(ty, native::read_word(addr, prim)),
                None => Value::Pointer(addr as u64),
            },
            Type::String(kind) => string_value(*kind, native::read_pointer(addr)),
            Type::Object(interface) => {
                let ptr = native::read_pointer(addr);
                let (value, handle) = self.object_value(ptr, interface.as_deref(), mode);
                if mode == ObjectMode::WrapOut && handle != 0 {
                    native::write_pointer(addr, handle);
                }
                value
            }
            Type::Pointer { target, .. } => {
                let ptr = native::read_pointer(addr);
                if target.is_void() {
                    return Value::Pointer(ptr as u64);
                }
                if ptr == 0 {
                    return Value::Null;
                }
                Value::Array(vec![self.read_value(target, ptr, mode, depth + 1)])
            }
            // Unsized spans behind a pointer; sized ones are handled by their owner.
            Type::Array { .. } | Type::Blob { .. } => {
                Value::Pointer(native::read_pointer(addr) as u64)
            }
            Type::Struct(name) => match self.api.structure(name) {
                Some(def) if !def.opaque => self.struct_value(def, addr, mode, depth),
                _ => Value::Pointer(addr as u64),
            },
            Type::Alias { .. } => Value::Null,
        }
    }

    unsafe fn struct_value(
        &self,
        def: &ResolvedStruct,
        addr: usize,
        mode: ObjectMode,
        depth: usize,
    ) -> Value {
        let words = FieldWords {
            api: self.api,
            base: addr,
            def,
        };
        let mut fields = Vec::with_capacity(def.fields.len());
        for field in &def.fields {
            let at = addr + field.offset;
            let value = if let Some(count) = field.inline_count {
                let element = match field.field.ty.canonical() {
                    Type::Array { element, .. } => element.as_ref(),
                    other => other,
                };
                let stride = self.api.layout(element).map_or(0, |l| l.size).max(1);
                Value::Array(
                    (0..count as usize)
                        .map(|i| self.read_value(element, at + i * stride, mode, depth + 1))
                        .collect(),
                )
            } else if let Some(size) = &field.size {
                let n = self.extent(Some(size), &words);
                let ptr = native::read_pointer(at);
                self.extent_value(&field.field.ty, ptr, n, mode, depth + 1)
            } else {
                self.read_value(&field.field.ty, at, mode, depth + 1)
            };
            fields.push((field.field.name.clone(), value));
        }
        Value::Struct {
            name: def.name.clone(),
            fields,
        }
    }
}

/// Element type and extent kind of the first sized span reachable through pointers.
fn span_of(ty: &Type) -> Option<(&Type, ExtentKind)> {
    match ty {
        Type::Array { element, .. } => Some((element, ExtentKind::Elements)),
        Type::Blob {
            element, opaque, ..
        } => Some((
            element,
            if *opaque {
                ExtentKind::Opaque
            } else {
                ExtentKind::Bytes
            },
        )),
        Type::Pointer { target, .. } | Type::Alias { target, .. } => span_of(target),
        _ => None,
    }
}

/// Machine scalar behind a primitive (floats included), enum or flags type.
pub(crate) fn scalar_prim(api: &Api, ty: &Type) -> Option<Primitive> {
    match ty.canonical() {
        Type::Primitive(Primitive::Void) => None,
        Type::Primitive(p) => Some(*p),
        _ => api.scalar(ty),
    }
}

fn mask(word: u64, prim: Primitive) -> u64 {
    match prim.size() {
        1 => word & 0xFF,
        2 => word & 0xFFFF,
        4 => word & 0xFFFF_FFFF,
        _ => word,
    }
}

pub(crate) fn primitive_value(prim: Primitive, word: u64) -> Value {
    match prim {
        Primitive::Void => Value::Null,
        Primitive::Bool => Value::Bool(word & 0xFF != 0),
        Primitive::F32 => Value::Float(f32::from_bits(word as u32)),
        Primitive::F64 => Value::Double(f64::from_bits(word)),
        p if p.is_signed() => Value::SInt(sign_extend(word, p)),
        p => Value::UInt(mask(word, p)),
    }
}

unsafe fn string_value(kind: StringKind, addr: usize) -> Value {
    if addr == 0 {
        return Value::Null;
    }
    Value::String(match kind {
        StringKind::Narrow => native::read_cstr(addr),
        StringKind::Wide => native::read_wstr(addr),
    })
}
