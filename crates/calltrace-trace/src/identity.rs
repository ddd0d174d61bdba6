//! Object identity and reference counting for traced interface pointers.
//!
//! Every native object crossing the shim boundary gets a [`Wrapper`]. The application only ever
//! sees the wrapper's handle (its heap address); the real pointer is substituted back on the way
//! into the real implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::value::ObjectId;
use crate::writer::lock;

/// Per-wrapper state slot declared by a hook, e.g. the pointer of a pending buffer lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowField {
    pub name: String,
    pub initial: u64,
}

impl ShadowField {
    pub fn new(name: &str, initial: u64) -> Self {
        Self {
            name: name.to_owned(),
            initial,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Shadow {
    fields: Vec<(String, u64)>,
}

impl Shadow {
    fn from_fields(fields: &[ShadowField]) -> Self {
        Self {
            fields: fields.iter().map(|f| (f.name.clone(), f.initial)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<u64> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    /// Returns `false` when the wrapper does not carry `name`.
    pub fn set(&mut self, name: &str, value: u64) -> bool {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => {
                *v = value;
                true
            }
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Stand-in handed to the application for one native object.
///
/// The first word is the vtable pointer so the handle is itself a valid COM-style object once
/// generated shims install their dispatch table.
#[repr(C)]
#[derive(Debug)]
pub struct Wrapper {
    vtable: AtomicUsize,
    id: ObjectId,
    native: usize,
    interface: Mutex<Option<String>>,
    shadow: Mutex<Shadow>,
}

impl Wrapper {
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Address of the real object.
    pub fn native(&self) -> usize {
        self.native
    }

    /// Address handed to the application.
    pub fn handle(&self) -> usize {
        self as *const Wrapper as usize
    }

    pub fn interface(&self) -> Option<String> {
        lock(&self.interface).clone()
    }

    /// Replaces the interface name, e.g. when `QueryInterface` hands the object out as a derived
    /// interface.
    pub fn set_interface(&self, interface: &str) {
        *lock(&self.interface) = Some(interface.to_owned());
    }

    pub fn shadow(&self) -> MutexGuard<'_, Shadow> {
        lock(&self.shadow)
    }

    pub fn install_vtable(&self, vtable: usize) {
        self.vtable.store(vtable, Ordering::Release);
    }

    pub fn vtable(&self) -> usize {
        self.vtable.load(Ordering::Acquire)
    }
}

#[derive(Debug)]
struct Entry {
    wrapper: Arc<Wrapper>,
    refs: u64,
}

#[derive(Debug, Default)]
struct Inner {
    by_native: HashMap<usize, Entry>,
    /// Wrapper handle -> native address.
    by_handle: HashMap<usize, usize>,
    next_id: u64,
}

impl Inner {
    /// Native address behind `ptr`, which may be a handle or a raw native pointer.
    fn native_of(&self, ptr: usize) -> Option<usize> {
        if let Some(native) = self.by_handle.get(&ptr) {
            return Some(*native);
        }
        self.by_native.contains_key(&ptr).then_some(ptr)
    }

    fn insert(&mut self, native: usize, interface: Option<&str>, shadow: &[ShadowField]) -> Arc<Wrapper> {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        let wrapper = Arc::new(Wrapper {
            vtable: AtomicUsize::new(0),
            id,
            native,
            interface: Mutex::new(interface.map(str::to_owned)),
            shadow: Mutex::new(Shadow::from_fields(shadow)),
        });
        self.by_handle.insert(wrapper.handle(), native);
        self.by_native.insert(
            native,
            Entry {
                wrapper: Arc::clone(&wrapper),
                refs: 1,
            },
        );
        tracing::debug!(%id, native = format_args!("{native:#x}"), interface, "new object");
        wrapper
    }
}

/// Thread-safe map from native objects to their wrappers.
#[derive(Debug, Default)]
pub struct ObjectTracker {
    inner: Mutex<Inner>,
}

impl ObjectTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an object returned through an output parameter or return value.
    ///
    /// A fresh object gets a new identity with count 1; a known one (by native address or by
    /// handle) gets count + 1, since the real call handed out another reference. Null yields
    /// `None`.
    pub fn wrap(
        &self,
        ptr: usize,
        interface: Option<&str>,
        shadow: &[ShadowField],
    ) -> Option<Arc<Wrapper>> {
        if ptr == 0 {
            return None;
        }
        let mut inner = lock(&self.inner);
        if let Some(native) = inner.native_of(ptr) {
            let entry = inner.by_native.get_mut(&native)?;
            entry.refs += 1;
            refine(&entry.wrapper, interface);
            return Some(Arc::clone(&entry.wrapper));
        }
        Some(inner.insert(ptr, interface, shadow))
    }

    /// Identity of an object passed in by the application. Pointers never seen before (created
    /// outside the traced entry points) get an identity with count 1.
    pub fn identify(
        &self,
        ptr: usize,
        interface: Option<&str>,
        shadow: &[ShadowField],
    ) -> Option<Arc<Wrapper>> {
        if ptr == 0 {
            return None;
        }
        let mut inner = lock(&self.inner);
        if let Some(native) = inner.native_of(ptr) {
            let entry = inner.by_native.get(&native)?;
            refine(&entry.wrapper, interface);
            return Some(Arc::clone(&entry.wrapper));
        }
        Some(inner.insert(ptr, interface, shadow))
    }

    /// Looks up a handle or native pointer without creating anything.
    pub fn lookup(&self, ptr: usize) -> Option<Arc<Wrapper>> {
        let inner = lock(&self.inner);
        let native = inner.native_of(ptr)?;
        inner.by_native.get(&native).map(|e| Arc::clone(&e.wrapper))
    }

    /// Native pointer to pass to the real implementation. Unknown values pass through.
    pub fn unwrap(&self, ptr: usize) -> usize {
        let inner = lock(&self.inner);
        inner.by_handle.get(&ptr).copied().unwrap_or(ptr)
    }

    /// Records one more reference. Returns the new count.
    pub fn acquire(&self, ptr: usize) -> Option<u64> {
        let mut inner = lock(&self.inner);
        let native = inner.native_of(ptr)?;
        let entry = inner.by_native.get_mut(&native)?;
        entry.refs += 1;
        Some(entry.refs)
    }

    /// Drops one reference. At zero the mapping is removed so a new object allocated at the same
    /// address gets a fresh identity. Returns the remaining count.
    ///
    /// The count only tracks references handed out through traced calls. The value the real
    /// `Release` returns is not consulted, so references taken outside the shims (or by the
    /// runtime internally) can make the mapping outlive or predate the native object.
    pub fn release(&self, ptr: usize) -> Option<u64> {
        let mut inner = lock(&self.inner);
        let native = inner.native_of(ptr)?;
        let entry = inner.by_native.get_mut(&native)?;
        entry.refs = entry.refs.saturating_sub(1);
        let remaining = entry.refs;
        if remaining == 0 {
            if let Some(entry) = inner.by_native.remove(&native) {
                inner.by_handle.remove(&entry.wrapper.handle());
                tracing::debug!(id = %entry.wrapper.id(), "object released");
            }
        }
        Some(remaining)
    }

    pub fn refs(&self, ptr: usize) -> Option<u64> {
        let inner = lock(&self.inner);
        let native = inner.native_of(ptr)?;
        inner.by_native.get(&native).map(|e| e.refs)
    }

    pub fn len(&self) -> usize {
        lock(&self.inner).by_native.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn refine(wrapper: &Wrapper, interface: Option<&str>) {
    let Some(interface) = interface else {
        return;
    };
    let mut current = lock(&wrapper.interface);
    if current.is_none() {
        *current = Some(interface.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_is_the_wrapper_address() {
        let tracker = ObjectTracker::new();
        let w = tracker.wrap(0x1000, Some("IUnknown"), &[]).unwrap();
        assert_eq!(w.handle(), Arc::as_ptr(&w) as usize);
        assert_eq!(tracker.unwrap(w.handle()), 0x1000);
        assert_eq!(tracker.unwrap(0x2000), 0x2000);
    }

    #[test]
    fn shadow_fields_start_at_their_initial_value() {
        let tracker = ObjectTracker::new();
        let w = tracker
            .wrap(0x1000, None, &[ShadowField::new("locked_size", 0)])
            .unwrap();
        assert_eq!(w.shadow().get("locked_size"), Some(0));
        assert!(w.shadow().set("locked_size", 64));
        assert!(!w.shadow().set("missing", 1));
        assert_eq!(w.shadow().get("locked_size"), Some(64));
    }

    #[test]
    fn null_is_never_wrapped() {
        let tracker = ObjectTracker::new();
        assert!(tracker.wrap(0, None, &[]).is_none());
        assert!(tracker.identify(0, None, &[]).is_none());
        assert!(tracker.is_empty());
    }

    #[test]
    fn interface_can_be_replaced() {
        let tracker = ObjectTracker::new();
        let w = tracker.wrap(0x1000, Some("IUnknown"), &[]).unwrap();
        tracker.wrap(0x1000, Some("IDevice"), &[]);
        assert_eq!(w.interface().as_deref(), Some("IUnknown"));
        w.set_interface("IDevice");
        assert_eq!(w.interface().as_deref(), Some("IDevice"));
    }
}
