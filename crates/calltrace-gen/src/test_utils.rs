//! Fake native implementations for exercising shims without a real driver.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::interceptor::{RealFn, Resolver};

/// Resolver backed by closures registered per function and per (object, slot).
///
/// Fake objects are plain distinct addresses; nothing ever dereferences them.
#[derive(Default)]
pub struct FakeResolver {
    functions: Mutex<HashMap<String, RealFn>>,
    methods: Mutex<HashMap<(usize, usize), RealFn>>,
    symbols: Mutex<HashMap<String, usize>>,
    next_object: AtomicUsize,
    log: Mutex<Vec<String>>,
}

impl FakeResolver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A fresh fake native object address.
    pub fn new_object(&self) -> usize {
        0x7000_0000 + self.next_object.fetch_add(1, Ordering::Relaxed) * 0x100
    }

    pub fn on_function(&self, name: &str, real: impl Fn(&[u64]) -> u64 + Send + Sync + 'static) {
        self.functions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_owned(), Arc::new(real));
    }

    /// Registers the implementation of `slot` for `object`. The closure receives the native
    /// `this` as its first word.
    pub fn on_method(
        &self,
        object: usize,
        slot: usize,
        real: impl Fn(&[u64]) -> u64 + Send + Sync + 'static,
    ) {
        self.methods
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((object, slot), Arc::new(real));
    }

    /// Registers a real entry point called with its native signature by emitted shims.
    pub fn on_symbol(&self, name: &str, address: usize) {
        self.symbols
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_owned(), address);
    }

    /// Every real entry point resolved so far, as `name` or `object#slot`.
    pub fn resolved(&self) -> Vec<String> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn note(&self, entry: String) {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }
}

impl Resolver for FakeResolver {
    fn function(&self, name: &str) -> Option<RealFn> {
        let real = self
            .functions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()?;
        self.note(name.to_owned());
        Some(real)
    }

    fn method(&self, native_this: usize, slot: usize) -> Option<RealFn> {
        let real = self
            .methods
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(native_this, slot))
            .cloned()?;
        self.note(format!("{native_this:#x}#{slot}"));
        Some(real)
    }

    fn symbol(&self, name: &str) -> Option<usize> {
        let address = self
            .symbols
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .copied()?;
        self.note(name.to_owned());
        Some(address)
    }
}

/// Writes `value` through an out-pointer word, as a real implementation would.
///
/// # Safety
///
/// `out` must be a valid pointer to a pointer-sized slot.
pub unsafe fn write_out(out: u64, value: usize) {
    calltrace_api::native::write_pointer(out as usize, value);
}
