use std::collections::HashMap;

use calltrace_trace::{MemoryCapture, Wrapper};

use crate::interceptor::Resolver;
use crate::plan::{GeneratedApi, ShimPlan};

/// View of an in-flight call handed to injected snippets.
///
/// Argument words are the ones the application passed (wrapper handles, not native
/// pointers). Calls made through [`CallFrame::call_method`] and [`CallFrame::call_function`]
/// go straight to the real implementation and are not traced.
pub struct CallFrame<'a> {
    pub(crate) plan: &'a ShimPlan,
    pub(crate) generated: &'a GeneratedApi,
    pub(crate) resolver: &'a dyn Resolver,
    pub(crate) symbols: &'a HashMap<String, usize>,
    pub(crate) args: &'a [u64],
    pub(crate) native_this: Option<usize>,
    pub(crate) this: Option<&'a Wrapper>,
    pub(crate) result: Option<u64>,
    pub(crate) memory: &'a mut Vec<MemoryCapture>,
}

impl<'a> CallFrame<'a> {
    pub fn plan(&self) -> &ShimPlan {
        self.plan
    }

    pub fn arg(&self, name: &str) -> Option<u64> {
        let index = self.plan.arg(name)?.index;
        self.arg_at(index)
    }

    pub fn arg_at(&self, index: usize) -> Option<u64> {
        self.args.get(index).copied()
    }

    /// Return word of the real call; `None` before the call.
    pub fn result(&self) -> Option<u64> {
        self.result
    }

    /// Replaces the word the application receives. Only meaningful after the real call.
    pub fn set_result(&mut self, word: u64) {
        self.result = Some(word);
    }

    /// Address of the generated shim exporting `name`, when one was installed.
    pub fn shim_address(&self, name: &str) -> Option<usize> {
        self.symbols.get(name).copied()
    }

    /// `true` when the call returned a non-negative `HRESULT`.
    pub fn succeeded(&self) -> bool {
        self.result.is_some_and(|r| (r as u32 as i32) >= 0)
    }

    pub fn this(&self) -> Option<&Wrapper> {
        self.this
    }

    pub fn native_this(&self) -> Option<usize> {
        self.native_this
    }

    pub fn shadow_get(&self, field: &str) -> Option<u64> {
        self.this?.shadow().get(field)
    }

    /// Returns `false` when there is no `this` or it does not carry `field`.
    pub fn shadow_set(&self, field: &str, value: u64) -> bool {
        self.this.is_some_and(|w| w.shadow().set(field, value))
    }

    /// Attaches a copy of application memory to the record.
    ///
    /// # Safety
    ///
    /// `addr` must be valid for reads of `len` bytes unless one of them is zero.
    pub unsafe fn capture_memory(&mut self, addr: usize, len: usize) {
        if addr == 0 || len == 0 {
            return;
        }
        self.memory.push(MemoryCapture {
            address: addr as u64,
            bytes: calltrace_api::native::read_bytes(addr, len),
        });
    }

    /// Calls another method of the same native object, untraced.
    ///
    /// # Safety
    ///
    /// `args` must match the method's native signature.
    pub unsafe fn call_method(&self, method: &str, args: &[u64]) -> Option<u64> {
        let this = self.native_this?;
        let interface = self.generated.interface(self.plan.interface.as_deref()?)?;
        let slot = interface.slot(method)?;
        let real = self.resolver.method(this, slot)?;
        let mut words = Vec::with_capacity(args.len() + 1);
        words.push(this as u64);
        words.extend_from_slice(args);
        Some(real(&words))
    }

    /// Calls an entry point of the real implementation, untraced.
    ///
    /// # Safety
    ///
    /// `args` must match the function's native signature.
    pub unsafe fn call_function(&self, name: &str, args: &[u64]) -> Option<u64> {
        let real = self.resolver.function(name)?;
        Some(real(args))
    }
}
