//! Run-time execution of shim plans.
//!
//! [`ShimCall`] carries one intercepted call through its steps. Emitted shims drive the steps
//! themselves around a typed call of the real entry point; [`Interceptor::invoke`] runs the
//! same steps with a word-level [`RealFn`] obtained from a [`Resolver`].

use std::collections::HashMap;
use std::sync::Arc;

use calltrace_api::{Direction, RefEffect, Type};
use calltrace_trace::{
    fatal, ArgRecord, CallEnd, CallId, CallStatus, MemoryCapture, ObjectTracker, TraceWriter,
    Value, Wrapper,
};
use thiserror::Error;

use crate::capture::{ObjectMode, Serializer};
use crate::frame::CallFrame;
use crate::hooks::Snippet;
use crate::plan::{GeneratedApi, ShimPlan};

/// Word-level entry point of the real implementation. Methods receive the native `this`
/// as the first word.
pub type RealFn = Arc<dyn Fn(&[u64]) -> u64 + Send + Sync>;

/// Locates genuine entry points.
pub trait Resolver: Send + Sync {
    fn function(&self, name: &str) -> Option<RealFn>;
    fn method(&self, native_this: usize, slot: usize) -> Option<RealFn>;

    /// Raw address of an exported symbol, for emitted shims that call it with its native
    /// signature.
    fn symbol(&self, _name: &str) -> Option<usize> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterceptError {
    #[error("no shim for function `{0}`")]
    UnknownFunction(String),
    #[error("interface `{interface}` has no method `{method}`")]
    UnknownMethod { interface: String, method: String },
    #[error("{0:#x} is not a tracked object")]
    UnknownObject(usize),
}

/// Entry `slot` of the vtable of the COM-style object at `native`.
///
/// # Safety
///
/// `native` must point to an object whose first word is a vtable with more than `slot`
/// entries.
pub unsafe fn vtable_entry(native: usize, slot: usize) -> usize {
    let vtable = calltrace_api::native::read_pointer(native);
    calltrace_api::native::read_pointer(vtable + slot * std::mem::size_of::<usize>())
}

pub struct Interceptor {
    generated: Arc<GeneratedApi>,
    writer: Arc<dyn TraceWriter>,
    resolver: Arc<dyn Resolver>,
    tracker: Arc<ObjectTracker>,
    vtables: HashMap<String, usize>,
    /// Exported shim functions by name, handed out by proc-address lookups.
    symbols: HashMap<String, usize>,
}

impl Interceptor {
    pub fn new(
        generated: Arc<GeneratedApi>,
        writer: Arc<dyn TraceWriter>,
        resolver: Arc<dyn Resolver>,
    ) -> Self {
        Self {
            generated,
            writer,
            resolver,
            tracker: Arc::new(ObjectTracker::new()),
            vtables: HashMap::new(),
            symbols: HashMap::new(),
        }
    }

    /// Shares an identity map with other interceptors (e.g. one per API of a process).
    pub fn with_tracker(mut self, tracker: Arc<ObjectTracker>) -> Self {
        self.tracker = tracker;
        self
    }

    /// Dispatch table installed into wrappers of `interface`.
    pub fn with_vtable(mut self, interface: &str, vtable: usize) -> Self {
        self.vtables.insert(interface.to_owned(), vtable);
        self
    }

    /// Address of the shim exporting function `name`.
    pub fn with_symbol(mut self, name: &str, shim: usize) -> Self {
        self.symbols.insert(name.to_owned(), shim);
        self
    }

    pub fn shim_symbol(&self, name: &str) -> Option<usize> {
        self.symbols.get(name).copied()
    }

    pub fn generated(&self) -> &GeneratedApi {
        &self.generated
    }

    pub fn tracker(&self) -> &ObjectTracker {
        &self.tracker
    }

    pub fn resolver(&self) -> &dyn Resolver {
        self.resolver.as_ref()
    }

    /// Plan of the function at `index`. A missing index means the shims and the plans were
    /// generated from different tables, which is unrecoverable.
    pub fn function_at(&self, index: usize) -> Arc<ShimPlan> {
        match self.generated.functions.get(index) {
            Some(plan) => Arc::clone(plan),
            None => {
                tracing::error!(index, "function shim has no plan");
                std::process::abort()
            }
        }
    }

    pub fn method_at(&self, interface: usize, slot: usize) -> Arc<ShimPlan> {
        match self
            .generated
            .interfaces
            .get(interface)
            .and_then(|i| i.slots.get(slot))
        {
            Some(plan) => Arc::clone(plan),
            None => {
                tracing::error!(interface, slot, "method shim has no plan");
                std::process::abort()
            }
        }
    }

    /// Opens a call. `this` is the application's view of the object for methods.
    pub fn begin(&self, plan: Arc<ShimPlan>, this: Option<usize>, args: &[u64]) -> ShimCall<'_> {
        let id = match self.writer.begin(&plan.qualified_name) {
            Ok(id) => id,
            Err(err) => fatal(&err),
        };
        let shadow = self.generated.shadow_for(plan.interface.as_deref());
        let this = this.and_then(|ptr| self.tracker.identify(ptr, plan.interface.as_deref(), shadow));
        tracing::debug!(call = id.0, name = %plan.qualified_name, "call begins");
        ShimCall {
            interceptor: self,
            before: vec![None; plan.args.len()],
            after: vec![None; plan.args.len()],
            native_args: args.to_vec(),
            args: args.to_vec(),
            plan,
            id,
            this,
            scratch: Vec::new(),
            result: None,
            memory: Vec::new(),
        }
    }

    /// Traces a call of the free function `name`.
    ///
    /// # Safety
    ///
    /// `args` must be valid for the function's declared parameter types.
    pub unsafe fn call_function(&self, name: &str, args: &[u64]) -> Result<u64, InterceptError> {
        let plan = self
            .generated
            .function(name)
            .cloned()
            .ok_or_else(|| InterceptError::UnknownFunction(name.to_owned()))?;
        Ok(self.invoke(plan, None, args))
    }

    /// Traces a call of `method` on the object behind `this`, dispatching through the plan
    /// of the object's concrete interface.
    ///
    /// # Safety
    ///
    /// `args` must be valid for the method's declared parameter types.
    pub unsafe fn call_method(
        &self,
        this: usize,
        method: &str,
        args: &[u64],
    ) -> Result<u64, InterceptError> {
        let interface = self
            .tracker
            .lookup(this)
            .and_then(|w| w.interface())
            .ok_or(InterceptError::UnknownObject(this))?;
        self.call_method_as(&interface, this, method, args)
    }

    /// Like [`Interceptor::call_method`] with an explicit interface.
    ///
    /// # Safety
    ///
    /// `args` must be valid for the method's declared parameter types.
    pub unsafe fn call_method_as(
        &self,
        interface: &str,
        this: usize,
        method: &str,
        args: &[u64],
    ) -> Result<u64, InterceptError> {
        let plan = self
            .generated
            .method(interface, method)
            .cloned()
            .ok_or_else(|| InterceptError::UnknownMethod {
                interface: interface.to_owned(),
                method: method.to_owned(),
            })?;
        Ok(self.invoke(plan, Some(this), args))
    }

    /// Runs every step of a shim against a word-level real entry point.
    ///
    /// # Safety
    ///
    /// `args` must be valid for the plan's parameter types.
    pub unsafe fn invoke(&self, plan: Arc<ShimPlan>, this: Option<usize>, args: &[u64]) -> u64 {
        let mut call = self.begin(plan, this, args);
        call.capture_pre();
        call.inject_pre();
        call.prepare();
        let Some(real) = call.resolve_real() else {
            return call.unresolved();
        };
        let words = call.native_words();
        call.complete(real(&words));
        call.inject_post();
        call.capture_post();
        call.finish()
    }

    fn serializer(&self) -> Serializer<'_> {
        Serializer {
            api: &self.generated.api,
            generated: &self.generated,
            tracker: &self.tracker,
            vtables: &self.vtables,
            helpers: &self.generated.helpers,
        }
    }
}

/// One call in flight.
pub struct ShimCall<'a> {
    interceptor: &'a Interceptor,
    plan: Arc<ShimPlan>,
    id: CallId,
    this: Option<Arc<Wrapper>>,
    /// Words as the application passed them.
    args: Vec<u64>,
    /// Words handed to the real implementation.
    native_args: Vec<u64>,
    /// Native copies of object arrays referenced by `native_args`.
    scratch: Vec<Vec<usize>>,
    before: Vec<Option<Value>>,
    after: Vec<Option<Value>>,
    result: Option<u64>,
    memory: Vec<MemoryCapture>,
}

impl ShimCall<'_> {
    pub fn id(&self) -> CallId {
        self.id
    }

    pub fn plan(&self) -> &ShimPlan {
        &self.plan
    }

    /// Serializes In/InOut arguments.
    ///
    /// # Safety
    ///
    /// The argument words must be valid for their declared types.
    pub unsafe fn capture_pre(&mut self) {
        let serializer = self.interceptor.serializer();
        for arg in self.plan.pre_call_args() {
            self.before[arg.index] =
                Some(serializer.capture_arg(arg, &self.args, ObjectMode::Identify));
        }
    }

    pub fn inject_pre(&mut self) {
        let snippet = self.plan.injection.pre.clone();
        self.run_snippet(snippet);
    }

    pub fn inject_post(&mut self) {
        let snippet = self.plan.injection.post.clone();
        self.run_snippet(snippet);
    }

    fn run_snippet(&mut self, snippet: Option<Snippet>) {
        let Some(snippet) = snippet else {
            return;
        };
        let mut frame = CallFrame {
            plan: &self.plan,
            generated: &self.interceptor.generated,
            resolver: self.interceptor.resolver.as_ref(),
            symbols: &self.interceptor.symbols,
            args: &self.args,
            native_this: self.this.as_ref().map(|w| w.native()),
            this: self.this.as_deref(),
            result: self.result,
            memory: &mut self.memory,
        };
        (snippet.run)(&mut frame);
        self.result = frame.result;
    }

    /// Substitutes native pointers for wrapper handles in the arguments.
    ///
    /// # Safety
    ///
    /// Object array arguments must be valid for their evaluated counts.
    pub unsafe fn prepare(&mut self) {
        let tracker = &self.interceptor.tracker;
        let helpers = &self.interceptor.generated.helpers;
        for arg in &self.plan.args {
            if arg.direction != Direction::In {
                continue;
            }
            let word = self.args[arg.index];
            match arg.ty.canonical() {
                Type::Object(_) => {
                    self.native_args[arg.index] = tracker.unwrap(word as usize) as u64;
                }
                Type::Array { element, .. } if matches!(element.canonical(), Type::Object(_)) => {
                    if word == 0 {
                        continue;
                    }
                    let count = arg
                        .size
                        .as_ref()
                        .and_then(|s| s.expr.evaluate(&self.args, helpers).ok())
                        .unwrap_or(0);
                    if count == 0 {
                        continue;
                    }
                    let natives: Vec<usize> = (0..count as usize)
                        .map(|i| {
                            let at = word as usize + i * std::mem::size_of::<usize>();
                            tracker.unwrap(calltrace_api::native::read_pointer(at))
                        })
                        .collect();
                    self.native_args[arg.index] = natives.as_ptr() as u64;
                    self.scratch.push(natives);
                }
                _ => {}
            }
        }
    }

    /// Native `this`, for methods.
    pub fn native_this(&self) -> usize {
        self.this.as_ref().map_or(0, |w| w.native())
    }

    pub fn native_arg(&self, index: usize) -> u64 {
        self.native_args.get(index).copied().unwrap_or(0)
    }

    /// Words for a [`RealFn`]: the native `this` first for methods.
    pub fn native_words(&self) -> Vec<u64> {
        let mut words = Vec::with_capacity(self.native_args.len() + 1);
        if self.plan.is_method() {
            words.push(self.native_this() as u64);
        }
        words.extend_from_slice(&self.native_args);
        words
    }

    pub fn resolve_real(&self) -> Option<RealFn> {
        let resolver = &self.interceptor.resolver;
        match self.plan.slot {
            Some(slot) if self.plan.is_method() => resolver.method(self.native_this(), slot),
            _ => resolver.function(self.plan.name()),
        }
    }

    pub fn real_symbol(&self) -> Option<usize> {
        self.interceptor.resolver.symbol(self.plan.name())
    }

    pub fn complete(&mut self, ret: u64) {
        self.result = Some(ret);
    }

    /// Serializes Out/InOut arguments, wrapping produced objects in place.
    ///
    /// # Safety
    ///
    /// The argument words must be valid for their declared types.
    pub unsafe fn capture_post(&mut self) {
        let serializer = self.interceptor.serializer();
        for arg in self.plan.post_call_args() {
            self.after[arg.index] =
                Some(serializer.capture_arg(arg, &self.args, ObjectMode::WrapOut));
        }
    }

    /// Ends the call and returns the word the application receives.
    pub fn finish(mut self) -> u64 {
        let ret = self.result.unwrap_or(0);
        let (ret_value, app_ret) = match &self.plan.ret {
            None => (None, ret),
            Some(ty) => match ty.canonical() {
                Type::Object(interface) => {
                    let (value, handle) = self.interceptor.serializer().object_value(
                        ret as usize,
                        interface.as_deref(),
                        ObjectMode::WrapOut,
                    );
                    (Some(value), handle as u64)
                }
                Type::Primitive(_) | Type::Enum(_) | Type::Flags(_) => {
                    (Some(self.interceptor.serializer().scalar_value(ty, ret)), ret)
                }
                _ => (Some(Value::Pointer(ret)), ret),
            },
        };
        self.apply_refcount();
        self.emit(ret_value, CallStatus::Completed);
        app_ret
    }

    /// Ends a call whose real entry point could not be found. Every declared argument is
    /// recorded; only pre-call values are filled in.
    pub fn unresolved(mut self) -> u64 {
        let sentinel = match self.plan.fail {
            Some(value) => value,
            None if self.plan.ret.is_none() => 0,
            None => {
                tracing::warn!(name = %self.plan.qualified_name, "unresolved entry point has no failure value, returning 0");
                0
            }
        };
        for after in &mut self.after {
            *after = None;
        }
        let ret_value = self.plan.ret.as_ref().map(|ty| match ty.canonical() {
            Type::Primitive(_) | Type::Enum(_) | Type::Flags(_) => {
                self.interceptor.serializer().scalar_value(ty, sentinel)
            }
            _ if sentinel == 0 => Value::Null,
            _ => Value::Pointer(sentinel),
        });
        self.emit(ret_value, CallStatus::Unresolved);
        sentinel
    }

    fn apply_refcount(&self) {
        let Some(this) = &self.this else {
            return;
        };
        let tracker = &self.interceptor.tracker;
        match self.plan.refcount {
            RefEffect::None => {}
            RefEffect::Acquire => {
                tracker.acquire(this.handle());
            }
            RefEffect::Release => {
                if tracker.release(this.handle()) == Some(0) {
                    tracing::debug!(id = %this.id(), "last reference dropped");
                }
            }
        }
    }

    /// Writes one argument record per declared parameter, then the call end.
    fn emit(&mut self, ret: Option<Value>, status: CallStatus) {
        let writer = &self.interceptor.writer;
        for arg in &self.plan.args {
            let before = self.before[arg.index].take();
            let after = self.after[arg.index].take();
            let record = ArgRecord {
                index: arg.index,
                name: arg.name.clone(),
                before,
                after,
            };
            if let Err(err) = writer.write(self.id, record) {
                fatal(&err);
            }
        }
        let end = CallEnd {
            this: self.this.as_ref().map(|w| w.id()),
            ret,
            status,
            memory: std::mem::take(&mut self.memory),
            side_effects: self.plan.side_effects,
        };
        if let Err(err) = writer.end(self.id, end) {
            fatal(&err);
        }
    }
}
