//! Shim generation for resolved API tables.
//!
//! [`Generator`] turns an [`calltrace_api::Api`] plus [`Hooks`] into one [`ShimPlan`] per
//! function and per interface slot. Plans are either rendered as Rust source by
//! [`RustEmitter`] or executed directly by an [`Interceptor`].

mod capture;
mod emit;
mod frame;
mod hooks;
mod interceptor;
mod plan;
pub mod shader;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use emit::RustEmitter;
pub use frame::CallFrame;
pub use hooks::{
    ArgContext, ArgEncoding, CustomEncodeFn, Hooks, InjectHook, Injection, SerializeArgHook,
    Snippet, SnippetFn, VisibilityHook, WrapperStateHook,
};
pub use interceptor::{vtable_entry, InterceptError, Interceptor, RealFn, Resolver, ShimCall};
pub use plan::{ArgPlan, GenError, GeneratedApi, Generator, InterfacePlan, ShimPlan};
pub use shader::ShaderFormat;
