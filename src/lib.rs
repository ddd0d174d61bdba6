//! Call tracing for object-oriented native graphics APIs.
//!
//! The pieces live in their own crates and are re-exported here:
//!
//! - [`api`]: declarative API tables (types, interfaces, size expressions).
//! - [`trace`]: trace values, records, writers and object identities.
//! - [`gen`]: shim plans, the run-time interceptor and the Rust source emitter.
//! - [`specs`]: the D3D9, D3D11/11.1 and EGL tables with their hooks.
//!
//! [`interceptor`] wires them together for one named API.

use std::sync::Arc;

pub use calltrace_api as api;
pub use calltrace_gen as gen;
pub use calltrace_specs as specs;
pub use calltrace_trace as trace;

use calltrace_gen::{GenError, Generator, Interceptor, Resolver};
use calltrace_specs::SpecError;
use calltrace_trace::{ObjectTracker, TraceWriter};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Spec(#[from] SpecError),
    #[error(transparent)]
    Gen(#[from] GenError),
}

/// Generates the shim plans of `api` and returns an interceptor executing them.
pub fn interceptor(
    api: &str,
    writer: Arc<dyn TraceWriter>,
    resolver: Arc<dyn Resolver>,
) -> Result<Interceptor, Error> {
    let binding = calltrace_specs::load(api)?;
    let generated = Generator::new(&binding.api, &binding.hooks).generate()?;
    tracing::debug!(api, shims = generated.shim_count(), "interceptor ready");
    Ok(Interceptor::new(Arc::new(generated), writer, resolver))
}

/// Like [`interceptor`], sharing `tracker` so objects keep one identity across APIs
/// (e.g. a D3D9 device used alongside D3D11 in one process).
pub fn interceptor_with_tracker(
    api: &str,
    writer: Arc<dyn TraceWriter>,
    resolver: Arc<dyn Resolver>,
    tracker: Arc<ObjectTracker>,
) -> Result<Interceptor, Error> {
    Ok(interceptor(api, writer, resolver)?.with_tracker(tracker))
}
