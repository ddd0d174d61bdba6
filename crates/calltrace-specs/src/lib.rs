//! API tables and hooks for the traced graphics APIs.
//!
//! Each module exposes a `builder()` with the declarations and a `hooks()` with the
//! per-API customizations (lock tracking, shader disassembly, attribute lists, ...).
//! [`load`] resolves both by API name.

pub mod d3d11;
pub mod d3d9;
pub mod egl;
pub mod winapi;

use calltrace_api::{Api, ApiBuilder, ApiError};
use calltrace_gen::Hooks;

/// Names accepted by [`builder`] and [`load`].
pub const APIS: [&str; 4] = ["d3d9", "d3d11", "d3d11_1", "egl"];

#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    #[error("unknown API `{0}` (expected one of {APIS:?})")]
    UnknownApi(String),
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// A resolved API table with the hooks its shims are generated with.
pub struct Binding {
    pub api: Api,
    pub hooks: Hooks,
}

pub fn builder(name: &str) -> Result<ApiBuilder, SpecError> {
    Ok(match name {
        "d3d9" => d3d9::builder(),
        "d3d11" => d3d11::builder(),
        "d3d11_1" => d3d11::d3d11_1::builder(),
        "egl" => egl::builder(),
        other => return Err(SpecError::UnknownApi(other.to_owned())),
    })
}

/// Resolves the named API. EGL hooks get a fresh [`egl::ProfileTracker`]; use
/// [`egl::hooks`] directly to share one.
pub fn load(name: &str) -> Result<Binding, SpecError> {
    let api = builder(name)?.resolve()?;
    let hooks = match name {
        "d3d9" => d3d9::hooks(),
        "d3d11" | "d3d11_1" => d3d11::hooks(),
        _ => egl::hooks(egl::ProfileTracker::new()),
    };
    tracing::debug!(api = name, interfaces = api.interfaces().len(), "loaded API table");
    Ok(Binding { api, hooks })
}
