//! Exported shims for the traced APIs, emitted at build time.
//!
//! Each module holds the `#[no_mangle]` entry points, vtables and `install` function for one
//! API. Nothing records until `install` has been given an interceptor built from the same
//! tables; a shim called before that aborts the process.

#[allow(
    non_snake_case,
    non_camel_case_types,
    non_upper_case_globals,
    dead_code,
    clippy::missing_safety_doc,
    clippy::too_many_arguments
)]
pub mod d3d9 {
    include!(concat!(env!("OUT_DIR"), "/d3d9.rs"));
}

#[allow(
    non_snake_case,
    non_camel_case_types,
    non_upper_case_globals,
    dead_code,
    clippy::missing_safety_doc,
    clippy::too_many_arguments
)]
pub mod d3d11_1 {
    include!(concat!(env!("OUT_DIR"), "/d3d11_1.rs"));
}

#[allow(
    non_snake_case,
    non_camel_case_types,
    non_upper_case_globals,
    dead_code,
    clippy::missing_safety_doc,
    clippy::too_many_arguments
)]
pub mod egl {
    include!(concat!(env!("OUT_DIR"), "/egl.rs"));
}
