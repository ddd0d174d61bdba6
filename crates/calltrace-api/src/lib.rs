//! Declarative description of native object-oriented APIs.
//!
//! Tables are assembled with [`ApiBuilder`], composed and extended in place, then validated and
//! frozen by [`ApiBuilder::resolve`]. The resulting [`Api`] is immutable and is what the shim
//! generator consumes.

mod callable;
pub mod native;
mod registry;
pub mod size;
mod types;

pub use callable::{Callable, Direction, Param, RefEffect};
pub use registry::{
    Api, ApiBuilder, ApiError, BoundParam, Interface, ResolvedCallable, ResolvedField,
    ResolvedStruct,
};
pub use size::{BoundExpr, BoundSize, EvalError, ExtentKind, SizeExprError, SizeHelperFn, SizeHelpers};
pub use types::{
    EnumDef, EnumValue, Field, FlagBit, FlagsDef, Guid, Layout, Primitive, SizeSpec, StringKind,
    StructDef, Type,
};
