//! Trace values, call records and the run-time state shared by generated shims: the writer
//! collaborator, object identities and per-object shadow state.

mod config;
pub mod format;
mod identity;
pub mod stream;
mod value;
mod writer;

pub use config::{TraceConfig, LOG_ENV, OUTPUT_ENV};
pub use identity::{ObjectTracker, Shadow, ShadowField, Wrapper};
pub use stream::{StreamReader, StreamWriter, TraceReadError};
pub use value::{
    ArgRecord, CallEnd, CallId, CallRecord, CallStatus, MemoryCapture, ObjectId, Value,
};
pub use writer::{fatal, CallCounter, MemoryTrace, TraceWriteError, TraceWriter};
