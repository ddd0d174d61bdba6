use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::value::{ArgRecord, CallEnd, CallId, CallRecord};

#[derive(Debug, Error)]
pub enum TraceWriteError {
    #[error("trace I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("{0:?} was never started")]
    UnknownCall(CallId),
    #[error("{call:?}: argument #{index} written twice")]
    DuplicateArg { call: CallId, index: usize },
    #[error("{what} does not fit the trace encoding")]
    TooLarge { what: &'static str },
}

/// Sink for call records.
///
/// A call is opened with [`TraceWriter::begin`], receives one [`ArgRecord`] per parameter and
/// is closed by [`TraceWriter::end`]. Calls from different threads may interleave.
pub trait TraceWriter: Send + Sync {
    fn begin(&self, name: &str) -> Result<CallId, TraceWriteError>;
    fn write(&self, call: CallId, arg: ArgRecord) -> Result<(), TraceWriteError>;
    fn end(&self, call: CallId, end: CallEnd) -> Result<(), TraceWriteError>;
}

/// Writer failures leave the trace in an unknown state; the process stops.
pub fn fatal(err: &TraceWriteError) -> ! {
    tracing::error!(%err, "trace writer failed, aborting");
    std::process::abort()
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Monotonic call-id source.
#[derive(Debug, Default)]
pub struct CallCounter {
    next: AtomicU64,
}

impl CallCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> CallId {
        CallId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug)]
pub(crate) struct PendingCall {
    pub name: String,
    pub args: Vec<ArgRecord>,
}

/// Calls opened but not yet ended.
#[derive(Debug, Default)]
pub(crate) struct PendingCalls {
    calls: Mutex<HashMap<CallId, PendingCall>>,
}

impl PendingCalls {
    pub fn open(&self, id: CallId, name: &str) {
        lock(&self.calls).insert(
            id,
            PendingCall {
                name: name.to_owned(),
                args: Vec::new(),
            },
        );
    }

    pub fn push(&self, id: CallId, arg: ArgRecord) -> Result<(), TraceWriteError> {
        let mut calls = lock(&self.calls);
        let call = calls.get_mut(&id).ok_or(TraceWriteError::UnknownCall(id))?;
        if call.args.iter().any(|a| a.index == arg.index) {
            return Err(TraceWriteError::DuplicateArg {
                call: id,
                index: arg.index,
            });
        }
        call.args.push(arg);
        Ok(())
    }

    pub fn close(&self, id: CallId, end: CallEnd) -> Result<CallRecord, TraceWriteError> {
        let call = lock(&self.calls)
            .remove(&id)
            .ok_or(TraceWriteError::UnknownCall(id))?;
        Ok(CallRecord::assemble(id, call.name, call.args, end))
    }
}

/// Keeps finished records in memory, in completion order.
#[derive(Debug, Default)]
pub struct MemoryTrace {
    counter: CallCounter,
    pending: PendingCalls,
    records: Mutex<Vec<CallRecord>>,
}

impl MemoryTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<CallRecord> {
        lock(&self.records).clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.records).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Last finished record with the given qualified name.
    pub fn last(&self, name: &str) -> Option<CallRecord> {
        lock(&self.records)
            .iter()
            .rev()
            .find(|r| r.name == name)
            .cloned()
    }
}

impl TraceWriter for MemoryTrace {
    fn begin(&self, name: &str) -> Result<CallId, TraceWriteError> {
        let id = self.counter.next();
        self.pending.open(id, name);
        Ok(id)
    }

    fn write(&self, call: CallId, arg: ArgRecord) -> Result<(), TraceWriteError> {
        self.pending.push(call, arg)
    }

    fn end(&self, call: CallId, end: CallEnd) -> Result<(), TraceWriteError> {
        let record = self.pending.close(call, end)?;
        lock(&self.records).push(record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{CallStatus, Value};

    fn end() -> CallEnd {
        CallEnd {
            this: None,
            ret: None,
            status: CallStatus::Completed,
            memory: Vec::new(),
            side_effects: true,
        }
    }

    #[test]
    fn ids_increase_and_args_are_ordered() {
        let trace = MemoryTrace::new();
        let a = trace.begin("f").unwrap();
        let b = trace.begin("g").unwrap();
        assert!(b > a);
        trace
            .write(
                a,
                ArgRecord {
                    index: 1,
                    name: "y".into(),
                    before: Some(Value::UInt(2)),
                    after: None,
                },
            )
            .unwrap();
        trace
            .write(
                a,
                ArgRecord {
                    index: 0,
                    name: "x".into(),
                    before: Some(Value::UInt(1)),
                    after: None,
                },
            )
            .unwrap();
        trace.end(a, end()).unwrap();
        let record = trace.last("f").unwrap();
        let names: Vec<_> = record.args.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["x", "y"]);
    }

    #[test]
    fn ending_an_unknown_call_fails() {
        let trace = MemoryTrace::new();
        assert!(matches!(
            trace.end(CallId(42), end()),
            Err(TraceWriteError::UnknownCall(CallId(42)))
        ));
    }

    #[test]
    fn duplicate_argument_is_rejected() {
        let trace = MemoryTrace::new();
        let id = trace.begin("f").unwrap();
        let arg = ArgRecord {
            index: 0,
            name: "x".into(),
            before: None,
            after: None,
        };
        trace.write(id, arg.clone()).unwrap();
        assert!(matches!(
            trace.write(id, arg),
            Err(TraceWriteError::DuplicateArg { index: 0, .. })
        ));
    }
}
