use std::io::{self, Read, Write};
use std::sync::Mutex;

use thiserror::Error;

use crate::format::{
    ValueTag, MAX_VALUE_DEPTH, STATUS_COMPLETED, STATUS_UNRESOLVED, TRACE_MAGIC, TRACE_VERSION,
};
use crate::value::{
    ArgRecord, CallEnd, CallId, CallRecord, CallStatus, MemoryCapture, ObjectId, Value,
};
use crate::writer::{lock, CallCounter, PendingCalls, TraceWriteError, TraceWriter};

#[derive(Debug, Error)]
pub enum TraceReadError {
    #[error("trace I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("not a calltrace stream")]
    InvalidMagic,
    #[error("unsupported trace version {0}")]
    UnsupportedVersion(u32),
    #[error("unknown value tag {0}")]
    UnknownValueTag(u8),
    #[error("unknown call status {0}")]
    UnknownStatus(u8),
    #[error("value nesting exceeds {MAX_VALUE_DEPTH} levels")]
    TooDeep,
    #[error("malformed record: {0}")]
    Malformed(&'static str),
}

fn put_u8(out: &mut Vec<u8>, v: u8) {
    out.push(v);
}

fn put_u32(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn put_u64(out: &mut Vec<u8>, v: u64) {
    out.extend_from_slice(&v.to_le_bytes());
}

fn put_len(out: &mut Vec<u8>, len: usize, what: &'static str) -> Result<(), TraceWriteError> {
    let len = u32::try_from(len).map_err(|_| TraceWriteError::TooLarge { what })?;
    put_u32(out, len);
    Ok(())
}

fn put_bytes(out: &mut Vec<u8>, bytes: &[u8]) -> Result<(), TraceWriteError> {
    put_len(out, bytes.len(), "byte string")?;
    out.extend_from_slice(bytes);
    Ok(())
}

fn put_str(out: &mut Vec<u8>, s: &str) -> Result<(), TraceWriteError> {
    put_bytes(out, s.as_bytes())
}

fn put_opt_value(out: &mut Vec<u8>, value: Option<&Value>) -> Result<(), TraceWriteError> {
    match value {
        None => put_u8(out, 0),
        Some(v) => {
            put_u8(out, 1);
            encode_value(out, v)?;
        }
    }
    Ok(())
}

pub fn encode_value(out: &mut Vec<u8>, value: &Value) -> Result<(), TraceWriteError> {
    match value {
        Value::Null => put_u8(out, ValueTag::Null as u8),
        Value::Bool(b) => {
            put_u8(out, ValueTag::Bool as u8);
            put_u8(out, *b as u8);
        }
        Value::SInt(v) => {
            put_u8(out, ValueTag::SInt as u8);
            put_u64(out, *v as u64);
        }
        Value::UInt(v) => {
            put_u8(out, ValueTag::UInt as u8);
            put_u64(out, *v);
        }
        Value::Float(v) => {
            put_u8(out, ValueTag::Float as u8);
            put_u32(out, v.to_bits());
        }
        Value::Double(v) => {
            put_u8(out, ValueTag::Double as u8);
            put_u64(out, v.to_bits());
        }
        Value::String(s) => {
            put_u8(out, ValueTag::String as u8);
            put_str(out, s)?;
        }
        Value::Enum { name, value } => {
            put_u8(out, ValueTag::Enum as u8);
            match name {
                Some(name) => {
                    put_u8(out, 1);
                    put_str(out, name)?;
                }
                None => put_u8(out, 0),
            }
            put_u64(out, *value as u64);
        }
        Value::Flags { value, names } => {
            put_u8(out, ValueTag::Flags as u8);
            put_u64(out, *value);
            put_len(out, names.len(), "flag list")?;
            for name in names {
                put_str(out, name)?;
            }
        }
        Value::Struct { name, fields } => {
            put_u8(out, ValueTag::Struct as u8);
            put_str(out, name)?;
            put_len(out, fields.len(), "struct")?;
            for (field, v) in fields {
                put_str(out, field)?;
                encode_value(out, v)?;
            }
        }
        Value::Array(items) => {
            put_u8(out, ValueTag::Array as u8);
            put_len(out, items.len(), "array")?;
            for item in items {
                encode_value(out, item)?;
            }
        }
        Value::Blob(bytes) => {
            put_u8(out, ValueTag::Blob as u8);
            put_bytes(out, bytes)?;
        }
        Value::Pointer(addr) => {
            put_u8(out, ValueTag::Pointer as u8);
            put_u64(out, *addr);
        }
        Value::Object(id) => {
            put_u8(out, ValueTag::Object as u8);
            put_u64(out, id.0);
        }
    }
    Ok(())
}

pub fn encode_record(record: &CallRecord) -> Result<Vec<u8>, TraceWriteError> {
    let mut out = Vec::new();
    put_u64(&mut out, record.id.0);
    put_str(&mut out, &record.name)?;
    match record.this {
        Some(id) => {
            put_u8(&mut out, 1);
            put_u64(&mut out, id.0);
        }
        None => put_u8(&mut out, 0),
    }
    put_len(&mut out, record.args.len(), "argument list")?;
    for arg in &record.args {
        put_len(&mut out, arg.index, "argument index")?;
        put_str(&mut out, &arg.name)?;
        put_opt_value(&mut out, arg.before.as_ref())?;
        put_opt_value(&mut out, arg.after.as_ref())?;
    }
    put_opt_value(&mut out, record.ret.as_ref())?;
    put_u8(
        &mut out,
        match record.status {
            CallStatus::Completed => STATUS_COMPLETED,
            CallStatus::Unresolved => STATUS_UNRESOLVED,
        },
    );
    put_len(&mut out, record.memory.len(), "memory list")?;
    for capture in &record.memory {
        put_u64(&mut out, capture.address);
        put_bytes(&mut out, &capture.bytes)?;
    }
    put_u8(&mut out, record.side_effects as u8);
    Ok(out)
}

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], TraceReadError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.buf.len())
            .ok_or(TraceReadError::Malformed("field runs past end of record"))?;
        let out = &self.buf[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, TraceReadError> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32, TraceReadError> {
        let mut b = [0u8; 4];
        b.copy_from_slice(self.take(4)?);
        Ok(u32::from_le_bytes(b))
    }

    fn u64(&mut self) -> Result<u64, TraceReadError> {
        let mut b = [0u8; 8];
        b.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(b))
    }

    fn bytes(&mut self) -> Result<Vec<u8>, TraceReadError> {
        let len = self.u32()? as usize;
        Ok(self.take(len)?.to_vec())
    }

    fn string(&mut self) -> Result<String, TraceReadError> {
        String::from_utf8(self.bytes()?).map_err(|_| TraceReadError::Malformed("invalid UTF-8"))
    }

    /// Element count, bounded by the remaining bytes so hostile counts cannot force huge
    /// allocations.
    fn count(&mut self) -> Result<usize, TraceReadError> {
        let n = self.u32()? as usize;
        if n > self.buf.len() - self.pos {
            return Err(TraceReadError::Malformed("count exceeds record size"));
        }
        Ok(n)
    }

    fn flag(&mut self) -> Result<bool, TraceReadError> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(TraceReadError::Malformed("invalid presence byte")),
        }
    }

    fn opt_value(&mut self) -> Result<Option<Value>, TraceReadError> {
        if self.flag()? {
            Ok(Some(self.value(0)?))
        } else {
            Ok(None)
        }
    }

    fn value(&mut self, depth: usize) -> Result<Value, TraceReadError> {
        if depth > MAX_VALUE_DEPTH {
            return Err(TraceReadError::TooDeep);
        }
        let raw = self.u8()?;
        let tag = ValueTag::from_u8(raw).ok_or(TraceReadError::UnknownValueTag(raw))?;
        Ok(match tag {
            ValueTag::Null => Value::Null,
            ValueTag::Bool => Value::Bool(self.flag()?),
            ValueTag::SInt => Value::SInt(self.u64()? as i64),
            ValueTag::UInt => Value::UInt(self.u64()?),
            ValueTag::Float => Value::Float(f32::from_bits(self.u32()?)),
            ValueTag::Double => Value::Double(f64::from_bits(self.u64()?)),
            ValueTag::String => Value::String(self.string()?),
            ValueTag::Enum => {
                let name = if self.flag()? {
                    Some(self.string()?)
                } else {
                    None
                };
                Value::Enum {
                    name,
                    value: self.u64()? as i64,
                }
            }
            ValueTag::Flags => {
                let value = self.u64()?;
                let n = self.count()?;
                let mut names = Vec::with_capacity(n);
                for _ in 0..n {
                    names.push(self.string()?);
                }
                Value::Flags { value, names }
            }
            ValueTag::Struct => {
                let name = self.string()?;
                let n = self.count()?;
                let mut fields = Vec::with_capacity(n);
                for _ in 0..n {
                    let field = self.string()?;
                    fields.push((field, self.value(depth + 1)?));
                }
                Value::Struct { name, fields }
            }
            ValueTag::Array => {
                let n = self.count()?;
                let mut items = Vec::with_capacity(n);
                for _ in 0..n {
                    items.push(self.value(depth + 1)?);
                }
                Value::Array(items)
            }
            ValueTag::Blob => Value::Blob(self.bytes()?),
            ValueTag::Pointer => Value::Pointer(self.u64()?),
            ValueTag::Object => Value::Object(ObjectId(self.u64()?)),
        })
    }
}

pub fn decode_value(bytes: &[u8]) -> Result<Value, TraceReadError> {
    let mut cursor = Cursor { buf: bytes, pos: 0 };
    let value = cursor.value(0)?;
    if cursor.pos != bytes.len() {
        return Err(TraceReadError::Malformed("trailing bytes after value"));
    }
    Ok(value)
}

pub fn decode_record(payload: &[u8]) -> Result<CallRecord, TraceReadError> {
    let mut c = Cursor {
        buf: payload,
        pos: 0,
    };
    let id = CallId(c.u64()?);
    let name = c.string()?;
    let this = if c.flag()? {
        Some(ObjectId(c.u64()?))
    } else {
        None
    };
    let argc = c.count()?;
    let mut args = Vec::with_capacity(argc);
    for _ in 0..argc {
        let index = c.u32()? as usize;
        let name = c.string()?;
        let before = c.opt_value()?;
        let after = c.opt_value()?;
        args.push(ArgRecord {
            index,
            name,
            before,
            after,
        });
    }
    let ret = c.opt_value()?;
    let status = match c.u8()? {
        STATUS_COMPLETED => CallStatus::Completed,
        STATUS_UNRESOLVED => CallStatus::Unresolved,
        other => return Err(TraceReadError::UnknownStatus(other)),
    };
    let memc = c.count()?;
    let mut memory = Vec::with_capacity(memc);
    for _ in 0..memc {
        let address = c.u64()?;
        let bytes = c.bytes()?;
        memory.push(MemoryCapture { address, bytes });
    }
    let side_effects = c.flag()?;
    if c.pos != payload.len() {
        return Err(TraceReadError::Malformed("trailing bytes after record"));
    }
    Ok(CallRecord {
        id,
        name,
        this,
        args,
        ret,
        status,
        memory,
        side_effects,
    })
}

/// Writes length-prefixed records to any byte sink, one record per finished call.
pub struct StreamWriter<W> {
    counter: CallCounter,
    pending: PendingCalls,
    sink: Mutex<W>,
}

impl<W: Write + Send> StreamWriter<W> {
    pub fn new(mut sink: W) -> Result<Self, TraceWriteError> {
        sink.write_all(&TRACE_MAGIC)?;
        sink.write_all(&TRACE_VERSION.to_le_bytes())?;
        Ok(Self {
            counter: CallCounter::new(),
            pending: PendingCalls::default(),
            sink: Mutex::new(sink),
        })
    }

    pub fn flush(&self) -> Result<(), TraceWriteError> {
        lock(&self.sink).flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.sink
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl<W: Write + Send> TraceWriter for StreamWriter<W> {
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
        let payload = encode_record(&record)?;
        let len = u32::try_from(payload.len())
            .map_err(|_| TraceWriteError::TooLarge { what: "record" })?;
        let mut sink = lock(&self.sink);
        sink.write_all(&len.to_le_bytes())?;
        sink.write_all(&payload)?;
        Ok(())
    }
}

/// Reads records back from a stream produced by [`StreamWriter`].
///
/// A record cut short by end of input (the traced process died mid-write) ends iteration
/// instead of failing; [`StreamReader::truncated`] reports it.
pub struct StreamReader<R> {
    reader: R,
    pub version: u32,
    truncated: bool,
}

/// Reads until `buf` is full or the input ends; returns how much was read.
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

impl<R: Read> StreamReader<R> {
    pub fn new(mut reader: R) -> Result<Self, TraceReadError> {
        let mut magic = [0u8; 8];
        if read_up_to(&mut reader, &mut magic)? != magic.len() || magic != TRACE_MAGIC {
            return Err(TraceReadError::InvalidMagic);
        }
        let mut version = [0u8; 4];
        if read_up_to(&mut reader, &mut version)? != version.len() {
            return Err(TraceReadError::InvalidMagic);
        }
        let version = u32::from_le_bytes(version);
        if version != TRACE_VERSION {
            return Err(TraceReadError::UnsupportedVersion(version));
        }
        Ok(Self {
            reader,
            version,
            truncated: false,
        })
    }

    pub fn truncated(&self) -> bool {
        self.truncated
    }

    pub fn next_record(&mut self) -> Result<Option<CallRecord>, TraceReadError> {
        if self.truncated {
            return Ok(None);
        }
        let mut len = [0u8; 4];
        match read_up_to(&mut self.reader, &mut len)? {
            0 => return Ok(None),
            4 => {}
            _ => {
                self.truncated = true;
                return Ok(None);
            }
        }
        let len = u32::from_le_bytes(len) as usize;
        let mut payload = Vec::new();
        let got = (&mut self.reader)
            .take(len as u64)
            .read_to_end(&mut payload)?;
        if got != len {
            tracing::warn!(expected = len, got, "trace ends inside a record");
            self.truncated = true;
            return Ok(None);
        }
        decode_record(&payload).map(Some)
    }

    pub fn read_all(&mut self) -> Result<Vec<CallRecord>, TraceReadError> {
        let mut out = Vec::new();
        while let Some(record) = self.next_record()? {
            out.push(record);
        }
        Ok(out)
    }
}
