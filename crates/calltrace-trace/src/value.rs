use std::fmt;

/// Process-wide sequence number of a traced call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallId(pub u64);

/// Stable identity of a traced interface object. Never reused within a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj#{}", self.0)
    }
}

/// A serialized argument, field or return value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    SInt(i64),
    UInt(u64),
    Float(f32),
    Double(f64),
    String(String),
    /// `name` is `None` when the value is not one of the declared enumerators.
    Enum {
        name: Option<String>,
        value: i64,
    },
    /// Raw value plus the declared flag names it decomposes into.
    Flags {
        value: u64,
        names: Vec<String>,
    },
    Struct {
        name: String,
        fields: Vec<(String, Value)>,
    },
    Array(Vec<Value>),
    Blob(Vec<u8>),
    /// Address recorded without following it.
    Pointer(u64),
    Object(ObjectId),
}

impl Value {
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            Value::Blob(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            Value::Object(id) => Some(*id),
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Struct { fields, .. } => fields.iter().find(|(n, _)| n == name).map(|(_, v)| v),
            _ => None,
        }
    }
}

/// One parameter of a call. `before` is captured ahead of the real call (In/InOut), `after`
/// once the real call returned (Out/InOut).
#[derive(Debug, Clone, PartialEq)]
pub struct ArgRecord {
    pub index: usize,
    pub name: String,
    pub before: Option<Value>,
    pub after: Option<Value>,
}

impl ArgRecord {
    /// Most recent value of the argument.
    pub fn value(&self) -> Option<&Value> {
        self.after.as_ref().or(self.before.as_ref())
    }
}

/// Bytes read from application memory while handling a call (e.g. a locked buffer on unlock).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryCapture {
    pub address: u64,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatus {
    Completed,
    /// The real entry point could not be found; the failure sentinel was returned.
    Unresolved,
}

/// Everything known about a call once it finished.
#[derive(Debug, Clone, PartialEq)]
pub struct CallEnd {
    pub this: Option<ObjectId>,
    pub ret: Option<Value>,
    pub status: CallStatus,
    pub memory: Vec<MemoryCapture>,
    pub side_effects: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallRecord {
    pub id: CallId,
    pub name: String,
    pub this: Option<ObjectId>,
    pub args: Vec<ArgRecord>,
    pub ret: Option<Value>,
    pub status: CallStatus,
    pub memory: Vec<MemoryCapture>,
    pub side_effects: bool,
}

impl CallRecord {
    pub fn arg(&self, name: &str) -> Option<&ArgRecord> {
        self.args.iter().find(|a| a.name == name)
    }

    pub(crate) fn assemble(id: CallId, name: String, mut args: Vec<ArgRecord>, end: CallEnd) -> Self {
        args.sort_by_key(|a| a.index);
        Self {
            id,
            name,
            this: end.this,
            args,
            ret: end.ret,
            status: end.status,
            memory: end.memory,
            side_effects: end.side_effects,
        }
    }
}
