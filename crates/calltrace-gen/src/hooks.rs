//! Customization points consulted while generating shims.
//!
//! Each hook is a boxed callback with a baseline default, so a per-API binding only overrides
//! the points it cares about.

use std::fmt;
use std::sync::Arc;

use calltrace_api::{Api, BoundParam, Interface, ResolvedCallable, SizeHelpers};
use calltrace_trace::{ShadowField, Value};

use crate::frame::CallFrame;
use crate::shader::ShaderFormat;

/// What the serializer sees when choosing how to record one parameter.
#[derive(Clone, Copy)]
pub struct ArgContext<'a> {
    pub api: &'a Api,
    /// Concrete interface the shim is generated for; `None` for free functions.
    pub interface: Option<&'a Interface>,
    pub callable: &'a ResolvedCallable,
    pub param: &'a BoundParam,
    pub index: usize,
}

/// Encoder for a parameter with no table-driven encoding.
///
/// The callback receives the argument word and may read the memory it points to; it is only
/// invoked with words the application passed to the real entry point.
pub type CustomEncodeFn = dyn Fn(u64) -> Value + Send + Sync;

#[derive(Clone)]
pub enum ArgEncoding {
    Default,
    /// Blob holding shader bytecode, recorded as text.
    ShaderText(ShaderFormat),
    /// `void **` output of a `QueryInterface`-style call; the interface is looked up by the IID
    /// passed in parameter `riid`.
    ObjectFromIid { riid: usize },
    Custom {
        label: String,
        encode: Arc<CustomEncodeFn>,
    },
}

impl ArgEncoding {
    pub fn custom(label: &str, encode: impl Fn(u64) -> Value + Send + Sync + 'static) -> Self {
        ArgEncoding::Custom {
            label: label.to_owned(),
            encode: Arc::new(encode),
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, ArgEncoding::Default)
    }
}

impl fmt::Debug for ArgEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgEncoding::Default => f.write_str("Default"),
            ArgEncoding::ShaderText(format) => write!(f, "ShaderText({format:?})"),
            ArgEncoding::ObjectFromIid { riid } => write!(f, "ObjectFromIid({riid})"),
            ArgEncoding::Custom { label, .. } => write!(f, "Custom({label})"),
        }
    }
}

pub type SnippetFn = dyn Fn(&mut CallFrame<'_>) + Send + Sync;

/// Code injected around the real call: source text for emitted shims and the equivalent
/// closure for run-time interception.
#[derive(Clone)]
pub struct Snippet {
    pub code: String,
    pub run: Arc<SnippetFn>,
}

impl Snippet {
    pub fn new(code: &str, run: impl Fn(&mut CallFrame<'_>) + Send + Sync + 'static) -> Self {
        Self {
            code: code.to_owned(),
            run: Arc::new(run),
        }
    }
}

impl fmt::Debug for Snippet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snippet").field("code", &self.code).finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Injection {
    pub pre: Option<Snippet>,
    pub post: Option<Snippet>,
}

impl Injection {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.pre.is_none() && self.post.is_none()
    }
}

pub type SerializeArgHook = Box<dyn Fn(&ArgContext<'_>) -> ArgEncoding + Send + Sync>;
pub type WrapperStateHook = Box<dyn Fn(&Interface) -> Vec<ShadowField> + Send + Sync>;
pub type InjectHook =
    Box<dyn Fn(Option<&Interface>, &ResolvedCallable) -> Injection + Send + Sync>;
pub type VisibilityHook = Box<dyn Fn(&ResolvedCallable) -> bool + Send + Sync>;

pub struct Hooks {
    pub serialize_arg: SerializeArgHook,
    pub wrapper_state: WrapperStateHook,
    pub inject: InjectHook,
    pub is_visible: VisibilityHook,
    /// Implementations of the size helpers the tables declare.
    pub helpers: SizeHelpers,
}

impl Default for Hooks {
    fn default() -> Self {
        Self {
            serialize_arg: Box::new(|_| ArgEncoding::Default),
            wrapper_state: Box::new(|_| Vec::new()),
            inject: Box::new(|_, _| Injection::none()),
            is_visible: Box::new(|callable| callable.callable.exported),
            helpers: SizeHelpers::new(),
        }
    }
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_serialize_arg(
        mut self,
        hook: impl Fn(&ArgContext<'_>) -> ArgEncoding + Send + Sync + 'static,
    ) -> Self {
        self.serialize_arg = Box::new(hook);
        self
    }

    pub fn with_wrapper_state(
        mut self,
        hook: impl Fn(&Interface) -> Vec<ShadowField> + Send + Sync + 'static,
    ) -> Self {
        self.wrapper_state = Box::new(hook);
        self
    }

    pub fn with_inject(
        mut self,
        hook: impl Fn(Option<&Interface>, &ResolvedCallable) -> Injection + Send + Sync + 'static,
    ) -> Self {
        self.inject = Box::new(hook);
        self
    }

    pub fn with_visibility(
        mut self,
        hook: impl Fn(&ResolvedCallable) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.is_visible = Box::new(hook);
        self
    }

    pub fn with_helpers(mut self, helpers: SizeHelpers) -> Self {
        self.helpers.extend(&helpers);
        self
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("helpers", &self.helpers)
            .finish_non_exhaustive()
    }
}
