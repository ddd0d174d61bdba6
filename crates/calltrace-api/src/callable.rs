use crate::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    In,
    Out,
    InOut,
}

impl Direction {
    /// Whether the value may be read before the real call.
    pub fn reads_before(self) -> bool {
        matches!(self, Direction::In | Direction::InOut)
    }

    /// Whether the value is (re)read after the real call.
    pub fn reads_after(self) -> bool {
        matches!(self, Direction::Out | Direction::InOut)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: Type,
    pub direction: Direction,
}

/// Reference-count effect of a method on its `this` object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefEffect {
    #[default]
    None,
    /// `AddRef`-style: the caller gains one reference.
    Acquire,
    /// `Release`-style: the caller gives one reference back.
    Release,
}

/// A free function or an interface method.
#[derive(Debug, Clone, PartialEq)]
pub struct Callable {
    pub name: String,
    pub ret: Type,
    pub params: Vec<Param>,
    pub side_effects: bool,
    /// Word returned to the caller when the real entry point cannot be resolved.
    pub fail: Option<u64>,
    pub refcount: RefEffect,
    /// Whether the table declares this entry point as a public symbol.
    pub exported: bool,
}

impl Callable {
    pub fn new(ret: Type, name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ret,
            params: Vec::new(),
            side_effects: true,
            fail: None,
            refcount: RefEffect::None,
            exported: true,
        }
    }

    pub fn arg(self, ty: Type, name: &str) -> Self {
        self.param(Direction::In, ty, name)
    }

    pub fn out(self, ty: Type, name: &str) -> Self {
        self.param(Direction::Out, ty, name)
    }

    pub fn inout(self, ty: Type, name: &str) -> Self {
        self.param(Direction::InOut, ty, name)
    }

    pub fn param(mut self, direction: Direction, ty: Type, name: &str) -> Self {
        self.params.push(Param {
            name: name.to_owned(),
            ty,
            direction,
        });
        self
    }

    pub fn no_side_effects(mut self) -> Self {
        self.side_effects = false;
        self
    }

    pub fn fail(mut self, value: i64) -> Self {
        self.fail = Some(value as u64);
        self
    }

    pub fn acquires(mut self) -> Self {
        self.refcount = RefEffect::Acquire;
        self
    }

    pub fn releases(mut self) -> Self {
        self.refcount = RefEffect::Release;
        self
    }

    /// Marks an entry point that is not exported by default (e.g. extensions only reachable
    /// through a `GetProcAddress`-style lookup).
    pub fn internal(mut self) -> Self {
        self.exported = false;
        self
    }

    pub fn param_index(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name == name)
    }

    pub fn arg_names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }

    pub fn returns_value(&self) -> bool {
        !self.ret.is_void()
    }
}
