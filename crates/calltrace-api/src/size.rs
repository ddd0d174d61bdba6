//! Size expressions: the formulas relating an array/blob extent to sibling values.
//!
//! An expression is parsed from its table spelling, bound once against the parameter list (or
//! struct field list) it lives in, and evaluated at run time against concrete argument words.
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := '*' unary | postfix
//! postfix := primary ('->' ident)*
//! primary := number | ident | ident '(' args ')' | 'sizeof' '(' ident ')' | '(' expr ')'
//! ```

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::callable::Direction;
use crate::native;
use crate::types::{Primitive, Type};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    pub fn symbol(self) -> char {
        match self {
            BinOp::Add => '+',
            BinOp::Sub => '-',
            BinOp::Mul => '*',
            BinOp::Div => '/',
        }
    }
}

/// Parsed, unbound expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Num(u64),
    Name(String),
    Deref(Box<Expr>),
    Field(Box<Expr>, String),
    Binary(BinOp, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
    SizeOf(String),
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Num(n) => write!(f, "{n}"),
            Expr::Name(name) => f.write_str(name),
            Expr::Deref(inner) => write!(f, "*{inner}"),
            Expr::Field(base, field) => write!(f, "{base}->{field}"),
            Expr::Binary(op, lhs, rhs) => write!(f, "({lhs} {} {rhs})", op.symbol()),
            Expr::Call(name, args) => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i != 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            Expr::SizeOf(name) => write!(f, "sizeof({name})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SizeExprError {
    #[error("syntax error at offset {offset}: {message}")]
    Syntax { offset: usize, message: String },
    #[error("`{0}` does not name a sibling parameter, field or constant")]
    UnknownName(String),
    #[error("`{name}` is written by the call and cannot be read before it")]
    OutBeforeCall { name: String },
    #[error("cannot dereference `{0}`: not a pointer to an integer")]
    InvalidDeref(String),
    #[error("`{base}` does not point to a struct with an integer field `{field}`")]
    InvalidField { base: String, field: String },
    #[error("unknown size helper `{0}`")]
    UnknownHelper(String),
    #[error("size helper `{name}` takes {expected} argument(s), got {got}")]
    HelperArity {
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("unknown type `{0}` in sizeof")]
    UnknownSizeOf(String),
    #[error("struct field array count `{0}` is not a constant")]
    NotConstant(String),
}

pub fn parse(source: &str) -> Result<Expr, SizeExprError> {
    let mut parser = Parser {
        src: source.as_bytes(),
        pos: 0,
    };
    let expr = parser.expr()?;
    parser.skip_ws();
    if parser.pos != parser.src.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(expr)
}

struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, message: &str) -> SizeExprError {
        SizeExprError::Syntax {
            offset: self.pos,
            message: message.to_owned(),
        }
    }

    fn skip_ws(&mut self) {
        while self.pos < self.src.len() && self.src[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<u8> {
        self.skip_ws();
        self.src.get(self.pos).copied()
    }

    fn eat(&mut self, c: u8) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_arrow(&mut self) -> bool {
        self.skip_ws();
        if self.src[self.pos..].starts_with(b"->") {
            self.pos += 2;
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> Result<Expr, SizeExprError> {
        let mut lhs = self.term()?;
        loop {
            self.skip_ws();
            if self.src[self.pos..].starts_with(b"->") {
                return Err(self.error("`->` must follow an operand"));
            }
            let op = match self.peek() {
                Some(b'+') => BinOp::Add,
                Some(b'-') => BinOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn term(&mut self) -> Result<Expr, SizeExprError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(b'*') => BinOp::Mul,
                Some(b'/') => BinOp::Div,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn unary(&mut self) -> Result<Expr, SizeExprError> {
        if self.eat(b'*') {
            let inner = self.unary()?;
            return Ok(Expr::Deref(Box::new(inner)));
        }
        let mut expr = self.primary()?;
        while self.eat_arrow() {
            let field = self
                .ident()
                .ok_or_else(|| self.error("expected field name after `->`"))?;
            expr = Expr::Field(Box::new(expr), field);
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, SizeExprError> {
        match self.peek() {
            Some(b'(') => {
                self.pos += 1;
                let inner = self.expr()?;
                if !self.eat(b')') {
                    return Err(self.error("expected `)`"));
                }
                Ok(inner)
            }
            Some(c) if c.is_ascii_digit() => self.number(),
            Some(c) if c.is_ascii_alphabetic() || c == b'_' => {
                let name = self.ident().ok_or_else(|| self.error("expected identifier"))?;
                if !self.eat(b'(') {
                    return Ok(Expr::Name(name));
                }
                if name == "sizeof" {
                    let ty = self
                        .ident()
                        .ok_or_else(|| self.error("expected type name in sizeof"))?;
                    if !self.eat(b')') {
                        return Err(self.error("expected `)` after sizeof type"));
                    }
                    return Ok(Expr::SizeOf(ty));
                }
                let mut args = Vec::new();
                if !self.eat(b')') {
                    loop {
                        args.push(self.expr()?);
                        if self.eat(b',') {
                            continue;
                        }
                        if self.eat(b')') {
                            break;
                        }
                        return Err(self.error("expected `,` or `)` in argument list"));
                    }
                }
                Ok(Expr::Call(name, args))
            }
            Some(_) => Err(self.error("unexpected character")),
            None => Err(self.error("unexpected end of expression")),
        }
    }

    fn ident(&mut self) -> Option<String> {
        self.skip_ws();
        let start = self.pos;
        while self.pos < self.src.len()
            && (self.src[self.pos].is_ascii_alphanumeric() || self.src[self.pos] == b'_')
        {
            self.pos += 1;
        }
        if start == self.pos || self.src[start].is_ascii_digit() {
            self.pos = start;
            return None;
        }
        std::str::from_utf8(&self.src[start..self.pos])
            .ok()
            .map(str::to_owned)
    }

    fn number(&mut self) -> Result<Expr, SizeExprError> {
        let start = self.pos;
        let (radix, digits_start) = if self.src[self.pos..].starts_with(b"0x")
            || self.src[self.pos..].starts_with(b"0X")
        {
            (16, self.pos + 2)
        } else {
            (10, self.pos)
        };
        self.pos = digits_start;
        while self.pos < self.src.len() && self.src[self.pos].is_ascii_hexdigit() {
            if radix == 10 && !self.src[self.pos].is_ascii_digit() {
                break;
            }
            self.pos += 1;
        }
        let digits = std::str::from_utf8(&self.src[digits_start..self.pos]).unwrap_or("");
        let value = u64::from_str_radix(digits, radix).map_err(|_| SizeExprError::Syntax {
            offset: start,
            message: "invalid number".to_owned(),
        })?;
        // Tolerate C integer suffixes (`4u`, `16UL`).
        while self.pos < self.src.len() && matches!(self.src[self.pos], b'u' | b'U' | b'l' | b'L')
        {
            self.pos += 1;
        }
        Ok(Expr::Num(value))
    }
}

/// Expression bound to concrete sibling positions, field offsets and constants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundExpr {
    Const(u64),
    /// Word of the sibling at this position.
    Arg(usize),
    /// Integer read through a pointer. A null pointer reads as 0.
    Deref {
        inner: Box<BoundExpr>,
        prim: Primitive,
    },
    /// Integer field read through a struct pointer. A null pointer reads as 0.
    Field {
        base: Box<BoundExpr>,
        offset: usize,
        prim: Primitive,
    },
    Binary {
        op: BinOp,
        lhs: Box<BoundExpr>,
        rhs: Box<BoundExpr>,
    },
    Helper {
        name: String,
        args: Vec<BoundExpr>,
    },
}

impl BoundExpr {
    /// Folds the expression when it references no run-time value.
    pub fn as_const(&self) -> Option<u64> {
        match self {
            BoundExpr::Const(v) => Some(*v),
            BoundExpr::Binary { op, lhs, rhs } => {
                apply(*op, lhs.as_const()?, rhs.as_const()?).ok()
            }
            _ => None,
        }
    }

    /// Sibling positions this expression reads.
    pub fn references(&self) -> Vec<usize> {
        let mut out = Vec::new();
        self.collect_refs(&mut out);
        out.sort_unstable();
        out.dedup();
        out
    }

    fn collect_refs(&self, out: &mut Vec<usize>) {
        match self {
            BoundExpr::Const(_) => {}
            BoundExpr::Arg(i) => out.push(*i),
            BoundExpr::Deref { inner, .. } => inner.collect_refs(out),
            BoundExpr::Field { base, .. } => base.collect_refs(out),
            BoundExpr::Binary { lhs, rhs, .. } => {
                lhs.collect_refs(out);
                rhs.collect_refs(out);
            }
            BoundExpr::Helper { args, .. } => {
                for arg in args {
                    arg.collect_refs(out);
                }
            }
        }
    }

    /// Evaluates against argument words.
    ///
    /// # Safety
    ///
    /// Every pointer the expression dereferences (directly or through a helper) must be either
    /// null or valid for reads of the pointed-to integer.
    pub unsafe fn evaluate<B: Bindings + ?Sized>(
        &self,
        bindings: &B,
        helpers: &SizeHelpers,
    ) -> Result<u64, EvalError> {
        match self {
            BoundExpr::Const(v) => Ok(*v),
            BoundExpr::Arg(i) => bindings.word(*i).ok_or(EvalError::Unbound(*i)),
            BoundExpr::Deref { inner, prim } => {
                let addr = inner.evaluate(bindings, helpers)?;
                if addr == 0 {
                    return Ok(0);
                }
                Ok(native::read_word(addr as usize, *prim))
            }
            BoundExpr::Field { base, offset, prim } => {
                let addr = base.evaluate(bindings, helpers)?;
                if addr == 0 {
                    return Ok(0);
                }
                Ok(native::read_word(addr as usize + offset, *prim))
            }
            BoundExpr::Binary { op, lhs, rhs } => {
                let l = lhs.evaluate(bindings, helpers)?;
                let r = rhs.evaluate(bindings, helpers)?;
                apply(*op, l, r)
            }
            BoundExpr::Helper { name, args } => {
                let helper = helpers
                    .get(name)
                    .ok_or_else(|| EvalError::MissingHelper(name.clone()))?;
                let mut words = Vec::with_capacity(args.len());
                for arg in args {
                    words.push(arg.evaluate(bindings, helpers)?);
                }
                helper(&words)
            }
        }
    }
}

fn apply(op: BinOp, l: u64, r: u64) -> Result<u64, EvalError> {
    match op {
        BinOp::Add => l.checked_add(r).ok_or(EvalError::Overflow),
        BinOp::Sub => l.checked_sub(r).ok_or(EvalError::Negative),
        BinOp::Mul => l.checked_mul(r).ok_or(EvalError::Overflow),
        BinOp::Div => l.checked_div(r).ok_or(EvalError::DivideByZero),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("size expression overflowed")]
    Overflow,
    #[error("size expression is negative")]
    Negative,
    #[error("size expression divides by zero")]
    DivideByZero,
    #[error("no implementation registered for size helper `{0}`")]
    MissingHelper(String),
    #[error("size expression reads sibling #{0}, which has no value in this phase")]
    Unbound(usize),
}

/// Source of sibling words during evaluation.
pub trait Bindings {
    fn word(&self, index: usize) -> Option<u64>;
}

impl Bindings for [u64] {
    fn word(&self, index: usize) -> Option<u64> {
        self.get(index).copied()
    }
}

impl Bindings for Vec<u64> {
    fn word(&self, index: usize) -> Option<u64> {
        self.get(index).copied()
    }
}

/// Run-time implementation of a declared size helper. Receives the evaluated argument words
/// and reports overflow with [`EvalError::Overflow`].
pub type SizeHelperFn = unsafe fn(&[u64]) -> Result<u64, EvalError>;

#[derive(Debug, Clone, Default)]
pub struct SizeHelpers {
    map: HashMap<String, SizeHelperFn>,
}

impl SizeHelpers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, helper: SizeHelperFn) -> &mut Self {
        self.map.insert(name.to_owned(), helper);
        self
    }

    pub fn get(&self, name: &str) -> Option<SizeHelperFn> {
        self.map.get(name).copied()
    }

    pub fn extend(&mut self, other: &SizeHelpers) {
        self.map
            .extend(other.map.iter().map(|(k, v)| (k.clone(), *v)));
    }
}

/// How an evaluated extent is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtentKind {
    /// Number of array elements.
    Elements,
    /// Byte length of a blob.
    Bytes,
    /// Byte length of an opaque blob; copied raw, never interpreted.
    Opaque,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    PreCall,
    PostCall,
}

/// A size expression bound to one parameter (or struct field).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundSize {
    pub source: String,
    pub expr: BoundExpr,
    pub kind: ExtentKind,
    /// Evaluated before the real call (In/InOut parameters).
    pub pre_call: bool,
    /// Evaluated after the real call (Out/InOut parameters).
    pub post_call: bool,
}

impl BoundSize {
    pub fn evaluated_in(&self, phase: Phase) -> bool {
        match phase {
            Phase::PreCall => self.pre_call,
            Phase::PostCall => self.post_call,
        }
    }
}

/// Something a size expression may name.
#[derive(Debug, Clone, Copy)]
pub struct Sibling<'a> {
    pub name: &'a str,
    pub ty: &'a Type,
    pub direction: Direction,
}

/// Type-level facts the binder needs from the API under resolution.
pub trait TypeEnv {
    fn constant(&self, name: &str) -> Option<u64>;
    fn helper_arity(&self, name: &str) -> Option<usize>;
    /// Integer scalar behind a type (primitive, enum, flags), if any.
    fn scalar(&self, ty: &Type) -> Option<Primitive>;
    /// Offset and type of a field of a (non-opaque) struct.
    fn field(&self, structure: &str, field: &str) -> Option<(usize, Type)>;
    fn size_of_named(&self, name: &str) -> Option<usize>;
}

enum Static {
    Int,
    /// Address of a value of this type.
    Pointer(Type),
}

pub struct Binder<'a> {
    pub siblings: &'a [Sibling<'a>],
    pub env: &'a dyn TypeEnv,
    /// Phase in which the owning value is first evaluated.
    pub phase: Phase,
}

impl Binder<'_> {
    pub fn bind(&self, expr: &Expr) -> Result<BoundExpr, SizeExprError> {
        self.bind_typed(expr).map(|(bound, _)| bound)
    }

    fn bind_typed(&self, expr: &Expr) -> Result<(BoundExpr, Static), SizeExprError> {
        match expr {
            Expr::Num(n) => Ok((BoundExpr::Const(*n), Static::Int)),
            Expr::Name(name) => {
                if let Some(index) = self.siblings.iter().position(|s| s.name == name) {
                    let sibling = &self.siblings[index];
                    if self.phase == Phase::PreCall && sibling.direction == Direction::Out {
                        return Err(SizeExprError::OutBeforeCall { name: name.clone() });
                    }
                    let st = match sibling.ty.canonical() {
                        Type::Pointer { target, .. } => Static::Pointer((**target).clone()),
                        _ => Static::Int,
                    };
                    return Ok((BoundExpr::Arg(index), st));
                }
                if let Some(value) = self.env.constant(name) {
                    return Ok((BoundExpr::Const(value), Static::Int));
                }
                Err(SizeExprError::UnknownName(name.clone()))
            }
            Expr::Deref(inner) => {
                let (bound, st) = self.bind_typed(inner)?;
                let prim = match &st {
                    Static::Pointer(target) => self.env.scalar(target),
                    Static::Int => None,
                }
                .ok_or_else(|| SizeExprError::InvalidDeref(inner.to_string()))?;
                Ok((
                    BoundExpr::Deref {
                        inner: Box::new(bound),
                        prim,
                    },
                    Static::Int,
                ))
            }
            Expr::Field(base, field) => {
                let invalid = || SizeExprError::InvalidField {
                    base: base.to_string(),
                    field: field.clone(),
                };
                let (bound, st) = self.bind_typed(base)?;
                let Static::Pointer(target) = st else {
                    return Err(invalid());
                };
                let Type::Struct(name) = target.canonical() else {
                    return Err(invalid());
                };
                let (offset, field_ty) = self.env.field(name, field).ok_or_else(invalid)?;
                let prim = self.env.scalar(&field_ty).ok_or_else(invalid)?;
                Ok((
                    BoundExpr::Field {
                        base: Box::new(bound),
                        offset,
                        prim,
                    },
                    Static::Int,
                ))
            }
            Expr::Binary(op, lhs, rhs) => {
                let lhs = self.bind(lhs)?;
                let rhs = self.bind(rhs)?;
                let bound = BoundExpr::Binary {
                    op: *op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                };
                match bound.as_const() {
                    Some(v) => Ok((BoundExpr::Const(v), Static::Int)),
                    None => Ok((bound, Static::Int)),
                }
            }
            Expr::Call(name, args) => {
                let expected = self
                    .env
                    .helper_arity(name)
                    .ok_or_else(|| SizeExprError::UnknownHelper(name.clone()))?;
                if expected != args.len() {
                    return Err(SizeExprError::HelperArity {
                        name: name.clone(),
                        expected,
                        got: args.len(),
                    });
                }
                let args = args
                    .iter()
                    .map(|a| self.bind(a))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((
                    BoundExpr::Helper {
                        name: name.clone(),
                        args,
                    },
                    Static::Int,
                ))
            }
            Expr::SizeOf(name) => {
                let size = primitive_named(name)
                    .map(Primitive::size)
                    .or_else(|| self.env.size_of_named(name))
                    .ok_or_else(|| SizeExprError::UnknownSizeOf(name.clone()))?;
                Ok((BoundExpr::Const(size as u64), Static::Int))
            }
        }
    }
}

fn primitive_named(name: &str) -> Option<Primitive> {
    Some(match name {
        "u8" | "BYTE" | "UINT8" => Primitive::U8,
        "i8" | "INT8" => Primitive::I8,
        "u16" | "WORD" | "UINT16" => Primitive::U16,
        "i16" | "INT16" => Primitive::I16,
        "u32" | "DWORD" | "UINT" | "UINT32" => Primitive::U32,
        "i32" | "INT" | "INT32" | "LONG" => Primitive::I32,
        "u64" | "UINT64" => Primitive::U64,
        "i64" | "INT64" => Primitive::I64,
        "f32" | "FLOAT" | "float" => Primitive::F32,
        "f64" | "double" => Primitive::F64,
        "usize" | "SIZE_T" => Primitive::Usize,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_table_spellings() {
        assert_eq!(
            parse("4*Vector4fCount").unwrap(),
            Expr::Binary(
                BinOp::Mul,
                Box::new(Expr::Num(4)),
                Box::new(Expr::Name("Vector4fCount".into()))
            )
        );
        assert_eq!(
            parse("*pSizeOfData").unwrap(),
            Expr::Deref(Box::new(Expr::Name("pSizeOfData".into())))
        );
        assert_eq!(
            parse("_vertexDataSize(PrimitiveType, PrimitiveCount, Stride)")
                .unwrap()
                .to_string(),
            "_vertexDataSize(PrimitiveType, PrimitiveCount, Stride)"
        );
        assert_eq!(
            parse("pDesc->ByteWidth").unwrap(),
            Expr::Field(Box::new(Expr::Name("pDesc".into())), "ByteWidth".into())
        );
        assert_eq!(parse("0x10").unwrap(), Expr::Num(16));
        assert_eq!(parse("sizeof(DWORD)").unwrap(), Expr::SizeOf("DWORD".into()));
    }

    #[test]
    fn deref_and_multiply_share_the_star() {
        let expr = parse("NumVertices * *pStride").unwrap();
        assert_eq!(expr.to_string(), "(NumVertices * *pStride)");
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(matches!(parse("4 *"), Err(SizeExprError::Syntax { .. })));
        assert!(matches!(parse("(a"), Err(SizeExprError::Syntax { .. })));
        assert!(matches!(parse("a b"), Err(SizeExprError::Syntax { .. })));
        assert!(matches!(parse("f(a,"), Err(SizeExprError::Syntax { .. })));
    }

    #[test]
    fn arithmetic_is_checked() {
        let helpers = SizeHelpers::new();
        let sub = BoundExpr::Binary {
            op: BinOp::Sub,
            lhs: Box::new(BoundExpr::Arg(0)),
            rhs: Box::new(BoundExpr::Arg(1)),
        };
        let words = vec![1u64, 2];
        assert_eq!(
            unsafe { sub.evaluate(&words, &helpers) },
            Err(EvalError::Negative)
        );
        let div = BoundExpr::Binary {
            op: BinOp::Div,
            lhs: Box::new(BoundExpr::Const(8)),
            rhs: Box::new(BoundExpr::Arg(0)),
        };
        assert_eq!(
            unsafe { div.evaluate(&vec![0u64], &helpers) },
            Err(EvalError::DivideByZero)
        );
    }

    #[test]
    fn null_deref_reads_zero() {
        let helpers = SizeHelpers::new();
        let expr = BoundExpr::Deref {
            inner: Box::new(BoundExpr::Arg(0)),
            prim: Primitive::U32,
        };
        assert_eq!(unsafe { expr.evaluate(&vec![0u64], &helpers) }, Ok(0));
        let value: u32 = 7;
        let addr = &value as *const u32 as usize as u64;
        assert_eq!(unsafe { expr.evaluate(&vec![addr], &helpers) }, Ok(7));
    }

    #[test]
    fn missing_helper_is_an_eval_error() {
        let expr = BoundExpr::Helper {
            name: "_count".into(),
            args: vec![BoundExpr::Const(1)],
        };
        assert_eq!(
            unsafe { expr.evaluate(&Vec::<u64>::new(), &SizeHelpers::new()) },
            Err(EvalError::MissingHelper("_count".into()))
        );
    }
}
