use calltrace_api::size::{
    self, BinOp, Binder, EvalError, Expr, Phase, Sibling, SizeHelpers, TypeEnv,
};
use calltrace_api::{Direction, Primitive, Type};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

struct NoTypes;

impl TypeEnv for NoTypes {
    fn constant(&self, name: &str) -> Option<u64> {
        (name == "D3DDP_MAXTEXCOORD").then_some(8)
    }

    fn helper_arity(&self, name: &str) -> Option<usize> {
        (name == "_double").then_some(1)
    }

    fn scalar(&self, ty: &Type) -> Option<Primitive> {
        match ty.canonical() {
            Type::Primitive(p) if p.is_integer() => Some(*p),
            _ => None,
        }
    }

    fn field(&self, _structure: &str, _field: &str) -> Option<(usize, Type)> {
        None
    }

    fn size_of_named(&self, _name: &str) -> Option<usize> {
        None
    }
}

const NAMES: [&str; 3] = ["x", "y", "z"];

fn siblings(ty: &Type) -> Vec<Sibling<'_>> {
    NAMES
        .iter()
        .map(|&name| Sibling {
            name,
            ty,
            direction: Direction::In,
        })
        .collect()
}

unsafe fn double(args: &[u64]) -> Result<u64, EvalError> {
    args[0].checked_mul(2).ok_or(EvalError::Overflow)
}

fn bind(source: &str) -> Result<size::BoundExpr, size::SizeExprError> {
    let ty = Type::prim(Primitive::U32);
    let siblings = siblings(&ty);
    let binder = Binder {
        siblings: &siblings,
        env: &NoTypes,
        phase: Phase::PreCall,
    };
    binder.bind(&size::parse(source)?)
}

fn eval(source: &str, words: &[u64]) -> Result<u64, EvalError> {
    let mut helpers = SizeHelpers::new();
    helpers.register("_double", double);
    let bound = bind(source).unwrap();
    unsafe { bound.evaluate(&words.to_vec(), &helpers) }
}

#[test]
fn evaluates_table_expressions() {
    assert_eq!(eval("4*x", &[3, 0, 0]), Ok(12));
    assert_eq!(eval("x*y + z", &[2, 3, 4]), Ok(10));
    assert_eq!(eval("(x + y) / 2", &[3, 5, 0]), Ok(4));
    assert_eq!(eval("_double(x) - 1", &[5, 0, 0]), Ok(9));
    assert_eq!(eval("_double(x)", &[u64::MAX, 0, 0]), Err(EvalError::Overflow));
    assert_eq!(eval("D3DDP_MAXTEXCOORD * 4", &[0, 0, 0]), Ok(32));
    assert_eq!(eval("x - y", &[1, 2, 0]), Err(EvalError::Negative));
}

#[test]
fn helper_arity_is_checked() {
    assert!(matches!(
        bind("_double(x, y)"),
        Err(size::SizeExprError::HelperArity {
            expected: 1,
            got: 2,
            ..
        })
    ));
}

#[test]
fn deref_of_a_plain_integer_is_rejected() {
    assert!(matches!(
        bind("*x"),
        Err(size::SizeExprError::InvalidDeref(_))
    ));
}

fn arb_expr() -> impl Strategy<Value = Expr> {
    let leaf = prop_oneof![
        (0u64..64).prop_map(Expr::Num),
        prop::sample::select(NAMES.to_vec()).prop_map(|n| Expr::Name(n.to_owned())),
    ];
    leaf.prop_recursive(4, 32, 2, |inner| {
        (
            prop::sample::select(vec![BinOp::Add, BinOp::Sub, BinOp::Mul, BinOp::Div]),
            inner.clone(),
            inner,
        )
            .prop_map(|(op, l, r)| Expr::Binary(op, Box::new(l), Box::new(r)))
    })
}

fn reference(expr: &Expr, words: &[u64; 3]) -> Option<u64> {
    match expr {
        Expr::Num(n) => Some(*n),
        Expr::Name(name) => NAMES.iter().position(|n| *n == name.as_str()).map(|i| words[i]),
        Expr::Binary(op, l, r) => {
            let l = reference(l, words)?;
            let r = reference(r, words)?;
            match op {
                BinOp::Add => l.checked_add(r),
                BinOp::Sub => l.checked_sub(r),
                BinOp::Mul => l.checked_mul(r),
                BinOp::Div => l.checked_div(r),
            }
        }
        _ => None,
    }
}

proptest! {
    #[test]
    fn display_reparses_to_the_same_tree(expr in arb_expr()) {
        let reparsed = size::parse(&expr.to_string()).unwrap();
        prop_assert_eq!(reparsed, expr);
    }

    #[test]
    fn evaluation_matches_checked_arithmetic(
        expr in arb_expr(),
        words in prop::array::uniform3(0u64..1000),
    ) {
        let ty = Type::prim(Primitive::U32);
        let siblings = siblings(&ty);
        let binder = Binder { siblings: &siblings, env: &NoTypes, phase: Phase::PreCall };
        let bound = binder.bind(&expr).unwrap();
        let got = unsafe { bound.evaluate(&words.to_vec(), &SizeHelpers::new()) };
        prop_assert_eq!(got.ok(), reference(&expr, &words));
    }
}
