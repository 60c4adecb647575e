use std::fmt;

use crate::dumper::{Dumpable, Dumper};
use crate::expr::UnreducedMethodRef;
use crate::signature::{JavaType, RefType};
use crate::ssa::SsaIdent;

/// A storage location an expression can read or assign.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LValue {
    /// A local variable slot; `name` is filled in once the slot is named.
    Local { slot: u16, name: Option<String> },
    /// An operand stack position.
    Stack(u32),
    StaticField { owner: RefType, name: String },
}

impl LValue {
    pub fn local(slot: u16) -> Self {
        LValue::Local { slot, name: None }
    }

    pub fn named_local(slot: u16, name: impl Into<String>) -> Self {
        LValue::Local {
            slot,
            name: Some(name.into()),
        }
    }

    pub fn static_field(owner: impl Into<String>, name: impl Into<String>) -> Self {
        LValue::StaticField {
            owner: RefType::new(owner),
            name: name.into(),
        }
    }
}

impl fmt::Display for LValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LValue::Local { name: Some(name), .. } => f.write_str(name),
            LValue::Local { slot, name: None } => write!(f, "slot{}", slot),
            LValue::Stack(pos) => write!(f, "stack{}", pos),
            LValue::StaticField { owner, name } => write!(f, "{}.{}", owner, name),
        }
    }
}

/// A read of an [`LValue`], optionally tagged with the SSA identity it reads.
#[derive(Clone, Debug, PartialEq)]
pub struct LValueExpr {
    pub lvalue: LValue,
    pub ssa: Option<SsaIdent<LValue>>,
}

impl LValueExpr {
    pub fn new(lvalue: LValue) -> Self {
        Self { lvalue, ssa: None }
    }

    pub fn with_ssa(lvalue: LValue, ssa: SsaIdent<LValue>) -> Self {
        Self {
            lvalue,
            ssa: Some(ssa),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Null,
    Boolean(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    String(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => f.write_str("null"),
            Literal::Boolean(b) => write!(f, "{}", b),
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Long(l) => write!(f, "{}L", l),
            Literal::Double(d) => write!(f, "{:?}", d),
            Literal::String(s) => write!(f, "\"{}\"", s.escape_default()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    UShr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Rem => "%",
            BinaryOperator::And => "&",
            BinaryOperator::Or => "|",
            BinaryOperator::Xor => "^",
            BinaryOperator::Shl => "<<",
            BinaryOperator::Shr => ">>",
            BinaryOperator::UShr => ">>>",
            BinaryOperator::Eq => "==",
            BinaryOperator::Ne => "!=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Le => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Ge => ">=",
        }
    }
}

/// An ordinary method call. `object` is absent for static calls.
#[derive(Clone, Debug, PartialEq)]
pub struct Invocation {
    pub object: Option<Box<Expr>>,
    pub owner: RefType,
    pub name: String,
    pub args: Vec<Expr>,
    pub result_type: JavaType,
}

/// Expression tree node.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Literal(Literal),
    LValue(LValueExpr),
    BinaryOp {
        op: BinaryOperator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Cast {
        target: JavaType,
        expr: Box<Expr>,
    },
    Invoke(Invocation),
    MethodRef(UnreducedMethodRef),
}

impl Expr {
    pub fn lvalue(lvalue: LValue) -> Self {
        Expr::LValue(LValueExpr::new(lvalue))
    }

    pub fn binary(op: BinaryOperator, lhs: Expr, rhs: Expr) -> Self {
        Expr::BinaryOp {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn cast(target: JavaType, expr: Expr) -> Self {
        Expr::Cast {
            target,
            expr: Box::new(expr),
        }
    }

    /// Short variant name, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Literal(_) => "literal",
            Expr::LValue(_) => "lvalue",
            Expr::BinaryOp { .. } => "binary operation",
            Expr::Cast { .. } => "cast",
            Expr::Invoke(_) => "invocation",
            Expr::MethodRef(_) => "unreduced method reference",
        }
    }
}

impl Dumpable for Expr {
    fn dump<'d>(&self, d: &'d mut Dumper) -> &'d mut Dumper {
        match self {
            Expr::Literal(lit) => d.print(&lit.to_string()),
            Expr::LValue(lv) => d.print(&lv.lvalue.to_string()),
            Expr::BinaryOp { op, lhs, rhs } => {
                dump_operand(lhs, d);
                d.print(" ").print(op.symbol()).print(" ");
                dump_operand(rhs, d)
            }
            Expr::Cast { target, expr } => {
                d.print("(").dump(target).print(")");
                dump_operand(expr, d)
            }
            Expr::Invoke(call) => {
                match &call.object {
                    Some(object) => dump_operand(object, d),
                    None => d.print(&call.owner.to_string()),
                };
                d.print(".").print(&call.name).print("(");
                d.separated(&call.args, ", ").print(")")
            }
            Expr::MethodRef(m) => m.dump(d),
        }
    }
}

fn dump_operand<'d>(expr: &Expr, d: &'d mut Dumper) -> &'d mut Dumper {
    match expr {
        Expr::BinaryOp { .. } | Expr::Cast { .. } => d.print("(").dump(expr).print(")"),
        _ => d.dump(expr),
    }
}
