use std::collections::HashMap;

use tracing::debug;

use crate::error::UnsupportedOperation;
use crate::expr::{Expr, Invocation, LValue, LValueExpr};
use crate::signature::JavaType;
use crate::ssa::{SsaIdent, SsaIdentifiers};

/// Which side of an assignment the expression being rewritten sits on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RewriteFlags {
    LValue,
    #[default]
    RValue,
    LAndRValue,
}

/// State handed down through a rewrite.
#[derive(Clone, Copy, Debug, Default)]
pub struct RewriteContext<'a> {
    /// Identities live at the statement being rewritten.
    pub ssa: Option<&'a SsaIdentifiers<LValue>>,
    pub flags: RewriteFlags,
}

impl<'a> RewriteContext<'a> {
    pub fn new(ssa: &'a SsaIdentifiers<LValue>) -> Self {
        Self {
            ssa: Some(ssa),
            flags: RewriteFlags::RValue,
        }
    }

    pub fn with_flags(self, flags: RewriteFlags) -> Self {
        Self { flags, ..self }
    }
}

/// A transformation over expression trees.
///
/// The provided methods recurse into children unchanged; implementations
/// override the hook for the nodes they care about.
pub trait ExpressionRewriter {
    fn rewrite_expression(&mut self, expr: Expr, ctx: &RewriteContext<'_>) -> Expr {
        expr.apply_expression_rewriter(self, ctx)
    }

    fn rewrite_lvalue(&mut self, lvalue: LValueExpr, _ctx: &RewriteContext<'_>) -> LValueExpr {
        lvalue
    }
}

/// Supplies the expression that should replace a single-use lvalue read.
pub trait LValueRewriter {
    fn lvalue_replacement(
        &mut self,
        lvalue: &LValueExpr,
        ssa: &SsaIdentifiers<LValue>,
    ) -> Option<Expr>;
}

/// Every lvalue read found in a tree, in evaluation order.
#[derive(Clone, Debug, Default)]
pub struct LValueUsageCollector {
    used: Vec<LValueExpr>,
}

impl LValueUsageCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collect(&mut self, lvalue: &LValueExpr) {
        self.used.push(lvalue.clone());
    }

    pub fn used(&self) -> &[LValueExpr] {
        &self.used
    }

    pub fn count(&self, lvalue: &LValue) -> usize {
        self.used.iter().filter(|u| &u.lvalue == lvalue).count()
    }
}

/// The operations an expression variant supports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    pub rewrite: bool,
    pub collect_lvalues: bool,
    pub single_use_rewrite: bool,
}

impl Capabilities {
    pub const ALL: Capabilities = Capabilities {
        rewrite: true,
        collect_lvalues: true,
        single_use_rewrite: true,
    };
    pub const REWRITE_ONLY: Capabilities = Capabilities {
        rewrite: true,
        collect_lvalues: false,
        single_use_rewrite: false,
    };
}

impl Expr {
    pub fn capabilities(&self) -> Capabilities {
        match self {
            Expr::MethodRef(_) => Capabilities::REWRITE_ONLY,
            _ => Capabilities::ALL,
        }
    }

    /// Run `rewriter` over each child in evaluation order and rebuild the node
    /// from the results.
    pub fn apply_expression_rewriter<R>(self, rewriter: &mut R, ctx: &RewriteContext<'_>) -> Expr
    where
        R: ExpressionRewriter + ?Sized,
    {
        match self {
            Expr::Literal(_) => self,
            Expr::LValue(lv) => Expr::LValue(rewriter.rewrite_lvalue(lv, ctx)),
            Expr::BinaryOp { op, lhs, rhs } => {
                let lhs = rewriter.rewrite_expression(*lhs, ctx);
                let rhs = rewriter.rewrite_expression(*rhs, ctx);
                Expr::binary(op, lhs, rhs)
            }
            Expr::Cast { target, expr } => {
                let expr = rewriter.rewrite_expression(*expr, ctx);
                Expr::cast(target, expr)
            }
            Expr::Invoke(call) => {
                let object = call
                    .object
                    .map(|o| Box::new(rewriter.rewrite_expression(*o, ctx)));
                let args = call
                    .args
                    .into_iter()
                    .map(|a| rewriter.rewrite_expression(a, ctx))
                    .collect();
                Expr::Invoke(Invocation {
                    object,
                    args,
                    ..call
                })
            }
            Expr::MethodRef(m) => Expr::MethodRef(m.apply_expression_rewriter(rewriter, ctx)),
        }
    }

    /// Substitute lvalue reads that `rewriter` knows a single-use value for.
    ///
    /// Children are visited right to left, so the last-evaluated read is
    /// offered first.
    pub fn replace_single_usage_lvalues(
        self,
        rewriter: &mut dyn LValueRewriter,
        ssa: &SsaIdentifiers<LValue>,
    ) -> Result<Expr, UnsupportedOperation> {
        Ok(match self {
            Expr::Literal(_) => self,
            Expr::LValue(lv) => match rewriter.lvalue_replacement(&lv, ssa) {
                Some(replacement) => replacement,
                None => Expr::LValue(lv),
            },
            Expr::BinaryOp { op, lhs, rhs } => {
                let rhs = (*rhs).replace_single_usage_lvalues(rewriter, ssa)?;
                let lhs = (*lhs).replace_single_usage_lvalues(rewriter, ssa)?;
                Expr::binary(op, lhs, rhs)
            }
            Expr::Cast { target, expr } => {
                Expr::cast(target, (*expr).replace_single_usage_lvalues(rewriter, ssa)?)
            }
            Expr::Invoke(call) => {
                let mut args = Vec::with_capacity(call.args.len());
                for arg in call.args.into_iter().rev() {
                    args.push(arg.replace_single_usage_lvalues(rewriter, ssa)?);
                }
                args.reverse();
                let object = match call.object {
                    Some(o) => Some(Box::new((*o).replace_single_usage_lvalues(rewriter, ssa)?)),
                    None => None,
                };
                Expr::Invoke(Invocation {
                    object,
                    args,
                    ..call
                })
            }
            Expr::MethodRef(_) => {
                return Err(UnsupportedOperation {
                    operation: "single-use lvalue substitution",
                    node: self.kind_name(),
                });
            }
        })
    }

    /// Record every lvalue this tree reads.
    pub fn collect_used_lvalues(
        &self,
        collector: &mut LValueUsageCollector,
    ) -> Result<(), UnsupportedOperation> {
        match self {
            Expr::Literal(_) => {}
            Expr::LValue(lv) => collector.collect(lv),
            Expr::BinaryOp { lhs, rhs, .. } => {
                lhs.collect_used_lvalues(collector)?;
                rhs.collect_used_lvalues(collector)?;
            }
            Expr::Cast { expr, .. } => expr.collect_used_lvalues(collector)?,
            Expr::Invoke(call) => {
                if let Some(object) = &call.object {
                    object.collect_used_lvalues(collector)?;
                }
                for arg in &call.args {
                    arg.collect_used_lvalues(collector)?;
                }
            }
            Expr::MethodRef(_) => {
                return Err(UnsupportedOperation {
                    operation: "lvalue collection",
                    node: self.kind_name(),
                });
            }
        }
        Ok(())
    }
}

/// Names local slots after their SSA identity.
///
/// Reads of the same slot share a name as long as their identities carry the
/// same type key; a slot reused at a different type gets a fresh name.
#[derive(Debug, Default)]
pub struct SsaLocalNamer {
    names: HashMap<(u16, Option<JavaType>), String>,
    per_slot: HashMap<u16, u32>,
}

impl SsaLocalNamer {
    pub fn new() -> Self {
        Self::default()
    }

    fn name_for(&mut self, slot: u16, type_key: Option<JavaType>) -> String {
        if let Some(name) = self.names.get(&(slot, type_key.clone())) {
            return name.clone();
        }
        let seen = self.per_slot.entry(slot).or_insert(0);
        let name = match *seen {
            0 => format!("var{}", slot),
            n => format!("var{}_{}", slot, n),
        };
        *seen += 1;
        debug!(slot, name = %name, "named local");
        self.names.insert((slot, type_key), name.clone());
        name
    }
}

impl ExpressionRewriter for SsaLocalNamer {
    fn rewrite_lvalue(&mut self, lvalue: LValueExpr, ctx: &RewriteContext<'_>) -> LValueExpr {
        let slot = match &lvalue.lvalue {
            LValue::Local { slot, name: None } => *slot,
            _ => return lvalue,
        };
        let ident: Option<SsaIdent<LValue>> = lvalue
            .ssa
            .clone()
            .or_else(|| ctx.ssa.and_then(|live| live.get(&lvalue.lvalue).cloned()));
        let type_key = ident.as_ref().and_then(|i| i.type_key().cloned());
        let name = self.name_for(slot, type_key);
        LValueExpr {
            lvalue: LValue::named_local(slot, name),
            ssa: ident,
        }
    }
}
