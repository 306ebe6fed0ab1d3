use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::internal::classad::{Ad, AdValue};

/// Attribute references deeper than this are treated as a reference cycle.
const MAX_EVAL_DEPTH: u32 = 64;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    /// `MY.attr`
    My,
    /// `TARGET.attr`
    Target,
    /// Bare `attr`, looked up in MY first and then in TARGET.
    Any,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Function {
    Max,
    Min,
}

/// Expression stored as an attribute value.
///
/// Only the subset needed to evaluate resource requests against a machine is supported.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum AdExpr {
    Literal(AdValue),
    Attr(Scope, String),
    Binary(BinaryOp, Box<AdExpr>, Box<AdExpr>),
    IfThenElse(Box<AdExpr>, Box<AdExpr>, Box<AdExpr>),
    Call(Function, Vec<AdExpr>),
}

impl AdExpr {
    pub fn int(value: i64) -> Self {
        AdExpr::Literal(AdValue::Int(value))
    }

    pub fn real(value: f64) -> Self {
        AdExpr::Literal(AdValue::Real(value))
    }

    pub fn my(name: &str) -> Self {
        AdExpr::Attr(Scope::My, name.to_string())
    }

    pub fn target(name: &str) -> Self {
        AdExpr::Attr(Scope::Target, name.to_string())
    }

    pub fn attr(name: &str) -> Self {
        AdExpr::Attr(Scope::Any, name.to_string())
    }

    pub fn binary(op: BinaryOp, left: AdExpr, right: AdExpr) -> Self {
        AdExpr::Binary(op, Box::new(left), Box::new(right))
    }

    pub fn if_then_else(condition: AdExpr, then: AdExpr, otherwise: AdExpr) -> Self {
        AdExpr::IfThenElse(Box::new(condition), Box::new(then), Box::new(otherwise))
    }

    pub fn call(function: Function, args: Vec<AdExpr>) -> Self {
        AdExpr::Call(function, args)
    }

    /// Evaluates the expression with `my` as the owning ad and `target` as the candidate.
    pub fn eval(&self, my: &Ad, target: Option<&Ad>) -> AdValue {
        EvalContext { my, target }.eval(self, 0)
    }
}

#[derive(Copy, Clone)]
struct EvalContext<'a> {
    my: &'a Ad,
    target: Option<&'a Ad>,
}

impl<'a> EvalContext<'a> {
    fn swapped(self) -> Option<EvalContext<'a>> {
        self.target.map(|target| EvalContext {
            my: target,
            target: Some(self.my),
        })
    }

    fn eval(self, expr: &AdExpr, depth: u32) -> AdValue {
        if depth > MAX_EVAL_DEPTH {
            return AdValue::Error;
        }
        match expr {
            AdExpr::Literal(value) => self.eval_value(value, depth),
            AdExpr::Attr(scope, name) => self.eval_attr(*scope, name, depth),
            AdExpr::Binary(op, left, right) => {
                let left = self.eval(left, depth + 1);
                match op {
                    BinaryOp::And if left == AdValue::Bool(false) => AdValue::Bool(false),
                    BinaryOp::Or if left == AdValue::Bool(true) => AdValue::Bool(true),
                    _ => eval_binary(*op, left, self.eval(right, depth + 1)),
                }
            }
            AdExpr::IfThenElse(condition, then, otherwise) => {
                match self.eval(condition, depth + 1) {
                    AdValue::Bool(true) => self.eval(then, depth + 1),
                    AdValue::Bool(false) => self.eval(otherwise, depth + 1),
                    AdValue::Int(v) => {
                        if v != 0 {
                            self.eval(then, depth + 1)
                        } else {
                            self.eval(otherwise, depth + 1)
                        }
                    }
                    AdValue::Undefined => AdValue::Undefined,
                    _ => AdValue::Error,
                }
            }
            AdExpr::Call(function, args) => {
                let mut result: Option<AdValue> = None;
                for arg in args {
                    let value = self.eval(arg, depth + 1);
                    if !value.is_number() {
                        return if value == AdValue::Undefined {
                            AdValue::Undefined
                        } else {
                            AdValue::Error
                        };
                    }
                    result = Some(match result {
                        None => value,
                        Some(current) => {
                            let take_new = match function {
                                Function::Max => {
                                    eval_binary(BinaryOp::Gt, value.clone(), current.clone())
                                }
                                Function::Min => {
                                    eval_binary(BinaryOp::Lt, value.clone(), current.clone())
                                }
                            };
                            if take_new == AdValue::Bool(true) {
                                value
                            } else {
                                current
                            }
                        }
                    });
                }
                result.unwrap_or(AdValue::Error)
            }
        }
    }

    fn eval_value(self, value: &AdValue, depth: u32) -> AdValue {
        match value {
            AdValue::Expr(expr) => self.eval(expr, depth + 1),
            other => other.clone(),
        }
    }

    fn eval_attr(self, scope: Scope, name: &str, depth: u32) -> AdValue {
        match scope {
            Scope::My => match self.my.lookup(name) {
                Some(value) => self.eval_value(value, depth),
                None => AdValue::Undefined,
            },
            Scope::Target => match (self.target.and_then(|t| t.lookup(name)), self.swapped()) {
                (Some(value), Some(ctx)) => ctx.eval_value(value, depth),
                _ => AdValue::Undefined,
            },
            Scope::Any => {
                if self.my.lookup(name).is_some() {
                    self.eval_attr(Scope::My, name, depth)
                } else {
                    self.eval_attr(Scope::Target, name, depth)
                }
            }
        }
    }
}

fn eval_binary(op: BinaryOp, left: AdValue, right: AdValue) -> AdValue {
    use AdValue::*;

    match op {
        BinaryOp::And | BinaryOp::Or => {
            return match (left, right) {
                (Bool(l), Bool(r)) => Bool(if op == BinaryOp::And { l && r } else { l || r }),
                (Undefined, _) | (_, Undefined) => Undefined,
                _ => Error,
            };
        }
        BinaryOp::Eq | BinaryOp::Ne => {
            let equal = match (&left, &right) {
                (Undefined, _) | (_, Undefined) => return Undefined,
                (Str(l), Str(r)) => l.eq_ignore_ascii_case(r),
                (Bool(l), Bool(r)) => l == r,
                (l, r) if l.is_number() && r.is_number() => l.as_f64() == r.as_f64(),
                _ => return Error,
            };
            return Bool(if op == BinaryOp::Eq { equal } else { !equal });
        }
        _ => {}
    }

    match (left, right) {
        (Error, _) | (_, Error) => Error,
        (Undefined, _) | (_, Undefined) => Undefined,
        (Int(l), Int(r)) => match op {
            BinaryOp::Add => Int(l.wrapping_add(r)),
            BinaryOp::Sub => Int(l.wrapping_sub(r)),
            BinaryOp::Mul => Int(l.wrapping_mul(r)),
            BinaryOp::Div => {
                if r == 0 {
                    Error
                } else {
                    Int(l / r)
                }
            }
            BinaryOp::Lt => Bool(l < r),
            BinaryOp::Le => Bool(l <= r),
            BinaryOp::Gt => Bool(l > r),
            BinaryOp::Ge => Bool(l >= r),
            _ => Error,
        },
        (l, r) if l.is_number() && r.is_number() => {
            let (l, r) = (l.as_f64().unwrap_or(0.0), r.as_f64().unwrap_or(0.0));
            match op {
                BinaryOp::Add => Real(l + r),
                BinaryOp::Sub => Real(l - r),
                BinaryOp::Mul => Real(l * r),
                BinaryOp::Div => {
                    if r == 0.0 {
                        Error
                    } else {
                        Real(l / r)
                    }
                }
                BinaryOp::Lt => Bool(l < r),
                BinaryOp::Le => Bool(l <= r),
                BinaryOp::Gt => Bool(l > r),
                BinaryOp::Ge => Bool(l >= r),
                _ => Error,
            }
        }
        _ => Error,
    }
}

impl Display for AdExpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AdExpr::Literal(value) => write!(f, "{value}"),
            AdExpr::Attr(Scope::My, name) => write!(f, "MY.{name}"),
            AdExpr::Attr(Scope::Target, name) => write!(f, "TARGET.{name}"),
            AdExpr::Attr(Scope::Any, name) => write!(f, "{name}"),
            AdExpr::Binary(op, left, right) => {
                let op = match op {
                    BinaryOp::Add => "+",
                    BinaryOp::Sub => "-",
                    BinaryOp::Mul => "*",
                    BinaryOp::Div => "/",
                    BinaryOp::Lt => "<",
                    BinaryOp::Le => "<=",
                    BinaryOp::Gt => ">",
                    BinaryOp::Ge => ">=",
                    BinaryOp::Eq => "==",
                    BinaryOp::Ne => "!=",
                    BinaryOp::And => "&&",
                    BinaryOp::Or => "||",
                };
                write!(f, "({left} {op} {right})")
            }
            AdExpr::IfThenElse(condition, then, otherwise) => {
                write!(f, "ifThenElse({condition}, {then}, {otherwise})")
            }
            AdExpr::Call(function, args) => {
                let name = match function {
                    Function::Max => "max",
                    Function::Min => "min",
                };
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}
