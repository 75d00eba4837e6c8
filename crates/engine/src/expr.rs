// Copyright (c) reifydb.com 2025
// This file is licensed under the AGPL-3.0-or-later, see license.md file

//! Row-wise expression evaluation for filter and map operators.
//!
//! Deliberately small: column references, literals, comparisons, arithmetic
//! and boolean connectives. `Undefined` propagates through every operator;
//! a filter treats anything but `Bool(true)` as a drop.

use std::fmt::{self, Display, Formatter};

use quiver_core::{BatchSchema, ColumnType, Error, Result, Value};
use serde::{Deserialize, Serialize};

use crate::batch::RowBatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    And,
    Or,
}

impl BinaryOp {
    fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }

    fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Column(String),
    Literal(Value),
    Binary { op: BinaryOp, left: Box<Expr>, right: Box<Expr> },
    Not(Box<Expr>),
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(name) => f.write_str(name),
            Expr::Literal(value) => write!(f, "{}", value),
            Expr::Binary { op, left, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            Expr::Not(inner) => write!(f, "not {}", inner),
        }
    }
}

impl Expr {
    /// Static result type of this expression against `schema`. Fails on
    /// unknown columns or operand types the operator cannot accept; the
    /// converter runs this before any task is built.
    pub fn infer_type(&self, schema: &BatchSchema) -> Result<ColumnType> {
        match self {
            Expr::Column(name) => schema
                .index_of(name)
                .map(|idx| schema.fields[idx].ty.clone())
                .ok_or_else(|| Error::engine(format!("unknown column '{}'", name))),
            Expr::Literal(value) => Ok(value.column_type()),
            Expr::Binary { op, left, right } => {
                let lt = left.infer_type(schema)?;
                let rt = right.infer_type(schema)?;
                if op.is_comparison() {
                    return Ok(ColumnType::Bool);
                }
                match op {
                    BinaryOp::And | BinaryOp::Or => Ok(ColumnType::Bool),
                    _ => match (lt, rt) {
                        (ColumnType::Int64, ColumnType::Int64) => Ok(ColumnType::Int64),
                        (ColumnType::Undefined, other) | (other, ColumnType::Undefined) => Ok(other),
                        (lt, rt)
                            if numeric(&lt) && numeric(&rt) =>
                        {
                            Ok(ColumnType::Float64)
                        }
                        (lt, rt) => Err(Error::engine(format!(
                            "operator '{}' expects numeric operands, got {} and {}",
                            op.symbol(),
                            lt,
                            rt
                        ))),
                    },
                }
            }
            Expr::Not(_) => Ok(ColumnType::Bool),
        }
    }

    /// Evaluate against one row of `batch`.
    ///
    /// Only called from operator `next()` while the producing task's arena
    /// is guaranteed alive, which is what makes the raw batch reads sound.
    pub(crate) fn evaluate(&self, batch: &RowBatch, row: usize) -> Result<Value> {
        match self {
            Expr::Column(name) => {
                let idx = batch
                    .schema()
                    .index_of(name)
                    .ok_or_else(|| Error::engine(format!("unknown column '{}'", name)))?;
                // SAFETY: see doc comment; the task owning the arena is
                // executing this expression right now.
                Ok(unsafe { batch.value(idx, row) })
            }
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Binary { op, left, right } => {
                let lhs = left.evaluate(batch, row)?;
                let rhs = right.evaluate(batch, row)?;
                apply_binary(*op, lhs, rhs)
            }
            Expr::Not(inner) => match inner.evaluate(batch, row)? {
                Value::Undefined => Ok(Value::Undefined),
                Value::Bool(v) => Ok(Value::Bool(!v)),
                other => {
                    Err(Error::engine(format!("'not' expects a boolean, got {}", other.column_type())))
                }
            },
        }
    }
}

fn numeric(ty: &ColumnType) -> bool {
    matches!(ty, ColumnType::Int64 | ColumnType::Float64)
}

fn apply_binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value> {
    if lhs.is_undefined() || rhs.is_undefined() {
        return Ok(Value::Undefined);
    }
    if op.is_comparison() {
        return compare(op, &lhs, &rhs);
    }
    match op {
        BinaryOp::And | BinaryOp::Or => match (lhs, rhs) {
            (Value::Bool(l), Value::Bool(r)) => Ok(Value::Bool(match op {
                BinaryOp::And => l && r,
                _ => l || r,
            })),
            (l, r) => Err(Error::engine(format!(
                "'{}' expects booleans, got {} and {}",
                op.symbol(),
                l.column_type(),
                r.column_type()
            ))),
        },
        _ => arithmetic(op, lhs, rhs),
    }
}

fn compare(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value> {
    let ordering = match (lhs, rhs) {
        (Value::Int64(l), Value::Int64(r)) => l.partial_cmp(r),
        (Value::Float64(l), Value::Float64(r)) => l.partial_cmp(r),
        (Value::Int64(l), Value::Float64(r)) => (*l as f64).partial_cmp(r),
        (Value::Float64(l), Value::Int64(r)) => l.partial_cmp(&(*r as f64)),
        (Value::Utf8(l), Value::Utf8(r)) => Some(l.cmp(r)),
        (Value::Bool(l), Value::Bool(r)) => Some(l.cmp(r)),
        (l, r) => {
            return Err(Error::engine(format!(
                "cannot compare {} with {}",
                l.column_type(),
                r.column_type()
            )));
        }
    };
    let ordering = match ordering {
        Some(ordering) => ordering,
        // NaN against anything: comparisons are false, inequality is true.
        None => return Ok(Value::Bool(op == BinaryOp::NotEq)),
    };
    Ok(Value::Bool(match op {
        BinaryOp::Eq => ordering.is_eq(),
        BinaryOp::NotEq => !ordering.is_eq(),
        BinaryOp::Lt => ordering.is_lt(),
        BinaryOp::Le => ordering.is_le(),
        BinaryOp::Gt => ordering.is_gt(),
        _ => ordering.is_ge(),
    }))
}

fn arithmetic(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value> {
    match (lhs, rhs) {
        (Value::Int64(l), Value::Int64(r)) => match op {
            BinaryOp::Add => Ok(Value::Int64(l.wrapping_add(r))),
            BinaryOp::Sub => Ok(Value::Int64(l.wrapping_sub(r))),
            BinaryOp::Mul => Ok(Value::Int64(l.wrapping_mul(r))),
            _ => {
                if r == 0 {
                    Err(Error::engine("integer division by zero"))
                } else {
                    // checked_div also catches i64::MIN / -1.
                    l.checked_div(r)
                        .map(Value::Int64)
                        .ok_or_else(|| Error::engine("integer division overflow"))
                }
            }
        },
        (l, r) => {
            let (l, r) = match (as_f64(&l), as_f64(&r)) {
                (Some(l), Some(r)) => (l, r),
                _ => {
                    return Err(Error::engine(format!(
                        "'{}' expects numeric operands, got {} and {}",
                        op.symbol(),
                        l.column_type(),
                        r.column_type()
                    )));
                }
            };
            Ok(Value::Float64(match op {
                BinaryOp::Add => l + r,
                BinaryOp::Sub => l - r,
                BinaryOp::Mul => l * r,
                _ => l / r,
            }))
        }
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Int64(v) => Some(*v as f64),
        Value::Float64(v) => Some(*v),
        _ => None,
    }
}
