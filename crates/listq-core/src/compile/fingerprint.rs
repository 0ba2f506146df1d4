//! Deterministic fingerprinting of erased query shapes.

use crate::{
    compile::ErasedQuery,
    expr::{BinaryOperator, Expr, Lambda, Method, QueryExpr, TerminalOp},
};
use sha2::{Digest, Sha256};
use std::fmt;

///
/// ShapeFingerprint
///
/// Stable cache key for one erased shape. Two queries share a fingerprint
/// when they differ only in constant values.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ShapeFingerprint([u8; 32]);

impl ShapeFingerprint {
    /// Fingerprint the shape and the structure of its captures. Capture
    /// constants contribute their position only.
    #[must_use]
    pub fn of(erased: &ErasedQuery) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"shapefp:v1");

        write_tag(&mut hasher, 0x01);
        hash_query(&mut hasher, &erased.shape);

        write_tag(&mut hasher, 0x02);
        write_len_u32(&mut hasher, erased.captures.len());
        for capture in &erased.captures {
            write_str(&mut hasher, &capture.name);
            hash_expr(&mut hasher, &capture.expr);
        }

        let digest = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);

        Self(out)
    }

    #[must_use]
    pub fn as_hex(&self) -> String {
        let mut out = String::with_capacity(64);
        for byte in self.0 {
            use std::fmt::Write as _;
            let _ = write!(out, "{byte:02x}");
        }
        out
    }
}

impl fmt::Display for ShapeFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_hex())
    }
}

fn hash_query(hasher: &mut Sha256, query: &QueryExpr) {
    if let Some(source) = query.source() {
        hash_query(hasher, source);
    }

    match query {
        QueryExpr::Source { entity } => {
            write_tag(hasher, 0x10);
            write_str(hasher, entity);
        }
        QueryExpr::Filter { predicate, .. } => {
            write_tag(hasher, 0x11);
            hash_lambda(hasher, predicate);
        }
        QueryExpr::OrderBy {
            key,
            descending,
            then_by,
            ..
        } => {
            write_tag(hasher, 0x12);
            write_bool(hasher, *descending);
            write_bool(hasher, *then_by);
            hash_lambda(hasher, key);
        }
        QueryExpr::GroupBy { key, .. } => {
            write_tag(hasher, 0x13);
            hash_lambda(hasher, key);
        }
        QueryExpr::Skip { count, .. } => {
            write_tag(hasher, 0x14);
            hash_expr(hasher, count);
        }
        QueryExpr::Take { count, .. } => {
            write_tag(hasher, 0x15);
            hash_expr(hasher, count);
        }
        QueryExpr::Select { projection, .. } => {
            write_tag(hasher, 0x16);
            hash_lambda(hasher, projection);
        }
        QueryExpr::OfType { content_type, .. } => {
            write_tag(hasher, 0x17);
            write_str(hasher, content_type);
        }
        QueryExpr::Distinct { .. } => write_tag(hasher, 0x18),
        QueryExpr::Reverse { .. } => write_tag(hasher, 0x19),
        QueryExpr::Terminal {
            op,
            predicate,
            index,
            ..
        } => {
            write_tag(hasher, 0x1a);
            write_tag(hasher, terminal_tag(*op));
            match predicate {
                Some(lambda) => hash_lambda(hasher, lambda),
                None => write_tag(hasher, 0x00),
            }
            match index {
                Some(index) => hash_expr(hasher, index),
                None => write_tag(hasher, 0x00),
            }
        }
    }
}

fn hash_lambda(hasher: &mut Sha256, lambda: &Lambda) {
    write_tag(hasher, lambda.arity);
    hash_expr(hasher, &lambda.body);
}

fn hash_expr(hasher: &mut Sha256, expr: &Expr) {
    match expr {
        Expr::Param(position) => {
            write_tag(hasher, 0x21);
            write_tag(hasher, *position);
        }
        Expr::Member { target, name } => {
            write_tag(hasher, 0x22);
            hash_expr(hasher, target);
            write_str(hasher, name);
        }
        // value-free: constants are read by slot
        Expr::Constant(_) => write_tag(hasher, 0x23),
        Expr::Variable(name) => {
            write_tag(hasher, 0x24);
            write_str(hasher, name);
        }
        Expr::Placeholder(name) => {
            write_tag(hasher, 0x25);
            write_str(hasher, name);
        }
        Expr::Not(inner) => {
            write_tag(hasher, 0x26);
            hash_expr(hasher, inner);
        }
        Expr::Binary { op, left, right } => {
            write_tag(hasher, 0x27);
            write_tag(hasher, operator_tag(*op));
            hash_expr(hasher, left);
            hash_expr(hasher, right);
        }
        Expr::Conditional {
            test,
            if_true,
            if_false,
        } => {
            write_tag(hasher, 0x28);
            hash_expr(hasher, test);
            hash_expr(hasher, if_true);
            hash_expr(hasher, if_false);
        }
        Expr::Call {
            method,
            target,
            args,
        } => {
            write_tag(hasher, 0x29);
            write_tag(hasher, method_tag(*method));
            hash_expr(hasher, target);
            write_len_u32(hasher, args.len());
            for arg in args {
                hash_expr(hasher, arg);
            }
        }
        Expr::Record(fields) => {
            write_tag(hasher, 0x2a);
            write_len_u32(hasher, fields.len());
            for (name, expr) in fields {
                write_str(hasher, name);
                hash_expr(hasher, expr);
            }
        }
    }
}

const fn operator_tag(op: BinaryOperator) -> u8 {
    match op {
        BinaryOperator::Add => 0x01,
        BinaryOperator::AndAlso => 0x02,
        BinaryOperator::Eq => 0x03,
        BinaryOperator::Ge => 0x04,
        BinaryOperator::Gt => 0x05,
        BinaryOperator::Le => 0x06,
        BinaryOperator::Lt => 0x07,
        BinaryOperator::Mul => 0x08,
        BinaryOperator::Ne => 0x09,
        BinaryOperator::OrElse => 0x0a,
        BinaryOperator::Sub => 0x0b,
    }
}

const fn method_tag(method: Method) -> u8 {
    match method {
        Method::Contains => 0x01,
        Method::Equals => 0x02,
        Method::IsMemberOf => 0x03,
        Method::IsNullOrEmpty => 0x04,
        Method::StartsWith => 0x05,
    }
}

const fn terminal_tag(op: TerminalOp) -> u8 {
    match op {
        TerminalOp::All => 0x01,
        TerminalOp::Any => 0x02,
        TerminalOp::Count => 0x03,
        TerminalOp::ElementAt => 0x04,
        TerminalOp::ElementAtOrDefault => 0x05,
        TerminalOp::First => 0x06,
        TerminalOp::FirstOrDefault => 0x07,
        TerminalOp::Last => 0x08,
        TerminalOp::Single => 0x09,
        TerminalOp::SingleOrDefault => 0x0a,
    }
}

fn write_str(hasher: &mut Sha256, value: &str) {
    write_len_u32(hasher, value.len());
    hasher.update(value.as_bytes());
}

fn write_len_u32(hasher: &mut Sha256, len: usize) {
    let len = u32::try_from(len).unwrap_or(u32::MAX);
    hasher.update(len.to_be_bytes());
}

fn write_bool(hasher: &mut Sha256, value: bool) {
    write_tag(hasher, u8::from(value));
}

fn write_tag(hasher: &mut Sha256, tag: u8) {
    hasher.update([tag]);
}
