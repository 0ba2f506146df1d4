use crate::expr::{Expr, Lambda, QueryExpr};

/// Prefix of generated placeholder names; never a valid argument name.
pub const PLACEHOLDER_PREFIX: &str = "@p";

///
/// Capture
///
/// Row-invariant sub-expression lifted out of a query, with the placeholder
/// that stands in for it. The expression keeps this call's constants.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Capture {
    pub name: String,
    pub expr: Expr,
}

///
/// ErasedQuery
///
/// A query with every maximal invariant sub-expression replaced by a
/// placeholder. `shape` holds no literal values.
///

#[derive(Clone, Debug, PartialEq)]
pub struct ErasedQuery {
    pub shape: QueryExpr,
    pub captures: Vec<Capture>,
}

/// Erase `query` into a parameter-free shape plus its captures.
///
/// Placeholders are numbered in chain order, source first, so equal shapes
/// always number their captures the same way.
#[must_use]
pub fn extract(query: &QueryExpr) -> ErasedQuery {
    let mut extractor = Extractor::default();
    let shape = extractor.query(query);

    ErasedQuery {
        shape,
        captures: extractor.captures,
    }
}

///
/// Extractor
///

#[derive(Default)]
struct Extractor {
    captures: Vec<Capture>,
}

impl Extractor {
    fn query(&mut self, query: &QueryExpr) -> QueryExpr {
        match query {
            QueryExpr::Source { entity } => QueryExpr::Source {
                entity: entity.clone(),
            },
            QueryExpr::Filter { source, predicate } => {
                let source = self.source(source);
                QueryExpr::Filter {
                    source,
                    predicate: self.lambda(predicate),
                }
            }
            QueryExpr::OrderBy {
                source,
                key,
                descending,
                then_by,
            } => {
                let source = self.source(source);
                QueryExpr::OrderBy {
                    source,
                    key: self.lambda(key),
                    descending: *descending,
                    then_by: *then_by,
                }
            }
            QueryExpr::GroupBy { source, key } => {
                let source = self.source(source);
                QueryExpr::GroupBy {
                    source,
                    key: self.lambda(key),
                }
            }
            QueryExpr::Skip { source, count } => {
                let source = self.source(source);
                QueryExpr::Skip {
                    source,
                    count: self.expr(count),
                }
            }
            QueryExpr::Take { source, count } => {
                let source = self.source(source);
                QueryExpr::Take {
                    source,
                    count: self.expr(count),
                }
            }
            QueryExpr::Select { source, projection } => {
                let source = self.source(source);
                QueryExpr::Select {
                    source,
                    projection: self.lambda(projection),
                }
            }
            QueryExpr::OfType {
                source,
                content_type,
            } => QueryExpr::OfType {
                source: self.source(source),
                content_type: content_type.clone(),
            },
            QueryExpr::Distinct { source } => QueryExpr::Distinct {
                source: self.source(source),
            },
            QueryExpr::Reverse { source } => QueryExpr::Reverse {
                source: self.source(source),
            },
            QueryExpr::Terminal {
                source,
                op,
                predicate,
                index,
            } => {
                let source = self.source(source);
                let predicate = predicate.as_ref().map(|lambda| self.lambda(lambda));
                QueryExpr::Terminal {
                    source,
                    op: *op,
                    predicate,
                    index: index.as_ref().map(|index| self.expr(index)),
                }
            }
        }
    }

    fn source(&mut self, source: &QueryExpr) -> Box<QueryExpr> {
        Box::new(self.query(source))
    }

    fn lambda(&mut self, lambda: &Lambda) -> Lambda {
        Lambda {
            arity: lambda.arity,
            body: self.expr(&lambda.body),
        }
    }

    fn expr(&mut self, expr: &Expr) -> Expr {
        if expr.is_invariant() {
            return self.capture(expr);
        }

        match expr {
            Expr::Member { target, name } => Expr::Member {
                target: Box::new(self.expr(target)),
                name: name.clone(),
            },
            Expr::Not(inner) => Expr::Not(Box::new(self.expr(inner))),
            Expr::Binary { op, left, right } => {
                let left = self.expr(left);
                Expr::Binary {
                    op: *op,
                    left: Box::new(left),
                    right: Box::new(self.expr(right)),
                }
            }
            Expr::Conditional {
                test,
                if_true,
                if_false,
            } => {
                let test = self.expr(test);
                let if_true = self.expr(if_true);
                Expr::Conditional {
                    test: Box::new(test),
                    if_true: Box::new(if_true),
                    if_false: Box::new(self.expr(if_false)),
                }
            }
            Expr::Call {
                method,
                target,
                args,
            } => {
                let target = self.expr(target);
                Expr::Call {
                    method: *method,
                    target: Box::new(target),
                    args: args.iter().map(|arg| self.expr(arg)).collect(),
                }
            }
            Expr::Record(fields) => Expr::Record(
                fields
                    .iter()
                    .map(|(name, expr)| (name.clone(), self.expr(expr)))
                    .collect(),
            ),
            Expr::Param(_) | Expr::Constant(_) | Expr::Variable(_) | Expr::Placeholder(_) => {
                expr.clone()
            }
        }
    }

    fn capture(&mut self, expr: &Expr) -> Expr {
        let name = format!("{PLACEHOLDER_PREFIX}{}", self.captures.len());
        self.captures.push(Capture {
            name: name.clone(),
            expr: expr.clone(),
        });

        Expr::Placeholder(name)
    }
}
