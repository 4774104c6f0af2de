//! Predicate IR - the compiled form of query criteria.
//!
//! Facet parsers produce [`Predicate`] values and the composer combines
//! them. The smart constructors fold constants so that an unresolved `eq`
//! collapses to `false` and an empty criteria tree collapses to `true`.

use super::column::ColumnRef;
use super::fragment::{FragmentBuilder, SqlFragment};
use super::token::Token;
use super::value::SqlValue;

// =============================================================================
// Predicate AST
// =============================================================================

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
}

impl CompareOp {
    fn token(self) -> Token {
        match self {
            CompareOp::Eq => Token::Eq,
            CompareOp::Ne => Token::Ne,
            CompareOp::Lt => Token::Lt,
            CompareOp::Gt => Token::Gt,
            CompareOp::Lte => Token::Lte,
            CompareOp::Gte => Token::Gte,
        }
    }
}

/// A boolean predicate over the data table.
///
/// Every variant must be handled in `to_fragment()` - the compiler enforces this.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Constant true / false.
    Const(bool),

    /// column op value
    Compare {
        column: ColumnRef,
        op: CompareOp,
        value: SqlValue,
    },

    /// column [NOT] IN (values...)
    InList {
        column: ColumnRef,
        values: Vec<SqlValue>,
        negated: bool,
    },

    /// column IS [NOT] NULL
    IsNull { column: ColumnRef, negated: bool },

    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    /// Constant value, if this predicate is one.
    pub fn as_const(&self) -> Option<bool> {
        match self {
            Predicate::Const(b) => Some(*b),
            _ => None,
        }
    }

    /// Conjunction with constant folding and flattening.
    pub fn and(predicates: impl IntoIterator<Item = Predicate>) -> Predicate {
        let mut parts = Vec::new();
        for p in predicates {
            match p {
                Predicate::Const(true) => {}
                Predicate::Const(false) => return Predicate::Const(false),
                Predicate::And(inner) => parts.extend(inner),
                other => parts.push(other),
            }
        }
        match parts.len() {
            0 => Predicate::Const(true),
            1 => parts.remove(0),
            _ => Predicate::And(parts),
        }
    }

    /// Disjunction with constant folding and flattening.
    pub fn or(predicates: impl IntoIterator<Item = Predicate>) -> Predicate {
        let mut parts = Vec::new();
        for p in predicates {
            match p {
                Predicate::Const(false) => {}
                Predicate::Const(true) => return Predicate::Const(true),
                Predicate::Or(inner) => parts.extend(inner),
                other => parts.push(other),
            }
        }
        match parts.len() {
            0 => Predicate::Const(false),
            1 => parts.remove(0),
            _ => Predicate::Or(parts),
        }
    }

    /// Logical negation.
    pub fn negate(predicate: Predicate) -> Predicate {
        match predicate {
            Predicate::Const(b) => Predicate::Const(!b),
            Predicate::Not(inner) => *inner,
            other => Predicate::Not(Box::new(other)),
        }
    }

    // =========================================================================
    // Constructors
    // =========================================================================

    pub fn compare(column: impl Into<ColumnRef>, op: CompareOp, value: impl Into<SqlValue>) -> Self {
        Predicate::Compare {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(column: impl Into<ColumnRef>, value: impl Into<SqlValue>) -> Self {
        Self::compare(column, CompareOp::Eq, value)
    }

    /// `column IS NULL OR column <> value`, so rows without a value are kept.
    pub fn ne_or_null(column: impl Into<ColumnRef>, value: impl Into<SqlValue>) -> Self {
        let column = column.into();
        Predicate::or([
            Predicate::IsNull {
                column: column.clone(),
                negated: false,
            },
            Self::compare(column, CompareOp::Ne, value),
        ])
    }

    /// `column IN (...)`; an empty list matches nothing.
    pub fn in_list(column: impl Into<ColumnRef>, values: Vec<SqlValue>) -> Self {
        if values.is_empty() {
            return Predicate::Const(false);
        }
        Predicate::InList {
            column: column.into(),
            values,
            negated: false,
        }
    }

    /// `column NOT IN (...)`; an empty list matches everything.
    pub fn not_in_list(column: impl Into<ColumnRef>, values: Vec<SqlValue>) -> Self {
        if values.is_empty() {
            return Predicate::Const(true);
        }
        Predicate::InList {
            column: column.into(),
            values,
            negated: true,
        }
    }

    /// `column IS NULL OR column NOT IN (...)`; an empty list matches everything.
    pub fn not_in_or_null(column: impl Into<ColumnRef>, values: Vec<SqlValue>) -> Self {
        if values.is_empty() {
            return Predicate::Const(true);
        }
        let column = column.into();
        Predicate::or([
            Predicate::IsNull {
                column: column.clone(),
                negated: false,
            },
            Predicate::InList {
                column,
                values,
                negated: true,
            },
        ])
    }

    // =========================================================================
    // Predicate to SQL
    // =========================================================================

    /// Render this predicate as a parameterized fragment.
    ///
    /// Nested AND/OR groups and negated groups are parenthesized so the
    /// text has the same shape as the tree.
    pub fn to_fragment(&self) -> SqlFragment {
        match self {
            Predicate::Const(true) => SqlFragment::always_true(),
            Predicate::Const(false) => SqlFragment::always_false(),

            Predicate::Compare { column, op, value } => FragmentBuilder::new()
                .column(column.clone())
                .space()
                .push(op.token())
                .space()
                .param(value.clone())
                .build(),

            Predicate::InList {
                column,
                values,
                negated,
            } => {
                if values.is_empty() {
                    return if *negated {
                        SqlFragment::always_true()
                    } else {
                        SqlFragment::always_false()
                    };
                }
                let mut b = FragmentBuilder::new().column(column.clone()).space();
                if *negated {
                    b = b.push(Token::Not).space();
                }
                b = b.push(Token::In).space().push(Token::LParen);
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        b = b.push(Token::Comma).space();
                    }
                    b = b.param(value.clone());
                }
                b.push(Token::RParen).build()
            }

            Predicate::IsNull { column, negated } => FragmentBuilder::new()
                .column(column.clone())
                .space()
                .push(if *negated {
                    Token::IsNotNull
                } else {
                    Token::IsNull
                })
                .build(),

            Predicate::And(parts) => join_parts(parts, Token::And),
            Predicate::Or(parts) => join_parts(parts, Token::Or),

            Predicate::Not(inner) => FragmentBuilder::new()
                .push(Token::Not)
                .space()
                .grouped(&inner.to_fragment())
                .build(),
        }
    }
}

fn join_parts(parts: &[Predicate], joiner: Token) -> SqlFragment {
    let rendered: Vec<SqlFragment> = parts
        .iter()
        .map(|p| match p {
            Predicate::And(_) | Predicate::Or(_) => FragmentBuilder::new()
                .grouped(&p.to_fragment())
                .build(),
            _ => p.to_fragment(),
        })
        .collect();
    FragmentBuilder::new()
        .append_range(rendered.iter(), joiner)
        .build()
}
