//! Parameterized SQL fragments.
//!
//! A [`SqlFragment`] is an immutable token stream whose values are all bound
//! parameters. Fragments are built with [`FragmentBuilder`], which only
//! accepts keywords, allow-listed identifiers and values; there is no way to
//! push request text into the SQL itself.

use super::column::ColumnRef;
use super::dialect::Dialect;
use super::token::{Token, TokenStream};
use super::value::SqlValue;

/// An immutable piece of SQL plus the values bound to its placeholders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlFragment {
    tokens: TokenStream,
}

/// SQL text for one dialect with its parameters in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSql {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

impl SqlFragment {
    /// Fragment that matches every row.
    pub fn always_true() -> Self {
        FragmentBuilder::new().push(Token::True).build()
    }

    /// Fragment that matches no row.
    pub fn always_false() -> Self {
        FragmentBuilder::new().push(Token::False).build()
    }

    pub fn tokens(&self) -> &TokenStream {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Render the fragment text for a dialect.
    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.tokens.serialize(dialect)
    }

    /// Bound values in placeholder order.
    pub fn params(&self) -> Vec<SqlValue> {
        self.tokens.params()
    }

    pub fn compile(&self, dialect: Dialect) -> CompiledSql {
        CompiledSql {
            sql: self.to_sql(dialect),
            params: self.params(),
        }
    }
}

/// Accumulates tokens into a [`SqlFragment`].
#[derive(Debug, Default)]
#[must_use = "builders have no effect until build() is called"]
pub struct FragmentBuilder {
    tokens: TokenStream,
}

impl FragmentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a keyword, operator or punctuation token.
    pub fn push(mut self, token: Token) -> Self {
        self.tokens.push(token);
        self
    }

    /// Append several tokens.
    pub fn append(mut self, tokens: impl IntoIterator<Item = Token>) -> Self {
        self.tokens.extend(tokens);
        self
    }

    /// Append a value as a bound parameter.
    pub fn param(mut self, value: impl Into<SqlValue>) -> Self {
        self.tokens.push(Token::Param(value.into()));
        self
    }

    /// Append an allow-listed identifier verbatim (quoted per dialect).
    pub fn column(mut self, column: impl Into<ColumnRef>) -> Self {
        self.tokens.push(Token::Column(column.into()));
        self
    }

    /// Append an existing fragment.
    pub fn fragment(mut self, fragment: &SqlFragment) -> Self {
        self.tokens.append(&fragment.tokens);
        self
    }

    /// Append an existing fragment wrapped in parentheses.
    pub fn grouped(mut self, fragment: &SqlFragment) -> Self {
        self.tokens.lparen().append(&fragment.tokens).rparen();
        self
    }

    /// Append fragments separated by ` {joiner} `.
    pub fn append_range<'a>(
        mut self,
        fragments: impl IntoIterator<Item = &'a SqlFragment>,
        joiner: Token,
    ) -> Self {
        for (i, fragment) in fragments.into_iter().enumerate() {
            if i > 0 {
                self.tokens.space().push(joiner.clone()).space();
            }
            self.tokens.append(&fragment.tokens);
        }
        self
    }

    pub fn space(mut self) -> Self {
        self.tokens.space();
        self
    }

    pub fn build(self) -> SqlFragment {
        SqlFragment {
            tokens: self.tokens,
        }
    }
}
