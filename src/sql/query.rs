//! Query builder - construct the SELECT statements the engine runs.

use super::column::{ColumnRef, TableName};
use super::dialect::{Dialect, SqlDialect};
use super::fragment::{CompiledSql, SqlFragment};
use super::token::{SqlFunction, Token, TokenStream};
use super::value::SqlValue;

// =============================================================================
// Select list
// =============================================================================

/// A SELECT list item.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    Column(ColumnRef),
    /// `COUNT(*) AS alias`
    CountStar { alias: &'static str },
}

impl SelectItem {
    fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();
        match self {
            SelectItem::Column(column) => {
                ts.push(Token::Column(column.clone()));
            }
            SelectItem::CountStar { alias } => {
                ts.push(Token::Function(SqlFunction::Count))
                    .lparen()
                    .push(Token::Star)
                    .rparen()
                    .space()
                    .push(Token::As)
                    .space()
                    .push(Token::Alias(alias));
            }
        }
        ts
    }
}

// =============================================================================
// ORDER BY
// =============================================================================

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

/// NULLS ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullsOrder {
    First,
    Last,
}

/// What a row is ordered by.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderKey {
    /// The column value itself.
    Column(ColumnRef),
    /// `CASE column WHEN v1 THEN 0 WHEN v2 THEN 1 ... END`: an explicit ordering
    /// of the column's values, used where surrogate keys carry no order.
    ///
    /// Integer values are catalog surrogate keys and render inline, so the
    /// statement stays under the store's bound-parameter limit however many
    /// options a facet has.
    Ordinal {
        column: ColumnRef,
        values: Vec<SqlValue>,
    },
}

/// An ORDER BY expression.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct OrderByExpr {
    pub key: OrderKey,
    pub dir: SortDir,
    pub nulls: Option<NullsOrder>,
}

impl OrderByExpr {
    pub fn new(key: OrderKey, dir: SortDir) -> Self {
        Self {
            key,
            dir,
            nulls: None,
        }
    }

    pub fn asc(key: OrderKey) -> Self {
        Self::new(key, SortDir::Asc)
    }

    pub fn desc(key: OrderKey) -> Self {
        Self::new(key, SortDir::Desc)
    }

    pub fn nulls_last(mut self) -> Self {
        self.nulls = Some(NullsOrder::Last);
        self
    }

    /// Convert to tokens for a specific dialect.
    ///
    /// Skips NULLS FIRST/LAST for dialects that don't support it.
    pub fn to_tokens_for_dialect(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();

        match &self.key {
            OrderKey::Column(column) => {
                ts.push(Token::Column(column.clone()));
            }
            OrderKey::Ordinal { column, values } => {
                ts.push(Token::Case)
                    .space()
                    .push(Token::Column(column.clone()));
                for (ordinal, value) in values.iter().enumerate() {
                    let value = match value {
                        SqlValue::Int(key) => Token::LitInt(*key),
                        other => Token::Param(other.clone()),
                    };
                    ts.space()
                        .push(Token::When)
                        .space()
                        .push(value)
                        .space()
                        .push(Token::Then)
                        .space()
                        .push(Token::LitInt(ordinal as i64));
                }
                ts.space()
                    .push(Token::Else)
                    .space()
                    .push(Token::LitInt(values.len() as i64))
                    .space()
                    .push(Token::End);
            }
        }

        ts.space().push(match self.dir {
            SortDir::Asc => Token::Asc,
            SortDir::Desc => Token::Desc,
        });

        if let Some(nulls) = &self.nulls {
            if dialect.supports_nulls_ordering() {
                ts.space().push(match nulls {
                    NullsOrder::First => Token::NullsFirst,
                    NullsOrder::Last => Token::NullsLast,
                });
            }
        }

        ts
    }
}

// =============================================================================
// LIMIT / OFFSET
// =============================================================================

/// LIMIT and OFFSET clause.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LimitOffset {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl LimitOffset {
    /// Delegates to `SqlDialect::emit_limit_offset()` for the actual formatting.
    pub fn to_tokens(&self, dialect: Dialect) -> TokenStream {
        dialect.emit_limit_offset(self.limit, self.offset)
    }
}

// =============================================================================
// Query Builder
// =============================================================================

/// A SELECT query over a version's data table.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "Query has no effect until compiled with compile()"]
pub struct Query {
    pub select: Vec<SelectItem>,
    pub from: TableName,
    pub where_clause: Option<SqlFragment>,
    pub order_by: Vec<OrderByExpr>,
    pub limit_offset: Option<LimitOffset>,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            select: Vec::new(),
            from: TableName::Data,
            where_clause: None,
            order_by: Vec::new(),
            limit_offset: None,
        }
    }
}

impl Query {
    /// Create a new empty query over the data table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the SELECT list to the given columns.
    pub fn select(mut self, columns: impl IntoIterator<Item = ColumnRef>) -> Self {
        self.select = columns.into_iter().map(SelectItem::Column).collect();
        self
    }

    /// SELECT COUNT(*) AS alias
    pub fn select_count(mut self, alias: &'static str) -> Self {
        self.select = vec![SelectItem::CountStar { alias }];
        self
    }

    /// Set the WHERE fragment.
    pub fn filter(mut self, condition: SqlFragment) -> Self {
        self.where_clause = Some(condition);
        self
    }

    /// Set the ORDER BY clause.
    pub fn order_by(mut self, exprs: Vec<OrderByExpr>) -> Self {
        self.order_by = exprs;
        self
    }

    /// Set LIMIT.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit_offset.get_or_insert_with(LimitOffset::default).limit = Some(limit);
        self
    }

    /// Set OFFSET.
    pub fn offset(mut self, offset: u64) -> Self {
        self.limit_offset.get_or_insert_with(LimitOffset::default).offset = Some(offset);
        self
    }

    /// Convert to token stream for a specific dialect.
    pub fn to_tokens_for_dialect(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();

        ts.push(Token::Select).space();
        if self.select.is_empty() {
            ts.push(Token::Star);
        }
        for (i, item) in self.select.iter().enumerate() {
            if i > 0 {
                ts.comma().space();
            }
            ts.append(&item.to_tokens());
        }

        ts.newline()
            .push(Token::From)
            .space()
            .push(Token::Table(self.from));

        if let Some(where_clause) = &self.where_clause {
            ts.newline()
                .push(Token::Where)
                .space()
                .append(where_clause.tokens());
        }

        if !self.order_by.is_empty() {
            ts.newline().push(Token::OrderBy).space();
            for (i, ob) in self.order_by.iter().enumerate() {
                if i > 0 {
                    ts.comma().space();
                }
                ts.append(&ob.to_tokens_for_dialect(dialect));
            }
        }

        if let Some(lo) = &self.limit_offset {
            let lo_tokens = lo.to_tokens(dialect);
            if !lo_tokens.is_empty() {
                ts.newline().append(&lo_tokens);
            }
        }

        ts
    }

    /// Generate SQL text and parameters for a specific dialect.
    pub fn compile(&self, dialect: Dialect) -> CompiledSql {
        let ts = self.to_tokens_for_dialect(dialect);
        CompiledSql {
            sql: ts.serialize(dialect),
            params: ts.params(),
        }
    }
}
