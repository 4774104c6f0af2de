//! SQL generation module.
//!
//! This module provides the injection-safe SQL layer the query compiler
//! targets:
//!
//! - [`token`] - Token types for SQL generation
//! - [`column`] - Allow-listed identifiers
//! - [`fragment`] - Parameterized fragments and their builder
//! - [`expr`] - Predicate IR with constant folding
//! - [`query`] - SELECT query builder
//! - [`dialect`] - SQL dialect implementations

pub mod column;
pub mod dialect;
pub mod expr;
pub mod fragment;
pub mod query;
pub mod token;
pub mod value;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types at the sql module level
pub use column::{CatalogColumn, ColumnRef, FixedColumn, InvalidIdentifier, TableName};
pub use dialect::{Dialect, SqlDialect};
pub use expr::{CompareOp, Predicate};
pub use fragment::{CompiledSql, FragmentBuilder, SqlFragment};
pub use query::{LimitOffset, NullsOrder, OrderByExpr, OrderKey, Query, SelectItem, SortDir};
pub use token::{SqlFunction, Token, TokenStream};
pub use value::SqlValue;
