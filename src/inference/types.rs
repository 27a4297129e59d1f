//! Column types and the promotion lattice
//!
//! A column's type only ever moves up the lattice as new value kinds are
//! observed for it:
//!
//! ```text
//!                         VARCHAR
//!       ┌───────┬────────┬───┴────┬────────┬───────┐
//!    BOOLEAN VARBINARY TIMESTAMP DOUBLE  OBJECT  ARRAY
//!                                  │
//!                               DECIMAL
//!                                  │
//!                               BIGINT
//!                                  │
//!                               INTEGER
//!       └───────┴────────┴───┬────┴────────┴───────┘
//!                           NULL
//! ```
//!
//! `promote` is the least upper bound of the prior type and the native type of
//! the observed kind, so folding it over any ordering of the same kinds gives
//! the same result.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::ValueKind;

/// SQL-visible column type
///
/// `Object` and `Array` only exist while inferring; they mark fields that are
/// projected into virtual tables and never appear on a finished column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SqlType {
    Null,
    Boolean,
    Integer,
    BigInt,
    Decimal,
    Double,
    Varchar,
    VarBinary,
    Timestamp,
    Object,
    Array,
}

impl SqlType {
    /// SQL type name
    pub fn type_name(&self) -> &'static str {
        match self {
            SqlType::Null => "NULL",
            SqlType::Boolean => "BOOLEAN",
            SqlType::Integer => "INTEGER",
            SqlType::BigInt => "BIGINT",
            SqlType::Decimal => "DECIMAL",
            SqlType::Double => "DOUBLE",
            SqlType::Varchar => "VARCHAR",
            SqlType::VarBinary => "VARBINARY",
            SqlType::Timestamp => "TIMESTAMP",
            SqlType::Object => "OBJECT",
            SqlType::Array => "ARRAY",
        }
    }

    /// Whether values of this type are flattened into a virtual table
    pub fn is_complex(&self) -> bool {
        matches!(self, SqlType::Object | SqlType::Array)
    }

    fn numeric_rank(&self) -> Option<u8> {
        match self {
            SqlType::Integer => Some(0),
            SqlType::BigInt => Some(1),
            SqlType::Decimal => Some(2),
            SqlType::Double => Some(3),
            _ => None,
        }
    }

    /// Least upper bound of two types
    pub fn join(self, other: SqlType) -> SqlType {
        if self == other {
            return self;
        }

        match (self, other) {
            (SqlType::Null, t) | (t, SqlType::Null) => t,
            (a, b) => match (a.numeric_rank(), b.numeric_rank()) {
                (Some(ra), Some(rb)) => {
                    if ra >= rb {
                        a
                    } else {
                        b
                    }
                }
                // Incomparable kinds (including Varchar itself) meet at the top
                _ => SqlType::Varchar,
            },
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl ValueKind {
    /// SQL type a value of this kind maps to when nothing else is known
    pub fn native_type(&self) -> SqlType {
        match self {
            ValueKind::Null => SqlType::Null,
            ValueKind::Boolean => SqlType::Boolean,
            ValueKind::Int32 => SqlType::Integer,
            ValueKind::Int64 => SqlType::BigInt,
            ValueKind::Decimal128 => SqlType::Decimal,
            ValueKind::Double => SqlType::Double,
            ValueKind::String | ValueKind::ObjectId | ValueKind::MinKey | ValueKind::MaxKey => {
                SqlType::Varchar
            }
            ValueKind::Binary => SqlType::VarBinary,
            ValueKind::DateTime => SqlType::Timestamp,
            ValueKind::Document => SqlType::Object,
            ValueKind::Array => SqlType::Array,
            ValueKind::RegularExpression
            | ValueKind::JavaScript
            | ValueKind::Symbol
            | ValueKind::Timestamp
            | ValueKind::Undefined
            | ValueKind::DbPointer => SqlType::Varchar,
        }
    }
}

/// Promote a column's type after observing a value of `observed` kind
pub fn promote(prior: SqlType, observed: ValueKind) -> SqlType {
    prior.join(observed.native_type())
}

/// Promotion for the document identifier field
///
/// Identifiers are never expanded into virtual tables, so complex kinds are
/// treated as strings.
pub fn promote_key(prior: SqlType, observed: ValueKind) -> SqlType {
    let next = promote(prior, observed);
    if next.is_complex() {
        SqlType::Varchar
    } else {
        next
    }
}

/// Whether moving from `prior` to `next` collapses a complex shape to a scalar
///
/// When this is true any virtual table built for the previous shape is stale.
pub fn collapses(prior: SqlType, next: SqlType) -> bool {
    prior.is_complex() && !next.is_complex()
}
