//! Whole-table aggregate functions over columns of any scalar kind.
//!
//! Every scalar kind falls in one [Category]; the category picks the wide
//! accumulator (`i64`, `u64` or `f64`) a single generic routine runs with.

use std::cmp::Ordering;

use crate::ast::AggregateFunction;
use crate::column::Column;
use crate::data_type::{DataType, TypeKind};
use crate::error::{Error, Result};
use crate::value::Field;

/// Numeric family of a scalar kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Signed,
    Unsigned,
    Float,
    Text,
}

impl Category {
    pub fn of(kind: TypeKind) -> Self {
        match kind {
            TypeKind::Int8 | TypeKind::Int16 | TypeKind::Int32 | TypeKind::Int64 => Self::Signed,
            TypeKind::UInt8 | TypeKind::UInt16 | TypeKind::UInt32 | TypeKind::UInt64 => {
                Self::Unsigned
            }
            TypeKind::Float32 | TypeKind::Float64 => Self::Float,
            TypeKind::String | TypeKind::Nullable => Self::Text,
        }
    }
}

/// A wide numeric accumulator.
trait Accumulator: Copy {
    const ZERO: Self;

    fn widen(field: &Field) -> Option<Self>;

    fn add(self, other: Self) -> Option<Self>;

    fn into_field(self) -> Field;
}

impl Accumulator for i64 {
    const ZERO: Self = 0;

    fn widen(field: &Field) -> Option<Self> {
        match field {
            Field::Int8(v) => Some(i64::from(*v)),
            Field::Int16(v) => Some(i64::from(*v)),
            Field::Int32(v) => Some(i64::from(*v)),
            Field::Int64(v) => Some(*v),
            _ => None,
        }
    }

    fn add(self, other: Self) -> Option<Self> {
        self.checked_add(other)
    }

    fn into_field(self) -> Field {
        Field::Int64(self)
    }
}

impl Accumulator for u64 {
    const ZERO: Self = 0;

    fn widen(field: &Field) -> Option<Self> {
        match field {
            Field::UInt8(v) => Some(u64::from(*v)),
            Field::UInt16(v) => Some(u64::from(*v)),
            Field::UInt32(v) => Some(u64::from(*v)),
            Field::UInt64(v) => Some(*v),
            _ => None,
        }
    }

    fn add(self, other: Self) -> Option<Self> {
        self.checked_add(other)
    }

    fn into_field(self) -> Field {
        Field::UInt64(self)
    }
}

impl Accumulator for f64 {
    const ZERO: Self = 0.0;

    fn widen(field: &Field) -> Option<Self> {
        as_f64(field)
    }

    fn add(self, other: Self) -> Option<Self> {
        Some(self + other)
    }

    fn into_field(self) -> Field {
        Field::Float64(self)
    }
}

fn as_f64(field: &Field) -> Option<f64> {
    match field {
        Field::Int8(v) => Some(f64::from(*v)),
        Field::Int16(v) => Some(f64::from(*v)),
        Field::Int32(v) => Some(f64::from(*v)),
        Field::Int64(v) => Some(*v as f64),
        Field::UInt8(v) => Some(f64::from(*v)),
        Field::UInt16(v) => Some(f64::from(*v)),
        Field::UInt32(v) => Some(f64::from(*v)),
        Field::UInt64(v) => Some(*v as f64),
        Field::Float32(v) => Some(f64::from(*v)),
        Field::Float64(v) => Some(*v),
        Field::Null | Field::String(_) => None,
    }
}

/// Orders two values of the same scalar kind.
fn compare(a: &Field, b: &Field) -> Option<Ordering> {
    match (a, b) {
        (Field::Int8(a), Field::Int8(b)) => a.partial_cmp(b),
        (Field::Int16(a), Field::Int16(b)) => a.partial_cmp(b),
        (Field::Int32(a), Field::Int32(b)) => a.partial_cmp(b),
        (Field::Int64(a), Field::Int64(b)) => a.partial_cmp(b),
        (Field::UInt8(a), Field::UInt8(b)) => a.partial_cmp(b),
        (Field::UInt16(a), Field::UInt16(b)) => a.partial_cmp(b),
        (Field::UInt32(a), Field::UInt32(b)) => a.partial_cmp(b),
        (Field::UInt64(a), Field::UInt64(b)) => a.partial_cmp(b),
        (Field::Float32(a), Field::Float32(b)) => a.partial_cmp(b),
        (Field::Float64(a), Field::Float64(b)) => a.partial_cmp(b),
        (Field::String(a), Field::String(b)) => a.partial_cmp(b),
        _ => None,
    }
}

fn is_nan(field: &Field) -> bool {
    match field {
        Field::Float32(v) => v.is_nan(),
        Field::Float64(v) => v.is_nan(),
        _ => false,
    }
}

/// Iterates over the non-null values of every column chunk.
fn non_null_values<'a>(chunks: &'a [&'a Column]) -> impl Iterator<Item = Field> + 'a {
    chunks.iter().flat_map(|&column| {
        (0..column.len())
            .filter(move |&row| !column.is_null_at(row))
            .filter_map(move |row| column.get(row))
    })
}

fn sum<A: Accumulator>(chunks: &[&Column], column: &str) -> Result<Field> {
    let mut total = A::ZERO;
    for value in non_null_values(chunks) {
        let Some(value) = A::widen(&value) else {
            continue;
        };
        total = total.add(value).ok_or_else(|| Error::AggregateOverflow {
            function: "SUM",
            column: column.to_string(),
        })?;
    }
    Ok(total.into_field())
}

fn average(chunks: &[&Column]) -> Field {
    let (total, count) = non_null_values(chunks)
        .filter_map(|value| as_f64(&value))
        .fold((0.0, 0usize), |(total, count), value| (total + value, count + 1));
    if count == 0 {
        Field::Float64(0.0)
    } else {
        Field::Float64(total / count as f64)
    }
}

fn extremum(
    chunks: &[&Column],
    column: &str,
    function: AggregateFunction,
    keep: Ordering,
) -> Result<Field> {
    // NaN is unordered; it only wins when every value is NaN
    non_null_values(chunks)
        .reduce(|best, value| {
            if (is_nan(&best) && !is_nan(&value)) || compare(&value, &best) == Some(keep) {
                value
            } else {
                best
            }
        })
        .ok_or_else(|| Error::NoNonNullValues {
            function: function.name(),
            column: column.to_string(),
        })
}

/// Type of the single value `function` produces for a column of `data_type`.
///
/// # Errors
/// Returns [Error::UnsupportedAggregateType] for anything but `COUNT` on text.
pub fn result_type(function: AggregateFunction, data_type: &DataType) -> Result<DataType> {
    let scalar = data_type.scalar();
    let category = Category::of(scalar.kind());
    if category == Category::Text && function != AggregateFunction::Count {
        return Err(Error::UnsupportedAggregateType {
            function: function.name(),
            type_name: scalar.name(),
        });
    }
    Ok(match (function, category) {
        (AggregateFunction::Count, _) => DataType::UInt64,
        (AggregateFunction::Avg, _) => DataType::Float64,
        (AggregateFunction::Sum, Category::Signed) => DataType::Int64,
        (AggregateFunction::Sum, Category::Unsigned) => DataType::UInt64,
        (AggregateFunction::Sum, _) => DataType::Float64,
        (AggregateFunction::Min | AggregateFunction::Max, _) => scalar.clone(),
    })
}

/// Computes `function` over every chunk of one column.
///
/// `chunks` are the per-block pieces of the column named `column`, all of
/// type `data_type`. Null rows are skipped.
///
/// # Errors
/// - [Error::UnsupportedAggregateType] for non-`COUNT` functions on text.
/// - [Error::NoNonNullValues] for `MIN`/`MAX` without any non-null value.
/// - [Error::AggregateOverflow] if a `SUM` leaves its accumulator's range.
pub fn compute(
    function: AggregateFunction,
    column: &str,
    data_type: &DataType,
    chunks: &[&Column],
) -> Result<Field> {
    result_type(function, data_type)?;
    let category = Category::of(data_type.scalar().kind());

    match function {
        AggregateFunction::Count => Ok(Field::UInt64(non_null_values(chunks).count() as u64)),
        AggregateFunction::Sum => match category {
            Category::Signed => sum::<i64>(chunks, column),
            Category::Unsigned => sum::<u64>(chunks, column),
            _ => sum::<f64>(chunks, column),
        },
        AggregateFunction::Avg => Ok(average(chunks)),
        AggregateFunction::Min => extremum(chunks, column, function, Ordering::Less),
        AggregateFunction::Max => extremum(chunks, column, function, Ordering::Greater),
    }
}

/// `COUNT(*)`: the total number of rows.
pub fn count_rows(row_counts: impl IntoIterator<Item = usize>) -> Field {
    Field::UInt64(row_counts.into_iter().sum::<usize>() as u64)
}
