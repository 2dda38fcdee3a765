use std::sync::Arc;

use bitvec::prelude::*;

use crate::data_type::DataType;
use crate::error::{Error, Result};
use crate::value::{Field, NativeType};

/// Contiguous storage for the values of one scalar kind.
#[derive(Debug, Clone)]
pub struct ColumnVector<T> {
    data: Vec<T>,
    data_type: Arc<DataType>,
}

impl<T: NativeType> ColumnVector<T> {
    pub fn new(data_type: Arc<DataType>) -> Self {
        Self {
            data: Vec::new(),
            data_type,
        }
    }

    pub fn push(&mut self, value: T) {
        self.data.push(value);
    }

    pub fn get(&self, row_idx: usize) -> Option<&T> {
        self.data.get(row_idx)
    }

    /// Returns the raw values.
    pub fn values(&self) -> &[T] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn push_field(&mut self, value: &Field) -> bool {
        match T::from_field(value) {
            Some(native) => {
                self.data.push(native);
                true
            }
            None => false,
        }
    }

    fn push_default(&mut self) {
        self.data.push(T::default_value());
    }

    fn pop_field(&mut self) -> Option<Field> {
        self.data.pop().map(T::into_field)
    }

    fn get_field(&self, row_idx: usize) -> Option<Field> {
        self.data.get(row_idx).cloned().map(T::into_field)
    }
}

/// Decorates a value column with a parallel null bitmap.
///
/// A `true` bit means the row is `NULL`; the nested column then holds a
/// default placeholder so both sequences keep the same length.
#[derive(Debug, Clone)]
pub struct ColumnNullable {
    nested: Box<Column>,
    null_bitmap: BitVec,
    data_type: Arc<DataType>,
}

impl ColumnNullable {
    pub fn nested(&self) -> &Column {
        &self.nested
    }

    pub fn null_bitmap(&self) -> &BitSlice {
        &self.null_bitmap
    }
}

/// A typed, growable column.
///
/// The set of variants is closed: one per scalar kind plus the nullable
/// decorator, so every dispatch site is checked exhaustively.
#[derive(Debug, Clone)]
pub enum Column {
    Int8(ColumnVector<i8>),
    Int16(ColumnVector<i16>),
    Int32(ColumnVector<i32>),
    Int64(ColumnVector<i64>),
    UInt8(ColumnVector<u8>),
    UInt16(ColumnVector<u16>),
    UInt32(ColumnVector<u32>),
    UInt64(ColumnVector<u64>),
    Float32(ColumnVector<f32>),
    Float64(ColumnVector<f64>),
    String(ColumnVector<Arc<str>>),
    Nullable(ColumnNullable),
}

/// Runs `$body` with `$col` bound to the inner [ColumnVector] of any scalar
/// variant, or `$nbody` with `$n` bound to the [ColumnNullable].
macro_rules! dispatch {
    ($self:expr, $col:ident => $body:expr, $n:ident => $nbody:expr) => {
        match $self {
            Column::Int8($col) => $body,
            Column::Int16($col) => $body,
            Column::Int32($col) => $body,
            Column::Int64($col) => $body,
            Column::UInt8($col) => $body,
            Column::UInt16($col) => $body,
            Column::UInt32($col) => $body,
            Column::UInt64($col) => $body,
            Column::Float32($col) => $body,
            Column::Float64($col) => $body,
            Column::String($col) => $body,
            Column::Nullable($n) => $nbody,
        }
    };
}

impl Column {
    /// Creates a new, empty column for `data_type`.
    pub fn new(data_type: Arc<DataType>) -> Self {
        match data_type.as_ref() {
            DataType::Int8 => Self::Int8(ColumnVector::new(data_type)),
            DataType::Int16 => Self::Int16(ColumnVector::new(data_type)),
            DataType::Int32 => Self::Int32(ColumnVector::new(data_type)),
            DataType::Int64 => Self::Int64(ColumnVector::new(data_type)),
            DataType::UInt8 => Self::UInt8(ColumnVector::new(data_type)),
            DataType::UInt16 => Self::UInt16(ColumnVector::new(data_type)),
            DataType::UInt32 => Self::UInt32(ColumnVector::new(data_type)),
            DataType::UInt64 => Self::UInt64(ColumnVector::new(data_type)),
            DataType::Float32 => Self::Float32(ColumnVector::new(data_type)),
            DataType::Float64 => Self::Float64(ColumnVector::new(data_type)),
            DataType::String => Self::String(ColumnVector::new(data_type)),
            DataType::Nullable(nested) => Self::Nullable(ColumnNullable {
                nested: Box::new(Self::new(Arc::clone(nested))),
                null_bitmap: bitvec!(),
                data_type,
            }),
        }
    }

    /// Builds a column of `data_type` holding `fields` in order.
    ///
    /// # Errors
    /// Fails like [Column::push] on the first value of the wrong kind.
    pub fn from_fields(
        data_type: Arc<DataType>,
        fields: impl IntoIterator<Item = Field>,
    ) -> Result<Self> {
        let mut column = Self::new(data_type);
        for field in fields {
            column.push(field)?;
        }
        Ok(column)
    }

    /// Returns the shared type descriptor owned by this column.
    pub fn data_type(&self) -> &Arc<DataType> {
        dispatch!(self, col => &col.data_type, n => &n.data_type)
    }

    /// Returns the number of rows currently stored in the column.
    pub fn len(&self) -> usize {
        dispatch!(self, col => col.len(), n => n.null_bitmap.len())
    }

    /// Returns true if there is no row in the column, else false.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        dispatch!(self, col => col.data.clear(), n => {
            n.nested.clear();
            n.null_bitmap.clear();
        })
    }

    /// Appends the default value of the column kind.
    ///
    /// Zero for numbers, the empty string for text and `NULL` for nullable columns.
    pub fn insert_default(&mut self) {
        dispatch!(self, col => col.push_default(), n => {
            n.nested.insert_default();
            n.null_bitmap.push(true);
        })
    }

    /// Removes the last row, returning its value, or `None` if the column is empty.
    pub fn pop_back(&mut self) -> Option<Field> {
        dispatch!(self, col => col.pop_field(), n => {
            let is_null = n.null_bitmap.pop()?;
            let value = n.nested.pop_back()?;
            Some(if is_null { Field::Null } else { value })
        })
    }

    /// Appends a new value to the end of the column.
    ///
    /// # Errors
    /// Returns [Error::WrongKind] if the value's kind does not match the
    /// column kind, or if the value is `NULL` and the column is not nullable.
    /// Nothing is appended on error.
    ///
    /// # Example
    /// ```
    /// # use std::sync::Arc;
    /// # use coldb::{Column, DataType, Field};
    /// let mut col = Column::new(Arc::new(DataType::parse("Nullable(Int32)").unwrap()));
    /// col.push(Field::Int32(30)).unwrap();
    /// col.push(Field::Null).unwrap();
    ///
    /// assert_eq!(col.len(), 2);
    /// assert!(col.get(1).unwrap().is_null());
    /// ```
    pub fn push(&mut self, value: Field) -> Result<()> {
        let expected = self.data_type().name();
        dispatch!(self, col => {
            if !col.push_field(&value) {
                return Err(Error::WrongKind {
                    expected,
                    found: value.kind_name().to_string(),
                });
            }
        }, n => {
            let is_null = value.is_null();
            if is_null {
                n.nested.insert_default();
            } else {
                n.nested.push(value)?;
            }
            n.null_bitmap.push(is_null);
        });
        Ok(())
    }

    /// Copies row `row_idx` of `src` to the end of this column.
    ///
    /// # Errors
    /// Returns [Error::WrongKind] if `src` is a different column kind and
    /// [Error::RowOutOfRange] if `row_idx` is past its end.
    pub fn insert_from(&mut self, src: &Column, row_idx: usize) -> Result<()> {
        if row_idx >= src.len() {
            return Err(Error::RowOutOfRange {
                index: row_idx,
                len: src.len(),
            });
        }
        if self.data_type() != src.data_type() {
            return Err(Error::WrongKind {
                expected: self.data_type().name(),
                found: src.data_type().name(),
            });
        }
        match (self, src) {
            (Self::Nullable(dst), Self::Nullable(src)) => {
                dst.nested.insert_from(&src.nested, row_idx)?;
                dst.null_bitmap.push(src.null_bitmap[row_idx]);
                Ok(())
            }
            (dst, src) => match src.get(row_idx) {
                Some(value) => dst.push(value),
                None => Err(Error::RowOutOfRange {
                    index: row_idx,
                    len: src.len(),
                }),
            },
        }
    }

    /// Retrieves the value at the specified row index.
    ///
    /// Returns `None` if the index is out of bounds and `Some(Field::Null)`
    /// for a null row of a nullable column.
    pub fn get(&self, row_idx: usize) -> Option<Field> {
        dispatch!(self, col => col.get_field(row_idx), n => {
            if *n.null_bitmap.get(row_idx)? {
                Some(Field::Null)
            } else {
                n.nested.get(row_idx)
            }
        })
    }

    /// Returns true if the row is `NULL`; always false for non-nullable columns.
    pub fn is_null_at(&self, row_idx: usize) -> bool {
        match self {
            Self::Nullable(n) => n.null_bitmap.get(row_idx).is_some_and(|bit| *bit),
            _ => false,
        }
    }
}
