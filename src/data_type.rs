use std::{collections::HashMap, fmt, sync::Arc};

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};
use crate::value::Field;

/// Discriminant of a [DataType], without the nested type of `Nullable`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    String,
    Nullable,
}

impl TypeKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Int8 => "Int8",
            Self::Int16 => "Int16",
            Self::Int32 => "Int32",
            Self::Int64 => "Int64",
            Self::UInt8 => "UInt8",
            Self::UInt16 => "UInt16",
            Self::UInt32 => "UInt32",
            Self::UInt64 => "UInt64",
            Self::Float32 => "Float32",
            Self::Float64 => "Float64",
            Self::String => "String",
            Self::Nullable => "Nullable",
        }
    }
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Represents the supported data types of a table schema.
///
/// A `DataType` is immutable and shared behind an [Arc] by every schema entry
/// and every column using it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    /// A 8-bit signed integer.
    Int8,
    /// A 16-bit signed integer.
    Int16,
    /// A 32-bit signed integer.
    Int32,
    /// A 64-bit signed integer.
    Int64,
    /// A 8-bit unsigned integer.
    UInt8,
    /// A 16-bit unsigned integer.
    UInt16,
    /// A 32-bit unsigned integer.
    UInt32,
    /// A 64-bit unsigned integer.
    UInt64,
    /// A 32-bit floating-point number.
    Float32,
    /// A 64-bit floating-point number.
    Float64,
    /// A variable-length UTF-8 character string.
    String,
    /// Wraps another type and allows `NULL` values.
    Nullable(Arc<DataType>),
}

impl DataType {
    pub fn kind(&self) -> TypeKind {
        match self {
            Self::Int8 => TypeKind::Int8,
            Self::Int16 => TypeKind::Int16,
            Self::Int32 => TypeKind::Int32,
            Self::Int64 => TypeKind::Int64,
            Self::UInt8 => TypeKind::UInt8,
            Self::UInt16 => TypeKind::UInt16,
            Self::UInt32 => TypeKind::UInt32,
            Self::UInt64 => TypeKind::UInt64,
            Self::Float32 => TypeKind::Float32,
            Self::Float64 => TypeKind::Float64,
            Self::String => TypeKind::String,
            Self::Nullable(_) => TypeKind::Nullable,
        }
    }

    /// Returns the SQL name of the type, e.g. `Nullable(Int32)`.
    pub fn name(&self) -> String {
        match self {
            Self::Nullable(nested) => format!("Nullable({})", nested.name()),
            other => other.kind().name().to_string(),
        }
    }

    /// Fixed binary width in bytes, or `None` for variable-length types.
    ///
    /// A nullable type needs one extra byte for its null flag.
    pub fn size(&self) -> Option<usize> {
        match self {
            Self::Int8 | Self::UInt8 => Some(1),
            Self::Int16 | Self::UInt16 => Some(2),
            Self::Int32 | Self::UInt32 | Self::Float32 => Some(4),
            Self::Int64 | Self::UInt64 | Self::Float64 => Some(8),
            Self::String => None,
            Self::Nullable(nested) => nested.size().map(|size| size + 1),
        }
    }

    pub fn is_nullable(&self) -> bool {
        matches!(self, Self::Nullable(_))
    }

    /// Returns the wrapped type of a `Nullable`, `None` for scalar types.
    pub fn nested(&self) -> Option<&Arc<DataType>> {
        match self {
            Self::Nullable(nested) => Some(nested),
            _ => None,
        }
    }

    /// Strips every `Nullable` wrapper and returns the underlying scalar type.
    pub fn scalar(&self) -> &DataType {
        match self {
            Self::Nullable(nested) => nested.scalar(),
            other => other,
        }
    }

    /// Parses a type name.
    ///
    /// Scalar names are matched exactly (case-sensitive), `Nullable(X)` recurses on `X`.
    ///
    /// # Errors
    /// Returns [Error::UnknownType] for any other name.
    pub fn parse(name: &str) -> Result<DataType> {
        let data_type = match name {
            "Int8" => Self::Int8,
            "Int16" => Self::Int16,
            "Int32" => Self::Int32,
            "Int64" => Self::Int64,
            "UInt8" => Self::UInt8,
            "UInt16" => Self::UInt16,
            "UInt32" => Self::UInt32,
            "UInt64" => Self::UInt64,
            "Float32" => Self::Float32,
            "Float64" => Self::Float64,
            "String" => Self::String,
            _ => {
                let nested = name
                    .strip_prefix("Nullable(")
                    .and_then(|rest| rest.strip_suffix(')'))
                    .filter(|inner| !inner.is_empty())
                    .ok_or_else(|| Error::UnknownType(name.to_string()))?;
                Self::Nullable(Arc::new(Self::parse(nested)?))
            }
        };
        Ok(data_type)
    }

    /// Appends the little-endian binary encoding of `value` to `buffer`.
    ///
    /// Fixed-width types write their raw bytes, `String` writes a 4-byte length
    /// prefix followed by the UTF-8 bytes, `Nullable` writes a flag byte
    /// (1 = null) followed by the nested encoding when the value is not null.
    ///
    /// # Errors
    /// Returns [Error::WrongKind] if `value` does not belong to this type.
    pub fn serialize_binary(&self, value: &Field, buffer: &mut Vec<u8>) -> Result<()> {
        match (self, value) {
            (Self::Nullable(_), Field::Null) => buffer.push(1),
            (Self::Nullable(nested), value) => {
                let start = buffer.len();
                buffer.push(0);
                if let Err(err) = nested.serialize_binary(value, buffer) {
                    buffer.truncate(start);
                    return Err(err);
                }
            }
            (Self::Int8, Field::Int8(v)) => buffer.push(*v as u8),
            (Self::UInt8, Field::UInt8(v)) => buffer.push(*v),
            (Self::Int16, Field::Int16(v)) => {
                LittleEndian::write_i16(reserve(buffer, 2), *v);
            }
            (Self::UInt16, Field::UInt16(v)) => {
                LittleEndian::write_u16(reserve(buffer, 2), *v);
            }
            (Self::Int32, Field::Int32(v)) => {
                LittleEndian::write_i32(reserve(buffer, 4), *v);
            }
            (Self::UInt32, Field::UInt32(v)) => {
                LittleEndian::write_u32(reserve(buffer, 4), *v);
            }
            (Self::Int64, Field::Int64(v)) => {
                LittleEndian::write_i64(reserve(buffer, 8), *v);
            }
            (Self::UInt64, Field::UInt64(v)) => {
                LittleEndian::write_u64(reserve(buffer, 8), *v);
            }
            (Self::Float32, Field::Float32(v)) => {
                LittleEndian::write_f32(reserve(buffer, 4), *v);
            }
            (Self::Float64, Field::Float64(v)) => {
                LittleEndian::write_f64(reserve(buffer, 8), *v);
            }
            (Self::String, Field::String(s)) => {
                let len = u32::try_from(s.len()).map_err(|_| Error::WrongKind {
                    expected: "String shorter than 4 GiB".into(),
                    found: format!("String of {} bytes", s.len()),
                })?;
                LittleEndian::write_u32(reserve(buffer, 4), len);
                buffer.extend_from_slice(s.as_bytes());
            }
            (expected, found) => {
                return Err(Error::WrongKind {
                    expected: expected.name(),
                    found: found.kind_name().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Decodes one value from the start of `buffer`.
    ///
    /// Returns the value and the number of bytes consumed.
    ///
    /// # Errors
    /// Returns [Error::TruncatedData] if `buffer` is shorter than the encoded length.
    pub fn deserialize_binary(&self, buffer: &[u8]) -> Result<(Field, usize)> {
        let decoded = match self {
            Self::Nullable(nested) => {
                if take(buffer, 1)?[0] != 0 {
                    return Ok((Field::Null, 1));
                }
                let (value, used) = nested.deserialize_binary(&buffer[1..])?;
                (value, used + 1)
            }
            Self::String => {
                let len = LittleEndian::read_u32(take(buffer, 4)?) as usize;
                let bytes = &take(buffer, 4 + len)?[4..];
                let text = String::from_utf8_lossy(bytes);
                (Field::String(Arc::from(text.as_ref())), 4 + len)
            }
            Self::Int8 => (Field::Int8(take(buffer, 1)?[0] as i8), 1),
            Self::UInt8 => (Field::UInt8(take(buffer, 1)?[0]), 1),
            Self::Int16 => (Field::Int16(LittleEndian::read_i16(take(buffer, 2)?)), 2),
            Self::UInt16 => (Field::UInt16(LittleEndian::read_u16(take(buffer, 2)?)), 2),
            Self::Int32 => (Field::Int32(LittleEndian::read_i32(take(buffer, 4)?)), 4),
            Self::UInt32 => (Field::UInt32(LittleEndian::read_u32(take(buffer, 4)?)), 4),
            Self::Int64 => (Field::Int64(LittleEndian::read_i64(take(buffer, 8)?)), 8),
            Self::UInt64 => (Field::UInt64(LittleEndian::read_u64(take(buffer, 8)?)), 8),
            Self::Float32 => (Field::Float32(LittleEndian::read_f32(take(buffer, 4)?)), 4),
            Self::Float64 => (Field::Float64(LittleEndian::read_f64(take(buffer, 8)?)), 8),
        };
        Ok(decoded)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

fn reserve(buffer: &mut Vec<u8>, width: usize) -> &mut [u8] {
    let start = buffer.len();
    buffer.resize(start + width, 0);
    &mut buffer[start..]
}

fn take(buffer: &[u8], needed: usize) -> Result<&[u8]> {
    buffer.get(..needed).ok_or(Error::TruncatedData {
        needed,
        available: buffer.len(),
    })
}

/// Creates [DataType] descriptors from type names and hands out one shared
/// instance per distinct name.
#[derive(Debug, Default)]
pub struct TypeFactory {
    cache: HashMap<String, Arc<DataType>>,
}

impl TypeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the shared descriptor for `name`, parsing it on first use.
    ///
    /// # Errors
    /// Returns [Error::UnknownType] if the name is not a supported type.
    pub fn create(&mut self, name: &str) -> Result<Arc<DataType>> {
        if let Some(data_type) = self.cache.get(name) {
            return Ok(Arc::clone(data_type));
        }
        let data_type = Arc::new(DataType::parse(name)?);
        self.cache.insert(name.to_string(), Arc::clone(&data_type));
        Ok(data_type)
    }
}
