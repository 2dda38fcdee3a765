use std::{fmt, sync::Arc};

use crate::data_type::{DataType, TypeKind};
use crate::error::{Error, Result};

/// Represents a single data value read from a column.
///
/// This enum wraps every supported scalar into a single type so rows can be
/// accessed uniformly whatever the column kind. It includes SQL `NULL`.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// represents an empty or missing value.
    Null,
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    /// A UTF-8 string value, wrapped in an [Arc] for cheap cloning.
    String(Arc<str>),
}

impl Field {
    /// Returns `true` if the value is [Field::Null].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the scalar kind of this value.
    ///
    /// Returns `None` for [Field::Null]: a standalone NULL is untyped until it
    /// is placed in a nullable column.
    pub fn kind(&self) -> Option<TypeKind> {
        match self {
            Self::Null => None,
            Self::Int8(_) => Some(TypeKind::Int8),
            Self::Int16(_) => Some(TypeKind::Int16),
            Self::Int32(_) => Some(TypeKind::Int32),
            Self::Int64(_) => Some(TypeKind::Int64),
            Self::UInt8(_) => Some(TypeKind::UInt8),
            Self::UInt16(_) => Some(TypeKind::UInt16),
            Self::UInt32(_) => Some(TypeKind::UInt32),
            Self::UInt64(_) => Some(TypeKind::UInt64),
            Self::Float32(_) => Some(TypeKind::Float32),
            Self::Float64(_) => Some(TypeKind::Float64),
            Self::String(_) => Some(TypeKind::String),
        }
    }

    pub(crate) fn kind_name(&self) -> &'static str {
        self.kind().map_or("NULL", |kind| kind.name())
    }

    /// Extracts the value as the native type `T`.
    ///
    /// # Errors
    /// Returns [Error::WrongKind] if the stored kind is not `T`'s kind
    /// (including when the value is NULL).
    ///
    /// # Example
    /// ```
    /// # use coldb::value::Field;
    /// let field = Field::UInt32(7);
    /// assert_eq!(field.get::<u32>().unwrap(), 7);
    /// assert!(field.get::<i64>().is_err());
    /// ```
    pub fn get<T: NativeType>(&self) -> Result<T> {
        T::from_field(self).ok_or_else(|| Error::WrongKind {
            expected: T::KIND.name().to_string(),
            found: self.kind_name().to_string(),
        })
    }

    /// Converts a SQL literal into a value of `data_type`.
    ///
    /// An unquoted `NULL` (any case) is only accepted by nullable types.
    /// Numeric conversion is strict: overflow or trailing characters fail.
    pub fn from_literal(
        text: &str,
        quoted: bool,
        data_type: &DataType,
    ) -> std::result::Result<Field, String> {
        let is_null_keyword = !quoted && text.eq_ignore_ascii_case("NULL");
        match data_type {
            DataType::Nullable(_) if is_null_keyword => Ok(Self::Null),
            DataType::Nullable(nested) => Self::from_literal(text, quoted, nested),
            _ if is_null_keyword => Err(format!(
                "NULL is not allowed in a non-nullable {} column",
                data_type.name()
            )),
            DataType::Int8 => i8::parse_text(text).map(Self::Int8),
            DataType::Int16 => i16::parse_text(text).map(Self::Int16),
            DataType::Int32 => i32::parse_text(text).map(Self::Int32),
            DataType::Int64 => i64::parse_text(text).map(Self::Int64),
            DataType::UInt8 => u8::parse_text(text).map(Self::UInt8),
            DataType::UInt16 => u16::parse_text(text).map(Self::UInt16),
            DataType::UInt32 => u32::parse_text(text).map(Self::UInt32),
            DataType::UInt64 => u64::parse_text(text).map(Self::UInt64),
            DataType::Float32 => f32::parse_text(text).map(Self::Float32),
            DataType::Float64 => f64::parse_text(text).map(Self::Float64),
            DataType::String => Arc::<str>::parse_text(text).map(Self::String),
        }
    }
}

/// Canonical text rendering: floats use six decimals, NULL renders as `NULL`.
impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Int8(v) => write!(f, "{v}"),
            Self::Int16(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::UInt8(v) => write!(f, "{v}"),
            Self::UInt16(v) => write!(f, "{v}"),
            Self::UInt32(v) => write!(f, "{v}"),
            Self::UInt64(v) => write!(f, "{v}"),
            Self::Float32(v) => write!(f, "{v:.6}"),
            Self::Float64(v) => write!(f, "{v:.6}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

/// A Rust type that backs one scalar column kind.
pub trait NativeType: Clone + PartialOrd + fmt::Debug + Send + Sync + 'static {
    const KIND: TypeKind;

    /// Value stored by `Column::insert_default`.
    fn default_value() -> Self;

    fn from_field(field: &Field) -> Option<Self>;

    fn into_field(self) -> Field;

    fn parse_text(text: &str) -> std::result::Result<Self, String>;
}

macro_rules! impl_native_type {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl NativeType for $ty {
                const KIND: TypeKind = TypeKind::$variant;

                fn default_value() -> Self {
                    <$ty>::default()
                }

                fn from_field(field: &Field) -> Option<Self> {
                    match field {
                        Field::$variant(v) => Some(*v),
                        _ => None,
                    }
                }

                fn into_field(self) -> Field {
                    Field::$variant(self)
                }

                fn parse_text(text: &str) -> std::result::Result<Self, String> {
                    text.parse::<$ty>().map_err(|e| e.to_string())
                }
            }
        )*
    };
}

impl_native_type!(
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64,
);

impl NativeType for Arc<str> {
    const KIND: TypeKind = TypeKind::String;

    fn default_value() -> Self {
        Arc::from("")
    }

    fn from_field(field: &Field) -> Option<Self> {
        match field {
            Field::String(s) => Some(Arc::clone(s)),
            _ => None,
        }
    }

    fn into_field(self) -> Field {
        Field::String(self)
    }

    fn parse_text(text: &str) -> std::result::Result<Self, String> {
        Ok(Arc::from(text))
    }
}
