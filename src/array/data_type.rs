//! Array data types.
//!
//! Only fixed-size numeric and boolean data types are supported.
//! Elements are held in memory in native endianness, the [`bytes`](crate::array::codec::BytesCodec) codec sets the stored endianness.

use derive_more::From;
use serde::{de::Error as _, Deserialize, Serialize};
use thiserror::Error;

use super::FillValue;

/// A data type.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[rustfmt::skip]
pub enum DataType {
    /// `bool` Boolean.
    Bool,
    /// `int8` Integer in `[-2^7, 2^7-1]`.
    Int8,
    /// `int16` Integer in `[-2^15, 2^15-1]`.
    Int16,
    /// `int32` Integer in `[-2^31, 2^31-1]`.
    Int32,
    /// `int64` Integer in `[-2^63, 2^63-1]`.
    Int64,
    /// `uint8` Integer in `[0, 2^8-1]`.
    UInt8,
    /// `uint16` Integer in `[0, 2^16-1]`.
    UInt16,
    /// `uint32` Integer in `[0, 2^32-1]`.
    UInt32,
    /// `uint64` Integer in `[0, 2^64-1]`.
    UInt64,
    /// `float32` IEEE 754 single-precision floating point: sign bit, 8 bits exponent, 23 bits mantissa.
    Float32,
    /// `float64` IEEE 754 double-precision floating point: sign bit, 11 bits exponent, 52 bits mantissa.
    Float64,
}

/// An unsupported data type error.
#[derive(Debug, Error, From)]
#[error("unsupported data type {0}")]
pub struct UnsupportedDataTypeError(String);

/// A fill value metadata incompatibility error.
#[derive(Debug, Error)]
#[error("incompatible fill value {1} for data type {0}")]
pub struct IncompatibleFillValueMetadataError(DataType, serde_json::Value);

/// A fill value incompatibility error.
#[derive(Debug, Error)]
#[error("incompatible fill value {1} for data type {0}")]
pub struct IncompatibleFillValueError(DataType, FillValue);

impl IncompatibleFillValueError {
    /// Create a new incompatible fill value error.
    #[must_use]
    pub const fn new(data_type: DataType, fill_value: FillValue) -> Self {
        Self(data_type, fill_value)
    }
}

impl core::fmt::Display for DataType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Serialize for DataType {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for DataType {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let name = String::deserialize(d)?;
        Self::from_name(&name).map_err(|err| D::Error::custom(err.to_string()))
    }
}

impl DataType {
    /// Returns the name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt8 => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
        }
    }

    /// Returns the size of an element in bytes.
    #[must_use]
    pub const fn size(&self) -> usize {
        match self {
            Self::Bool | Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 => 8,
        }
    }

    /// Create a data type from its name.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedDataTypeError`] if `name` is not a supported data type.
    pub fn from_name(name: &str) -> Result<Self, UnsupportedDataTypeError> {
        match name {
            "bool" => Ok(Self::Bool),
            "int8" => Ok(Self::Int8),
            "int16" => Ok(Self::Int16),
            "int32" => Ok(Self::Int32),
            "int64" => Ok(Self::Int64),
            "uint8" => Ok(Self::UInt8),
            "uint16" => Ok(Self::UInt16),
            "uint32" => Ok(Self::UInt32),
            "uint64" => Ok(Self::UInt64),
            "float32" => Ok(Self::Float32),
            "float64" => Ok(Self::Float64),
            _ => Err(UnsupportedDataTypeError(name.to_string())),
        }
    }

    /// Create a fill value from a JSON scalar.
    ///
    /// Floating point fill values may also be `"NaN"`, `"Infinity"`, `"-Infinity"`, or a big-endian hex string of the bit pattern (e.g. `"0x7fc00000"`).
    ///
    /// # Errors
    ///
    /// Returns [`IncompatibleFillValueMetadataError`] if the fill value is incompatible with the data type.
    pub fn fill_value_from_metadata(
        &self,
        fill_value: &serde_json::Value,
    ) -> Result<FillValue, IncompatibleFillValueMetadataError> {
        use serde_json::Value;
        use FillValue as FV;
        let err = || IncompatibleFillValueMetadataError(*self, fill_value.clone());
        let as_i64 = || fill_value.as_i64().ok_or_else(err);
        let as_u64 = || fill_value.as_u64().ok_or_else(err);
        match self {
            Self::Bool => match fill_value {
                Value::Bool(value) => Ok(FV::from(*value)),
                _ => Err(err()),
            },
            Self::Int8 => Ok(FV::from(i8::try_from(as_i64()?).map_err(|_| err())?)),
            Self::Int16 => Ok(FV::from(i16::try_from(as_i64()?).map_err(|_| err())?)),
            Self::Int32 => Ok(FV::from(i32::try_from(as_i64()?).map_err(|_| err())?)),
            Self::Int64 => Ok(FV::from(as_i64()?)),
            Self::UInt8 => Ok(FV::from(u8::try_from(as_u64()?).map_err(|_| err())?)),
            Self::UInt16 => Ok(FV::from(u16::try_from(as_u64()?).map_err(|_| err())?)),
            Self::UInt32 => Ok(FV::from(u32::try_from(as_u64()?).map_err(|_| err())?)),
            Self::UInt64 => Ok(FV::from(as_u64()?)),
            Self::Float32 => match fill_value {
                Value::String(string) => match parse_non_finite(string) {
                    #[allow(clippy::cast_possible_truncation)]
                    Some(value) => Ok(FV::from(value as f32)),
                    None => {
                        let bits: [u8; 4] = parse_hex(string).ok_or_else(err)?;
                        Ok(FV::from(f32::from_be_bytes(bits)))
                    }
                },
                #[allow(clippy::cast_possible_truncation)]
                _ => Ok(FV::from(fill_value.as_f64().ok_or_else(err)? as f32)),
            },
            Self::Float64 => match fill_value {
                Value::String(string) => match parse_non_finite(string) {
                    Some(value) => Ok(FV::from(value)),
                    None => {
                        let bits: [u8; 8] = parse_hex(string).ok_or_else(err)?;
                        Ok(FV::from(f64::from_be_bytes(bits)))
                    }
                },
                _ => Ok(FV::from(fill_value.as_f64().ok_or_else(err)?)),
            },
        }
    }

    /// Create fill value metadata.
    ///
    /// # Errors
    ///
    /// Returns [`IncompatibleFillValueError`] if the fill value size does not match the data type size.
    pub fn metadata_fill_value(
        &self,
        fill_value: &FillValue,
    ) -> Result<serde_json::Value, IncompatibleFillValueError> {
        let err = || IncompatibleFillValueError::new(*self, fill_value.clone());
        let bytes = fill_value.as_ne_bytes();
        macro_rules! from_ne {
            ($t:ty) => {
                <$t>::from_ne_bytes(bytes.try_into().map_err(|_| err())?)
            };
        }
        if bytes.len() != self.size() {
            return Err(err());
        }
        Ok(match self {
            Self::Bool => serde_json::Value::Bool(bytes[0] != 0),
            Self::Int8 => from_ne!(i8).into(),
            Self::Int16 => from_ne!(i16).into(),
            Self::Int32 => from_ne!(i32).into(),
            Self::Int64 => from_ne!(i64).into(),
            Self::UInt8 => from_ne!(u8).into(),
            Self::UInt16 => from_ne!(u16).into(),
            Self::UInt32 => from_ne!(u32).into(),
            Self::UInt64 => from_ne!(u64).into(),
            Self::Float32 => {
                let value = from_ne!(f32);
                if value.is_nan() && value.to_bits() != f32::NAN.to_bits() {
                    format!("0x{:08x}", value.to_bits()).into()
                } else {
                    float_to_metadata(f64::from(value))
                }
            }
            Self::Float64 => {
                let value = from_ne!(f64);
                if value.is_nan() && value.to_bits() != f64::NAN.to_bits() {
                    format!("0x{:016x}", value.to_bits()).into()
                } else {
                    float_to_metadata(value)
                }
            }
        })
    }
}

fn parse_non_finite(string: &str) -> Option<f64> {
    match string {
        "NaN" => Some(f64::NAN),
        "Infinity" => Some(f64::INFINITY),
        "-Infinity" => Some(f64::NEG_INFINITY),
        _ => None,
    }
}

fn parse_hex<const N: usize>(string: &str) -> Option<[u8; N]> {
    let hex = string.strip_prefix("0x")?;
    if hex.len() != N * 2 {
        return None;
    }
    let mut bytes = [0u8; N];
    for (byte, i) in bytes.iter_mut().zip((0..hex.len()).step_by(2)) {
        *byte = u8::from_str_radix(hex.get(i..i + 2)?, 16).ok()?;
    }
    Some(bytes)
}

fn float_to_metadata(value: f64) -> serde_json::Value {
    if value.is_nan() {
        "NaN".into()
    } else if value.is_infinite() && value.is_sign_positive() {
        "Infinity".into()
    } else if value.is_infinite() {
        "-Infinity".into()
    } else {
        value.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_type_names() {
        for data_type in [
            DataType::Bool,
            DataType::Int8,
            DataType::Int16,
            DataType::Int32,
            DataType::Int64,
            DataType::UInt8,
            DataType::UInt16,
            DataType::UInt32,
            DataType::UInt64,
            DataType::Float32,
            DataType::Float64,
        ] {
            assert_eq!(DataType::from_name(data_type.name()).unwrap(), data_type);
        }
        assert!(DataType::from_name("complex64").is_err());
        let data_type: DataType = serde_json::from_str(r#""int32""#).unwrap();
        assert_eq!(data_type, DataType::Int32);
        assert_eq!(data_type.size(), 4);
        assert_eq!(serde_json::to_string(&data_type).unwrap(), r#""int32""#);
        assert!(serde_json::from_str::<DataType>(r#""r16""#).is_err());
    }

    #[test]
    fn data_type_fill_value_int() {
        let data_type = DataType::Int8;
        let fill_value = data_type
            .fill_value_from_metadata(&serde_json::json!(-7))
            .unwrap();
        assert_eq!(fill_value, FillValue::from(-7i8));
        assert_eq!(
            data_type.metadata_fill_value(&fill_value).unwrap(),
            serde_json::json!(-7)
        );
        assert!(data_type
            .fill_value_from_metadata(&serde_json::json!(200))
            .is_err());
        assert!(DataType::UInt8
            .fill_value_from_metadata(&serde_json::json!(-1))
            .is_err());
        assert!(DataType::UInt8
            .fill_value_from_metadata(&serde_json::json!(true))
            .is_err());
        assert!(DataType::UInt16
            .metadata_fill_value(&FillValue::from(1u8))
            .is_err());
    }

    #[test]
    fn data_type_fill_value_bool() {
        let fill_value = DataType::Bool
            .fill_value_from_metadata(&serde_json::json!(true))
            .unwrap();
        assert_eq!(fill_value, FillValue::from(true));
        assert!(DataType::Bool
            .fill_value_from_metadata(&serde_json::json!(1))
            .is_err());
    }

    #[test]
    fn data_type_fill_value_float() {
        let data_type = DataType::Float32;
        let fill_value = data_type
            .fill_value_from_metadata(&serde_json::json!(1.5))
            .unwrap();
        assert_eq!(fill_value, FillValue::from(1.5f32));
        assert_eq!(
            data_type.metadata_fill_value(&fill_value).unwrap(),
            serde_json::json!(1.5)
        );

        let fill_value = data_type
            .fill_value_from_metadata(&serde_json::json!("NaN"))
            .unwrap();
        assert!(f32::from_ne_bytes(fill_value.as_ne_bytes().try_into().unwrap()).is_nan());
        assert_eq!(
            data_type.metadata_fill_value(&fill_value).unwrap(),
            serde_json::json!("NaN")
        );

        let fill_value = DataType::Float64
            .fill_value_from_metadata(&serde_json::json!("-Infinity"))
            .unwrap();
        assert_eq!(fill_value, FillValue::from(f64::NEG_INFINITY));
        assert_eq!(
            DataType::Float64.metadata_fill_value(&fill_value).unwrap(),
            serde_json::json!("-Infinity")
        );

        let fill_value = data_type
            .fill_value_from_metadata(&serde_json::json!("0x7fc00001"))
            .unwrap();
        assert_eq!(fill_value, FillValue::from(f32::from_bits(0x7fc0_0001)));
        assert_eq!(
            data_type.metadata_fill_value(&fill_value).unwrap(),
            serde_json::json!("0x7fc00001")
        );
        assert!(data_type
            .fill_value_from_metadata(&serde_json::json!("0x7fc0"))
            .is_err());
        assert!(data_type
            .fill_value_from_metadata(&serde_json::json!("one"))
            .is_err());
    }
}
