use crate::{StorageValue, decode::Decode, encode::Encode, error::ConversionError};

use super::mismatch;

/// The INTEGER payload of `value`, widened to 64 bits.
pub(crate) fn integer(
    value: &StorageValue<'_>,
    type_name: &'static str,
) -> Result<i64, ConversionError> {
    match value {
        StorageValue::Int(v) => Ok(i64::from(*v)),
        StorageValue::Int64(v) => Ok(*v),
        other => Err(mismatch(other, type_name)),
    }
}

/// Narrow an INTEGER column to `T`, reporting the offending value on overflow.
pub(crate) fn narrow<T>(
    value: &StorageValue<'_>,
    type_name: &'static str,
) -> Result<T, ConversionError>
where
    T: TryFrom<i64>,
{
    let v = integer(value, type_name)?;
    T::try_from(v).map_err(|_| ConversionError::out_of_range(type_name, v))
}

// Types that fit in 32 bits are bound with the native 32-bit call.
macro_rules! int32 {
    ($($ty:ty),+) => {
        $(
            impl Encode for $ty {
                fn encode(&self) -> Result<StorageValue<'_>, ConversionError> {
                    Ok(StorageValue::Int(i32::from(*self)))
                }
            }

            impl<'r> Decode<'r> for $ty {
                fn decode(value: StorageValue<'r>) -> Result<Self, ConversionError> {
                    narrow(&value, stringify!($ty))
                }
            }
        )+
    };
}

int32!(i8, i16, i32);

impl Encode for i64 {
    fn encode(&self) -> Result<StorageValue<'_>, ConversionError> {
        Ok(StorageValue::Int64(*self))
    }
}

impl<'r> Decode<'r> for i64 {
    fn decode(value: StorageValue<'r>) -> Result<Self, ConversionError> {
        integer(&value, "i64")
    }
}

#[cfg(target_pointer_width = "64")]
impl Encode for isize {
    fn encode(&self) -> Result<StorageValue<'_>, ConversionError> {
        Ok(StorageValue::Int64(*self as i64))
    }
}

#[cfg(target_pointer_width = "32")]
impl Encode for isize {
    fn encode(&self) -> Result<StorageValue<'_>, ConversionError> {
        Ok(StorageValue::Int(*self as i32))
    }
}

impl<'r> Decode<'r> for isize {
    fn decode(value: StorageValue<'r>) -> Result<Self, ConversionError> {
        narrow(&value, "isize")
    }
}
