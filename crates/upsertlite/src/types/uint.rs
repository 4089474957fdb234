use crate::{
    StorageValue,
    decode::Decode,
    encode::Encode,
    error::ConversionError,
    types::int::narrow,
};

impl Encode for u8 {
    fn encode(&self) -> Result<StorageValue<'_>, ConversionError> {
        Ok(StorageValue::Int(i32::from(*self)))
    }
}

impl<'r> Decode<'r> for u8 {
    fn decode(value: StorageValue<'r>) -> Result<Self, ConversionError> {
        narrow(&value, "u8")
    }
}

impl Encode for u16 {
    fn encode(&self) -> Result<StorageValue<'_>, ConversionError> {
        Ok(StorageValue::Int(i32::from(*self)))
    }
}

impl<'r> Decode<'r> for u16 {
    fn decode(value: StorageValue<'r>) -> Result<Self, ConversionError> {
        narrow(&value, "u16")
    }
}

// u32 does not fit the 32-bit signed bind, so it is widened.
impl Encode for u32 {
    fn encode(&self) -> Result<StorageValue<'_>, ConversionError> {
        Ok(StorageValue::Int64(i64::from(*self)))
    }
}

impl<'r> Decode<'r> for u32 {
    fn decode(value: StorageValue<'r>) -> Result<Self, ConversionError> {
        narrow(&value, "u32")
    }
}

impl Encode for u64 {
    fn encode(&self) -> Result<StorageValue<'_>, ConversionError> {
        i64::try_from(*self)
            .map(StorageValue::Int64)
            .map_err(|_| ConversionError::out_of_range("u64", self))
    }
}

impl<'r> Decode<'r> for u64 {
    fn decode(value: StorageValue<'r>) -> Result<Self, ConversionError> {
        narrow(&value, "u64")
    }
}

// On 32-bit targets `usize` is as wide as `u32` and is widened the same way. On 64-bit
// targets values above `i64::MAX` are rejected like `u64`.
impl Encode for usize {
    #[cfg(target_pointer_width = "32")]
    fn encode(&self) -> Result<StorageValue<'_>, ConversionError> {
        Ok(StorageValue::Int64(*self as i64))
    }

    #[cfg(target_pointer_width = "64")]
    fn encode(&self) -> Result<StorageValue<'_>, ConversionError> {
        i64::try_from(*self)
            .map(StorageValue::Int64)
            .map_err(|_| ConversionError::out_of_range("usize", self))
    }
}

impl<'r> Decode<'r> for usize {
    fn decode(value: StorageValue<'r>) -> Result<Self, ConversionError> {
        narrow(&value, "usize")
    }
}
