use crate::{StorageValue, decode::Decode, encode::Encode, error::ConversionError};

use super::int::integer;

impl Encode for bool {
    fn encode(&self) -> Result<StorageValue<'_>, ConversionError> {
        Ok(StorageValue::Int(i32::from(*self)))
    }
}

impl<'r> Decode<'r> for bool {
    fn decode(value: StorageValue<'r>) -> Result<bool, ConversionError> {
        Ok(integer(&value, "bool")? != 0)
    }
}
