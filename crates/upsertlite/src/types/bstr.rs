//! Conversions between `bstr` types and SQL BLOBs.
use std::borrow::Cow;

use crate::{StorageValue, decode::Decode, encode::Encode, error::ConversionError};

#[doc(no_inline)]
pub use bstr::{BStr, BString, ByteSlice};

use super::bytes::blob;

impl<'r> Decode<'r> for BString {
    fn decode(value: StorageValue<'r>) -> Result<Self, ConversionError> {
        Ok(BString::from(blob(value, "BString")?.into_owned()))
    }
}

impl<'r> Decode<'r> for &'r BStr {
    fn decode(value: StorageValue<'r>) -> Result<Self, ConversionError> {
        match blob(value, "&BStr")? {
            Cow::Borrowed(b) => Ok(b.as_bstr()),
            Cow::Owned(_) => Err(ConversionError::NotBorrowed { type_name: "&BStr" }),
        }
    }
}

impl Encode for BStr {
    fn encode(&self) -> Result<StorageValue<'_>, ConversionError> {
        Ok(StorageValue::Blob(Cow::Borrowed(self.as_bytes())))
    }
}

impl Encode for BString {
    fn encode(&self) -> Result<StorageValue<'_>, ConversionError> {
        Ok(StorageValue::Blob(Cow::Borrowed(self.as_bytes())))
    }
}
