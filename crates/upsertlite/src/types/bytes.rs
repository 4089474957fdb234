use std::borrow::Cow;

use crate::{StorageValue, decode::Decode, encode::Encode, error::ConversionError};

use super::mismatch;

/// The raw bytes of a BLOB or TEXT column.
pub(crate) fn blob<'r>(
    value: StorageValue<'r>,
    type_name: &'static str,
) -> Result<Cow<'r, [u8]>, ConversionError> {
    match value {
        StorageValue::Blob(b) => Ok(b),
        StorageValue::Text(Cow::Borrowed(s)) => Ok(Cow::Borrowed(s.as_bytes())),
        StorageValue::Text(Cow::Owned(s)) => Ok(Cow::Owned(s.into_bytes())),
        other => Err(mismatch(&other, type_name)),
    }
}

impl Encode for [u8] {
    fn encode(&self) -> Result<StorageValue<'_>, ConversionError> {
        Ok(StorageValue::Blob(Cow::Borrowed(self)))
    }
}

impl<const N: usize> Encode for [u8; N] {
    fn encode(&self) -> Result<StorageValue<'_>, ConversionError> {
        Ok(StorageValue::Blob(Cow::Borrowed(self.as_slice())))
    }
}

impl Encode for Vec<u8> {
    fn encode(&self) -> Result<StorageValue<'_>, ConversionError> {
        Ok(StorageValue::Blob(Cow::Borrowed(self.as_slice())))
    }
}

impl<'r> Decode<'r> for &'r [u8] {
    fn decode(value: StorageValue<'r>) -> Result<Self, ConversionError> {
        match blob(value, "&[u8]")? {
            Cow::Borrowed(b) => Ok(b),
            Cow::Owned(_) => Err(ConversionError::NotBorrowed { type_name: "&[u8]" }),
        }
    }
}

impl<'r> Decode<'r> for Vec<u8> {
    fn decode(value: StorageValue<'r>) -> Result<Self, ConversionError> {
        Ok(blob(value, "Vec<u8>")?.into_owned())
    }
}

impl<'r> Decode<'r> for Cow<'r, [u8]> {
    fn decode(value: StorageValue<'r>) -> Result<Self, ConversionError> {
        blob(value, "Cow<[u8]>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_reads_as_bytes() {
        let v = Vec::<u8>::decode(StorageValue::from("abc")).unwrap();
        assert_eq!(v, b"abc");
    }

    #[test]
    fn integer_is_not_a_blob() {
        assert!(matches!(
            Vec::<u8>::decode(StorageValue::Int(1)),
            Err(ConversionError::DataType { .. })
        ));
    }
}
