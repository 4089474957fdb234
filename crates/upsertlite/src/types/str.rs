use std::borrow::Cow;

use crate::{StorageValue, decode::Decode, encode::Encode, error::ConversionError};

use super::mismatch;

/// The TEXT payload of `value`.
pub(crate) fn text<'r>(
    value: StorageValue<'r>,
    type_name: &'static str,
) -> Result<Cow<'r, str>, ConversionError> {
    match value {
        StorageValue::Text(s) => Ok(s),
        other => Err(mismatch(&other, type_name)),
    }
}

impl Encode for str {
    fn encode(&self) -> Result<StorageValue<'_>, ConversionError> {
        Ok(StorageValue::Text(Cow::Borrowed(self)))
    }
}

impl Encode for String {
    fn encode(&self) -> Result<StorageValue<'_>, ConversionError> {
        Ok(StorageValue::Text(Cow::Borrowed(self.as_str())))
    }
}

/// Borrows the column buffer. Only possible while the statement stays on the current row.
impl<'r> Decode<'r> for &'r str {
    fn decode(value: StorageValue<'r>) -> Result<Self, ConversionError> {
        match text(value, "&str")? {
            Cow::Borrowed(s) => Ok(s),
            Cow::Owned(_) => Err(ConversionError::NotBorrowed { type_name: "&str" }),
        }
    }
}

impl<'r> Decode<'r> for String {
    fn decode(value: StorageValue<'r>) -> Result<Self, ConversionError> {
        Ok(text(value, "String")?.into_owned())
    }
}

impl<'r> Decode<'r> for Cow<'r, str> {
    fn decode(value: StorageValue<'r>) -> Result<Self, ConversionError> {
        text(value, "Cow<str>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StorageClass;

    #[test]
    fn string_binds_borrowed() {
        let s = String::from("hello");
        let v = s.encode().unwrap();
        assert!(v.is_borrowed());
        assert_eq!(String::decode(v).unwrap(), "hello");
    }

    #[test]
    fn borrowed_str_requires_borrowed_value() {
        let v = StorageValue::Text(Cow::Owned("x".into()));
        assert!(matches!(
            <&str>::decode(v),
            Err(ConversionError::NotBorrowed { .. })
        ));
    }

    #[test]
    fn blob_is_not_text() {
        assert!(matches!(
            String::decode(StorageValue::from(&b"ab"[..])),
            Err(ConversionError::DataType {
                found: StorageClass::Blob,
                ..
            })
        ));
    }
}
