use std::{
    borrow::Cow,
    fmt::{self, Display, Formatter},
};

use libsqlite3_sys::{SQLITE_BLOB, SQLITE_FLOAT, SQLITE_INTEGER, SQLITE_NULL, SQLITE_TEXT};

/// The five fundamental storage classes of SQLite.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub enum StorageClass {
    Null,
    Integer,
    Real,
    Text,
    Blob,
}

impl StorageClass {
    pub fn name(&self) -> &'static str {
        match self {
            StorageClass::Null => "NULL",
            StorageClass::Integer => "INTEGER",
            StorageClass::Real => "REAL",
            StorageClass::Text => "TEXT",
            StorageClass::Blob => "BLOB",
        }
    }

    pub(crate) fn from_code(code: i32) -> Option<Self> {
        match code {
            SQLITE_INTEGER => Some(StorageClass::Integer),
            SQLITE_FLOAT => Some(StorageClass::Real),
            SQLITE_BLOB => Some(StorageClass::Blob),
            SQLITE_NULL => Some(StorageClass::Null),
            SQLITE_TEXT => Some(StorageClass::Text),

            // https://sqlite.org/c3ref/c_blob.html
            _ => None,
        }
    }
}

impl Display for StorageClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// A single value projected onto a SQLite storage class.
///
/// `Int` and `Int64` share the INTEGER storage class; the split records which native bind call
/// is used. Text and blob data are either borrowed from the caller, in which case they can be
/// bound without a copy, or owned.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageValue<'a> {
    Null,
    Int(i32),
    Int64(i64),
    Double(f64),
    Text(Cow<'a, str>),
    Blob(Cow<'a, [u8]>),
}

impl<'a> StorageValue<'a> {
    pub fn storage_class(&self) -> StorageClass {
        match self {
            StorageValue::Null => StorageClass::Null,
            StorageValue::Int(_) | StorageValue::Int64(_) => StorageClass::Integer,
            StorageValue::Double(_) => StorageClass::Real,
            StorageValue::Text(_) => StorageClass::Text,
            StorageValue::Blob(_) => StorageClass::Blob,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, StorageValue::Null)
    }

    /// Is the variable-length payload borrowed from somewhere else?
    pub fn is_borrowed(&self) -> bool {
        matches!(
            self,
            StorageValue::Text(Cow::Borrowed(_)) | StorageValue::Blob(Cow::Borrowed(_))
        )
    }

    /// The integer payload widened to 64 bits, if this is an INTEGER.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            StorageValue::Int(v) => Some(i64::from(*v)),
            StorageValue::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Detach the value from any borrowed buffer.
    pub fn into_owned(self) -> StorageValue<'static> {
        match self {
            StorageValue::Null => StorageValue::Null,
            StorageValue::Int(v) => StorageValue::Int(v),
            StorageValue::Int64(v) => StorageValue::Int64(v),
            StorageValue::Double(v) => StorageValue::Double(v),
            StorageValue::Text(v) => StorageValue::Text(Cow::Owned(v.into_owned())),
            StorageValue::Blob(v) => StorageValue::Blob(Cow::Owned(v.into_owned())),
        }
    }

    /// Reborrow the value. Variable-length data points into `self`.
    pub fn as_borrowed(&self) -> StorageValue<'_> {
        match self {
            StorageValue::Null => StorageValue::Null,
            StorageValue::Int(v) => StorageValue::Int(*v),
            StorageValue::Int64(v) => StorageValue::Int64(*v),
            StorageValue::Double(v) => StorageValue::Double(*v),
            StorageValue::Text(v) => StorageValue::Text(Cow::Borrowed(v.as_ref())),
            StorageValue::Blob(v) => StorageValue::Blob(Cow::Borrowed(v.as_ref())),
        }
    }
}

impl Display for StorageValue<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            StorageValue::Null => f.write_str("NULL"),
            StorageValue::Int(v) => write!(f, "{v}"),
            StorageValue::Int64(v) => write!(f, "{v}"),
            StorageValue::Double(v) => write!(f, "{v}"),
            StorageValue::Text(v) => write!(f, "{v:?}"),
            StorageValue::Blob(v) => write!(f, "<{} bytes>", v.len()),
        }
    }
}

impl From<i32> for StorageValue<'_> {
    fn from(v: i32) -> Self {
        StorageValue::Int(v)
    }
}

impl From<i64> for StorageValue<'_> {
    fn from(v: i64) -> Self {
        StorageValue::Int64(v)
    }
}

impl From<f64> for StorageValue<'_> {
    fn from(v: f64) -> Self {
        StorageValue::Double(v)
    }
}

impl From<bool> for StorageValue<'_> {
    fn from(v: bool) -> Self {
        StorageValue::Int(i32::from(v))
    }
}

impl<'a> From<&'a str> for StorageValue<'a> {
    fn from(v: &'a str) -> Self {
        StorageValue::Text(Cow::Borrowed(v))
    }
}

impl From<String> for StorageValue<'_> {
    fn from(v: String) -> Self {
        StorageValue::Text(Cow::Owned(v))
    }
}

impl<'a> From<&'a [u8]> for StorageValue<'a> {
    fn from(v: &'a [u8]) -> Self {
        StorageValue::Blob(Cow::Borrowed(v))
    }
}

impl From<Vec<u8>> for StorageValue<'_> {
    fn from(v: Vec<u8>) -> Self {
        StorageValue::Blob(Cow::Owned(v))
    }
}

impl<'a, T> From<Option<T>> for StorageValue<'a>
where
    T: Into<StorageValue<'a>>,
{
    fn from(v: Option<T>) -> Self {
        v.map_or(StorageValue::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_class_of_integers() {
        assert_eq!(StorageValue::Int(1).storage_class(), StorageClass::Integer);
        assert_eq!(StorageValue::Int64(1).storage_class(), StorageClass::Integer);
        assert_eq!(StorageValue::from(None::<i32>), StorageValue::Null);
    }

    #[test]
    fn into_owned_detaches() {
        let s = String::from("hello");
        let v = StorageValue::from(s.as_str());
        assert!(v.is_borrowed());
        let owned = v.into_owned();
        drop(s);
        assert!(!owned.is_borrowed());
        assert_eq!(owned, StorageValue::Text(Cow::Borrowed("hello")));
    }

    #[test]
    fn storage_class_from_code() {
        assert_eq!(StorageClass::from_code(SQLITE_TEXT), Some(StorageClass::Text));
        assert!(StorageClass::from_code(9999).is_none());
    }

    #[test]
    fn storage_classes_serialize_by_name() {
        assert_eq!(serde_json::to_string(&StorageClass::Blob).unwrap(), "\"Blob\"");
        let class: StorageClass = serde_json::from_str("\"Integer\"").unwrap();
        assert_eq!(class, StorageClass::Integer);
    }
}
