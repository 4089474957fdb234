//! Provides [`Encode`] for projecting values onto a SQLite storage class.
use std::{borrow::Cow, rc::Rc, sync::Arc};

use either::Either;

use crate::{StorageValue, error::ConversionError};

/// Encode a single value to be bound to a statement parameter.
///
/// The returned [`StorageValue`] may borrow text or blob data from `self`. When bound through
/// [`Statement::bind`](crate::Statement::bind), borrowed data is handed to SQLite without a
/// copy; owned data is always copied. A type that does not implement `Encode` cannot be bound,
/// so an unsupported type is rejected at compile time:
///
/// ```compile_fail
/// struct Unregistered;
///
/// let value = Unregistered;
/// let conn = upsertlite::Connection::open_in_memory().unwrap();
/// let mut stmt = conn.prepare("SELECT ?").unwrap();
/// stmt.bind(1, &value).unwrap();
/// ```
pub trait Encode {
    fn encode(&self) -> Result<StorageValue<'_>, ConversionError>;
}

impl<T> Encode for &T
where
    T: Encode + ?Sized,
{
    fn encode(&self) -> Result<StorageValue<'_>, ConversionError> {
        (**self).encode()
    }
}

impl<T> Encode for Box<T>
where
    T: Encode + ?Sized,
{
    fn encode(&self) -> Result<StorageValue<'_>, ConversionError> {
        (**self).encode()
    }
}

impl<T> Encode for Arc<T>
where
    T: Encode + ?Sized,
{
    fn encode(&self) -> Result<StorageValue<'_>, ConversionError> {
        (**self).encode()
    }
}

impl<T> Encode for Rc<T>
where
    T: Encode + ?Sized,
{
    fn encode(&self) -> Result<StorageValue<'_>, ConversionError> {
        (**self).encode()
    }
}

impl<T> Encode for Cow<'_, T>
where
    T: Encode + ToOwned + ?Sized,
{
    fn encode(&self) -> Result<StorageValue<'_>, ConversionError> {
        self.as_ref().encode()
    }
}

impl<T> Encode for Option<T>
where
    T: Encode,
{
    fn encode(&self) -> Result<StorageValue<'_>, ConversionError> {
        match self {
            Some(v) => v.encode(),
            None => Ok(StorageValue::Null),
        }
    }
}

impl<L, R> Encode for Either<L, R>
where
    L: Encode,
    R: Encode,
{
    fn encode(&self) -> Result<StorageValue<'_>, ConversionError> {
        match self {
            Either::Left(v) => v.encode(),
            Either::Right(v) => v.encode(),
        }
    }
}

/// Binds SQL `NULL`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Null;

impl Encode for Null {
    fn encode(&self) -> Result<StorageValue<'_>, ConversionError> {
        Ok(StorageValue::Null)
    }
}

impl Encode for () {
    fn encode(&self) -> Result<StorageValue<'_>, ConversionError> {
        Ok(StorageValue::Null)
    }
}

impl Encode for StorageValue<'_> {
    fn encode(&self) -> Result<StorageValue<'_>, ConversionError> {
        Ok(self.as_borrowed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_proxies_to_null() {
        let v: Option<i32> = None;
        assert_eq!(v.encode().unwrap(), StorageValue::Null);
        assert_eq!(Some(7i32).encode().unwrap(), StorageValue::Int(7));
    }

    #[test]
    fn either_proxies_to_active_side() {
        let left: Either<i64, String> = Either::Left(5);
        let right: Either<i64, String> = Either::Right("five".into());
        assert_eq!(left.encode().unwrap(), StorageValue::Int64(5));
        assert_eq!(right.encode().unwrap(), StorageValue::from("five"));
    }

    #[test]
    fn references_borrow_text() {
        let s = String::from("abc");
        let r = &s;
        assert!(r.encode().unwrap().is_borrowed());
    }
}
