//! Provides [`Decode`] for reading values back from a column.
use std::{rc::Rc, sync::Arc};

use either::Either;

use crate::{StorageValue, error::ConversionError};

/// A type that can be decoded from a column value.
///
/// The value passed in borrows the column buffer for `'r`, which lets borrowing types such as
/// `&'r str` avoid a copy.
pub trait Decode<'r>: Sized {
    fn decode(value: StorageValue<'r>) -> Result<Self, ConversionError>;
}

impl<'r, T> Decode<'r> for Option<T>
where
    T: Decode<'r>,
{
    fn decode(value: StorageValue<'r>) -> Result<Self, ConversionError> {
        if value.is_null() {
            Ok(None)
        } else {
            Ok(Some(T::decode(value)?))
        }
    }
}

/// Tries `L` first and falls back to `R`. If both fail, the error from `R` is returned.
impl<'r, L, R> Decode<'r> for Either<L, R>
where
    L: Decode<'r>,
    R: Decode<'r>,
{
    fn decode(value: StorageValue<'r>) -> Result<Self, ConversionError> {
        match L::decode(value.clone()) {
            Ok(v) => Ok(Either::Left(v)),
            Err(_) => R::decode(value).map(Either::Right),
        }
    }
}

impl<'r, T> Decode<'r> for Box<T>
where
    T: Decode<'r>,
{
    fn decode(value: StorageValue<'r>) -> Result<Self, ConversionError> {
        T::decode(value).map(Box::new)
    }
}

impl<'r, T> Decode<'r> for Arc<T>
where
    T: Decode<'r>,
{
    fn decode(value: StorageValue<'r>) -> Result<Self, ConversionError> {
        T::decode(value).map(Arc::new)
    }
}

impl<'r, T> Decode<'r> for Rc<T>
where
    T: Decode<'r>,
{
    fn decode(value: StorageValue<'r>) -> Result<Self, ConversionError> {
        T::decode(value).map(Rc::new)
    }
}

/// Dynamic values decode from any storage class, including NULL.
impl<'r> Decode<'r> for StorageValue<'r> {
    fn decode(value: StorageValue<'r>) -> Result<Self, ConversionError> {
        Ok(value)
    }
}
