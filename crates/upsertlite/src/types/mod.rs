//! Conversions between Rust and **SQLite** storage classes.
//!
//! # Types
//!
//! | Rust type                             | Bound as            | Storage class |
//! |---------------------------------------|---------------------|---------------|
//! | `bool`                                | 32-bit int          | INTEGER       |
//! | `i8`, `i16`, `i32`                    | 32-bit int          | INTEGER       |
//! | `u8`, `u16`                           | 32-bit int          | INTEGER       |
//! | `i64`, `u32`                          | 64-bit int          | INTEGER       |
//! | `u64`                                 | 64-bit int          | INTEGER       |
//! | `isize`, `usize`                      | pointer width       | INTEGER       |
//! | `f32`, `f64`                          | double              | REAL          |
//! | `&str`, [`String`], `Cow<str>`        | text                | TEXT          |
//! | `&[u8]`, `Vec<u8>`, `Cow<[u8]>`       | blob                | BLOB          |
//! | `bstr::BString`, `&BStr`              | blob                | BLOB          |
//! | `time::PrimitiveDateTime`             | ISO 8601 text       | TEXT          |
//! | `time::OffsetDateTime`                | RFC 3339 text       | TEXT          |
//! | `time::Date`                          | `YYYY-MM-DD`        | TEXT          |
//! | `time::Time`                          | `HH:MM:SS.SSS`      | TEXT          |
//! | [`StorageValue`](crate::StorageValue) | as tagged           | any           |
//!
//! #### Note: Integer widths
//!
//! Types that fit in 32 bits are bound with `sqlite3_bind_int`, wider types with
//! `sqlite3_bind_int64`. The width of `isize` and `usize` follows `target_pointer_width` and is
//! fixed at build time. SQLite stores all integers as 64-bit signed values, so reading narrows
//! with a range check: a value that does not fit fails with
//! [`ConversionError::OutOfRange`](crate::ConversionError::OutOfRange).
//!
//! `u64` values above `i64::MAX` cannot be stored and fail on bind rather than wrapping.
//!
//! #### Note: `f32` is lossy
//!
//! `f32` is promoted to a double on write and truncated on read. The round trip only holds up to
//! `f32` precision.
//!
//! # Nullable
//!
//! `Option<T>` is supported where `T` implements `Encode` or `Decode`. Reading `NULL` into a type
//! that is not an `Option` fails with
//! [`ConversionError::UnexpectedNull`](crate::ConversionError::UnexpectedNull).
//!
//! `either::Either<L, R>` binds whichever side is present and decodes by trying `L`, then `R`.

use crate::{StorageClass, StorageValue, error::ConversionError};

/// The error for a column value that `type_name` does not accept. `NULL` is reported as
/// [`ConversionError::UnexpectedNull`].
pub(crate) fn mismatch(value: &StorageValue<'_>, type_name: &'static str) -> ConversionError {
    match value.storage_class() {
        StorageClass::Null => ConversionError::UnexpectedNull { type_name },
        found => ConversionError::DataType { type_name, found },
    }
}

pub mod bstr;
pub mod time;

mod bool;
mod bytes;
mod float;
mod int;
mod str;
mod uint;
