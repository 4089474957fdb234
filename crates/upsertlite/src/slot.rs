//! Positional access to statement parameters and result columns.
//!
//! Conversion rules never see a [`Statement`] directly. They are handed a [`ParamSlot`] ("bind
//! parameter i") or a [`ColumnSlot`] ("read column i"), and the auto-indexing adapters
//! [`AutoBinder`] and [`AutoGetter`] walk those slots in order.

use std::{borrow::Cow, slice, str};

use crate::{
    Error, Result, Statement, StorageClass, StorageValue,
    decode::Decode,
    encode::Encode,
    error::ConversionError,
    sqlite::ffi::{self, BindLifetime},
};

/// One 1-based parameter of a statement.
pub struct ParamSlot<'s, 'c> {
    stmt: &'s mut Statement<'c>,
    index: usize,
}

impl<'s, 'c> ParamSlot<'s, 'c> {
    /// # Panics
    ///
    /// Panics if `index` is 0 or greater than the statement's parameter count.
    pub fn new(stmt: &'s mut Statement<'c>, index: usize) -> Self {
        let count = stmt.bind_parameter_count();
        assert!(
            (1..=count).contains(&index),
            "parameter index {index} out of range 1..={count} for statement {:?}",
            stmt.sql()
        );
        Self { stmt, index }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Bind `value`. Borrowed text and blob data is handed to SQLite without a copy unless
    /// `force_copy` is set; owned data is always copied.
    pub fn put(self, value: StorageValue<'c>, force_copy: bool) -> Result<()> {
        let lifetime = if value.is_borrowed() && !force_copy {
            BindLifetime::Static
        } else {
            BindLifetime::Transient
        };
        // SAFETY: borrowed data lives for 'c, which outlives the statement. Owned data is
        // bound as transient, so SQLite copies it before `value` is dropped.
        unsafe { self.stmt.bind_raw(self.index, &value, lifetime) }
    }

    /// Bind `value`, always letting SQLite take a private copy.
    pub fn put_copied(self, value: &StorageValue<'_>) -> Result<()> {
        // SAFETY: transient binds are copied by SQLite before returning.
        unsafe {
            self.stmt
                .bind_raw(self.index, value, BindLifetime::Transient)
        }
    }
}

/// One 0-based result column of the current row.
///
/// Values read through the slot borrow the column buffer, which stays valid until the statement
/// is stepped or reset. Both need `&mut Statement`, so the borrow checker enforces this.
pub struct ColumnSlot<'s> {
    stmt: &'s Statement<'s>,
    index: usize,
}

impl<'s> ColumnSlot<'s> {
    pub fn new(stmt: &'s Statement<'_>, index: usize) -> Result<Self> {
        stmt.check_column(index)?;
        Ok(Self { stmt, index })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn storage_class(&self) -> StorageClass {
        StorageClass::from_code(ffi::column_type(self.stmt.as_ptr(), self.index as i32))
            .unwrap_or(StorageClass::Null)
    }

    /// The column value, borrowing text and blob data from the statement.
    pub fn value(&self) -> std::result::Result<StorageValue<'s>, ConversionError> {
        let stmt = self.stmt.as_ptr();
        let index = self.index as i32;
        let value = match self.storage_class() {
            StorageClass::Null => StorageValue::Null,
            StorageClass::Integer => StorageValue::Int64(ffi::column_int64(stmt, index)),
            StorageClass::Real => StorageValue::Double(ffi::column_double(stmt, index)),
            StorageClass::Text => {
                // https://www.sqlite.org/c3ref/column_blob.html
                // Fetch the pointer first, then the length of the converted text.
                let ptr = ffi::column_text(stmt, index);
                let len = ffi::column_bytes(stmt, index) as usize;
                let bytes = if ptr.is_null() || len == 0 {
                    &[][..]
                } else {
                    unsafe { slice::from_raw_parts(ptr, len) }
                };
                StorageValue::Text(Cow::Borrowed(str::from_utf8(bytes)?))
            }
            StorageClass::Blob => {
                let ptr = ffi::column_blob(stmt, index) as *const u8;
                let len = ffi::column_bytes(stmt, index) as usize;
                let bytes = if ptr.is_null() || len == 0 {
                    &[][..]
                } else {
                    unsafe { slice::from_raw_parts(ptr, len) }
                };
                StorageValue::Blob(Cow::Borrowed(bytes))
            }
        };
        Ok(value)
    }

    pub fn get<T>(&self) -> Result<T>
    where
        T: Decode<'s>,
    {
        T::decode(self.value()?).map_err(|source| Error::ColumnDecode {
            index: format!("{:?}", self.index),
            source,
        })
    }
}

/// Binds successive parameters, starting at 1 or at a chosen offset.
pub struct AutoBinder<'s, 'c> {
    stmt: &'s mut Statement<'c>,
    next: usize,
}

impl<'s, 'c> AutoBinder<'s, 'c> {
    pub fn new(stmt: &'s mut Statement<'c>) -> Self {
        Self::starting_at(stmt, 1)
    }

    pub fn starting_at(stmt: &'s mut Statement<'c>, index: usize) -> Self {
        Self { stmt, next: index }
    }

    /// The index the next value will be bound to.
    pub fn next_index(&self) -> usize {
        self.next
    }

    /// Bind `value` without copying borrowed data, then advance.
    pub fn bind<T>(&mut self, value: &'c T) -> Result<&mut Self>
    where
        T: Encode + ?Sized,
    {
        let encoded = value.encode()?;
        ParamSlot::new(self.stmt, self.next).put(encoded, false)?;
        self.next += 1;
        Ok(self)
    }

    /// Bind a copy of `value`, then advance.
    pub fn bind_copy<T>(&mut self, value: &T) -> Result<&mut Self>
    where
        T: Encode + ?Sized,
    {
        let encoded = value.encode()?;
        ParamSlot::new(self.stmt, self.next).put_copied(&encoded)?;
        self.next += 1;
        Ok(self)
    }
}

/// Reads successive columns of the current row, starting at 0.
pub struct AutoGetter<'s> {
    stmt: &'s Statement<'s>,
    next: usize,
}

impl<'s> AutoGetter<'s> {
    pub fn new(stmt: &'s Statement<'_>) -> Self {
        Self { stmt, next: 0 }
    }

    pub fn next_index(&self) -> usize {
        self.next
    }

    pub fn get<T>(&mut self) -> Result<T>
    where
        T: Decode<'s>,
    {
        let slot = ColumnSlot::new(self.stmt, self.next)?;
        self.next += 1;
        slot.get()
    }
}

#[cfg(test)]
mod tests {
    use crate::{Connection, Error, StorageClass, StorageValue};

    #[test]
    fn column_slot_reads_each_storage_class() {
        let conn = Connection::open_in_memory().unwrap();
        let mut stmt = conn
            .prepare("SELECT NULL, 7, 1.5, 'text', x'0102', ''")
            .unwrap();
        assert!(stmt.step().unwrap());

        let classes: Vec<_> = (0..6).map(|i| stmt.column_type(i).unwrap()).collect();
        assert_eq!(
            classes,
            [
                StorageClass::Null,
                StorageClass::Integer,
                StorageClass::Real,
                StorageClass::Text,
                StorageClass::Blob,
                StorageClass::Text,
            ]
        );
        assert_eq!(stmt.column(1).unwrap().value().unwrap(), StorageValue::Int64(7));
        assert_eq!(stmt.column(3).unwrap().value().unwrap(), StorageValue::from("text"));
        assert_eq!(
            stmt.column(4).unwrap().value().unwrap(),
            StorageValue::from(&[1u8, 2][..])
        );
        assert_eq!(stmt.column(5).unwrap().value().unwrap(), StorageValue::from(""));
        assert!(stmt.column(3).unwrap().value().unwrap().is_borrowed());
    }

    #[test]
    fn auto_getter_stops_at_column_count() {
        let conn = Connection::open_in_memory().unwrap();
        let mut stmt = conn.prepare("SELECT 1, 'two'").unwrap();
        assert!(stmt.step().unwrap());

        let mut getter = stmt.getter();
        assert_eq!(getter.get::<i32>().unwrap(), 1);
        assert_eq!(getter.get::<&str>().unwrap(), "two");
        assert!(matches!(
            getter.get::<i32>(),
            Err(Error::ColumnIndexOutOfBounds { index: 2, len: 2 })
        ));
    }

    #[test]
    fn auto_binder_honours_start_offset() {
        let (a, b) = (10i64, String::from("b"));
        let conn = Connection::open_in_memory().unwrap();
        let mut stmt = conn.prepare("SELECT ?, ?, ?").unwrap();
        stmt.bind(1, &0i32).unwrap();
        let mut binder = super::AutoBinder::starting_at(&mut stmt, 2);
        binder.bind(&a).unwrap().bind(&b).unwrap();
        assert_eq!(binder.next_index(), 4);

        assert!(stmt.step().unwrap());
        assert_eq!(stmt.get::<i32>(0).unwrap(), 0);
        assert_eq!(stmt.get::<i64>(1).unwrap(), 10);
        assert_eq!(stmt.get::<String>(2).unwrap(), "b");
    }

    #[test]
    #[should_panic(expected = "parameter index 0")]
    fn zero_index_is_a_contract_violation() {
        let conn = Connection::open_in_memory().unwrap();
        let mut stmt = conn.prepare("SELECT ?").unwrap();
        let _ = stmt.bind(0, &1i32);
    }

    #[test]
    #[should_panic(expected = "parameter index 2")]
    fn index_past_parameter_count_panics() {
        let conn = Connection::open_in_memory().unwrap();
        let mut stmt = conn.prepare("SELECT ?").unwrap();
        let _ = stmt.bind_copy(2, &1i32);
    }
}
