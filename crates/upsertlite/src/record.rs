//! Records of named values for the batch engine.

use std::{
    cmp::Ordering,
    fmt::{self, Debug, Display, Formatter},
    hash::{Hash, Hasher},
    sync::Arc,
};

use indexmap::{Equivalent, IndexMap};
use smallvec::SmallVec;

use crate::{
    Result, Statement, StorageValue, encode::Encode, error::ConversionError, row::FromRow,
};

fn hash_caseless<H: Hasher>(name: &str, state: &mut H) {
    for b in name.bytes() {
        state.write_u8(b.to_ascii_lowercase());
    }
    state.write_u8(0xff);
}

/// A column name. Comparison, ordering and hashing ignore ASCII case, as SQLite does for
/// identifiers.
#[derive(Clone)]
pub struct FieldName(Arc<str>);

impl FieldName {
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison with a plain string.
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl PartialEq for FieldName {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.0)
    }
}

impl Eq for FieldName {}

impl Hash for FieldName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_caseless(&self.0, state);
    }
}

impl Ord for FieldName {
    fn cmp(&self, other: &Self) -> Ordering {
        let a = self.0.bytes().map(|b| b.to_ascii_lowercase());
        let b = other.0.bytes().map(|b| b.to_ascii_lowercase());
        a.cmp(b)
    }
}

impl PartialOrd for FieldName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Debug for FieldName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&*self.0, f)
    }
}

impl Display for FieldName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for FieldName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for FieldName {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

/// Looks up a [`FieldName`] key from a borrowed string without allocating.
struct Caseless<'a>(&'a str);

impl Hash for Caseless<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_caseless(self.0, state);
    }
}

impl Equivalent<FieldName> for Caseless<'_> {
    fn equivalent(&self, key: &FieldName) -> bool {
        key.matches(self.0)
    }
}

/// The ordered field names of one record. Two sets are equal when they name the same fields in
/// the same order, ignoring case.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FieldSet(SmallVec<[FieldName; 8]>);

impl FieldSet {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldName> {
        self.0.iter()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// The 0-based position of `name` in the set.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|f| f.matches(name))
    }

    /// The same names, sorted case-insensitively.
    pub fn canonical(mut self) -> Self {
        self.0.sort();
        self
    }
}

impl FromIterator<FieldName> for FieldSet {
    fn from_iter<I: IntoIterator<Item = FieldName>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// An ordered set of named values, one row's worth of data for a table.
///
/// Values are converted to their storage class as they are set. A failed conversion is kept with
/// the record and reported when the record is written, so a batch containing it is rolled back.
///
/// Setting a field that already exists, in any letter case, replaces its value and keeps its
/// position.
///
/// ```
/// use upsertlite::Record;
///
/// let record = Record::new().with("id", 1i64).with("name", "Ada");
/// assert_eq!(record.len(), 2);
/// assert!(record.get("NAME").is_some());
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record(IndexMap<FieldName, std::result::Result<StorageValue<'static>, ConversionError>>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to `value`.
    pub fn set<K, V>(&mut self, name: K, value: V)
    where
        K: Into<FieldName>,
        V: Encode,
    {
        let encoded = value.encode().map(StorageValue::into_owned);
        self.0.insert(name.into(), encoded);
    }

    /// Set `name` to `value` and return the record, for chaining.
    #[must_use]
    pub fn with<K, V>(mut self, name: K, value: V) -> Self
    where
        K: Into<FieldName>,
        V: Encode,
    {
        self.set(name, value);
        self
    }

    /// Set `name` to an already converted value.
    pub fn set_value<K>(&mut self, name: K, value: StorageValue<'static>)
    where
        K: Into<FieldName>,
    {
        self.0.insert(name.into(), Ok(value));
    }

    /// The converted value of `name`, or the error its conversion produced.
    pub fn field(
        &self,
        name: &str,
    ) -> Option<std::result::Result<&StorageValue<'static>, &ConversionError>> {
        self.0.get(&Caseless(name)).map(|v| v.as_ref())
    }

    /// The value of `name`, if present and converted successfully.
    pub fn get(&self, name: &str) -> Option<&StorageValue<'static>> {
        self.field(name).and_then(|v| v.ok())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(&Caseless(name))
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.0.shift_remove(&Caseless(name)).is_some()
    }

    /// The first conversion error recorded for any field.
    pub fn check(&self) -> Result<()> {
        match self.0.values().find_map(|v| v.as_ref().err()) {
            Some(err) => Err(err.clone().into()),
            None => Ok(()),
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &FieldName> {
        self.0.keys()
    }

    /// Fields in insertion order. Failed conversions surface as `Err`.
    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (&FieldName, std::result::Result<&StorageValue<'static>, &ConversionError>)>
    {
        self.0.iter().map(|(k, v)| (k, v.as_ref()))
    }

    /// The field names of this record, in order.
    pub fn field_set(&self) -> FieldSet {
        self.0.keys().cloned().collect()
    }
}

impl<K> FromIterator<(K, StorageValue<'static>)> for Record
where
    K: Into<FieldName>,
{
    fn from_iter<I: IntoIterator<Item = (K, StorageValue<'static>)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (name, value) in iter {
            record.set_value(name, value);
        }
        record
    }
}

/// Reads every column of the row, keyed by column name.
impl<'r> FromRow<'r> for Record {
    fn from_row(stmt: &'r Statement<'_>) -> Result<Self> {
        let mut record = Record::new();
        for index in 0..stmt.column_count() {
            let name = stmt.column_name(index)?;
            let value = stmt.column(index)?.value()?.into_owned();
            record.set_value(name, value);
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of<T: Hash + ?Sized>(value: &T) -> u64 {
        let mut h = DefaultHasher::new();
        value.hash(&mut h);
        h.finish()
    }

    #[test]
    fn field_names_ignore_case() {
        let a = FieldName::from("Name");
        let b = FieldName::from("nAME");
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_eq!(hash_of(&a), hash_of(&Caseless("NAME")));
        assert!(FieldName::from("a") < FieldName::from("B"));
        assert_eq!(a.to_string(), "Name");
    }

    #[test]
    fn set_replaces_in_place() {
        let mut record = Record::new().with("a", 1).with("b", 2);
        record.set("A", 3);
        assert_eq!(record.len(), 2);
        let names: Vec<_> = record.names().map(FieldName::as_str).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(record.get("a"), Some(&StorageValue::Int(3)));
    }

    #[test]
    fn field_sets_are_order_sensitive() {
        let ab = Record::new().with("a", 1).with("b", 2).field_set();
        let ba = Record::new().with("B", 1).with("A", 2).field_set();
        assert_ne!(ab, ba);
        assert_eq!(ab, ba.clone().canonical());
        assert_eq!(ab.canonical(), ba.canonical());
    }

    #[test]
    fn conversion_errors_are_deferred() {
        let record = Record::new().with("id", 1).with("big", u64::MAX);
        assert!(record.contains("big"));
        assert!(record.get("big").is_none());
        assert!(matches!(record.field("big"), Some(Err(ConversionError::OutOfRange { .. }))));
        assert!(record.check().is_err());
    }

    #[test]
    fn values_are_owned() {
        let text = String::from("borrowed");
        let record = Record::new().with("t", text.as_str());
        drop(text);
        assert_eq!(record.get("t"), Some(&StorageValue::from("borrowed")));
    }
}
