//! Derive output exercised against a real connection.

use upsertlite::{Codec, Connection, ConversionError, Decode, Encode, StorageValue};

#[derive(Debug, PartialEq, Codec)]
struct UserId(i64);

#[derive(Debug, PartialEq, Encode, Decode)]
#[upsertlite(rename_all = "screaming_snake_case")]
enum Status {
    Active,
    OnHold,
    #[upsertlite(rename = "gone")]
    Deleted,
}

#[derive(Debug, PartialEq, Codec)]
#[upsertlite(repr = "i32")]
#[repr(i32)]
enum Level {
    Low = 1,
    High = 10,
}

fn round_trip<T>(value: &T) -> T
where
    T: Encode + for<'r> Decode<'r>,
{
    let conn = Connection::open_in_memory().unwrap();
    let mut stmt = conn.prepare("SELECT ?").unwrap();
    stmt.bind_copy(1, value).unwrap();
    let (out,): (T,) = stmt.fetch_one().unwrap();
    out
}

#[test]
fn newtype_is_transparent() {
    assert_eq!(UserId(42).encode().unwrap(), StorageValue::Int64(42));
    assert_eq!(round_trip(&UserId(-7)), UserId(-7));
}

#[test]
fn enums_are_stored_by_name() {
    assert_eq!(
        Status::OnHold.encode().unwrap(),
        StorageValue::from("ON_HOLD")
    );
    assert_eq!(Status::Deleted.encode().unwrap(), StorageValue::from("gone"));
    for status in [Status::Active, Status::OnHold, Status::Deleted] {
        let out = round_trip(&status);
        assert_eq!(out, status);
    }
}

#[test]
fn unknown_enum_name_is_an_error() {
    let err = Status::decode(StorageValue::from("ARCHIVED")).unwrap_err();
    assert!(matches!(err, ConversionError::Custom(msg) if msg.contains("ARCHIVED")));
}

#[test]
fn repr_enums_are_stored_as_integers() {
    assert_eq!(Level::High.encode().unwrap(), StorageValue::Int(10));
    assert_eq!(round_trip(&Level::Low), Level::Low);
    assert!(Level::decode(StorageValue::Int64(3)).is_err());
}

#[test]
fn derive() {
    let t = trybuild::TestCases::new();
    t.pass("tests/trybuild/pass_*.rs");
}
