//! NULL handling on both sides of a statement.

use upsertlite::{ConversionError, Either, Error, Null, StorageClass};
use upsertlite_test::connection;

fn assert_unexpected_null(err: Error, expected: &str) {
    match err {
        Error::ColumnDecode {
            source: ConversionError::UnexpectedNull { type_name },
            ..
        } => assert_eq!(type_name, expected),
        _ => panic!("expected column decode NULL error, got {err:?}"),
    }
}

#[test]
fn null_decoding_errors_for_non_option_types() -> anyhow::Result<()> {
    let conn = connection()?;
    let mut stmt = conn.prepare("SELECT NULL")?;

    assert_unexpected_null(stmt.fetch_one::<(i32,)>().unwrap_err(), "i32");
    assert_unexpected_null(stmt.fetch_one::<(i64,)>().unwrap_err(), "i64");
    assert_unexpected_null(stmt.fetch_one::<(f64,)>().unwrap_err(), "f64");
    assert_unexpected_null(stmt.fetch_one::<(bool,)>().unwrap_err(), "bool");
    Ok(())
}

#[test]
fn null_decodes_to_none() -> anyhow::Result<()> {
    let conn = connection()?;
    let (a, b, c): (Option<i32>, Option<String>, Option<Either<i64, String>>) =
        conn.prepare("SELECT NULL, NULL, NULL")?.fetch_one()?;
    assert_eq!(a, None);
    assert_eq!(b, None);
    assert_eq!(c, None);
    Ok(())
}

#[test]
fn none_and_null_bind_as_null() -> anyhow::Result<()> {
    let conn = connection()?;
    let mut stmt = conn.prepare("SELECT ? IS NULL, ? IS NULL, ? IS NULL")?;
    stmt.bind_copy(1, &None::<i64>)?;
    stmt.bind_copy(2, &Null)?;
    stmt.bind_copy(3, &Some(1i64))?;
    let (a, b, c): (bool, bool, bool) = stmt.fetch_one()?;
    assert!(a && b && !c);
    Ok(())
}

#[test]
fn unbound_parameters_are_null() -> anyhow::Result<()> {
    let conn = connection()?;
    let mut stmt = conn.prepare("SELECT ?")?;
    let (value,): (Option<String>,) = stmt.fetch_one()?;
    assert_eq!(value, None);

    stmt.bind_copy(1, &"x")?;
    stmt.clear_bindings();
    let (value,): (Option<String>,) = stmt.fetch_one()?;
    assert_eq!(value, None);
    Ok(())
}

#[test]
fn null_storage_class() -> anyhow::Result<()> {
    let conn = connection()?;
    let mut stmt = conn.prepare("SELECT NULL")?;
    assert!(stmt.step()?);
    assert_eq!(stmt.column_type(0)?, StorageClass::Null);
    Ok(())
}
