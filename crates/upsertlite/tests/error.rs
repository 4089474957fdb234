use upsertlite::{Error, ExtendedErrCode, PrimaryErrCode, Record, batch_insert, load_table_meta};
use upsertlite_test::{connection, tdb};

#[test]
fn it_fails_with_unique_violation() -> anyhow::Result<()> {
    let conn = tdb()?;
    let tx = conn.begin()?;
    tx.exec("INSERT INTO people (id, name) VALUES (1, 'Ada')")?;

    let err = tx
        .exec("INSERT INTO people (id, name) VALUES (1, 'Ada')")
        .unwrap_err();
    let err = err.into_sqlite_error().unwrap();

    assert_eq!(err.primary, PrimaryErrCode::Constraint);
    assert_eq!(err.extended, ExtendedErrCode::ConstraintPrimaryKey);
    Ok(())
}

#[test]
fn it_fails_with_foreign_key_violation() -> anyhow::Result<()> {
    let conn = tdb()?;
    let tx = conn.begin()?;

    let err = tx
        .exec("INSERT INTO memberships (person_id, group_name) VALUES (99, 'admins')")
        .unwrap_err();
    let err = err.into_sqlite_error().unwrap();

    assert_eq!(err.primary, PrimaryErrCode::Constraint);
    assert_eq!(err.extended, ExtendedErrCode::ConstraintForeignKey);
    Ok(())
}

#[test]
fn it_fails_with_not_null_violation() -> anyhow::Result<()> {
    let conn = tdb()?;
    let meta = load_table_meta(&conn, "people")?;
    let records = [Record::new().with("id", 1i64).with("name", None::<&str>)];

    let err = batch_insert(&records, &conn, &meta).unwrap_err();
    let err = err.into_sqlite_error().unwrap();

    assert_eq!(err.primary, PrimaryErrCode::Constraint);
    assert_eq!(err.extended, ExtendedErrCode::ConstraintNotNull);
    assert!(err.message.contains("people.name"), "{}", err.message);
    Ok(())
}

#[test]
fn it_fails_with_check_violation() -> anyhow::Result<()> {
    let conn = connection()?;
    conn.exec("CREATE TABLE products (id INTEGER PRIMARY KEY, price REAL CHECK (price > 0))")?;

    let err = conn
        .exec("INSERT INTO products (price) VALUES (-1)")
        .unwrap_err();
    let err = err.into_sqlite_error().unwrap();

    assert_eq!(err.primary, PrimaryErrCode::Constraint);
    assert_eq!(err.extended, ExtendedErrCode::ConstraintCheck);
    Ok(())
}

#[test]
fn syntax_errors_keep_the_native_message() -> anyhow::Result<()> {
    let conn = connection()?;
    let err = conn.prepare("SELEKT 1").unwrap_err();
    let err = match err {
        Error::Sqlite(err) => err,
        other => panic!("expected a database error, got {other:?}"),
    };
    assert_eq!(err.primary, PrimaryErrCode::Error);
    assert_eq!(err.code, 1);
    assert!(err.message.contains("syntax error"), "{}", err.message);
    Ok(())
}

#[test]
fn missing_table_is_reported_by_name() -> anyhow::Result<()> {
    let conn = tdb()?;
    let err = load_table_meta(&conn, "nobody").unwrap_err();
    assert_eq!(err.to_string(), "no table named \"nobody\"");
    Ok(())
}

#[test]
fn conversion_errors_are_not_database_errors() {
    let record = Record::new().with("n", u64::MAX);
    let err = record.check().unwrap_err();
    assert!(err.as_sqlite_error().is_none());
    assert!(err.as_conversion_error().is_some());
    assert!(err.to_string().contains(&u64::MAX.to_string()), "{err}");
}
