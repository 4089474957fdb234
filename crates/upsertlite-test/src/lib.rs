use upsertlite::{Connection, quote_identifier};

const TEST_SCHEMA: &str = include_str!("setup.sql");

// Make a new connection
pub fn connection() -> anyhow::Result<Connection> {
    Ok(Connection::open_in_memory()?)
}

/// Return a connection to a database pre-configured with our test schema.
pub fn tdb() -> anyhow::Result<Connection> {
    let conn = connection()?;
    conn.exec(TEST_SCHEMA)?;
    Ok(conn)
}

/// Number of rows in `table`.
pub fn row_count(conn: &Connection, table: &str) -> anyhow::Result<i64> {
    let (count,): (i64,) = conn
        .prepare(&format!("SELECT count(*) FROM {}", quote_identifier(table)))?
        .fetch_one()?;
    Ok(count)
}

// Test type encoding and decoding
#[macro_export]
macro_rules! test_type {
    ($name:ident<$ty:ty>($sql:literal, $($text:literal == $value:expr),+ $(,)?)) => {
        $crate::__test_prepared_type!($name<$ty>($sql, $($text == $value),+));
        $crate::test_unprepared_type!($name<$ty>($($text == $value),+));
    };

    ($name:ident<$ty:ty>($($text:literal == $value:expr),+ $(,)?)) => {
        paste::item! {
            $crate::__test_prepared_type!($name<$ty>($crate::[< query_for_test_prepared_type >]!(), $($text == $value),+));
            $crate::test_unprepared_type!($name<$ty>($($text == $value),+));
        }
    };

    ($name:ident($($text:literal == $value:expr),+ $(,)?)) => {
        $crate::test_type!($name<$name>($($text == $value),+));
    };
}

// Test decoding of a literal selected without parameters
#[macro_export]
macro_rules! test_unprepared_type {
    ($name:ident<$ty:ty>($($text:literal == $value:expr),+ $(,)?)) => {
        paste::item! {
            #[test]
            fn [< test_unprepared_type_ $name >] () -> anyhow::Result<()> {
                let conn = upsertlite_test::connection()?;

                $(
                    {
                        let query = format!("SELECT {}", $text);
                        let (rec,): ($ty,) = conn.prepare(&query)?.fetch_one()?;
                        let expected: $ty = $value;
                        assert_eq!(expected, rec);
                    }
                )+

                Ok(())
            }
        }
    }
}

// Test binding a value and reading it back
#[macro_export]
macro_rules! __test_prepared_type {
    ($name:ident<$ty:ty>($sql:expr, $($text:literal == $value:expr),+ $(,)?)) => {
        paste::item! {
            #[test]
            fn [< test_prepared_type_ $name >] () -> anyhow::Result<()> {
                let conn = upsertlite_test::connection()?;

                $(
                    {
                        let value: $ty = $value;
                        let query = format!($sql, $text);
                        println!("{query} bound to {:?}", value);

                        let mut stmt = conn.prepare(&query)?;
                        stmt.bind_copy(1, &value)?;
                        stmt.bind_copy(2, &value)?;
                        let (matches, returned, round_trip): (bool, $ty, $ty) = stmt.fetch_one()?;

                        assert!(matches,
                                "[1] DB value mismatch; given value: {:?}\n\
                                 as returned: {:?}\n\
                                 round-trip: {:?}",
                                value, returned, round_trip);

                        assert_eq!(value, returned,
                                "[2] DB value mismatch; given value: {:?}\n\
                                 as returned: {:?}\n\
                                 round-trip: {:?}",
                                value, returned, round_trip);

                        assert_eq!(value, round_trip,
                                "[3] DB value mismatch; given value: {:?}\n\
                                 as returned: {:?}\n\
                                 round-trip: {:?}",
                                value, returned, round_trip);
                    }
                )+

                Ok(())
            }
        }
    };
}

#[macro_export]
macro_rules! query_for_test_prepared_type {
    () => {
        "SELECT {0} is ?, {0}, ?"
    };
}
