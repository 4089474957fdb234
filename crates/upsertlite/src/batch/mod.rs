//! Bulk writes of [`Record`]s into one table.
//!
//! [`batch_insert`] compiles a single INSERT for the whole batch. [`batch_upsert`] keeps one
//! UPDATE per distinct field set in a bounded cache, and falls back to an INSERT for records
//! whose key matches no row. Both run inside one transaction: any error rolls the whole batch
//! back.

use crate::{
    BatchOptions, Connection, Error, FieldOrder, FieldSet, Record, Result, StorageValue,
    schema::TableMeta, slot::ParamSlot, sql,
};

mod cache;

pub use cache::CacheStats;

use cache::{CachedStatement, FieldSetCache};

/// Outcome of [`batch_insert`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsertSummary {
    pub records: usize,
    pub rows_affected: u64,
}

/// Outcome of [`batch_upsert`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertSummary {
    pub records: usize,
    /// Records that matched an existing row.
    pub updated: usize,
    /// Records written by the INSERT fallback.
    pub inserted: usize,
    pub cache: CacheStats,
}

/// What [`upsert_record`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upserted {
    Updated,
    Inserted,
}

fn field_position(meta: &TableMeta, name: &str) -> Result<usize> {
    meta.position(name).ok_or_else(|| Error::UnknownField {
        table: meta.table_name.clone(),
        field: name.to_string(),
    })
}

fn check_fields(record: &Record, meta: &TableMeta) -> Result<()> {
    for name in record.names() {
        field_position(meta, name.as_str())?;
    }
    Ok(())
}

fn require_pk(meta: &TableMeta) -> Result<()> {
    if meta.has_pk() {
        Ok(())
    } else {
        Err(Error::NoPrimaryKey {
            table: meta.table_name.clone(),
        })
    }
}

/// The value of `name`, borrowing the record's text and blob data.
fn value_of<'r>(record: &'r Record, name: &str) -> Result<StorageValue<'r>> {
    match record.field(name) {
        Some(Ok(value)) => Ok(value.as_borrowed()),
        Some(Err(err)) => Err(Error::Conversion(err.clone())),
        None => Err(Error::Protocol(format!("record has no field {name:?}"))),
    }
}

/// Bind the non-key fields of `record` in `fields` order, then the key.
fn bind_update<'r>(
    cached: &mut CachedStatement<'r>,
    record: &'r Record,
    fields: &FieldSet,
    pk: &str,
) -> Result<()> {
    let mut index = 1;
    for name in fields.iter().filter(|name| !name.matches(pk)) {
        ParamSlot::new(&mut cached.statement, index).put(value_of(record, name.as_str())?, false)?;
        index += 1;
    }
    ParamSlot::new(&mut cached.statement, cached.pk_param_position)
        .put(value_of(record, pk)?, false)
}

/// INSERT `record` with a statement naming exactly its fields. The statement is finalized
/// before returning.
fn insert_one<'r>(conn: &'r Connection, meta: &TableMeta, record: &'r Record) -> Result<u64> {
    let sql = sql::insert_command(&meta.table_name, record.names().map(|n| n.as_str()));
    let mut stmt = conn.prepare(&sql)?;
    for (i, name) in record.names().enumerate() {
        ParamSlot::new(&mut stmt, i + 1).put(value_of(record, name.as_str())?, false)?;
    }
    stmt.execute()
}

/// Insert `records` into the table described by `meta`, using the connection's
/// [`BatchOptions`].
///
/// A single INSERT names every column referenced by any record, in schema order. Each record
/// binds the fields it carries; columns it leaves out are NULL. Columns no record mentions are
/// left to their schema default.
///
/// A `NOT NULL DEFAULT` column that only some records carry is therefore bound NULL for the
/// others, which fails the whole batch with a NOT NULL constraint error.
///
/// Every field name is checked against `meta` before anything is written. An unknown field
/// fails with [`Error::UnknownField`] and the table is left unchanged.
pub fn batch_insert<'a>(
    records: &'a [Record],
    conn: &'a Connection,
    meta: &TableMeta,
) -> Result<InsertSummary> {
    batch_insert_with(records, conn, meta, conn.batch_options())
}

/// [`batch_insert`] with explicit options.
pub fn batch_insert_with<'a>(
    records: &'a [Record],
    conn: &'a Connection,
    meta: &TableMeta,
    options: &BatchOptions,
) -> Result<InsertSummary> {
    let mut summary = InsertSummary::default();

    let mut used = vec![false; meta.fields.len()];
    for record in records {
        for name in record.names() {
            used[field_position(meta, name.as_str())?] = true;
        }
    }
    if records.is_empty() {
        return Ok(summary);
    }

    // Parameter index of each schema column; 0 for columns no record references.
    let mut params = vec![0; meta.fields.len()];
    let mut columns = Vec::new();
    for (position, field) in meta.fields.iter().enumerate() {
        if used[position] {
            columns.push(field.name.as_str());
            params[position] = columns.len();
        }
    }

    let tx = conn.begin_with(options.transaction)?;
    let mut stmt = conn.prepare_persistent(&sql::insert_command(&meta.table_name, &columns))?;

    for record in records {
        for name in record.names() {
            let index = params[field_position(meta, name.as_str())?];
            ParamSlot::new(&mut stmt, index).put(value_of(record, name.as_str())?, false)?;
        }
        summary.rows_affected += stmt.execute()?;
        stmt.reset()?;
        stmt.clear_bindings();
        summary.records += 1;
    }

    drop(stmt);
    tx.commit()?;

    tracing::debug!(
        target: "upsertlite::batch",
        table = %meta.table_name,
        records = summary.records,
        columns = columns.len(),
        "batch insert committed"
    );
    Ok(summary)
}

/// Update or insert `records` by primary key, using the connection's [`BatchOptions`].
///
/// For each record an UPDATE of its non-key fields is run against the row with a matching key.
/// When no row matches, the record is inserted instead. UPDATE statements are cached by the
/// record's [`FieldSet`], so a batch with few distinct shapes compiles few statements.
///
/// Fails with [`Error::NoPrimaryKey`] when the table has no single-column key, with
/// [`Error::RecordMissingPk`] when a record does not carry it, and with
/// [`Error::UnknownField`] as [`batch_insert`] does. Any failure rolls back the whole batch.
pub fn batch_upsert<'a>(
    records: &'a [Record],
    conn: &'a Connection,
    meta: &TableMeta,
) -> Result<UpsertSummary> {
    batch_upsert_with(records, conn, meta, conn.batch_options())
}

/// [`batch_upsert`] with explicit options.
pub fn batch_upsert_with<'a>(
    records: &'a [Record],
    conn: &'a Connection,
    meta: &TableMeta,
    options: &BatchOptions,
) -> Result<UpsertSummary> {
    require_pk(meta)?;
    for record in records {
        check_fields(record, meta)?;
    }

    let mut summary = UpsertSummary::default();
    if records.is_empty() {
        return Ok(summary);
    }

    let tx = conn.begin_with(options.transaction)?;
    // Declared after the transaction so cached statements are finalized before a rollback.
    let mut cache = FieldSetCache::new(options.cache_capacity);

    for record in records {
        let key = match options.field_order {
            FieldOrder::Preserve => record.field_set(),
            FieldOrder::Canonical => record.field_set().canonical(),
        };
        let cached = cache.get_or_prepare(&key, || CachedStatement::prepare(conn, meta, &key))?;
        bind_update(cached, record, &key, &meta.pk)?;

        if cached.statement.execute()? == 0 {
            insert_one(conn, meta, record)?;
            summary.inserted += 1;
        } else {
            summary.updated += 1;
        }

        cached.statement.reset()?;
        cached.statement.clear_bindings();
        summary.records += 1;
    }

    summary.cache = cache.stats();
    cache.clear();
    tx.commit()?;

    tracing::debug!(
        target: "upsertlite::batch",
        table = %meta.table_name,
        records = summary.records,
        inserted = summary.inserted,
        updated = summary.updated,
        prepared = summary.cache.prepared,
        evictions = summary.cache.evictions,
        "batch upsert committed"
    );
    Ok(summary)
}

/// Insert one record. Returns the number of rows inserted.
pub fn insert_record(record: &Record, conn: &Connection, meta: &TableMeta) -> Result<u64> {
    check_fields(record, meta)?;
    insert_one(conn, meta, record)
}

/// Update the row whose key matches `record`. Returns the number of rows changed, 0 when no
/// row matched.
pub fn update_record(record: &Record, conn: &Connection, meta: &TableMeta) -> Result<u64> {
    require_pk(meta)?;
    check_fields(record, meta)?;
    let key = record.field_set();
    let mut cached = CachedStatement::prepare(conn, meta, &key)?;
    bind_update(&mut cached, record, &key, &meta.pk)?;
    cached.statement.execute()
}

/// Update the row whose key matches `record`, or insert it when there is none.
pub fn upsert_record(record: &Record, conn: &Connection, meta: &TableMeta) -> Result<Upserted> {
    let tx = conn.begin()?;
    let outcome = if update_record(record, conn, meta)? > 0 {
        Upserted::Updated
    } else {
        insert_one(conn, meta, record)?;
        Upserted::Inserted
    };
    tx.commit()?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::load_table_meta;

    fn setup() -> (Connection, TableMeta) {
        let conn = Connection::open_in_memory().unwrap();
        conn.exec(
            "CREATE TABLE items (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL DEFAULT 'unnamed',
                qty INTEGER DEFAULT 0
            )",
        )
        .unwrap();
        let meta = load_table_meta(&conn, "items").unwrap();
        (conn, meta)
    }

    fn rows(conn: &Connection) -> Vec<(i64, String, Option<i64>)> {
        conn.prepare("SELECT id, name, qty FROM items ORDER BY id")
            .unwrap()
            .fetch_all()
            .unwrap()
    }

    #[test]
    fn insert_uses_defaults_for_unreferenced_columns() {
        let (conn, meta) = setup();
        let records = vec![
            Record::new().with("id", 1i64),
            Record::new().with("ID", 2i64),
        ];
        let summary = batch_insert(&records, &conn, &meta).unwrap();
        assert_eq!(summary.records, 2);
        assert_eq!(summary.rows_affected, 2);
        assert_eq!(
            rows(&conn),
            [(1, "unnamed".to_string(), Some(0)), (2, "unnamed".to_string(), Some(0))]
        );
    }

    #[test]
    fn insert_of_nothing_is_a_no_op() {
        let (conn, meta) = setup();
        assert_eq!(
            batch_insert(&[], &conn, &meta).unwrap(),
            InsertSummary::default()
        );
        assert!(conn.is_autocommit());
    }

    #[test]
    fn upsert_updates_then_inserts() {
        let (conn, meta) = setup();
        conn.exec("INSERT INTO items (id, name, qty) VALUES (1, 'one', 1)")
            .unwrap();

        let records = vec![
            Record::new().with("id", 1i64).with("qty", 10i64),
            Record::new().with("id", 2i64).with("qty", 20i64),
            Record::new().with("id", 3i64).with("name", "three"),
        ];
        let summary = batch_upsert(&records, &conn, &meta).unwrap();
        assert_eq!(summary.updated, 1);
        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.cache.prepared, 2);
        assert_eq!(summary.cache.hits, 1);
        assert_eq!(
            rows(&conn),
            [
                (1, "one".to_string(), Some(10)),
                (2, "unnamed".to_string(), Some(20)),
                (3, "three".to_string(), Some(0)),
            ]
        );
    }

    #[test]
    fn canonical_order_shares_statements() {
        let (conn, meta) = setup();
        let records = vec![
            Record::new().with("id", 1i64).with("qty", 1i64),
            Record::new().with("qty", 2i64).with("id", 2i64),
        ];
        let options = BatchOptions::default().field_order(FieldOrder::Canonical);
        let summary = batch_upsert_with(&records, &conn, &meta, &options).unwrap();
        assert_eq!(summary.cache.prepared, 1);

        let summary = batch_upsert(&records, &conn, &meta).unwrap();
        assert_eq!(summary.cache.prepared, 2);
        assert_eq!(summary.updated, 2);
    }

    #[test]
    fn key_only_records() {
        let (conn, meta) = setup();
        let records = vec![Record::new().with("id", 5i64)];
        assert_eq!(batch_upsert(&records, &conn, &meta).unwrap().inserted, 1);
        assert_eq!(batch_upsert(&records, &conn, &meta).unwrap().updated, 1);
        assert_eq!(rows(&conn).len(), 1);
    }

    #[test]
    fn single_record_helpers() {
        let (conn, meta) = setup();
        let record = Record::new().with("id", 7i64).with("name", "seven");
        assert_eq!(insert_record(&record, &conn, &meta).unwrap(), 1);

        let changed = Record::new().with("id", 7i64).with("qty", 3i64);
        assert_eq!(update_record(&changed, &conn, &meta).unwrap(), 1);

        let absent = Record::new().with("id", 8i64);
        assert_eq!(update_record(&absent, &conn, &meta).unwrap(), 0);
        assert_eq!(
            upsert_record(&absent, &conn, &meta).unwrap(),
            Upserted::Inserted
        );
        assert_eq!(
            upsert_record(&changed, &conn, &meta).unwrap(),
            Upserted::Updated
        );
        assert_eq!(
            rows(&conn),
            [
                (7, "seven".to_string(), Some(3)),
                (8, "unnamed".to_string(), Some(0)),
            ]
        );
    }

    #[test]
    fn upsert_without_key_column() {
        let conn = Connection::open_in_memory().unwrap();
        conn.exec("CREATE TABLE logs (msg TEXT)").unwrap();
        let meta = load_table_meta(&conn, "logs").unwrap();
        let records = vec![Record::new().with("msg", "hi")];
        assert!(matches!(
            batch_upsert(&records, &conn, &meta),
            Err(Error::NoPrimaryKey { table }) if table == "logs"
        ));
    }
}
