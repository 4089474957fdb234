use hashlink::lru_cache::LruCache;

use crate::{Connection, Error, FieldSet, Result, Statement, schema::TableMeta, sql};

/// A compiled `UPDATE … WHERE pk = ?` for one field set.
#[derive(Debug)]
pub(crate) struct CachedStatement<'c> {
    pub(crate) statement: Statement<'c>,
    /// 1-based parameter bound to the key in the WHERE clause.
    pub(crate) pk_param_position: usize,
}

impl<'c> CachedStatement<'c> {
    /// Compile the UPDATE for records shaped like `fields`. The key is left out of the SET list.
    pub(crate) fn prepare(conn: &'c Connection, meta: &TableMeta, fields: &FieldSet) -> Result<Self> {
        if !fields.contains(&meta.pk) {
            return Err(Error::RecordMissingPk {
                table: meta.table_name.clone(),
                pk: meta.pk.clone(),
            });
        }

        let columns: Vec<&str> = fields
            .iter()
            .filter(|name| !name.matches(&meta.pk))
            .map(|name| name.as_str())
            .collect();
        let pk_param_position = columns.len() + 1;
        let sql = sql::update_where_command(&meta.table_name, &columns, &meta.pk);

        Ok(Self {
            statement: conn.prepare_persistent(&sql)?,
            pk_param_position,
        })
    }
}

/// Counters for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Statements compiled on a miss.
    pub prepared: u64,
    pub hits: u64,
    /// Statements dropped to make room for a new field set.
    pub evictions: u64,
}

/// Prepared UPDATE statements keyed by the field set of the records they serve. When full, the
/// least recently used statement is finalized.
pub(crate) struct FieldSetCache<'c> {
    inner: LruCache<FieldSet, CachedStatement<'c>>,
    stats: CacheStats,
}

impl<'c> FieldSetCache<'c> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            inner: LruCache::new(capacity.max(1)),
            stats: CacheStats::default(),
        }
    }

    /// The statement for `key`, compiled with `prepare` on a miss.
    pub(crate) fn get_or_prepare<F>(
        &mut self,
        key: &FieldSet,
        prepare: F,
    ) -> Result<&mut CachedStatement<'c>>
    where
        F: FnOnce() -> Result<CachedStatement<'c>>,
    {
        if self.inner.contains_key(key) {
            self.stats.hits += 1;
        } else {
            let statement = prepare()?;
            if self.inner.len() >= self.inner.capacity() {
                if let Some((evicted, _)) = self.inner.remove_lru() {
                    self.stats.evictions += 1;
                    tracing::warn!(
                        target: "upsertlite::batch",
                        capacity = self.inner.capacity(),
                        "evicted statement for fields {:?}; more distinct field sets than the cache holds",
                        evicted
                    );
                }
            }
            self.inner.insert(key.clone(), statement);
            self.stats.prepared += 1;
        }

        self.inner
            .get_mut(key)
            .ok_or_else(|| Error::Protocol("statement missing from cache after insert".into()))
    }

    pub(crate) fn stats(&self) -> CacheStats {
        self.stats
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.inner.len()
    }

    /// Finalize every cached statement.
    pub(crate) fn clear(&mut self) {
        self.inner.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FieldName, schema::load_table_meta};

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.exec("CREATE TABLE t (id INTEGER PRIMARY KEY, a TEXT, b TEXT, c TEXT)")
            .unwrap();
        conn
    }

    fn fields(names: &[&str]) -> FieldSet {
        names.iter().map(|n| FieldName::new(n)).collect()
    }

    #[test]
    fn key_is_bound_after_set_columns() {
        let conn = setup();
        let meta = load_table_meta(&conn, "t").unwrap();
        let cached = CachedStatement::prepare(&conn, &meta, &fields(&["a", "ID", "b"])).unwrap();
        assert_eq!(cached.pk_param_position, 3);
        assert_eq!(
            cached.statement.sql(),
            r#"UPDATE "t" SET "a" = ?, "b" = ? WHERE "id" = ?"#
        );
    }

    #[test]
    fn missing_key_is_an_error() {
        let conn = setup();
        let meta = load_table_meta(&conn, "t").unwrap();
        let err = CachedStatement::prepare(&conn, &meta, &fields(&["a"])).unwrap_err();
        assert!(matches!(err, Error::RecordMissingPk { pk, .. } if pk == "id"));
    }

    #[test]
    fn hits_and_evictions() {
        let conn = setup();
        let meta = load_table_meta(&conn, "t").unwrap();
        let mut cache = FieldSetCache::new(2);

        for names in [
            &["id", "a"][..],
            &["id", "b"],
            &["ID", "A"],
            &["id", "c"],
            &["id", "b"],
        ] {
            let key = fields(names);
            cache
                .get_or_prepare(&key, || CachedStatement::prepare(&conn, &meta, &key))
                .unwrap();
        }

        // [id, b] was evicted by [id, c] and compiled again.
        assert_eq!(
            cache.stats(),
            CacheStats {
                prepared: 4,
                hits: 1,
                evictions: 2,
            }
        );
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn failed_prepare_caches_nothing() {
        let conn = setup();
        let meta = load_table_meta(&conn, "t").unwrap();
        let mut cache = FieldSetCache::new(4);
        let key = fields(&["a"]);
        assert!(
            cache
                .get_or_prepare(&key, || CachedStatement::prepare(&conn, &meta, &key))
                .is_err()
        );
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.stats().prepared, 0);
    }
}
