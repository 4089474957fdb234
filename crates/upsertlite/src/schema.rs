//! Table metadata read from the database schema.

use crate::{Affinity, Connection, Error, Result, sql::quote_identifier};

/// One column of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMeta {
    pub name: String,
    /// The declared type, possibly empty.
    pub decl_type: String,
    /// The default value expression as written in the schema.
    pub default: Option<String>,
    pub not_null: bool,
    /// 1-based position within the primary key, or 0 when the column is not part of it.
    pub pk_position: u32,
}

impl FieldMeta {
    pub fn affinity(&self) -> Affinity {
        match self.decl_type.parse() {
            Ok(affinity) => affinity,
            Err(never) => match never {},
        }
    }
}

/// The columns of a table and the name of its primary key.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableMeta {
    pub table_name: String,
    /// Columns in schema order.
    pub fields: Vec<FieldMeta>,
    /// The single-column primary key, or an empty string when the table has none or the key
    /// spans several columns.
    pub pk: String,
}

impl TableMeta {
    /// The column called `name`, compared case-insensitively.
    pub fn field(&self, name: &str) -> Option<&FieldMeta> {
        self.position(name).map(|i| &self.fields[i])
    }

    /// Schema position of the column called `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| f.name.eq_ignore_ascii_case(name))
    }

    pub fn has_pk(&self) -> bool {
        !self.pk.is_empty()
    }

    /// Columns that make up the primary key, in key order.
    pub fn primary_key(&self) -> Vec<&FieldMeta> {
        let mut key: Vec<_> = self.fields.iter().filter(|f| f.pk_position > 0).collect();
        key.sort_by_key(|f| f.pk_position);
        key
    }
}

/// Read the columns of `table` with `PRAGMA table_info`.
pub fn load_table_meta(conn: &Connection, table: &str) -> Result<TableMeta> {
    if table.is_empty() {
        return Err(Error::Protocol("table name is empty".into()));
    }

    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_identifier(table)))?;
    let fields = stmt
        .query_map(|row| {
            Ok(FieldMeta {
                name: row.get_named("name")?,
                decl_type: row.get_named::<Option<String>>("type")?.unwrap_or_default(),
                default: row.get_named("dflt_value")?,
                not_null: row.get_named("notnull")?,
                pk_position: row.get_named("pk")?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if fields.is_empty() {
        return Err(Error::TableNotFound(table.to_string()));
    }

    let mut meta = TableMeta {
        table_name: table.to_string(),
        fields,
        pk: String::new(),
    };
    let pk = match meta.primary_key().as_slice() {
        [key] => key.name.clone(),
        _ => String::new(),
    };
    meta.pk = pk;
    Ok(meta)
}

/// Read metadata for every user table in the database, in name order.
pub fn load_all_table_meta(conn: &Connection) -> Result<Vec<TableMeta>> {
    let names: Vec<(String,)> = conn
        .prepare(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\' \
             ORDER BY name",
        )?
        .fetch_all()?;

    names
        .iter()
        .map(|(name,)| load_table_meta(conn, name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.exec(
            r#"
            CREATE TABLE people (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL DEFAULT 'anon',
                score REAL,
                extra
            );
            CREATE TABLE pairs (a INTEGER, b INTEGER, PRIMARY KEY (a, b));
            CREATE TABLE logs (msg TEXT);
            "#,
        )
        .unwrap();
        conn
    }

    #[test]
    fn reads_columns_and_key() {
        let conn = conn();
        let meta = load_table_meta(&conn, "people").unwrap();
        assert_eq!(meta.pk, "id");
        let names: Vec<_> = meta.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["id", "name", "score", "extra"]);

        let name = meta.field("NAME").unwrap();
        assert_eq!(name.default.as_deref(), Some("'anon'"));
        assert!(name.not_null);
        assert_eq!(name.affinity(), Affinity::Text);
        assert_eq!(meta.field("extra").unwrap().affinity(), Affinity::Blob);
        assert_eq!(meta.position("score"), Some(2));
    }

    #[test]
    fn composite_and_missing_keys_leave_pk_empty() {
        let conn = conn();
        let pairs = load_table_meta(&conn, "pairs").unwrap();
        assert!(!pairs.has_pk());
        assert_eq!(pairs.primary_key().len(), 2);
        assert!(!load_table_meta(&conn, "logs").unwrap().has_pk());
    }

    #[test]
    fn missing_and_empty_tables() {
        let conn = conn();
        assert!(matches!(
            load_table_meta(&conn, "ghost"),
            Err(Error::TableNotFound(name)) if name == "ghost"
        ));
        assert!(matches!(load_table_meta(&conn, ""), Err(Error::Protocol(_))));
    }

    #[test]
    fn all_tables() {
        let conn = conn();
        let all = load_all_table_meta(&conn).unwrap();
        let names: Vec<_> = all.iter().map(|m| m.table_name.as_str()).collect();
        assert_eq!(names, ["logs", "pairs", "people"]);
    }
}
