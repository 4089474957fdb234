//! Builders for the few statement shapes the batch engine needs. Identifiers are always quoted
//! and values are always `?` placeholders.

use std::fmt::Write;

/// Quote an SQL identifier, doubling any embedded `"`.
pub fn quote_identifier(ident: &str) -> String {
    let escaped = ident.replace('"', "\"\"");
    format!("\"{escaped}\"")
}

/// Append the quoted names, each followed by `suffix`, separated by commas. Returns how many
/// names were written.
fn push_identifiers<I, S>(sql: &mut String, names: I, suffix: &str) -> usize
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut count = 0;
    for name in names {
        if count > 0 {
            sql.push_str(", ");
        }
        sql.push_str(&quote_identifier(name.as_ref()));
        sql.push_str(suffix);
        count += 1;
    }
    count
}

/// `INSERT INTO "t" ("a", "b") VALUES (?, ?)`
///
/// With no columns, falls back to `INSERT INTO "t" DEFAULT VALUES`.
pub fn insert_command<I, S>(table: &str, columns: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut names = String::new();
    let count = push_identifiers(&mut names, columns, "");
    if count == 0 {
        return insert_default_values(table);
    }
    let placeholders = vec!["?"; count].join(", ");
    format!(
        "INSERT INTO {} ({names}) VALUES ({placeholders})",
        quote_identifier(table)
    )
}

/// `INSERT INTO "t" DEFAULT VALUES`
pub fn insert_default_values(table: &str) -> String {
    format!("INSERT INTO {} DEFAULT VALUES", quote_identifier(table))
}

/// `UPDATE "t" SET "a" = ?, "b" = ?` with no WHERE clause.
pub fn update_command<I, S>(table: &str, columns: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    update_set(table, columns).0
}

fn update_set<I, S>(table: &str, columns: I) -> (String, usize)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut sql = format!("UPDATE {} SET ", quote_identifier(table));
    let count = push_identifiers(&mut sql, columns, " = ?");
    (sql, count)
}

/// `UPDATE "t" SET "a" = ?, "b" = ? WHERE "pk" = ?`
///
/// The key is bound to the last parameter. When `columns` is empty the key is assigned to
/// itself, so the statement still reports whether the row exists.
pub fn update_where_command<I, S>(table: &str, columns: I, pk: &str) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let pk = quote_identifier(pk);
    let (mut sql, count) = update_set(table, columns);
    if count == 0 {
        write!(sql, "{pk} = {pk}").ok();
    }
    write!(sql, " WHERE {pk} = ?").ok();
    sql
}

/// `SELECT "a", "b" FROM "t"`
pub fn select_command<I, S>(table: &str, columns: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut sql = String::from("SELECT ");
    if push_identifiers(&mut sql, columns, "") == 0 {
        sql.push('*');
    }
    write!(sql, " FROM {}", quote_identifier(table)).ok();
    sql
}
