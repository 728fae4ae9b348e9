// Copyright 2023 Remi Bernotavicius

use crate::error::{Error, Result};
use diesel::prelude::Connection as _;
use diesel::RunQueryDsl as _;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::path::Path;

pub mod models;
pub mod schema;

pub type Connection = diesel::sqlite::SqliteConnection;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Opens the database at `path` (or `:memory:`), turns on foreign-key enforcement and brings the
/// schema up to date.
pub fn establish_connection(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();
    let url = path
        .to_str()
        .ok_or_else(|| Error::Internal(format!("database path {path:?} is not valid UTF-8")))?;
    let mut connection = Connection::establish(url)?;
    diesel::sql_query("PRAGMA foreign_keys = ON").execute(&mut connection)?;
    connection
        .run_pending_migrations(MIGRATIONS)
        .map_err(Error::Migration)?;
    log::debug!("database ready at {url}");
    Ok(connection)
}

/// Rolls back whatever transactions a panicking caller left open on `conn`.
pub fn abandon_open_transactions(conn: &mut Connection) -> Result<()> {
    use diesel::connection::{AnsiTransactionManager, TransactionManager};

    type Manager = AnsiTransactionManager;
    while <Manager as TransactionManager<Connection>>::transaction_manager_status_mut(conn)
        .transaction_depth()?
        .is_some()
    {
        <Manager as TransactionManager<Connection>>::rollback_transaction(conn)?;
        log::warn!("rolled back an abandoned transaction");
    }
    Ok(())
}

#[cfg(test)]
pub fn establish_in_memory() -> Connection {
    establish_connection(":memory:").unwrap()
}

#[test]
fn migrations() {
    let mut conn = establish_in_memory();

    // Redo every migration, the way `diesel migration redo --all` would.
    conn.revert_all_migrations(MIGRATIONS).unwrap();
    assert!(conn.has_pending_migration(MIGRATIONS).unwrap());
    conn.run_pending_migrations(MIGRATIONS).unwrap();
    assert!(!conn.has_pending_migration(MIGRATIONS).unwrap());
}

#[test]
fn foreign_keys_enforced() {
    use diesel::ExpressionMethods as _;
    use schema::recipe_ingredients::dsl::*;

    let mut conn = establish_in_memory();
    let err = diesel::insert_into(recipe_ingredients)
        .values((
            recipe_id.eq(models::RecipeId::new(99)),
            ingredient_id.eq(models::IngredientId::new(99)),
            quantity.eq("1 cup"),
        ))
        .execute(&mut conn)
        .unwrap_err();
    assert!(matches!(Error::from(err), Error::Integrity(_)));
}

#[test]
fn abandoned_transaction_rolled_back() {
    use diesel::connection::{AnsiTransactionManager, TransactionManager};
    use diesel::ExpressionMethods as _;
    use diesel::QueryDsl as _;
    use schema::ingredients::dsl::*;

    let mut conn = establish_in_memory();
    <AnsiTransactionManager as TransactionManager<Connection>>::begin_transaction(&mut conn)
        .unwrap();
    diesel::insert_into(ingredients)
        .values(name.eq("saffron"))
        .execute(&mut conn)
        .unwrap();

    abandon_open_transactions(&mut conn).unwrap();
    let count: i64 = ingredients.count().get_result(&mut conn).unwrap();
    assert_eq!(count, 0);

    // Nothing open any more, so this is a no-op.
    abandon_open_transactions(&mut conn).unwrap();
}
