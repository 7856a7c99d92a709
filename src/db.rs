//! Process-wide database pool and schema bootstrap.

use once_cell::sync::OnceCell;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Schema};

static DB_POOL: OnceCell<DatabaseConnection> = OnceCell::new();

/// Connect the global pool. Must be called once before [`get_db_pool`].
pub async fn init_db(database_url: String) {
    let mut options = ConnectOptions::new(database_url.clone());
    if database_url.contains(":memory:") {
        // In-memory SQLite is per-connection; a pool of one keeps every
        // statement on the same database.
        options.max_connections(1);
    }
    let pool = Database::connect(options)
        .await
        .expect("Failed to connect to database.");
    if DB_POOL.set(pool).is_err() {
        log::debug!("database pool was already initialized");
    }
}

pub fn get_db_pool() -> &'static DatabaseConnection {
    DB_POOL.get().expect("database pool is not initialized")
}

/// Create the portal tables on the global pool if they do not exist yet.
pub async fn init_schema() -> Result<(), DbErr> {
    create_tables(get_db_pool()).await
}

/// Create the portal tables on the given connection if they do not exist yet.
pub async fn create_tables(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut statements = [
        schema.create_table_from_entity(crate::orm::users::Entity),
        schema.create_table_from_entity(crate::orm::topics::Entity),
        schema.create_table_from_entity(crate::orm::questions::Entity),
    ];

    for statement in statements.iter_mut() {
        statement.if_not_exists();
        db.execute(backend.build(statement)).await?;
    }

    Ok(())
}
