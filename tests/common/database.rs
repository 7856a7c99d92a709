//! Shared test database setup
#![allow(dead_code)]

use sea_orm::{DatabaseConnection, DbErr, EntityTrait};

/// Connect the process-wide pool (in-memory SQLite unless TEST_DATABASE_URL
/// points somewhere else) and make sure the schema exists.
pub async fn setup_test_database() -> Result<&'static DatabaseConnection, DbErr> {
    let url =
        std::env::var("TEST_DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_owned());
    lectern::db::init_db(url).await;

    let db = lectern::db::get_db_pool();
    lectern::db::create_tables(db).await?;
    Ok(db)
}

/// Remove every row, children before parents.
pub async fn cleanup_test_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    use lectern::orm::{questions, topics, users};

    questions::Entity::delete_many().exec(db).await?;
    topics::Entity::delete_many().exec(db).await?;
    users::Entity::delete_many().exec(db).await?;
    Ok(())
}
