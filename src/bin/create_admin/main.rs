//! Out-of-band administrator provisioning.
//!
//! Registration only hands out teacher and student roles; the first admin
//! (and any further ones created this way) comes from here:
//!
//! ```text
//! ADMIN_EMAIL=root@example.com ADMIN_PASSWORD=... cargo run --bin create_admin
//! ```

use anyhow::{anyhow, bail, Context};
use env_logger::Env;
use lectern::content::{self, Registration};
use lectern::orm::users::Role;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let name = std::env::var("ADMIN_NAME").unwrap_or_else(|_| "Administrator".to_owned());
    let email = std::env::var("ADMIN_EMAIL")
        .context("ADMIN_EMAIL must be set")?
        .trim()
        .to_lowercase();
    let password = std::env::var("ADMIN_PASSWORD").context("ADMIN_PASSWORD must be set")?;

    if password.len() < lectern::constants::MIN_PASSWORD_LENGTH {
        bail!(
            "ADMIN_PASSWORD must be at least {} characters long",
            lectern::constants::MIN_PASSWORD_LENGTH
        );
    }

    lectern::db::init_db(std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?).await;
    lectern::db::init_schema()
        .await
        .context("failed to initialize database schema")?;

    let password_hash = lectern::session::hash_password(&password)
        .map_err(|e| anyhow!("failed to hash password: {}", e))?;

    let db = lectern::db::get_db_pool();
    match content::create_account(db, &name, &email, &password_hash, Role::Admin).await? {
        Registration::Created(user) => {
            println!(
                "Administrator '{}' <{}> created with user id {}.",
                user.name, user.email, user.user_id
            );
            Ok(())
        }
        Registration::EmailTaken => bail!("a user with email {} already exists", email),
    }
}
