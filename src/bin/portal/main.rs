use actix_files::Files;
use actix_session::{config::PersistentSession, storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::{Key, SameSite};
use actix_web::http::StatusCode;
use actix_web::middleware::{ErrorHandlers, Logger};
use actix_web::{App, HttpServer};
use env_logger::Env;
use lectern::db::{get_db_pool, init_db};
use rand::{distributions::Alphanumeric, Rng};
use std::path::PathBuf;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    init_lib_mods();
    init_our_mods();
    init_db(std::env::var("DATABASE_URL").expect("DATABASE_URL must be set.")).await;
    lectern::db::init_schema()
        .await
        .expect("Failed to initialize database schema.");
    log::info!(
        "database ready ({} administrators registered)",
        lectern::content::count_admins(get_db_pool())
            .await
            .unwrap_or(0)
    );

    let secret_key = match std::env::var("SECRET_KEY") {
        Ok(key) => Key::from(key.as_bytes()),
        Err(err) => {
            let random_string: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(128)
                .map(char::from)
                .collect();
            log::warn!("SECRET_KEY was invalid. Reason: {:?}\r\nThis means the key used for signing session cookies will invalidate every time the application is restarted. A secret key must be at least 64 bytes to be accepted.\r\n\r\nNeed a key? How about:\r\n{}", err, random_string);
            Key::from(random_string.as_bytes())
        }
    };

    let uploads_root = PathBuf::from(lectern::app_config::storage().local_path).join("uploads");
    let bind_addr = lectern::app_config::server().bind_addr;
    log::info!(
        "starting {} on {}",
        lectern::app_config::site().name,
        bind_addr
    );

    HttpServer::new(move || {
        // Order of middleware IS IMPORTANT and is in REVERSE EXECUTION ORDER.
        App::new()
            .wrap(
                ErrorHandlers::new()
                    .handler(StatusCode::BAD_REQUEST, lectern::web::error::render_400)
                    .handler(StatusCode::NOT_FOUND, lectern::web::error::render_404)
                    .handler(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        lectern::web::error::render_500,
                    ),
            )
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                    .cookie_same_site(SameSite::Lax)
                    .cookie_secure(false) // Allow HTTP for development
                    .session_lifecycle(PersistentSession::default())
                    .build(),
            )
            .wrap(Logger::new("%a %{User-Agent}i"))
            .service(Files::new("/uploads", uploads_root.clone()))
            .configure(lectern::web::configure)
    })
    .bind(&bind_addr)?
    .run()
    .await
}

/// Initialize third party crates we rely on but don't have control over.
pub fn init_lib_mods() {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}

/// Initialize all local mods.
/// Panics
pub fn init_our_mods() {
    lectern::app_config::init();
    lectern::filesystem::init();
}
