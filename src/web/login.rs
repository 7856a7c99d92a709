use crate::content;
use crate::db::get_db_pool;
use crate::flash::{set_flash, take_flash, Flash, Severity};
use crate::middleware::ClientCtx;
use crate::orm::users;
use crate::session;
use actix_session::Session;
use actix_web::{error, get, post, web, Error, HttpResponse};
use askama::Template;
use askama_actix::TemplateToResponse;
use sea_orm::{DatabaseConnection, DbErr};
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(post_login).service(view_login);
}

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    client: ClientCtx,
    flash: Option<Flash>,
    email: String,
}

#[derive(Deserialize)]
pub struct LoginForm {
    email: String,
    password: String,
}

/// Outcome of a credential check.
pub enum AuthOutcome {
    Success(users::Model),
    BadEmail,
    BadPassword,
}

pub async fn authenticate(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
) -> Result<AuthOutcome, DbErr> {
    let user = match content::find_by_email(db, email).await? {
        Some(user) => user,
        None => {
            // Burn a hash so an unknown email costs the same as a wrong
            // password.
            let _ = session::hash_password(password);
            return Ok(AuthOutcome::BadEmail);
        }
    };

    if !session::verify_password(password, &user.password_hash) {
        return Ok(AuthOutcome::BadPassword);
    }

    Ok(AuthOutcome::Success(user))
}

#[get("/login")]
pub async fn view_login(client: ClientCtx, session: Session) -> Result<HttpResponse, Error> {
    if let Some(user) = client.get_user() {
        return Ok(super::redirect(user.role.dashboard_path()));
    }

    Ok(LoginTemplate {
        client,
        flash: take_flash(&session),
        email: String::new(),
    }
    .to_response())
}

#[post("/login")]
pub async fn post_login(
    client: ClientCtx,
    session: Session,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse, Error> {
    if let Some(user) = client.get_user() {
        return Ok(super::redirect(user.role.dashboard_path()));
    }

    let email = form.email.trim().to_lowercase();

    if email.is_empty() || form.password.is_empty() {
        set_flash(
            &session,
            "Both email and password are required.",
            Severity::Danger,
        );
        return Ok(LoginTemplate {
            client,
            flash: take_flash(&session),
            email,
        }
        .to_response());
    }

    let outcome = authenticate(get_db_pool(), &email, &form.password)
        .await
        .map_err(|e| {
            log::error!("login lookup failed: {}", e);
            error::ErrorInternalServerError("Database error")
        })?;

    match outcome {
        AuthOutcome::Success(user) => {
            session::establish(&session, &user)
                .map_err(|_| error::ErrorInternalServerError("middleware error"))?;
            log::info!("user logged in: {} (user_id: {})", user.email, user.user_id);
            set_flash(
                &session,
                format!("Welcome back, {}!", user.name),
                Severity::Success,
            );
            Ok(super::redirect(user.role.dashboard_path()))
        }
        AuthOutcome::BadEmail | AuthOutcome::BadPassword => {
            log::debug!("login failure for {}", email);
            // One generic message for both cases to avoid email enumeration.
            set_flash(&session, "Invalid email or password.", Severity::Danger);
            Ok(LoginTemplate {
                client,
                flash: take_flash(&session),
                email,
            }
            .to_response())
        }
    }
}
