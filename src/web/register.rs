use crate::constants::MIN_PASSWORD_LENGTH;
use crate::content::{self, Registration};
use crate::db::get_db_pool;
use crate::flash::{set_flash, take_flash, Flash, Severity};
use crate::middleware::ClientCtx;
use crate::orm::users::Role;
use crate::session;
use actix_session::Session;
use actix_web::{error, get, post, web, Error, HttpResponse};
use askama::Template;
use askama_actix::TemplateToResponse;
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(post_register).service(view_register);
}

#[derive(Template)]
#[template(path = "register.html")]
struct RegisterTemplate {
    client: ClientCtx,
    flash: Option<Flash>,
    errors: Vec<String>,
    name: String,
    email: String,
    role: String,
}

#[derive(Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    /// "teacher" or "student"; admin is never self-selectable.
    pub role: String,
}

/// Every violated rule, in form order. Empty means the form is acceptable.
pub fn validate_registration(form: &RegisterForm) -> Vec<String> {
    let mut errors = Vec::new();

    if form.name.trim().is_empty() {
        errors.push("Full name is required.".to_owned());
    }

    let email = form.email.trim();
    if email.is_empty() {
        errors.push("Email is required.".to_owned());
    } else if !validator::validate_email(email) {
        errors.push("Invalid email format.".to_owned());
    }

    if form.password.is_empty() {
        errors.push("Password is required.".to_owned());
    } else if form.password.len() < MIN_PASSWORD_LENGTH {
        errors.push(format!(
            "Password must be at least {} characters long.",
            MIN_PASSWORD_LENGTH
        ));
    }

    if form.password != form.confirm_password {
        errors.push("Passwords do not match.".to_owned());
    }

    match Role::parse(&form.role) {
        Some(Role::Teacher) | Some(Role::Student) => {}
        _ => errors.push("Invalid role selected.".to_owned()),
    }

    errors
}

#[get("/register")]
pub async fn view_register(client: ClientCtx, session: Session) -> Result<HttpResponse, Error> {
    if client.is_user() {
        return Ok(super::redirect("/"));
    }

    Ok(RegisterTemplate {
        client,
        flash: take_flash(&session),
        errors: Vec::new(),
        name: String::new(),
        email: String::new(),
        role: String::new(),
    }
    .to_response())
}

#[post("/register")]
pub async fn post_register(
    client: ClientCtx,
    session: Session,
    form: web::Form<RegisterForm>,
) -> Result<HttpResponse, Error> {
    if client.is_user() {
        return Ok(super::redirect("/"));
    }

    let errors = validate_registration(&form);
    if !errors.is_empty() {
        return Ok(RegisterTemplate {
            client,
            flash: take_flash(&session),
            errors,
            name: form.name.clone(),
            email: form.email.clone(),
            role: form.role.clone(),
        }
        .to_response());
    }

    let name = form.name.trim();
    let email = form.email.trim().to_lowercase();
    // Checked by validate_registration above.
    let role = Role::parse(&form.role).ok_or_else(|| error::ErrorBadRequest("Invalid role"))?;

    let password_hash = session::hash_password(&form.password).map_err(|e| {
        log::error!("Failed to hash password: {}", e);
        error::ErrorInternalServerError("Failed to create user")
    })?;

    match content::create_account(get_db_pool(), name, &email, &password_hash, role).await {
        Ok(Registration::Created(user)) => {
            log::info!("New user registered: {} (user_id: {})", name, user.user_id);
            set_flash(
                &session,
                "Registration successful! You can now log in.",
                Severity::Success,
            );
            Ok(super::redirect("/login"))
        }
        Ok(Registration::EmailTaken) => Ok(RegisterTemplate {
            client,
            flash: take_flash(&session),
            errors: vec!["Email already registered.".to_owned()],
            name: form.name.clone(),
            email: form.email.clone(),
            role: form.role.clone(),
        }
        .to_response()),
        Err(e) => {
            log::error!("User registration failed for email {}: {}", email, e);
            set_flash(
                &session,
                "Registration failed. Please try again.",
                Severity::Danger,
            );
            Ok(RegisterTemplate {
                client,
                flash: take_flash(&session),
                errors: Vec::new(),
                name: form.name.clone(),
                email: form.email.clone(),
                role: form.role.clone(),
            }
            .to_response())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(
        name: &str,
        email: &str,
        password: &str,
        confirm: &str,
        role: &str,
    ) -> RegisterForm {
        RegisterForm {
            name: name.to_owned(),
            email: email.to_owned(),
            password: password.to_owned(),
            confirm_password: confirm.to_owned(),
            role: role.to_owned(),
        }
    }

    #[test]
    fn accepts_a_complete_form() {
        let errors = validate_registration(&form(
            "Ada Lovelace",
            "ada@example.com",
            "engine1",
            "engine1",
            "teacher",
        ));
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
    }

    #[test]
    fn lists_every_violated_rule() {
        let errors = validate_registration(&form("", "not-an-email", "abc", "abcd", "wizard"));
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn rejects_blank_name() {
        let errors =
            validate_registration(&form("   ", "a@b.example", "secret1", "secret1", "student"));
        assert_eq!(errors, vec!["Full name is required.".to_owned()]);
    }

    #[test]
    fn rejects_invalid_email() {
        let errors = validate_registration(&form("A", "nope", "secret1", "secret1", "student"));
        assert_eq!(errors, vec!["Invalid email format.".to_owned()]);
    }

    #[test]
    fn rejects_short_password() {
        let errors = validate_registration(&form("A", "a@b.example", "12345", "12345", "student"));
        assert_eq!(
            errors,
            vec!["Password must be at least 6 characters long.".to_owned()]
        );
    }

    #[test]
    fn rejects_mismatched_confirmation() {
        let errors =
            validate_registration(&form("A", "a@b.example", "secret1", "secret2", "student"));
        assert_eq!(errors, vec!["Passwords do not match.".to_owned()]);
    }

    #[test]
    fn admin_is_not_self_selectable() {
        let errors = validate_registration(&form("A", "a@b.example", "secret1", "secret1", "admin"));
        assert_eq!(errors, vec!["Invalid role selected.".to_owned()]);
    }
}
