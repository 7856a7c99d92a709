use crate::constants::GUEST_USERNAME;
use crate::flash::{set_flash, Severity};
use crate::orm::users::Role;
use crate::session;
use actix_session::{Session, SessionExt};
use actix_web::dev::Payload;
use actix_web::http::{header, StatusCode};
use actix_web::{Error, FromRequest, HttpRequest, HttpResponse, ResponseError};
use futures::future::{ready, Ready};
use std::fmt;

/// The authenticated identity read from the session cookie.
#[derive(Clone, Debug, PartialEq)]
pub struct Profile {
    pub id: i32,
    pub name: String,
    pub role: Role,
}

/// Client context passed to routes.
/// None is a guest browser with no (or an incomplete) session identity.
#[derive(Clone, Debug, Default)]
pub struct ClientCtx {
    client: Option<Profile>,
}

/// The capability rule for page access: a role reaches its own pages, and
/// admins additionally reach teacher and student pages for management.
pub fn can_access(session_role: Role, required: Role) -> bool {
    session_role == required || session_role == Role::Admin
}

impl ClientCtx {
    pub fn from_session(session: &Session) -> Self {
        let id = session.get::<i32>(session::KEY_USER_ID).ok().flatten();
        let name = session.get::<String>(session::KEY_USER_NAME).ok().flatten();
        let role = session.get::<Role>(session::KEY_ROLE).ok().flatten();

        let client = match (id, name, role) {
            (Some(id), Some(name), Some(role)) => Some(Profile { id, name, role }),
            _ => None,
        };
        Self { client }
    }

    pub fn get_user(&self) -> Option<&Profile> {
        self.client.as_ref()
    }

    /// Returns either the user's id or None.
    pub fn get_id(&self) -> Option<i32> {
        self.client.as_ref().map(|u| u.id)
    }

    /// Returns either the user's name or the word for guest.
    pub fn get_name(&self) -> String {
        match &self.client {
            Some(user) => user.name.to_owned(),
            None => GUEST_USERNAME.to_owned(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.client.is_some()
    }

    pub fn is_admin(&self) -> bool {
        matches!(&self.client, Some(user) if user.role == Role::Admin)
    }

    pub fn is_teacher(&self) -> bool {
        matches!(&self.client, Some(user) if user.role == Role::Teacher)
    }

    pub fn is_student(&self) -> bool {
        matches!(&self.client, Some(user) if user.role == Role::Student)
    }

    /// Role name for the nav bar; empty for guests.
    pub fn role_label(&self) -> &'static str {
        match &self.client {
            Some(user) => user.role.label(),
            None => "",
        }
    }

    /// Where "Dashboard" points for this browser.
    pub fn dashboard_path(&self) -> &'static str {
        match &self.client {
            Some(user) => user.role.dashboard_path(),
            None => "/",
        }
    }

    /// Gate a page on a role. Guests are sent to the login page, users whose
    /// role cannot access the page are sent home; both leave a notice. The
    /// error is a redirect response, so `?` never hands control back to a
    /// denied handler.
    pub fn require_role(&self, session: &Session, required: Role) -> Result<Profile, Denied> {
        match self.get_user() {
            None => {
                set_flash(
                    session,
                    "You must be logged in to access this page.",
                    Severity::Danger,
                );
                Err(Denied::to_login())
            }
            Some(profile) if can_access(profile.role, required) => Ok(profile.clone()),
            Some(_) => {
                set_flash(
                    session,
                    "You do not have permission to access this page.",
                    Severity::Danger,
                );
                Err(Denied::to_home())
            }
        }
    }
}

/// A role-gate denial. Renders as a redirect, never as a page body.
#[derive(Debug)]
pub struct Denied {
    location: &'static str,
}

impl Denied {
    fn to_login() -> Self {
        Self { location: "/login" }
    }

    fn to_home() -> Self {
        Self { location: "/" }
    }
}

impl fmt::Display for Denied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "access denied, redirecting to {}", self.location)
    }
}

impl ResponseError for Denied {
    fn status_code(&self) -> StatusCode {
        StatusCode::SEE_OTHER
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::SeeOther()
            .insert_header((header::LOCATION, self.location))
            .finish()
    }
}

/// This implementation is what provides the `client: ClientCtx` in the
/// parameters of route functions.
impl FromRequest for ClientCtx {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let session = req.get_session();
        ready(Ok(ClientCtx::from_session(&session)))
    }
}
