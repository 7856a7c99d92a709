use crate::flash::{set_flash, Severity};
use crate::session;
use actix_session::Session;
use actix_web::{get, Error, HttpResponse};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_logout);
}

#[get("/logout")]
pub async fn view_logout(session: Session) -> Result<HttpResponse, Error> {
    session::clear(&session);
    set_flash(&session, "You have been logged out.", Severity::Success);
    Ok(super::redirect("/login"))
}
