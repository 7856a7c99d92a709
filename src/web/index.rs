use crate::flash::{take_flash, Flash};
use crate::middleware::ClientCtx;
use actix_session::Session;
use actix_web::{get, Error, HttpResponse};
use askama::Template;
use askama_actix::TemplateToResponse;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_index);
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    client: ClientCtx,
    flash: Option<Flash>,
}

/// GET / - Welcome page; logged-in browsers land on their dashboard.
#[get("/")]
pub async fn view_index(client: ClientCtx, session: Session) -> Result<HttpResponse, Error> {
    if let Some(user) = client.get_user() {
        return Ok(super::redirect(user.role.dashboard_path()));
    }

    Ok(IndexTemplate {
        client,
        flash: take_flash(&session),
    }
    .to_response())
}
