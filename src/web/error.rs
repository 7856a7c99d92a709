//! Rendered error pages, wired through `ErrorHandlers` in `main`.
//!
//! These replace the framework's bare-text error bodies. They carry no
//! session state; an error page renders the same for every browser.

use actix_web::dev::ServiceResponse;
use actix_web::http::StatusCode;
use actix_web::middleware::ErrorHandlerResponse;
use actix_web::{HttpResponse, Result};
use askama::Template;

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate {
    code: u16,
    message: &'static str,
}

fn render<B>(
    res: ServiceResponse<B>,
    code: StatusCode,
    message: &'static str,
) -> Result<ErrorHandlerResponse<B>> {
    let (req, _) = res.into_parts();

    let body = ErrorTemplate {
        code: code.as_u16(),
        message,
    }
    .render()
    .unwrap_or_else(|_| message.to_owned());

    let response = HttpResponse::build(code)
        .content_type("text/html; charset=utf-8")
        .body(body);

    Ok(ErrorHandlerResponse::Response(
        ServiceResponse::new(req, response).map_into_right_body(),
    ))
}

pub fn render_400<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    render(res, StatusCode::BAD_REQUEST, "The request could not be understood.")
}

pub fn render_404<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    render(res, StatusCode::NOT_FOUND, "That page does not exist.")
}

pub fn render_500<B>(res: ServiceResponse<B>) -> Result<ErrorHandlerResponse<B>> {
    render(
        res,
        StatusCode::INTERNAL_SERVER_ERROR,
        "Something went wrong on our side. Please try again.",
    )
}
