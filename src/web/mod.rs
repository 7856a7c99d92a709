pub mod admin;
pub mod error;
pub mod index;
pub mod login;
pub mod logout;
pub mod register;
pub mod student;
pub mod teacher;

use actix_web::http::header;
use actix_web::HttpResponse;

/// Configures the web app by adding services from each web file.
pub fn configure(conf: &mut actix_web::web::ServiceConfig) {
    index::configure(conf);
    admin::configure(conf);
    login::configure(conf);
    logout::configure(conf);
    register::configure(conf);
    student::configure(conf);
    teacher::configure(conf);
}

/// The post/redirect/get hop every state-changing handler ends with.
pub(crate) fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location))
        .finish()
}
