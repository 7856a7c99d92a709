//! Teacher pages: dashboard, topic upload, topic details with replies.
//!
//! Every page is gated on the teacher role; admins pass the gate for
//! content management. Topic details and its actions are additionally
//! scoped to the owning teacher.

use crate::constants::{
    ALLOWED_VIDEO_EXTENSIONS, MAX_PDF_BYTES, MAX_TEXT_FIELD_BYTES, MAX_VIDEO_BYTES,
};
use crate::content::{self, Reply, TopicDeletion};
use crate::db::get_db_pool;
use crate::filesystem;
use crate::flash::{set_flash, take_flash, Flash, Severity};
use crate::middleware::ClientCtx;
use crate::orm::users::Role;
use crate::video::{self, VideoView};
use actix_multipart::{Field, Multipart};
use actix_session::Session;
use actix_web::{error, get, post, web, Error, HttpResponse};
use askama::Template;
use askama_actix::TemplateToResponse;
use futures::{StreamExt, TryStreamExt};
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_dashboard)
        .service(view_upload_topic)
        .service(post_upload_topic)
        .service(view_topic_details)
        .service(post_reply)
        .service(delete_topic);
}

// ============================================================================
// Dashboard
// ============================================================================

struct TopicRow {
    topic_id: i32,
    title: String,
    description: String,
    uploaded: String,
}

#[derive(Template)]
#[template(path = "teacher/dashboard.html")]
struct DashboardTemplate {
    client: ClientCtx,
    flash: Option<Flash>,
    topics: Vec<TopicRow>,
}

/// GET /teacher - the teacher's own topics, newest first.
#[get("/teacher")]
pub async fn view_dashboard(client: ClientCtx, session: Session) -> Result<HttpResponse, Error> {
    let profile = client.require_role(&session, Role::Teacher)?;

    let topics = content::topics_for_teacher(get_db_pool(), profile.id)
        .await
        .map_err(|e| {
            log::error!("failed to fetch topics for teacher {}: {}", profile.id, e);
            error::ErrorInternalServerError("Database error")
        })?
        .into_iter()
        .map(|topic| TopicRow {
            topic_id: topic.topic_id,
            title: topic.title,
            description: topic.description,
            uploaded: topic.upload_date.format("%Y-%m-%d %H:%M").to_string(),
        })
        .collect();

    Ok(DashboardTemplate {
        client,
        flash: take_flash(&session),
        topics,
    }
    .to_response())
}

// ============================================================================
// Topic upload
// ============================================================================

pub struct FilePart {
    pub filename: String,
    pub data: Vec<u8>,
    /// The upload exceeded its size cap; the data was discarded.
    pub truncated: bool,
}

#[derive(Default)]
pub struct UploadFields {
    pub title: String,
    pub description: String,
    pub video_url: String,
    pub video_file: Option<FilePart>,
    pub pdf_file: Option<FilePart>,
}

/// Lowercased extension after the final dot, if any.
fn file_extension(filename: &str) -> Option<String> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// Every violated upload rule. Empty means the form is acceptable.
pub fn validate_upload(fields: &UploadFields) -> Vec<String> {
    let mut errors = Vec::new();

    if fields.title.trim().is_empty() {
        errors.push("Topic title is required.".to_owned());
    }
    if fields.description.trim().is_empty() {
        errors.push("Topic description is required.".to_owned());
    }

    match &fields.pdf_file {
        None => errors.push("PDF notes are required.".to_owned()),
        Some(pdf) => {
            match file_extension(&pdf.filename) {
                Some(ext) if ext == "pdf" => {}
                Some(ext) => errors.push(format!(
                    "Only PDF files are allowed for notes. Detected: .{}",
                    ext
                )),
                None => errors.push("Only PDF files are allowed for notes.".to_owned()),
            }
            if pdf.truncated {
                errors.push("PDF file size exceeds the 50MB limit.".to_owned());
            }
        }
    }

    // An explicit URL wins over an uploaded file, so the file is only
    // checked when it is the source that would be kept.
    if fields.video_url.trim().is_empty() {
        match &fields.video_file {
            None => errors.push("Please provide a video URL or upload a video file.".to_owned()),
            Some(video) => {
                match file_extension(&video.filename) {
                    Some(ext) if ALLOWED_VIDEO_EXTENSIONS.contains(&ext.as_str()) => {}
                    Some(ext) => errors.push(format!(
                        "Only MP4, WebM, or Ogg video files are allowed. Detected: .{}",
                        ext
                    )),
                    None => {
                        errors.push("Only MP4, WebM, or Ogg video files are allowed.".to_owned())
                    }
                }
                if video.truncated {
                    errors.push("Video file size exceeds the 500MB limit.".to_owned());
                }
            }
        }
    }

    errors
}

#[derive(Template)]
#[template(path = "teacher/upload_topic.html")]
struct UploadTopicTemplate {
    client: ClientCtx,
    flash: Option<Flash>,
    errors: Vec<String>,
    title: String,
    description: String,
    video_url: String,
}

fn upload_form_response(
    client: ClientCtx,
    session: &Session,
    errors: Vec<String>,
    title: String,
    description: String,
    video_url: String,
) -> HttpResponse {
    UploadTopicTemplate {
        client,
        flash: take_flash(session),
        errors,
        title,
        description,
        video_url,
    }
    .to_response()
}

/// GET /teacher/topics/upload - the upload form.
#[get("/teacher/topics/upload")]
pub async fn view_upload_topic(client: ClientCtx, session: Session) -> Result<HttpResponse, Error> {
    client.require_role(&session, Role::Teacher)?;

    Ok(upload_form_response(
        client,
        &session,
        Vec::new(),
        String::new(),
        String::new(),
        String::new(),
    ))
}

async fn read_text_field(field: &mut Field) -> Result<String, Error> {
    let mut buf: Vec<u8> = Vec::with_capacity(256);
    while let Some(chunk) = field.next().await {
        let bytes = chunk.map_err(|e| {
            log::error!("upload_topic: multipart read error: {}", e);
            error::ErrorBadRequest("Error interpreting user input.")
        })?;
        if buf.len() + bytes.len() > MAX_TEXT_FIELD_BYTES {
            return Err(error::ErrorBadRequest("Form field too large."));
        }
        buf.extend_from_slice(&bytes);
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Buffer an uploaded file, capped at `limit` bytes. Oversized uploads are
/// drained (so the parser can reach the next field) but their data is
/// dropped and the part comes back flagged as truncated.
async fn read_file_field(field: &mut Field, limit: usize) -> Result<Option<FilePart>, Error> {
    let filename = field
        .content_disposition()
        .get_filename()
        .map(str::to_owned)
        .unwrap_or_default();

    let mut data: Vec<u8> = Vec::new();
    let mut truncated = false;
    while let Some(chunk) = field.next().await {
        let bytes = chunk.map_err(|e| {
            log::error!("upload_topic: multipart read error: {}", e);
            error::ErrorBadRequest("Error interpreting user input.")
        })?;
        if truncated {
            continue;
        }
        if data.len() + bytes.len() > limit {
            truncated = true;
            data = Vec::new();
            continue;
        }
        data.extend_from_slice(&bytes);
    }

    // A file input left empty still submits a part, with no name and no bytes.
    if filename.is_empty() && data.is_empty() && !truncated {
        return Ok(None);
    }
    Ok(Some(FilePart {
        filename,
        data,
        truncated,
    }))
}

async fn read_upload_form(mut payload: Multipart) -> Result<UploadFields, Error> {
    let mut fields = UploadFields::default();

    while let Ok(Some(mut field)) = payload.try_next().await {
        if let Some(field_name) = field.content_disposition().get_name() {
            match field_name {
                "title" => fields.title = read_text_field(&mut field).await?,
                "description" => fields.description = read_text_field(&mut field).await?,
                "video_url" => fields.video_url = read_text_field(&mut field).await?,
                "video_file" => {
                    fields.video_file = read_file_field(&mut field, MAX_VIDEO_BYTES).await?
                }
                "pdf_file" => fields.pdf_file = read_file_field(&mut field, MAX_PDF_BYTES).await?,
                _ => {
                    return Err(error::ErrorBadRequest(format!(
                        "Unrecognized field '{}'",
                        field_name,
                    )));
                }
            }
        }
    }

    Ok(fields)
}

/// POST /teacher/topics/upload - validate, place files, insert the row.
///
/// Files are written before the insert; if the insert then fails they are
/// unlinked again so no media outlives a row that never landed.
#[post("/teacher/topics/upload")]
pub async fn post_upload_topic(
    client: ClientCtx,
    session: Session,
    payload: Multipart,
) -> Result<HttpResponse, Error> {
    let profile = client.require_role(&session, Role::Teacher)?;

    let fields = read_upload_form(payload).await?;
    let errors = validate_upload(&fields);
    if !errors.is_empty() {
        return Ok(upload_form_response(
            client,
            &session,
            errors,
            fields.title,
            fields.description,
            fields.video_url,
        ));
    }

    let UploadFields {
        title,
        description,
        video_url,
        video_file,
        pdf_file,
    } = fields;
    let title = title.trim().to_owned();
    let description = description.trim().to_owned();
    let video_url = video_url.trim().to_owned();

    // Guarded by validate_upload above.
    let pdf = match pdf_file {
        Some(pdf) => pdf,
        None => return Err(error::ErrorBadRequest("PDF notes are required.")),
    };

    let pdf_extension = file_extension(&pdf.filename).unwrap_or_default();
    let pdf_path = match filesystem::store_pdf(pdf.data, &pdf_extension).await {
        Ok(path) => path,
        Err(e) => {
            log::error!("PDF upload failed: {}", e);
            set_flash(
                &session,
                "Failed to store the PDF file. Please try again.",
                Severity::Danger,
            );
            return Ok(upload_form_response(
                client,
                &session,
                Vec::new(),
                title,
                description,
                video_url,
            ));
        }
    };

    let video_reference = if video_url.is_empty() {
        let video = match video_file {
            Some(video) => video,
            None => {
                return Err(error::ErrorBadRequest(
                    "Please provide a video URL or upload a video file.",
                ))
            }
        };
        let extension = file_extension(&video.filename).unwrap_or_default();
        match filesystem::store_video(video.data, &extension).await {
            Ok(path) => path,
            Err(e) => {
                log::error!("Video upload failed: {}", e);
                filesystem::remove_media(&pdf_path).await;
                set_flash(
                    &session,
                    "Failed to store the video file. Please try again.",
                    Severity::Danger,
                );
                return Ok(upload_form_response(
                    client,
                    &session,
                    Vec::new(),
                    title,
                    description,
                    video_url,
                ));
            }
        }
    } else {
        video_url.clone()
    };

    match content::create_topic(
        get_db_pool(),
        profile.id,
        &title,
        &description,
        &video_reference,
        &pdf_path,
    )
    .await
    {
        Ok(topic) => {
            log::info!(
                "topic uploaded: '{}' (topic_id: {}, teacher_id: {})",
                topic.title,
                topic.topic_id,
                profile.id
            );
            set_flash(&session, "Topic uploaded successfully!", Severity::Success);
            Ok(super::redirect("/teacher"))
        }
        Err(e) => {
            log::error!("Topic upload failed for teacher_id {}: {}", profile.id, e);
            filesystem::remove_media(&pdf_path).await;
            if video_reference.starts_with(filesystem::VIDEO_DIR) {
                filesystem::remove_media(&video_reference).await;
            }
            set_flash(
                &session,
                "Failed to upload topic to database. Please try again.",
                Severity::Danger,
            );
            Ok(upload_form_response(
                client,
                &session,
                Vec::new(),
                title,
                description,
                video_url,
            ))
        }
    }
}

// ============================================================================
// Topic details & replies
// ============================================================================

struct QuestionRow {
    question_id: i32,
    student_name: String,
    question_text: String,
    reply_text: Option<String>,
    asked: String,
}

#[derive(Template)]
#[template(path = "teacher/topic_details.html")]
struct TopicDetailsTemplate {
    client: ClientCtx,
    flash: Option<Flash>,
    topic_id: i32,
    title: String,
    description: String,
    teacher_name: String,
    uploaded: String,
    video: VideoView,
    pdf_path: String,
    pdf_available: bool,
    questions: Vec<QuestionRow>,
}

/// GET /teacher/topics/{id} - details and Q&A for one owned topic.
#[get("/teacher/topics/{id}")]
pub async fn view_topic_details(
    client: ClientCtx,
    session: Session,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    let profile = client.require_role(&session, Role::Teacher)?;
    let topic_id = path.into_inner();
    let db = get_db_pool();

    let found = content::topic_with_teacher(db, topic_id).await.map_err(|e| {
        log::error!("failed to fetch topic {}: {}", topic_id, e);
        error::ErrorInternalServerError("Database error")
    })?;

    let (topic, teacher) = match found {
        Some(pair) => pair,
        None => {
            set_flash(
                &session,
                "Topic not found or you do not have access.",
                Severity::Danger,
            );
            return Ok(super::redirect("/teacher"));
        }
    };

    if topic.teacher_id != profile.id && profile.role != Role::Admin {
        set_flash(
            &session,
            "You do not have permission to view this topic.",
            Severity::Danger,
        );
        return Ok(super::redirect("/teacher"));
    }

    let questions = content::questions_for_topic(db, topic_id, true)
        .await
        .map_err(|e| {
            log::error!("failed to fetch questions for topic {}: {}", topic_id, e);
            error::ErrorInternalServerError("Database error")
        })?
        .into_iter()
        .map(|(question, student)| QuestionRow {
            question_id: question.question_id,
            student_name: student
                .map(|s| s.name)
                .unwrap_or_else(|| format!("User #{}", question.student_id)),
            question_text: question.question_text,
            reply_text: question.reply_text.filter(|reply| !reply.is_empty()),
            asked: question.timestamp.format("%Y-%m-%d %H:%M").to_string(),
        })
        .collect();

    Ok(TopicDetailsTemplate {
        client,
        flash: take_flash(&session),
        topic_id: topic.topic_id,
        title: topic.title,
        description: topic.description,
        teacher_name: teacher
            .map(|t| t.name)
            .unwrap_or_else(|| format!("User #{}", topic.teacher_id)),
        uploaded: topic.upload_date.format("%Y-%m-%d %H:%M").to_string(),
        video: video::view_for(&topic.video_url),
        pdf_available: filesystem::media_exists(&topic.pdf_path),
        pdf_path: topic.pdf_path,
        questions,
    }
    .to_response())
}

#[derive(Deserialize)]
pub struct ReplyForm {
    question_id: String,
    reply_text: String,
}

/// POST /teacher/topics/{id}/reply - set or overwrite a reply on one of the
/// topic's questions.
#[post("/teacher/topics/{id}/reply")]
pub async fn post_reply(
    client: ClientCtx,
    session: Session,
    path: web::Path<i32>,
    form: web::Form<ReplyForm>,
) -> Result<HttpResponse, Error> {
    let profile = client.require_role(&session, Role::Teacher)?;
    let topic_id = path.into_inner();
    let db = get_db_pool();
    let back = format!("/teacher/topics/{}", topic_id);

    let found = content::topic_with_teacher(db, topic_id).await.map_err(|e| {
        log::error!("failed to fetch topic {}: {}", topic_id, e);
        error::ErrorInternalServerError("Database error")
    })?;

    let topic = match found {
        Some((topic, _)) => topic,
        None => {
            set_flash(&session, "Topic not found.", Severity::Danger);
            return Ok(super::redirect("/teacher"));
        }
    };

    if topic.teacher_id != profile.id && profile.role != Role::Admin {
        set_flash(
            &session,
            "You do not have permission to reply on this topic.",
            Severity::Danger,
        );
        return Ok(super::redirect("/teacher"));
    }

    let reply_text = form.reply_text.trim();
    if reply_text.is_empty() {
        set_flash(&session, "Reply cannot be empty.", Severity::Danger);
        return Ok(super::redirect(&back));
    }

    let question_id = match form.question_id.parse::<i32>() {
        Ok(id) => id,
        Err(_) => {
            set_flash(&session, "Invalid question ID for reply.", Severity::Danger);
            return Ok(super::redirect(&back));
        }
    };

    match content::submit_reply(db, question_id, topic_id, reply_text).await {
        Ok(Reply::Updated) => {
            set_flash(&session, "Reply submitted successfully!", Severity::Success)
        }
        Ok(Reply::NotFound) => set_flash(
            &session,
            "Question not found on this topic.",
            Severity::Warning,
        ),
        Err(e) => {
            log::error!("Teacher reply failed for q_id {}: {}", question_id, e);
            set_flash(
                &session,
                "Failed to submit reply. Please try again.",
                Severity::Danger,
            );
        }
    }

    Ok(super::redirect(&back))
}

/// GET /teacher/topics/{id}/delete - cascading delete of an owned topic.
#[get("/teacher/topics/{id}/delete")]
pub async fn delete_topic(
    client: ClientCtx,
    session: Session,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    let profile = client.require_role(&session, Role::Teacher)?;
    let topic_id = path.into_inner();
    let db = get_db_pool();

    let found = content::topic_with_teacher(db, topic_id).await.map_err(|e| {
        log::error!("failed to fetch topic {}: {}", topic_id, e);
        error::ErrorInternalServerError("Database error")
    })?;

    match found {
        None => set_flash(&session, "Topic not found.", Severity::Warning),
        Some((topic, _)) if topic.teacher_id != profile.id && profile.role != Role::Admin => {
            set_flash(
                &session,
                "You do not have permission to delete this topic.",
                Severity::Danger,
            );
        }
        Some(_) => match content::delete_topic(db, topic_id).await {
            Ok(TopicDeletion::Deleted { media }) => {
                for path in &media {
                    filesystem::remove_media(path).await;
                }
                set_flash(
                    &session,
                    "Topic and associated files/questions deleted successfully!",
                    Severity::Success,
                );
            }
            Ok(TopicDeletion::NotFound) => {
                set_flash(&session, "Topic not found.", Severity::Warning)
            }
            Err(e) => {
                log::error!("Topic deletion failed: {}", e);
                set_flash(
                    &session,
                    "Error deleting topic. Please try again.",
                    Severity::Danger,
                );
            }
        },
    }

    Ok(super::redirect("/teacher"))
}
