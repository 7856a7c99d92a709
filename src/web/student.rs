//! Student pages: topic catalogue and the topic view with Q&A.

use crate::content::{self, Ask};
use crate::db::get_db_pool;
use crate::filesystem;
use crate::flash::{set_flash, take_flash, Flash, Severity};
use crate::middleware::ClientCtx;
use crate::orm::users::Role;
use crate::video::{self, VideoView};
use actix_session::Session;
use actix_web::{error, get, post, web, Error, HttpResponse};
use askama::Template;
use askama_actix::TemplateToResponse;
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_dashboard)
        .service(view_topic)
        .service(post_question);
}

// ============================================================================
// Dashboard
// ============================================================================

struct TopicRow {
    topic_id: i32,
    title: String,
    description: String,
    teacher_name: String,
    uploaded: String,
}

#[derive(Template)]
#[template(path = "student/dashboard.html")]
struct DashboardTemplate {
    client: ClientCtx,
    flash: Option<Flash>,
    topics: Vec<TopicRow>,
}

/// GET /student - every published topic, newest first.
#[get("/student")]
pub async fn view_dashboard(client: ClientCtx, session: Session) -> Result<HttpResponse, Error> {
    client.require_role(&session, Role::Student)?;

    let topics = content::all_topics_with_teachers(get_db_pool())
        .await
        .map_err(|e| {
            log::error!("failed to fetch topic catalogue: {}", e);
            error::ErrorInternalServerError("Database error")
        })?
        .into_iter()
        .map(|(topic, teacher)| TopicRow {
            topic_id: topic.topic_id,
            title: topic.title,
            description: topic.description,
            teacher_name: teacher
                .map(|t| t.name)
                .unwrap_or_else(|| format!("User #{}", topic.teacher_id)),
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
// Topic view & questions
// ============================================================================

struct QuestionRow {
    student_name: String,
    question_text: String,
    reply_text: Option<String>,
    asked: String,
}

#[derive(Template)]
#[template(path = "student/view_topic.html")]
struct ViewTopicTemplate {
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

/// GET /student/topics/{id} - lecture video, PDF notes and the Q&A thread.
#[get("/student/topics/{id}")]
pub async fn view_topic(
    client: ClientCtx,
    session: Session,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    client.require_role(&session, Role::Student)?;
    let topic_id = path.into_inner();
    let db = get_db_pool();

    let found = content::topic_with_teacher(db, topic_id).await.map_err(|e| {
        log::error!("failed to fetch topic {}: {}", topic_id, e);
        error::ErrorInternalServerError("Database error")
    })?;

    let (topic, teacher) = match found {
        Some(pair) => pair,
        None => {
            set_flash(&session, "Topic not found.", Severity::Danger);
            return Ok(super::redirect("/student"));
        }
    };

    // Older questions first, so the thread reads top to bottom.
    let questions = content::questions_for_topic(db, topic_id, false)
        .await
        .map_err(|e| {
            log::error!("failed to fetch questions for topic {}: {}", topic_id, e);
            error::ErrorInternalServerError("Database error")
        })?
        .into_iter()
        .map(|(question, student)| QuestionRow {
            student_name: student
                .map(|s| s.name)
                .unwrap_or_else(|| format!("User #{}", question.student_id)),
            question_text: question.question_text,
            reply_text: question.reply_text.filter(|reply| !reply.is_empty()),
            asked: question.timestamp.format("%Y-%m-%d %H:%M").to_string(),
        })
        .collect();

    Ok(ViewTopicTemplate {
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
pub struct QuestionForm {
    question_text: String,
}

/// POST /student/topics/{id}/questions - ask a question on a topic.
#[post("/student/topics/{id}/questions")]
pub async fn post_question(
    client: ClientCtx,
    session: Session,
    path: web::Path<i32>,
    form: web::Form<QuestionForm>,
) -> Result<HttpResponse, Error> {
    let profile = client.require_role(&session, Role::Student)?;
    let topic_id = path.into_inner();
    let back = format!("/student/topics/{}", topic_id);

    let question_text = form.question_text.trim();
    if question_text.is_empty() {
        set_flash(&session, "Question cannot be empty.", Severity::Danger);
        return Ok(super::redirect(&back));
    }

    match content::ask_question(get_db_pool(), topic_id, profile.id, question_text).await {
        Ok(Ask::Created(_)) => {
            set_flash(
                &session,
                "Your question has been submitted!",
                Severity::Success,
            );
            Ok(super::redirect(&back))
        }
        Ok(Ask::TopicMissing) => {
            set_flash(&session, "Topic not found.", Severity::Danger);
            Ok(super::redirect("/student"))
        }
        Err(e) => {
            log::error!(
                "Question submission failed for student_id {}: {}",
                profile.id,
                e
            );
            set_flash(
                &session,
                "Failed to submit question. Please try again.",
                Severity::Danger,
            );
            Ok(super::redirect(&back))
        }
    }
}
