//! Administration tools
//!
//! This module provides the admin dashboard and the three management pages
//! (users, topics, questions). Every mutation is admin-gated; the integrity
//! rules themselves (self-deletion, last admin, cascade order) live in
//! `crate::content` so they hold for any caller.

use crate::content::{self, QuestionDeletion, Reply, RoleChange, TopicDeletion, UserDeletion};
use crate::db::get_db_pool;
use crate::filesystem;
use crate::flash::{set_flash, take_flash, Flash, Severity};
use crate::middleware::ClientCtx;
use crate::orm::users::{self, Role};
use actix_session::Session;
use actix_web::{error, get, post, web, Error, HttpResponse};
use askama::Template;
use askama_actix::TemplateToResponse;
use sea_orm::{entity::*, query::*};
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_dashboard)
        // User management
        .service(view_users)
        .service(delete_user)
        .service(update_role)
        // Topic management
        .service(view_topics)
        .service(delete_topic)
        // Question management
        .service(view_questions)
        .service(post_reply)
        .service(delete_question);
}

// ============================================================================
// Dashboard
// ============================================================================

#[derive(Template)]
#[template(path = "admin/dashboard.html")]
struct DashboardTemplate {
    client: ClientCtx,
    flash: Option<Flash>,
    stats: content::DashboardStats,
}

/// GET /admin - portal-wide counters.
#[get("/admin")]
pub async fn view_dashboard(client: ClientCtx, session: Session) -> Result<HttpResponse, Error> {
    client.require_role(&session, Role::Admin)?;

    let stats = content::dashboard_stats(get_db_pool()).await.map_err(|e| {
        log::error!("failed to gather dashboard stats: {}", e);
        error::ErrorInternalServerError("Database error")
    })?;

    Ok(DashboardTemplate {
        client,
        flash: take_flash(&session),
        stats,
    }
    .to_response())
}

// ============================================================================
// User management
// ============================================================================

struct UserRow {
    user_id: i32,
    name: String,
    email: String,
    role_str: &'static str,
    registered: String,
    is_self: bool,
}

#[derive(Template)]
#[template(path = "admin/users.html")]
struct UsersTemplate {
    client: ClientCtx,
    flash: Option<Flash>,
    users: Vec<UserRow>,
}

/// GET /admin/users - list all users, newest registrations first.
#[get("/admin/users")]
pub async fn view_users(client: ClientCtx, session: Session) -> Result<HttpResponse, Error> {
    let profile = client.require_role(&session, Role::Admin)?;

    let users = content::all_users(get_db_pool())
        .await
        .map_err(|e| {
            log::error!("failed to fetch users: {}", e);
            error::ErrorInternalServerError("Database error")
        })?
        .into_iter()
        .map(|user| UserRow {
            user_id: user.user_id,
            name: user.name,
            email: user.email,
            role_str: user.role.as_str(),
            registered: user.registration_date.format("%Y-%m-%d").to_string(),
            is_self: user.user_id == profile.id,
        })
        .collect();

    Ok(UsersTemplate {
        client,
        flash: take_flash(&session),
        users,
    }
    .to_response())
}

/// GET /admin/users/{id}/delete - delete a user and everything they own.
#[get("/admin/users/{id}/delete")]
pub async fn delete_user(
    client: ClientCtx,
    session: Session,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    let profile = client.require_role(&session, Role::Admin)?;
    let target_id = path.into_inner();

    match content::delete_user(get_db_pool(), target_id, profile.id).await {
        Ok(UserDeletion::Deleted { media }) => {
            for path in &media {
                filesystem::remove_media(path).await;
            }
            log::info!("user {} deleted by admin {}", target_id, profile.id);
            set_flash(&session, "User deleted successfully!", Severity::Success);
        }
        Ok(UserDeletion::SelfDeletion) => set_flash(
            &session,
            "You cannot delete your own account.",
            Severity::Danger,
        ),
        Ok(UserDeletion::LastAdmin) => set_flash(
            &session,
            "Cannot delete the last administrator account.",
            Severity::Danger,
        ),
        Ok(UserDeletion::NotFound) => set_flash(&session, "User not found.", Severity::Warning),
        Err(e) => {
            log::error!("User deletion failed: {}", e);
            set_flash(
                &session,
                "Error deleting user. Please try again.",
                Severity::Danger,
            );
        }
    }

    Ok(super::redirect("/admin/users"))
}

#[derive(Deserialize)]
pub struct RoleForm {
    user_id: String,
    new_role: String,
}

/// POST /admin/users/role - change a user's role.
#[post("/admin/users/role")]
pub async fn update_role(
    client: ClientCtx,
    session: Session,
    form: web::Form<RoleForm>,
) -> Result<HttpResponse, Error> {
    let profile = client.require_role(&session, Role::Admin)?;

    let parsed = (form.user_id.parse::<i32>().ok(), Role::parse(&form.new_role));
    let (target_id, new_role) = match parsed {
        (Some(id), Some(role)) => (id, role),
        _ => {
            set_flash(&session, "Invalid user ID or role.", Severity::Danger);
            return Ok(super::redirect("/admin/users"));
        }
    };

    match content::change_role(get_db_pool(), target_id, new_role, profile.id).await {
        Ok(RoleChange::Updated) => {
            log::info!(
                "role of user {} set to {} by admin {}",
                target_id,
                new_role.as_str(),
                profile.id
            );
            set_flash(
                &session,
                "User role updated successfully!",
                Severity::Success,
            );
        }
        Ok(RoleChange::AlreadyAdmin) => {
            set_flash(&session, "Your role is already Admin.", Severity::Info)
        }
        Ok(RoleChange::LastAdmin) => set_flash(
            &session,
            "Cannot demote the last administrator account.",
            Severity::Danger,
        ),
        Ok(RoleChange::NotFound) => set_flash(&session, "User not found.", Severity::Warning),
        Err(e) => {
            log::error!("User role update failed for user_id {}: {}", target_id, e);
            set_flash(
                &session,
                "Failed to update user role. Please try again.",
                Severity::Danger,
            );
        }
    }

    Ok(super::redirect("/admin/users"))
}

// ============================================================================
// Topic management
// ============================================================================

struct TopicRow {
    topic_id: i32,
    title: String,
    teacher_name: String,
    uploaded: String,
}

#[derive(Template)]
#[template(path = "admin/topics.html")]
struct TopicsTemplate {
    client: ClientCtx,
    flash: Option<Flash>,
    topics: Vec<TopicRow>,
}

/// GET /admin/topics - list all topics with their teachers.
#[get("/admin/topics")]
pub async fn view_topics(client: ClientCtx, session: Session) -> Result<HttpResponse, Error> {
    client.require_role(&session, Role::Admin)?;

    let topics = content::all_topics_with_teachers(get_db_pool())
        .await
        .map_err(|e| {
            log::error!("failed to fetch topics: {}", e);
            error::ErrorInternalServerError("Database error")
        })?
        .into_iter()
        .map(|(topic, teacher)| TopicRow {
            topic_id: topic.topic_id,
            title: topic.title,
            teacher_name: teacher
                .map(|t| t.name)
                .unwrap_or_else(|| format!("User #{}", topic.teacher_id)),
            uploaded: topic.upload_date.format("%Y-%m-%d %H:%M").to_string(),
        })
        .collect();

    Ok(TopicsTemplate {
        client,
        flash: take_flash(&session),
        topics,
    }
    .to_response())
}

/// GET /admin/topics/{id}/delete - cascading delete of any topic.
#[get("/admin/topics/{id}/delete")]
pub async fn delete_topic(
    client: ClientCtx,
    session: Session,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    client.require_role(&session, Role::Admin)?;
    let topic_id = path.into_inner();

    match content::delete_topic(get_db_pool(), topic_id).await {
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
        Ok(TopicDeletion::NotFound) => set_flash(&session, "Topic not found.", Severity::Warning),
        Err(e) => {
            log::error!("Topic deletion failed: {}", e);
            set_flash(
                &session,
                "Error deleting topic. Please try again.",
                Severity::Danger,
            );
        }
    }

    Ok(super::redirect("/admin/topics"))
}

// ============================================================================
// Question management
// ============================================================================

struct QuestionRow {
    question_id: i32,
    topic_id: i32,
    topic_title: String,
    student_name: String,
    teacher_name: String,
    question_text: String,
    reply_text: Option<String>,
    asked: String,
}

#[derive(Template)]
#[template(path = "admin/questions.html")]
struct QuestionsTemplate {
    client: ClientCtx,
    flash: Option<Flash>,
    questions: Vec<QuestionRow>,
}

/// GET /admin/questions - every question with topic and author context,
/// answered or not.
#[get("/admin/questions")]
pub async fn view_questions(client: ClientCtx, session: Session) -> Result<HttpResponse, Error> {
    client.require_role(&session, Role::Admin)?;
    let db = get_db_pool();

    let rows = content::all_questions_with_topics(db).await.map_err(|e| {
        log::error!("failed to fetch questions: {}", e);
        error::ErrorInternalServerError("Database error")
    })?;

    let mut questions = Vec::with_capacity(rows.len());
    for (question, topic) in rows {
        let student_name = users::Entity::find_by_id(question.student_id)
            .one(db)
            .await
            .ok()
            .flatten()
            .map(|user| user.name)
            .unwrap_or_else(|| format!("User #{}", question.student_id));

        let (topic_id, topic_title, teacher_name) = match topic {
            Some(topic) => {
                let teacher_name = users::Entity::find_by_id(topic.teacher_id)
                    .one(db)
                    .await
                    .ok()
                    .flatten()
                    .map(|user| user.name)
                    .unwrap_or_else(|| format!("User #{}", topic.teacher_id));
                (topic.topic_id, topic.title, teacher_name)
            }
            None => (
                question.topic_id,
                format!("Topic #{}", question.topic_id),
                String::new(),
            ),
        };

        questions.push(QuestionRow {
            question_id: question.question_id,
            topic_id,
            topic_title,
            student_name,
            teacher_name,
            question_text: question.question_text,
            reply_text: question.reply_text.filter(|reply| !reply.is_empty()),
            asked: question.timestamp.format("%Y-%m-%d %H:%M").to_string(),
        });
    }

    Ok(QuestionsTemplate {
        client,
        flash: take_flash(&session),
        questions,
    }
    .to_response())
}

#[derive(Deserialize)]
pub struct AdminReplyForm {
    question_id: String,
    topic_id: String,
    reply_text: String,
}

/// POST /admin/questions/reply - reply to (or overwrite the reply of) any
/// question.
#[post("/admin/questions/reply")]
pub async fn post_reply(
    client: ClientCtx,
    session: Session,
    form: web::Form<AdminReplyForm>,
) -> Result<HttpResponse, Error> {
    client.require_role(&session, Role::Admin)?;

    let reply_text = form.reply_text.trim();
    let ids = (
        form.question_id.parse::<i32>().ok(),
        form.topic_id.parse::<i32>().ok(),
    );

    if reply_text.is_empty() {
        set_flash(&session, "Reply cannot be empty.", Severity::Danger);
        return Ok(super::redirect("/admin/questions"));
    }

    let (question_id, topic_id) = match ids {
        (Some(question_id), Some(topic_id)) => (question_id, topic_id),
        _ => {
            set_flash(
                &session,
                "Invalid question ID or topic ID for reply.",
                Severity::Danger,
            );
            return Ok(super::redirect("/admin/questions"));
        }
    };

    match content::submit_reply(get_db_pool(), question_id, topic_id, reply_text).await {
        Ok(Reply::Updated) => set_flash(&session, "Reply updated successfully!", Severity::Success),
        Ok(Reply::NotFound) => set_flash(&session, "Question not found.", Severity::Warning),
        Err(e) => {
            log::error!("Admin reply failed for q_id {}: {}", question_id, e);
            set_flash(
                &session,
                "Failed to submit reply. Please try again.",
                Severity::Danger,
            );
        }
    }

    Ok(super::redirect("/admin/questions"))
}

/// GET /admin/questions/{id}/delete - delete any question.
#[get("/admin/questions/{id}/delete")]
pub async fn delete_question(
    client: ClientCtx,
    session: Session,
    path: web::Path<i32>,
) -> Result<HttpResponse, Error> {
    client.require_role(&session, Role::Admin)?;
    let question_id = path.into_inner();

    match content::delete_question(get_db_pool(), question_id).await {
        Ok(QuestionDeletion::Deleted) => {
            set_flash(&session, "Question deleted successfully!", Severity::Success)
        }
        Ok(QuestionDeletion::NotFound) => {
            set_flash(&session, "Question not found.", Severity::Warning)
        }
        Err(e) => {
            log::error!("Question deletion failed: {}", e);
            set_flash(
                &session,
                "Error deleting question. Please try again.",
                Severity::Danger,
            );
        }
    }

    Ok(super::redirect("/admin/questions"))
}
