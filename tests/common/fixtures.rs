//! Test fixtures for creating test data
#![allow(dead_code)]

use chrono::Utc;
use lectern::orm::users::Role;
use lectern::orm::{questions, topics, users};
use sea_orm::{entity::*, ActiveValue::Set, DatabaseConnection, DbErr};

/// Create a user with known credentials. The password is hashed with the
/// same argon2 instance the login path verifies against.
pub async fn create_test_user(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
    role: Role,
    password: &str,
) -> Result<users::Model, DbErr> {
    let password_hash = lectern::session::hash_password(password)
        .map_err(|e| DbErr::Custom(format!("Password hashing failed: {}", e)))?;

    users::ActiveModel {
        name: Set(name.to_owned()),
        email: Set(email.to_owned()),
        password_hash: Set(password_hash),
        role: Set(role),
        registration_date: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Create a topic with an external video and a PDF path in storage layout.
pub async fn create_test_topic(
    db: &DatabaseConnection,
    teacher_id: i32,
    title: &str,
) -> Result<topics::Model, DbErr> {
    topics::ActiveModel {
        teacher_id: Set(teacher_id),
        title: Set(title.to_owned()),
        description: Set(format!("Notes and lecture for {}", title)),
        video_url: Set("https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_owned()),
        pdf_path: Set(format!(
            "uploads/pdf/{}",
            lectern::filesystem::unique_media_name("pdf", "pdf")
        )),
        upload_date: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Create a topic whose video is a locally uploaded file.
pub async fn create_test_topic_with_local_video(
    db: &DatabaseConnection,
    teacher_id: i32,
    title: &str,
) -> Result<topics::Model, DbErr> {
    topics::ActiveModel {
        teacher_id: Set(teacher_id),
        title: Set(title.to_owned()),
        description: Set(format!("Notes and lecture for {}", title)),
        video_url: Set(format!(
            "uploads/videos/{}",
            lectern::filesystem::unique_media_name("video", "mp4")
        )),
        pdf_path: Set(format!(
            "uploads/pdf/{}",
            lectern::filesystem::unique_media_name("pdf", "pdf")
        )),
        upload_date: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Create an unanswered question.
pub async fn create_test_question(
    db: &DatabaseConnection,
    topic_id: i32,
    student_id: i32,
    question_text: &str,
) -> Result<questions::Model, DbErr> {
    questions::ActiveModel {
        topic_id: Set(topic_id),
        student_id: Set(student_id),
        question_text: Set(question_text.to_owned()),
        reply_text: Set(None),
        timestamp: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}
