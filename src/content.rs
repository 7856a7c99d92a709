//! Persistence operations behind the page handlers.
//!
//! Handlers validate input and map these typed outcomes to notices; the
//! business rules live here and run before any mutation. Referential
//! integrity is procedural — the schema carries no ON DELETE CASCADE — so
//! every cascading delete lists its dependent statements explicitly and
//! runs them in one transaction. Media files are only unlinked by the
//! caller after the parent row delete affected at least one row.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    entity::*, query::*, ActiveValue::Set, DatabaseConnection, DbErr, TransactionTrait,
};

use crate::filesystem;
use crate::orm::users::Role;
use crate::orm::{questions, topics, users};

/// Outcome of an account-creation attempt.
pub enum Registration {
    Created(users::Model),
    EmailTaken,
}

pub async fn create_account(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
    password_hash: &str,
    role: Role,
) -> Result<Registration, DbErr> {
    let existing = users::Entity::find()
        .filter(users::Column::Email.eq(email))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(Registration::EmailTaken);
    }

    let user = users::ActiveModel {
        name: Set(name.to_owned()),
        email: Set(email.to_owned()),
        password_hash: Set(password_hash.to_owned()),
        role: Set(role),
        registration_date: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(Registration::Created(user))
}

pub async fn find_by_email(
    db: &DatabaseConnection,
    email: &str,
) -> Result<Option<users::Model>, DbErr> {
    users::Entity::find()
        .filter(users::Column::Email.eq(email))
        .one(db)
        .await
}

pub async fn count_admins(db: &DatabaseConnection) -> Result<usize, DbErr> {
    users::Entity::find()
        .filter(users::Column::Role.eq(Role::Admin))
        .count(db)
        .await
}

pub async fn all_users(db: &DatabaseConnection) -> Result<Vec<users::Model>, DbErr> {
    users::Entity::find()
        .order_by_desc(users::Column::RegistrationDate)
        .all(db)
        .await
}

/// Outcome of an admin deleting a user account.
pub enum UserDeletion {
    /// Account and dependent content removed; these media files back
    /// nothing anymore and should be unlinked.
    Deleted { media: Vec<String> },
    NotFound,
    SelfDeletion,
    LastAdmin,
}

/// Delete a user and, first, everything that references them: a teacher's
/// topics (with each topic's questions and media), a student's questions.
pub async fn delete_user(
    db: &DatabaseConnection,
    target_id: i32,
    acting_id: i32,
) -> Result<UserDeletion, DbErr> {
    if target_id == acting_id {
        return Ok(UserDeletion::SelfDeletion);
    }

    let target = match users::Entity::find_by_id(target_id).one(db).await? {
        Some(user) => user,
        None => return Ok(UserDeletion::NotFound),
    };

    if target.role == Role::Admin && count_admins(db).await? <= 1 {
        return Ok(UserDeletion::LastAdmin);
    }

    let txn = db.begin().await?;

    let owned_topics = topics::Entity::find()
        .filter(topics::Column::TeacherId.eq(target_id))
        .all(&txn)
        .await?;

    let mut media = Vec::new();
    for topic in &owned_topics {
        questions::Entity::delete_many()
            .filter(questions::Column::TopicId.eq(topic.topic_id))
            .exec(&txn)
            .await?;
        collect_topic_media(topic, &mut media);
    }

    topics::Entity::delete_many()
        .filter(topics::Column::TeacherId.eq(target_id))
        .exec(&txn)
        .await?;

    questions::Entity::delete_many()
        .filter(questions::Column::StudentId.eq(target_id))
        .exec(&txn)
        .await?;

    let result = users::Entity::delete_many()
        .filter(users::Column::UserId.eq(target_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    if result.rows_affected == 0 {
        Ok(UserDeletion::NotFound)
    } else {
        Ok(UserDeletion::Deleted { media })
    }
}

/// Outcome of an admin changing a user's role.
pub enum RoleChange {
    Updated,
    /// The acting admin re-selected admin for themselves.
    AlreadyAdmin,
    /// Would leave the portal without any administrator.
    LastAdmin,
    NotFound,
}

pub async fn change_role(
    db: &DatabaseConnection,
    target_id: i32,
    new_role: Role,
    acting_id: i32,
) -> Result<RoleChange, DbErr> {
    let target = match users::Entity::find_by_id(target_id).one(db).await? {
        Some(user) => user,
        None => return Ok(RoleChange::NotFound),
    };

    if target_id == acting_id && target.role == Role::Admin && new_role == Role::Admin {
        return Ok(RoleChange::AlreadyAdmin);
    }

    if target.role == Role::Admin && new_role != Role::Admin && count_admins(db).await? <= 1 {
        return Ok(RoleChange::LastAdmin);
    }

    let mut active: users::ActiveModel = target.into();
    active.role = Set(new_role);
    active.update(db).await?;

    Ok(RoleChange::Updated)
}

pub async fn create_topic(
    db: &DatabaseConnection,
    teacher_id: i32,
    title: &str,
    description: &str,
    video_url: &str,
    pdf_path: &str,
) -> Result<topics::Model, DbErr> {
    topics::ActiveModel {
        teacher_id: Set(teacher_id),
        title: Set(title.to_owned()),
        description: Set(description.to_owned()),
        video_url: Set(video_url.to_owned()),
        pdf_path: Set(pdf_path.to_owned()),
        upload_date: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn topics_for_teacher(
    db: &DatabaseConnection,
    teacher_id: i32,
) -> Result<Vec<topics::Model>, DbErr> {
    topics::Entity::find()
        .filter(topics::Column::TeacherId.eq(teacher_id))
        .order_by_desc(topics::Column::UploadDate)
        .all(db)
        .await
}

pub async fn all_topics_with_teachers(
    db: &DatabaseConnection,
) -> Result<Vec<(topics::Model, Option<users::Model>)>, DbErr> {
    topics::Entity::find()
        .find_also_related(users::Entity)
        .order_by_desc(topics::Column::UploadDate)
        .all(db)
        .await
}

pub async fn topic_with_teacher(
    db: &DatabaseConnection,
    topic_id: i32,
) -> Result<Option<(topics::Model, Option<users::Model>)>, DbErr> {
    topics::Entity::find()
        .filter(topics::Column::TopicId.eq(topic_id))
        .find_also_related(users::Entity)
        .one(db)
        .await
}

/// Outcome of deleting a topic.
pub enum TopicDeletion {
    /// Questions and the topic row are gone; unlink these files next.
    Deleted { media: Vec<String> },
    NotFound,
}

/// Remove a topic: dependent questions first, then the row. The stored
/// media paths are fetched up front but handed to the caller only when the
/// row delete affected something — a stale id must not unlink files.
pub async fn delete_topic(
    db: &DatabaseConnection,
    topic_id: i32,
) -> Result<TopicDeletion, DbErr> {
    let topic = match topics::Entity::find_by_id(topic_id).one(db).await? {
        Some(topic) => topic,
        None => return Ok(TopicDeletion::NotFound),
    };

    let txn = db.begin().await?;

    questions::Entity::delete_many()
        .filter(questions::Column::TopicId.eq(topic_id))
        .exec(&txn)
        .await?;

    let result = topics::Entity::delete_many()
        .filter(topics::Column::TopicId.eq(topic_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    if result.rows_affected == 0 {
        return Ok(TopicDeletion::NotFound);
    }

    let mut media = Vec::new();
    collect_topic_media(&topic, &mut media);
    Ok(TopicDeletion::Deleted { media })
}

/// The on-disk files a topic row references. External video URLs are not
/// files and are skipped.
fn collect_topic_media(topic: &topics::Model, media: &mut Vec<String>) {
    if topic.pdf_path.starts_with(filesystem::PDF_DIR) {
        media.push(topic.pdf_path.clone());
    }
    if topic.video_url.starts_with(filesystem::VIDEO_DIR) {
        media.push(topic.video_url.clone());
    }
}

/// Outcome of a student asking a question.
pub enum Ask {
    Created(questions::Model),
    TopicMissing,
}

pub async fn ask_question(
    db: &DatabaseConnection,
    topic_id: i32,
    student_id: i32,
    question_text: &str,
) -> Result<Ask, DbErr> {
    if topics::Entity::find_by_id(topic_id).one(db).await?.is_none() {
        return Ok(Ask::TopicMissing);
    }

    let question = questions::ActiveModel {
        topic_id: Set(topic_id),
        student_id: Set(student_id),
        question_text: Set(question_text.to_owned()),
        reply_text: Set(None),
        timestamp: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    Ok(Ask::Created(question))
}

pub async fn questions_for_topic(
    db: &DatabaseConnection,
    topic_id: i32,
    newest_first: bool,
) -> Result<Vec<(questions::Model, Option<users::Model>)>, DbErr> {
    let select = questions::Entity::find()
        .filter(questions::Column::TopicId.eq(topic_id))
        .find_also_related(users::Entity);
    let select = if newest_first {
        select.order_by_desc(questions::Column::Timestamp)
    } else {
        select.order_by_asc(questions::Column::Timestamp)
    };
    select.all(db).await
}

pub async fn all_questions_with_topics(
    db: &DatabaseConnection,
) -> Result<Vec<(questions::Model, Option<topics::Model>)>, DbErr> {
    questions::Entity::find()
        .find_also_related(topics::Entity)
        .order_by_desc(questions::Column::Timestamp)
        .all(db)
        .await
}

/// Outcome of a reply submission.
pub enum Reply {
    Updated,
    NotFound,
}

/// Set (or overwrite) the reply on a question. The update is keyed on both
/// the question id and its topic id so a reply can never be attached across
/// topics; resubmission simply overwrites the previous text.
pub async fn submit_reply(
    db: &DatabaseConnection,
    question_id: i32,
    topic_id: i32,
    reply_text: &str,
) -> Result<Reply, DbErr> {
    let result = questions::Entity::update_many()
        .col_expr(
            questions::Column::ReplyText,
            Expr::value(reply_text.to_owned()),
        )
        .filter(questions::Column::QuestionId.eq(question_id))
        .filter(questions::Column::TopicId.eq(topic_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        Ok(Reply::NotFound)
    } else {
        Ok(Reply::Updated)
    }
}

/// Outcome of deleting a single question.
pub enum QuestionDeletion {
    Deleted,
    NotFound,
}

pub async fn delete_question(
    db: &DatabaseConnection,
    question_id: i32,
) -> Result<QuestionDeletion, DbErr> {
    let result = questions::Entity::delete_many()
        .filter(questions::Column::QuestionId.eq(question_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        Ok(QuestionDeletion::NotFound)
    } else {
        Ok(QuestionDeletion::Deleted)
    }
}

/// Counters shown on the admin dashboard.
#[derive(Debug, Default)]
pub struct DashboardStats {
    pub total_users: usize,
    pub total_teachers: usize,
    pub total_students: usize,
    pub total_topics: usize,
    pub total_questions: usize,
    pub unanswered_questions: usize,
}

pub async fn dashboard_stats(db: &DatabaseConnection) -> Result<DashboardStats, DbErr> {
    let total_users = users::Entity::find().count(db).await?;
    let total_teachers = users::Entity::find()
        .filter(users::Column::Role.eq(Role::Teacher))
        .count(db)
        .await?;
    let total_students = users::Entity::find()
        .filter(users::Column::Role.eq(Role::Student))
        .count(db)
        .await?;
    let total_topics = topics::Entity::find().count(db).await?;
    let total_questions = questions::Entity::find().count(db).await?;
    let unanswered_questions = questions::Entity::find()
        .filter(
            questions::Column::ReplyText
                .is_null()
                .or(questions::Column::ReplyText.eq("")),
        )
        .count(db)
        .await?;

    Ok(DashboardStats {
        total_users,
        total_teachers,
        total_students,
        total_topics,
        total_questions,
        unanswered_questions,
    })
}
