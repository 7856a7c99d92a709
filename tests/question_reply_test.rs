/// Integration tests for the question/reply lifecycle: a question starts
/// unanswered, a reply is scoped to the question's own topic, and
/// resubmitting a reply overwrites rather than duplicates.

mod common;
use serial_test::serial;

use common::*;
use lectern::content::{self, Ask, QuestionDeletion, Reply};
use lectern::orm::questions;
use lectern::orm::users::Role;
use sea_orm::EntityTrait;

#[actix_rt::test]
#[serial]
async fn question_lifecycle_from_ask_to_answer() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(db).await.expect("Failed to cleanup");

    let teacher = create_test_user(db, "Ada", "ada@test.com", Role::Teacher, "password123")
        .await
        .expect("Failed to create teacher");
    let student = create_test_user(db, "Sam", "sam@test.com", Role::Student, "password123")
        .await
        .expect("Failed to create student");
    let topic = create_test_topic(db, teacher.user_id, "Closures")
        .await
        .expect("Failed to create topic");

    let asked = content::ask_question(db, topic.topic_id, student.user_id, "What captures what?")
        .await
        .expect("ask_question errored");
    let question = match asked {
        Ask::Created(question) => question,
        Ask::TopicMissing => panic!("existing topic reported missing"),
    };
    assert_eq!(question.reply_text, None);

    // Unanswered until someone replies.
    let stats = content::dashboard_stats(db).await.expect("stats errored");
    assert_eq!(stats.total_questions, 1);
    assert_eq!(stats.unanswered_questions, 1);

    let reply = content::submit_reply(
        db,
        question.question_id,
        topic.topic_id,
        "The closure captures its environment.",
    )
    .await
    .expect("submit_reply errored");
    assert!(matches!(reply, Reply::Updated));

    let stored = questions::Entity::find_by_id(question.question_id)
        .one(db)
        .await
        .expect("lookup failed")
        .expect("question vanished");
    assert_eq!(
        stored.reply_text.as_deref(),
        Some("The closure captures its environment.")
    );

    let stats = content::dashboard_stats(db).await.expect("stats errored");
    assert_eq!(stats.unanswered_questions, 0);

    cleanup_test_data(db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn resubmitting_a_reply_overwrites_the_previous_text() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(db).await.expect("Failed to cleanup");

    let teacher = create_test_user(db, "Ada", "ada@test.com", Role::Teacher, "password123")
        .await
        .expect("Failed to create teacher");
    let student = create_test_user(db, "Sam", "sam@test.com", Role::Student, "password123")
        .await
        .expect("Failed to create student");
    let topic = create_test_topic(db, teacher.user_id, "Borrowing")
        .await
        .expect("Failed to create topic");
    let question = create_test_question(db, topic.topic_id, student.user_id, "Why one &mut?")
        .await
        .expect("Failed to create question");

    for text in ["First answer.", "Second, better answer."] {
        let reply = content::submit_reply(db, question.question_id, topic.topic_id, text)
            .await
            .expect("submit_reply errored");
        assert!(matches!(reply, Reply::Updated));
    }

    let stored = questions::Entity::find_by_id(question.question_id)
        .one(db)
        .await
        .expect("lookup failed")
        .expect("question vanished");
    assert_eq!(stored.reply_text.as_deref(), Some("Second, better answer."));

    cleanup_test_data(db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn a_reply_cannot_cross_into_another_topic() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(db).await.expect("Failed to cleanup");

    let teacher = create_test_user(db, "Ada", "ada@test.com", Role::Teacher, "password123")
        .await
        .expect("Failed to create teacher");
    let student = create_test_user(db, "Sam", "sam@test.com", Role::Student, "password123")
        .await
        .expect("Failed to create student");
    let topic = create_test_topic(db, teacher.user_id, "Lifetimes")
        .await
        .expect("Failed to create topic");
    let other_topic = create_test_topic(db, teacher.user_id, "Traits")
        .await
        .expect("Failed to create topic");
    let question = create_test_question(db, topic.topic_id, student.user_id, "Why 'static?")
        .await
        .expect("Failed to create question");

    // Same question id, wrong topic id: the update must not match.
    let outcome = content::submit_reply(db, question.question_id, other_topic.topic_id, "nope")
        .await
        .expect("submit_reply errored");
    assert!(matches!(outcome, Reply::NotFound));

    let stored = questions::Entity::find_by_id(question.question_id)
        .one(db)
        .await
        .expect("lookup failed")
        .expect("question vanished");
    assert_eq!(stored.reply_text, None, "the reply must not have landed");

    cleanup_test_data(db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn asking_on_a_missing_topic_is_rejected() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(db).await.expect("Failed to cleanup");

    let student = create_test_user(db, "Sam", "sam@test.com", Role::Student, "password123")
        .await
        .expect("Failed to create student");

    let outcome = content::ask_question(db, 4242, student.user_id, "Hello?")
        .await
        .expect("ask_question errored");
    assert!(matches!(outcome, Ask::TopicMissing));

    cleanup_test_data(db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn question_deletion_reports_stale_ids() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(db).await.expect("Failed to cleanup");

    let teacher = create_test_user(db, "Ada", "ada@test.com", Role::Teacher, "password123")
        .await
        .expect("Failed to create teacher");
    let student = create_test_user(db, "Sam", "sam@test.com", Role::Student, "password123")
        .await
        .expect("Failed to create student");
    let topic = create_test_topic(db, teacher.user_id, "Iterators")
        .await
        .expect("Failed to create topic");
    let question = create_test_question(db, topic.topic_id, student.user_id, "Lazy or eager?")
        .await
        .expect("Failed to create question");

    let first = content::delete_question(db, question.question_id)
        .await
        .expect("delete_question errored");
    assert!(matches!(first, QuestionDeletion::Deleted));

    let second = content::delete_question(db, question.question_id)
        .await
        .expect("delete_question errored");
    assert!(matches!(second, QuestionDeletion::NotFound));

    cleanup_test_data(db).await.expect("Failed to cleanup");
}
