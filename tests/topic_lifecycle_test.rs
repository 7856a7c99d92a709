/// Integration tests for the procedural cascades: deleting a topic removes
/// its questions before the row, deleting a user removes everything the
/// user owns, and a stale id never reports success.

mod common;
use serial_test::serial;

use common::*;
use lectern::content::{self, TopicDeletion, UserDeletion};
use lectern::orm::users::Role;
use lectern::orm::{questions, topics, users};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

#[actix_rt::test]
#[serial]
async fn topic_deletion_removes_all_dependent_questions() {
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
    let topic = create_test_topic(db, teacher.user_id, "Sorting Algorithms")
        .await
        .expect("Failed to create topic");

    for i in 0..3 {
        create_test_question(db, topic.topic_id, student.user_id, &format!("Question {}", i))
            .await
            .expect("Failed to create question");
    }

    let outcome = content::delete_topic(db, topic.topic_id)
        .await
        .expect("delete_topic errored");
    match outcome {
        TopicDeletion::Deleted { media } => {
            assert_eq!(media, vec![topic.pdf_path.clone()]);
        }
        TopicDeletion::NotFound => panic!("existing topic reported as missing"),
    }

    let remaining_questions = questions::Entity::find()
        .filter(questions::Column::TopicId.eq(topic.topic_id))
        .count(db)
        .await
        .expect("count failed");
    assert_eq!(remaining_questions, 0, "all dependent questions must be gone");

    assert!(topics::Entity::find_by_id(topic.topic_id)
        .one(db)
        .await
        .expect("lookup failed")
        .is_none());

    cleanup_test_data(db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn deleting_a_stale_topic_id_reports_not_found_and_touches_nothing() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(db).await.expect("Failed to cleanup");

    let teacher = create_test_user(db, "Ada", "ada@test.com", Role::Teacher, "password123")
        .await
        .expect("Failed to create teacher");
    let topic = create_test_topic(db, teacher.user_id, "Recursion")
        .await
        .expect("Failed to create topic");

    let first = content::delete_topic(db, topic.topic_id)
        .await
        .expect("delete_topic errored");
    assert!(matches!(first, TopicDeletion::Deleted { .. }));

    // The second pass must not pretend to delete anything again.
    let second = content::delete_topic(db, topic.topic_id)
        .await
        .expect("delete_topic errored");
    assert!(matches!(second, TopicDeletion::NotFound));

    cleanup_test_data(db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn locally_uploaded_video_is_listed_for_removal() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(db).await.expect("Failed to cleanup");

    let teacher = create_test_user(db, "Ada", "ada@test.com", Role::Teacher, "password123")
        .await
        .expect("Failed to create teacher");
    let topic = create_test_topic_with_local_video(db, teacher.user_id, "Pointers")
        .await
        .expect("Failed to create topic");

    let outcome = content::delete_topic(db, topic.topic_id)
        .await
        .expect("delete_topic errored");
    match outcome {
        TopicDeletion::Deleted { media } => {
            assert_eq!(media.len(), 2, "both the PDF and the video file back the row");
            assert!(media.contains(&topic.pdf_path));
            assert!(media.contains(&topic.video_url));
        }
        TopicDeletion::NotFound => panic!("existing topic reported as missing"),
    }

    cleanup_test_data(db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn deleting_a_teacher_cascades_through_topics_and_their_questions() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(db).await.expect("Failed to cleanup");

    let admin = create_test_user(db, "Root", "root@test.com", Role::Admin, "password123")
        .await
        .expect("Failed to create admin");
    let teacher = create_test_user(db, "Ada", "ada@test.com", Role::Teacher, "password123")
        .await
        .expect("Failed to create teacher");
    let student = create_test_user(db, "Sam", "sam@test.com", Role::Student, "password123")
        .await
        .expect("Failed to create student");

    let topic = create_test_topic(db, teacher.user_id, "Graphs")
        .await
        .expect("Failed to create topic");
    create_test_question(db, topic.topic_id, student.user_id, "What is a DAG?")
        .await
        .expect("Failed to create question");

    let outcome = content::delete_user(db, teacher.user_id, admin.user_id)
        .await
        .expect("delete_user errored");
    match outcome {
        UserDeletion::Deleted { media } => assert_eq!(media, vec![topic.pdf_path.clone()]),
        _ => panic!("teacher deletion did not cascade"),
    }

    assert_eq!(topics::Entity::find().count(db).await.expect("count failed"), 0);
    assert_eq!(
        questions::Entity::find().count(db).await.expect("count failed"),
        0,
        "questions on the teacher's topics must not be orphaned"
    );
    // The asking student is untouched.
    assert!(users::Entity::find_by_id(student.user_id)
        .one(db)
        .await
        .expect("lookup failed")
        .is_some());

    cleanup_test_data(db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn deleting_a_student_removes_their_questions() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(db).await.expect("Failed to cleanup");

    let admin = create_test_user(db, "Root", "root@test.com", Role::Admin, "password123")
        .await
        .expect("Failed to create admin");
    let teacher = create_test_user(db, "Ada", "ada@test.com", Role::Teacher, "password123")
        .await
        .expect("Failed to create teacher");
    let student = create_test_user(db, "Sam", "sam@test.com", Role::Student, "password123")
        .await
        .expect("Failed to create student");

    let topic = create_test_topic(db, teacher.user_id, "Hash Tables")
        .await
        .expect("Failed to create topic");
    create_test_question(db, topic.topic_id, student.user_id, "Why prime buckets?")
        .await
        .expect("Failed to create question");

    let outcome = content::delete_user(db, student.user_id, admin.user_id)
        .await
        .expect("delete_user errored");
    assert!(matches!(outcome, UserDeletion::Deleted { .. }));

    assert_eq!(
        questions::Entity::find().count(db).await.expect("count failed"),
        0
    );
    // The topic the student asked on is untouched.
    assert!(topics::Entity::find_by_id(topic.topic_id)
        .one(db)
        .await
        .expect("lookup failed")
        .is_some());

    cleanup_test_data(db).await.expect("Failed to cleanup");
}
