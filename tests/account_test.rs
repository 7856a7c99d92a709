/// Integration tests for account creation and credential checks

mod common;
use serial_test::serial;

use common::*;
use lectern::content::{self, Registration};
use lectern::orm::users::Role;
use lectern::web::login::{authenticate, AuthOutcome};
use sea_orm::{EntityTrait, PaginatorTrait};

#[actix_rt::test]
#[serial]
async fn duplicate_email_is_rejected_without_creating_a_row() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(db).await.expect("Failed to cleanup");

    let hash = lectern::session::hash_password("secret1").expect("hashing failed");
    let first = content::create_account(db, "Ada", "ada@test.com", &hash, Role::Teacher)
        .await
        .expect("first registration failed");
    assert!(matches!(first, Registration::Created(_)));

    let second = content::create_account(db, "Imposter", "ada@test.com", &hash, Role::Student)
        .await
        .expect("second registration errored");
    assert!(
        matches!(second, Registration::EmailTaken),
        "duplicate email must be rejected"
    );

    let count = lectern::orm::users::Entity::find()
        .count(db)
        .await
        .expect("count failed");
    assert_eq!(count, 1, "the rejected registration must not create a row");

    cleanup_test_data(db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn created_account_carries_the_requested_role() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(db).await.expect("Failed to cleanup");

    let hash = lectern::session::hash_password("secret1").expect("hashing failed");
    let created = content::create_account(db, "Sam", "sam@test.com", &hash, Role::Student)
        .await
        .expect("registration failed");

    match created {
        Registration::Created(user) => {
            assert_eq!(user.role, Role::Student);
            assert_eq!(user.email, "sam@test.com");
        }
        Registration::EmailTaken => panic!("fresh email reported as taken"),
    }

    cleanup_test_data(db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn authenticate_accepts_only_the_right_password() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(db).await.expect("Failed to cleanup");

    let user = create_test_user(db, "Sam", "sam@test.com", Role::Student, "password123")
        .await
        .expect("Failed to create test user");

    let ok = authenticate(db, "sam@test.com", "password123")
        .await
        .expect("authenticate errored");
    match ok {
        AuthOutcome::Success(found) => assert_eq!(found.user_id, user.user_id),
        _ => panic!("valid credentials rejected"),
    }

    let wrong = authenticate(db, "sam@test.com", "password124")
        .await
        .expect("authenticate errored");
    assert!(matches!(wrong, AuthOutcome::BadPassword));

    let unknown = authenticate(db, "nobody@test.com", "password123")
        .await
        .expect("authenticate errored");
    assert!(matches!(unknown, AuthOutcome::BadEmail));

    cleanup_test_data(db).await.expect("Failed to cleanup");
}
