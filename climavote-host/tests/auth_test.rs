use climavote_host::errors::AuthError;

mod common;
use common::mock_app::MockApp;

#[tokio::test]
async fn test_register_and_authenticate() {
    let app = MockApp::new().await;

    let user = app.auth_service.register("  erin ", "secret").await.unwrap();
    assert_eq!(user.username, "erin");
    assert_ne!(user.password, "secret");

    let found = app.auth_service.authenticate("erin", "secret").await.unwrap();
    assert_eq!(found.id, user.id);

    let result = app.auth_service.authenticate("erin", "wrong").await;
    assert!(matches!(result, Err(AuthError::InvalidPassword)));

    let result = app.auth_service.authenticate("nobody", "secret").await;
    assert!(matches!(result, Err(AuthError::UserNotFound)));
}

#[tokio::test]
async fn test_register_rejects_bad_input() {
    let app = MockApp::new().await;
    app.create_test_user("frank").await;

    let result = app.auth_service.register("frank", "password123").await;
    assert!(matches!(result, Err(AuthError::UsernameExists)));

    let result = app.auth_service.register("ab", "password123").await;
    assert!(matches!(result, Err(AuthError::UsernameTooShort(_))));

    let result = app.auth_service.register("grace", "abc").await;
    assert!(matches!(result, Err(AuthError::PasswordTooShort(_))));
}
