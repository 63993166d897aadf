mod common;

use models::enums::{OtpPurpose, UserRole};
use serde_json::json;

use common::{test_app, PASSWORD};

#[tokio::test]
async fn register_with_email_otp_then_login() {
    let t = test_app();
    let branch = t.bank.seed_branch("PUN003", "SIMB0000003").await.id;

    let sent = t.request("POST", "/api/registration/send-otp", None, Some(json!({"email": "Kavya@Bank.in"}))).await;
    assert!(sent.success(), "{}", sent.body);
    assert_eq!(sent.body["data"]["email"], "kavya@bank.in");
    assert!(sent.body["data"].get("code").is_none());

    let code = t.sender.last_code("kavya@bank.in", OtpPurpose::Registration).await.unwrap();
    let wrong = if code == "000000" { "111111" } else { "000000" };
    let bad = t.request("POST", "/api/registration/verify-otp", None, Some(json!({"email": "kavya@bank.in", "code": wrong}))).await;
    assert!(!bad.success());
    assert_eq!(bad.logical_status(), 400);

    let ok = t.request("POST", "/api/registration/verify-otp", None, Some(json!({"email": "kavya@bank.in", "code": code}))).await;
    assert!(ok.success(), "{}", ok.body);

    let registered = t
        .request(
            "POST",
            "/api/registration/register",
            None,
            Some(json!({
                "email": "kavya@bank.in",
                "full_name": "Kavya Iyer",
                "phone": "+919876501234",
                "password": PASSWORD,
                "branch_id": branch,
                "date_of_birth": "1994-07-15",
                "address": "44 FC Road, Pune",
                "pan_number": "KLMNO6789P",
                "aadhaar_number": "345678901234"
            })),
        )
        .await;
    assert!(registered.success(), "{}", registered.body);
    assert_eq!(registered.body["data"]["role"], "Customer");
    assert_eq!(registered.body["data"]["aadhaar_number"], "XXXXXXXX1234");

    let token = t.login("kavya@bank.in", PASSWORD).await;
    let claims = t.services.auth.verify_token(&token).unwrap();
    assert_eq!(claims.role, UserRole::Customer);

    let again = t.request("POST", "/api/registration/send-otp", None, Some(json!({"email": "kavya@bank.in"}))).await;
    assert_eq!(again.logical_status(), 409);
}

#[tokio::test]
async fn register_without_otp_is_rejected() {
    let t = test_app();
    let branch = t.bank.seed_branch("PUN003", "SIMB0000003").await.id;
    let r = t
        .request(
            "POST",
            "/api/registration/register",
            None,
            Some(json!({
                "email": "nobody@bank.in",
                "full_name": "No Body",
                "phone": "9876501234",
                "password": PASSWORD,
                "branch_id": branch,
                "date_of_birth": "1990-01-01",
                "address": "1 Nowhere",
                "pan_number": "ABCDE1234F",
                "aadhaar_number": "234567890123"
            })),
        )
        .await;
    assert!(!r.success());
    assert_eq!(t.sender.count().await, 0);
}

#[tokio::test]
async fn password_reset_through_otp() {
    let t = test_app();
    t.bank.seed_user("arjun@bank.in", "Arjun", UserRole::Customer, None, PASSWORD).await;

    let r = t.request("POST", "/api/auth/forgot-password", None, Some(json!({"email": "arjun@bank.in"}))).await;
    assert!(r.success());
    let silent = t.request("POST", "/api/auth/forgot-password", None, Some(json!({"email": "ghost@bank.in"}))).await;
    assert!(silent.success());
    assert_eq!(t.sender.count().await, 1);

    let code = t.sender.last_code("arjun@bank.in", OtpPurpose::PasswordReset).await.unwrap();
    let verified = t
        .request("POST", "/api/otp/verify", None, Some(json!({"email": "arjun@bank.in", "purpose": "PasswordReset", "code": code})))
        .await;
    assert!(verified.success(), "{}", verified.body);

    let reset = t
        .request(
            "POST",
            "/api/auth/reset-password",
            None,
            Some(json!({"email": "arjun@bank.in", "code": code, "new_password": "N3wSecret!"})),
        )
        .await;
    assert!(reset.success(), "{}", reset.body);
    t.login("arjun@bank.in", "N3wSecret!").await;
}
