use super::sendmail::send_email;

pub async fn send_verification_email(
    to_email: &str,
    username: &str,
    token: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let subject = "Verify your email";
    let template_path = "src/mail/templates/verification-email.html";
    let base_url = std::env::var("APP_URL").unwrap_or_default();
    let verification_link = format!("{}/api/auth/verify?token={}", base_url, token);
    let placeholders = vec![
        ("{{username}}".to_string(), username.to_string()),
        ("{{verification_link}}".to_string(), verification_link),
    ];

    send_email(to_email, subject, template_path, &placeholders).await
}

pub async fn send_welcome_email(
    to_email: &str,
    username: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let subject = "Welcome to Worklane";
    let template_path = "src/mail/templates/welcome-email.html";
    let placeholders = vec![("{{username}}".to_string(), username.to_string())];

    send_email(to_email, subject, template_path, &placeholders).await
}

pub async fn send_forgot_password_email(
    to_email: &str,
    reset_link: &str,
    username: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let subject = "Reset your password";
    let template_path = "src/mail/templates/reset-password-email.html";
    let placeholders = vec![
        ("{{username}}".to_string(), username.to_string()),
        ("{{reset_link}}".to_string(), reset_link.to_string()),
    ];

    send_email(to_email, subject, template_path, &placeholders).await
}

pub async fn send_funds_released_email(
    to_email: &str,
    username: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let subject = "Funds released";
    let template_path = "src/mail/templates/funds-released-email.html";
    let placeholders = vec![("{{username}}".to_string(), username.to_string())];

    send_email(to_email, subject, template_path, &placeholders).await
}

pub async fn send_dispute_resolved_email(
    to_email: &str,
    username: &str,
    outcome: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let subject = "Your dispute has been resolved";
    let template_path = "src/mail/templates/dispute-resolved-email.html";
    let placeholders = vec![
        ("{{username}}".to_string(), username.to_string()),
        ("{{outcome}}".to_string(), outcome.to_string()),
    ];

    send_email(to_email, subject, template_path, &placeholders).await
}
