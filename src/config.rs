// config.rs
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: Option<String>,
    pub app_url: String,
    pub jwt_secret: String,
    pub jwt_maxage: i64,
    pub port: u16,
    // Payment processor configuration
    pub payment_secret_key: String,
    pub payment_webhook_secret: String,
    pub payment_api_base: String,
    pub platform_fee_percent: i64,
    // Email service configuration
    pub smtp_host: String,
    pub smtp_username: String,
    pub smtp_password: String,
    pub mail_from: String,
}

impl Config {
    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let jwt_secret = std::env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set");
        let jwt_maxage = std::env::var("JWT_MAXAGE").expect("JWT_MAXAGE must be set");
        let app_url = std::env::var("APP_URL").expect("APP_URL must be set");
        let redis_url = std::env::var("REDIS_URL").ok();

        // Payment processor configuration (with test defaults)
        let payment_secret_key = std::env::var("PAYMENT_SECRET_KEY")
            .unwrap_or_else(|_| "test_secret_key".to_string());
        let payment_webhook_secret = std::env::var("PAYMENT_WEBHOOK_SECRET")
            .unwrap_or_else(|_| "test_webhook_secret".to_string());
        let payment_api_base = std::env::var("PAYMENT_API_BASE")
            .unwrap_or_else(|_| "https://api.payments.example.com/v1".to_string());
        let platform_fee_percent = std::env::var("PLATFORM_FEE_PERCENT")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(5);

        // Email service configuration (with defaults)
        let smtp_host = std::env::var("SMTP_HOST")
            .unwrap_or_else(|_| "localhost".to_string());
        let smtp_username = std::env::var("SMTP_USERNAME")
            .unwrap_or_else(|_| "".to_string());
        let smtp_password = std::env::var("SMTP_PASSWORD")
            .unwrap_or_else(|_| "".to_string());
        let mail_from = std::env::var("MAIL_FROM")
            .unwrap_or_else(|_| "Worklane <no-reply@worklane.app>".to_string());

        Config {
            database_url,
            redis_url,
            app_url,
            jwt_secret,
            jwt_maxage: jwt_maxage.parse::<i64>().unwrap(),
            port: 8000,
            payment_secret_key,
            payment_webhook_secret,
            payment_api_base,
            platform_fee_percent,
            smtp_host,
            smtp_username,
            smtp_password,
            mail_from,
        }
    }
}
