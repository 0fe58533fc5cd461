use crate::attendance::{IncompleteDayPolicy, PayrollRules};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    // Recognition service
    pub recognition_url: String,
    pub recognition_api_key: String,
    pub recognition_timeout_secs: u64,
    /// det_prob_threshold forwarded to the service on every upload
    pub detection_threshold: f64,

    // Punch capture gate
    pub similarity_threshold: f64,
    pub punch_cooldown_minutes: u32,

    // Payroll rules used by the attendance aggregator
    pub payroll: PayrollRules,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            access_token_ttl: env::var("ACCESS_TOKEN_TTL")
                .unwrap_or_else(|_| "900".to_string()) // default 15 min
                .parse()
                .unwrap(),
            refresh_token_ttl: env::var("REFRESH_TOKEN_TTL")
                .unwrap_or_else(|_| "604800".to_string()) // default 7 days
                .parse()
                .unwrap(),

            rate_login_per_min: env::var("RATE_LOGIN_PER_MIN")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap(),
            rate_register_per_min: env::var("RATE_REGISTER_PER_MIN")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap(),
            rate_refresh_per_min: env::var("RATE_REFRESH_PER_MIN")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap(),
            rate_protected_per_min: env::var("RATE_PROTECTED_PER_MIN")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .unwrap(),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            recognition_url: env::var("RECOGNITION_URL").expect("RECOGNITION_URL must be set"),
            recognition_api_key: env::var("RECOGNITION_API_KEY")
                .expect("RECOGNITION_API_KEY must be set"),
            recognition_timeout_secs: env::var("RECOGNITION_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap(),
            detection_threshold: env::var("DETECTION_THRESHOLD")
                .unwrap_or_else(|_| "0.8".to_string())
                .parse()
                .unwrap(),

            similarity_threshold: env::var("SIMILARITY_THRESHOLD")
                .unwrap_or_else(|_| "0.97".to_string())
                .parse()
                .unwrap(),
            punch_cooldown_minutes: env::var("PUNCH_COOLDOWN_MINUTES")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap(),

            payroll: PayrollRules {
                working_hours_per_day: env::var("WORKING_HOURS_PER_DAY")
                    .unwrap_or_else(|_| "8".to_string())
                    .parse()
                    .unwrap(),
                minimum_hours_full_day: env::var("MINIMUM_HOURS_FULL_DAY")
                    .unwrap_or_else(|_| "6".to_string())
                    .parse()
                    .unwrap(),
                overtime_multiplier: env::var("OVERTIME_MULTIPLIER")
                    .unwrap_or_else(|_| "1.5".to_string())
                    .parse()
                    .unwrap(),
                incomplete_day_policy: IncompleteDayPolicy::from_str(
                    &env::var("INCOMPLETE_DAY_POLICY").unwrap_or_else(|_| "half_day".to_string()),
                )
                .expect("INCOMPLETE_DAY_POLICY must be one of no_pay, half_day, full_day, actual_hours"),
                assumed_incomplete_hours: env::var("ASSUMED_INCOMPLETE_HOURS")
                    .unwrap_or_else(|_| "4".to_string())
                    .parse()
                    .unwrap(),
                working_days_per_month: env::var("WORKING_DAYS_PER_MONTH")
                    .unwrap_or_else(|_| "22".to_string())
                    .parse()
                    .unwrap(),
            },
        }
    }
}
