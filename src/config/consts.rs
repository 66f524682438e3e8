// src/config/consts.rs

// Data source
pub const DEFAULT_CSV_URL: &str =
    "https://docs.google.com/spreadsheets/d/1Y9NE_QmtnMB612wjFhmjg8v2lAXsZfmlMtZIW_IiTuE/export?format=csv";
pub const ID_COLUMN: &str = "bloco";
pub const LOCATION_COLUMN: &str = "local";
pub const TIME_COLUMN: &str = "hora";
pub const CSV_SEP: char = ',';

// Local state
pub const DEFAULT_STATE_FILE: &str = "carnabot_db.json";
pub const DEFAULT_CONFIG_FILE: &str = "carnabot.toml";
pub const LOCK_SUFFIX: &str = "lock";
pub const LOCK_STALE_SECS: u64 = 600;

// Push
pub const ONESIGNAL_API_URL: &str = "https://onesignal.com/api/v1/notifications";
pub const DEFAULT_SEGMENT: &str = "Total Subscriptions";
pub const DEFAULT_LOCALES: [&str; 2] = ["en", "pt"];
pub const DEFAULT_TITLE: &str = "Carnabot Avisa! 🥁";

// Network
pub const HTTP_TIMEOUT_SECS: u64 = 30;
pub const USER_AGENT: &str = concat!("carnabot_poller/", env!("CARGO_PKG_VERSION"));

// Concurrency
pub const DISPATCH_WORKERS: usize = 1;
pub const MAX_DISPATCH_WORKERS: usize = 16;

// Environment overrides
pub const ENV_CSV_URL: &str = "CARNABOT_CSV_URL";
pub const ENV_STATE_FILE: &str = "CARNABOT_STATE_FILE";
pub const ENV_APP_ID: &str = "CARNABOT_ONESIGNAL_APP_ID";
pub const ENV_REST_KEY: &str = "CARNABOT_ONESIGNAL_REST_KEY";
