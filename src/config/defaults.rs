//! Default values for configuration

/// Site categories, in the order they are listed on the site
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "korotkie-anekdoty",
    "detskie-anekdoty",
    "armiya",
    "blondinki",
    "vovochka",
    "dengi",
    "eda-napitki",
    "genskie",
    "givotnye",
    "zakon",
    "znamenitosti",
    "igry",
    "istoricheskie",
    "kompyuternye",
    "literaturnye-pro-pisateley",
    "medicinskie",
    "mugskie",
    "multiki-skazki",
    "nacionalnosti",
    "novye-russkie",
    "personagi",
    "politicheskie",
    "poshlye",
    "prazdniki",
    "rabota-professii",
    "religiya",
    "sverhestestvennoe",
    "semeynye",
    "sport",
    "starye-sovetskie",
    "studenty",
    "transport",
    "turisty",
    "chernyy-yumor",
    "shkola",
    "raznoe",
    "raznoe-2",
    "raznoe-3",
    "populyarnye-anekdoty",
    "svegie-anekdoty",
];

/// Lower bound for the delivery interval (seconds)
pub const MIN_SEND_INTERVAL_SECS: u64 = 60;

/// Upper bound for the delivery interval (seconds)
pub const MAX_SEND_INTERVAL_SECS: u64 = 86_400;

/// Upper bound for the page map refresh interval (hours, one year)
pub const MAX_CHECK_INTERVAL_HOURS: u64 = 8_760;

/// Ledger file name inside the data directory
pub const SENT_FILE: &str = "sent_anekdots.json";

/// Page map file name inside the data directory
pub const PAGE_MAP_FILE: &str = "category_pages.json";

/// Default site root
pub fn default_base_url() -> String {
    "https://anekdotovstreet.com".to_string()
}

/// Default data directory (current working directory)
pub fn default_data_dir() -> std::path::PathBuf {
    std::path::PathBuf::from(".")
}

/// Default category list
pub fn default_categories() -> Vec<String> {
    DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect()
}

/// Default date-indexed category
pub fn default_date_category() -> Option<String> {
    Some("svegie-anekdoty".to_string())
}

/// Default hours between category rescans
pub fn default_check_interval_hours() -> u64 {
    12
}

/// Default seconds between deliveries
pub fn default_send_interval_secs() -> u64 {
    1800
}

/// Page count assumed for categories missing from the page map
pub fn default_fallback_page_count() -> u32 {
    10
}

/// Hard cap on pages probed per category
pub fn default_max_scan_pages() -> u32 {
    200
}

/// Minimum delay between scan probes (milliseconds)
pub fn default_scan_delay_ms() -> u64 {
    250
}

/// Ledger retention window (days)
pub fn default_retention_days() -> u32 {
    30
}

/// How far back the date-indexed category may reach (days)
pub fn default_date_window_days() -> u32 {
    30
}

/// Default user agent
pub fn default_user_agent() -> String {
    format!(
        "Mozilla/5.0 (compatible; anekdot-relay/{})",
        env!("CARGO_PKG_VERSION")
    )
}

/// Default request timeout in seconds
pub fn default_request_timeout() -> u64 {
    10
}

/// Default wait after a failed connectivity check (seconds)
pub fn default_offline_backoff_secs() -> u64 {
    60
}

/// Default connectivity reference endpoints
pub fn default_connectivity_endpoints() -> Vec<String> {
    vec![
        "https://www.google.com".to_string(),
        "https://1.1.1.1".to_string(),
    ]
}

/// Default connectivity probe timeout in seconds
pub fn default_connectivity_timeout() -> u64 {
    5
}

/// Default first backoff delay for the delivery loop (milliseconds)
pub fn default_retry_base_ms() -> u64 {
    1_000
}

/// Default backoff ceiling for the delivery loop (5 minutes)
pub fn default_retry_max_ms() -> u64 {
    300_000
}

/// Default webhook attempts per delivery
pub fn default_notify_attempts() -> u32 {
    5
}

/// Default first webhook retry delay (milliseconds)
pub fn default_notify_base_ms() -> u64 {
    5_000
}

/// Default webhook retry ceiling (milliseconds)
pub fn default_notify_max_ms() -> u64 {
    60_000
}
