#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};

/// 2023-11-14T22:13:20Z
pub const FIXED_TIMESTAMP_MS: i64 = 1_700_000_000_000;

pub fn fixed_now() -> DateTime<Utc> {
    Utc.timestamp_millis_opt(FIXED_TIMESTAMP_MS).unwrap()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
