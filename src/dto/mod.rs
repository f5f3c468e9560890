use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::clock::EpochMillis;

pub mod booster;
pub mod health;
pub mod validation;

fn format_epoch_millis(millis: EpochMillis) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .ok()
        .and_then(|time| time.format(&Rfc3339).ok())
        .unwrap_or_else(|| "invalid-timestamp".into())
}
