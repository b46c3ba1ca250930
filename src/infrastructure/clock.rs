//! Wall-clock timestamps for envelopes and log documents

use serde::Serializer;
use std::sync::atomic::{AtomicI64, Ordering};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Wall clock that never hands out a timestamp earlier than the last one.
///
/// System time can step backwards (NTP adjustments); error envelopes issued
/// by one process must still carry non-decreasing timestamps.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    /// Last issued timestamp, Unix nanoseconds
    last_nanos: AtomicI64,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            last_nanos: AtomicI64::new(0),
        }
    }

    /// Current UTC time, clamped to the previously issued value
    pub fn now(&self) -> OffsetDateTime {
        let wall = OffsetDateTime::now_utc();
        let nanos = i64::try_from(wall.unix_timestamp_nanos()).unwrap_or(i64::MAX);
        let previous = self.last_nanos.fetch_max(nanos, Ordering::AcqRel);
        if previous <= nanos {
            return wall;
        }
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(previous)).unwrap_or(wall)
    }
}

/// serde `serialize_with` adapter for RFC 3339 timestamps
pub fn serialize_rfc3339<S: Serializer>(ts: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error> {
    let formatted = ts.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&formatted)
}
