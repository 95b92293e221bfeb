//! Recast policies and next-availability computation.

use {
    chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Weekday},
    serde::{Deserialize, Serialize},
};

use crate::{Error, Result};

/// Longest fixed cooldown, in days.
pub const MAX_RECAST_DAYS: i64 = 3650;

/// Largest `interval_days` a daily policy accepts.
pub const MAX_INTERVAL_DAYS: u32 = 3650;

/// Largest `interval_weeks` a weekly policy accepts.
pub const MAX_INTERVAL_WEEKS: u32 = 520;

/// How a spent charge becomes available again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "recastType",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum RecastPolicy {
    /// A fixed cooldown counted from the anchor.
    Duration {
        #[serde(rename = "recastTimeMs", with = "millis")]
        recast_time: TimeDelta,
    },
    /// A daily slot at `available_at`, `interval_days` days after the anchor's slot.
    Daily {
        available_at: NaiveTime,
        #[serde(default)]
        interval_days: u32,
    },
    /// A weekly slot on `recast_day_of_week` at `available_at`.
    Weekly {
        recast_day_of_week: Weekday,
        available_at: NaiveTime,
        #[serde(default)]
        interval_weeks: u32,
    },
    /// No automatic refill; charges change only through explicit add/use.
    Manual,
}

impl RecastPolicy {
    /// Build a fixed-duration policy. The duration must be strictly positive.
    pub fn duration(recast_time: TimeDelta) -> Result<Self> {
        let policy = Self::Duration { recast_time };
        policy.validate()?;
        Ok(policy)
    }

    #[must_use]
    pub fn daily(available_at: NaiveTime, interval_days: u32) -> Self {
        Self::Daily {
            available_at,
            interval_days,
        }
    }

    #[must_use]
    pub fn weekly(recast_day_of_week: Weekday, available_at: NaiveTime, interval_weeks: u32) -> Self {
        Self::Weekly {
            recast_day_of_week,
            available_at,
            interval_weeks,
        }
    }

    /// Check the bounds a deserialized or hand-built policy must satisfy.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::Duration { recast_time } if recast_time <= TimeDelta::zero() => Err(
                Error::invalid("recast time", format!("must be positive, got {recast_time}")),
            ),
            Self::Duration { recast_time } if recast_time > TimeDelta::days(MAX_RECAST_DAYS) => {
                Err(Error::invalid(
                    "recast time",
                    format!("must be at most {MAX_RECAST_DAYS} days, got {recast_time}"),
                ))
            },
            Self::Daily { interval_days, .. } if interval_days > MAX_INTERVAL_DAYS => {
                Err(Error::invalid(
                    "interval days",
                    format!("must be at most {MAX_INTERVAL_DAYS}, got {interval_days}"),
                ))
            },
            Self::Weekly { interval_weeks, .. } if interval_weeks > MAX_INTERVAL_WEEKS => {
                Err(Error::invalid(
                    "interval weeks",
                    format!("must be at most {MAX_INTERVAL_WEEKS}, got {interval_weeks}"),
                ))
            },
            _ => Ok(()),
        }
    }

    /// Whether charges refill on their own as time passes.
    #[must_use]
    pub fn is_time_based(&self) -> bool {
        match self {
            Self::Duration { .. } | Self::Daily { .. } | Self::Weekly { .. } => true,
            Self::Manual => false,
        }
    }

    /// The instant at which a recast anchored at `from` completes.
    ///
    /// Fails with [`Error::Precondition`] for [`RecastPolicy::Manual`], for a
    /// non-positive duration, and when the result leaves chrono's range.
    pub fn ready_at(&self, from: NaiveDateTime) -> Result<NaiveDateTime> {
        match *self {
            Self::Duration { recast_time } => {
                if recast_time <= TimeDelta::zero() {
                    return Err(Error::precondition(format!(
                        "duration recast must be positive, got {recast_time}"
                    )));
                }
                from.checked_add_signed(recast_time)
                    .ok_or_else(|| out_of_range(from))
            },
            Self::Daily {
                available_at,
                interval_days,
            } => {
                // The anchor's own slot counts as spent once its time has come.
                let slot_passed = from.time() >= available_at;
                let days = u64::from(interval_days) + u64::from(slot_passed);
                let date = add_days(from.date(), days).ok_or_else(|| out_of_range(from))?;
                Ok(date.and_time(available_at))
            },
            Self::Weekly {
                recast_day_of_week,
                available_at,
                interval_weeks,
            } => {
                let slot_passed =
                    from.weekday() == recast_day_of_week && from.time() >= available_at;
                let weeks = u64::from(interval_weeks) + u64::from(slot_passed);
                let base = add_days(from.date(), weeks * 7).ok_or_else(|| out_of_range(from))?;
                let ahead = (7 + recast_day_of_week.num_days_from_monday()
                    - base.weekday().num_days_from_monday())
                    % 7;
                let date = add_days(base, u64::from(ahead)).ok_or_else(|| out_of_range(from))?;
                Ok(date.and_time(available_at))
            },
            Self::Manual => Err(Error::precondition(
                "manual recast has no scheduled availability",
            )),
        }
    }

    /// Time left from `now` until [`Self::ready_at`]. Non-positive means ready.
    pub fn until_ready(&self, from: NaiveDateTime, now: NaiveDateTime) -> Result<TimeDelta> {
        Ok(self.ready_at(from)? - now)
    }
}

fn add_days(date: NaiveDate, days: u64) -> Option<NaiveDate> {
    date.checked_add_days(Days::new(days))
}

fn out_of_range(from: NaiveDateTime) -> Error {
    Error::precondition(format!("recast from {from} leaves the supported calendar range"))
}

/// Serialize a [`TimeDelta`] as whole milliseconds.
mod millis {
    use {
        chrono::TimeDelta,
        serde::{Deserialize, Deserializer, Serializer, de},
    };

    pub fn serialize<S: Serializer>(value: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.num_milliseconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TimeDelta, D::Error> {
        let ms = i64::deserialize(deserializer)?;
        TimeDelta::try_milliseconds(ms)
            .ok_or_else(|| de::Error::custom(format!("{ms}ms is out of range")))
    }
}
