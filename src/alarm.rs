use std::{
    fmt,
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::{Duration, NaiveDateTime, NaiveTime};
use thiserror::Error;

/// how long a snooze defers the alarm
pub const SNOOZE_MINUTES: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Repeat {
    #[default]
    Once,
    Daily,
}

impl fmt::Display for Repeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Once => write!(f, "Once"),
            Self::Daily => write!(f, "Daily"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeField {
    Hour,
    Minute,
}

impl fmt::Display for TimeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hour => write!(f, "hour"),
            Self::Minute => write!(f, "minute"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeInputError {
    #[error("{field} {input:?} is not a whole number")]
    NotANumber { field: TimeField, input: String },
    #[error("{field} {value} is out of range")]
    OutOfRange { field: TimeField, value: i64 },
}

/// An hour and minute of the day that came from the user and passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmTime(NaiveTime);

impl AlarmTime {
    /// parses 24h hour (0-23) and minute (0-59) text input
    pub fn parse(hour: &str, minute: &str) -> Result<Self, TimeInputError> {
        let hour = parse_field(TimeField::Hour, hour, 23)?;
        let minute = parse_field(TimeField::Minute, minute, 59)?;
        Self::from_hm(hour, minute)
    }

    pub fn from_hm(hour: u32, minute: u32) -> Result<Self, TimeInputError> {
        if hour > 23 {
            return Err(TimeInputError::OutOfRange {
                field: TimeField::Hour,
                value: i64::from(hour),
            });
        }
        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(Self)
            .ok_or(TimeInputError::OutOfRange {
                field: TimeField::Minute,
                value: i64::from(minute),
            })
    }

    #[must_use]
    pub const fn time(self) -> NaiveTime {
        self.0
    }
}

fn parse_field(field: TimeField, input: &str, max: i64) -> Result<u32, TimeInputError> {
    let value = input
        .trim()
        .parse::<i64>()
        .map_err(|_| TimeInputError::NotANumber {
            field,
            input: input.to_string(),
        })?;
    if (0..=max).contains(&value) {
        u32::try_from(value).map_err(|_| TimeInputError::OutOfRange { field, value })
    } else {
        Err(TimeInputError::OutOfRange { field, value })
    }
}

/// the first occurrence of `time` strictly after `now`
#[must_use]
pub fn next_fire_time(now: NaiveDateTime, time: AlarmTime) -> NaiveDateTime {
    let candidate = now.date().and_time(time.time());
    if candidate <= now {
        candidate + Duration::days(1)
    } else {
        candidate
    }
}

/// what a single poll decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Wait,
    Fire,
    /// a one shot alarm went off, polling should end
    FireAndStop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmState {
    pub next_fire: Option<NaiveDateTime>,
    pub repeat: Repeat,
    pub snooze_until: Option<NaiveDateTime>,
    pub sound_path: PathBuf,
}

impl AlarmState {
    #[must_use]
    pub const fn new(sound_path: PathBuf) -> Self {
        Self {
            next_fire: None,
            repeat: Repeat::Once,
            snooze_until: None,
            sound_path,
        }
    }

    /// sets the alarm, a time that is not in the future means tomorrow
    pub fn schedule(&mut self, now: NaiveDateTime, time: AlarmTime, repeat: Repeat) -> NaiveDateTime {
        let next = next_fire_time(now, time);
        self.next_fire = Some(next);
        self.repeat = repeat;
        next
    }

    pub fn snooze(&mut self, now: NaiveDateTime) -> NaiveDateTime {
        let until = now + Duration::minutes(SNOOZE_MINUTES);
        self.snooze_until = Some(until);
        until
    }

    /// forget the schedule and any snooze, the sound stays
    pub fn clear(&mut self) {
        self.next_fire = None;
        self.snooze_until = None;
    }

    pub fn tick(&mut self, now: NaiveDateTime) -> Tick {
        // a pending snooze is the only thing that can fire
        if let Some(until) = self.snooze_until {
            if now >= until {
                self.snooze_until = None;
                return Tick::Fire;
            }
            return Tick::Wait;
        }
        match self.next_fire {
            Some(at) if now >= at => match self.repeat {
                Repeat::Daily => {
                    self.next_fire = Some(at + Duration::days(1));
                    Tick::Fire
                }
                Repeat::Once => {
                    self.next_fire = None;
                    Tick::FireAndStop
                }
            },
            _ => Tick::Wait,
        }
    }
}

/// The alarm state as shared between the ui and the poller.
#[derive(Debug, Clone)]
pub struct SharedState(Arc<Mutex<AlarmState>>);

impl SharedState {
    #[must_use]
    pub fn new(state: AlarmState) -> Self {
        Self(Arc::new(Mutex::new(state)))
    }

    /// a poisoned lock still holds valid scalars so we just keep using it
    pub fn lock(&self) -> MutexGuard<'_, AlarmState> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
