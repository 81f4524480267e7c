use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Fare/service tiers a train can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FareClass {
    #[serde(rename = "SL")]
    Sleeper,
    #[serde(rename = "3A")]
    ThreeTierAc,
    #[serde(rename = "2A")]
    TwoTierAc,
    #[serde(rename = "1A")]
    FirstAc,
    #[serde(rename = "CC")]
    ChairCar,
}

impl FareClass {
    pub const ALL: [FareClass; 5] = [
        FareClass::Sleeper,
        FareClass::ThreeTierAc,
        FareClass::TwoTierAc,
        FareClass::FirstAc,
        FareClass::ChairCar,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            FareClass::Sleeper => "SL",
            FareClass::ThreeTierAc => "3A",
            FareClass::TwoTierAc => "2A",
            FareClass::FirstAc => "1A",
            FareClass::ChairCar => "CC",
        }
    }
}

impl fmt::Display for FareClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for FareClass {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FareClass::ALL
            .into_iter()
            .find(|class| class.code() == s)
            .ok_or_else(|| CatalogError::UnknownClass(s.to_string()))
    }
}

/// Weekday names as they appear in a train's schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunningDay {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl RunningDay {
    pub const EVERY_DAY: [RunningDay; 7] = [
        RunningDay::Monday,
        RunningDay::Tuesday,
        RunningDay::Wednesday,
        RunningDay::Thursday,
        RunningDay::Friday,
        RunningDay::Saturday,
        RunningDay::Sunday,
    ];

    pub fn of(date: NaiveDate) -> Self {
        date.weekday().into()
    }

    pub fn name(&self) -> &'static str {
        match self {
            RunningDay::Monday => "Monday",
            RunningDay::Tuesday => "Tuesday",
            RunningDay::Wednesday => "Wednesday",
            RunningDay::Thursday => "Thursday",
            RunningDay::Friday => "Friday",
            RunningDay::Saturday => "Saturday",
            RunningDay::Sunday => "Sunday",
        }
    }
}

impl FromStr for RunningDay {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RunningDay::EVERY_DAY
            .into_iter()
            .find(|day| day.name() == s)
            .ok_or_else(|| CatalogError::UnknownDay(s.to_string()))
    }
}

impl From<Weekday> for RunningDay {
    fn from(day: Weekday) -> Self {
        match day {
            Weekday::Mon => RunningDay::Monday,
            Weekday::Tue => RunningDay::Tuesday,
            Weekday::Wed => RunningDay::Wednesday,
            Weekday::Thu => RunningDay::Thursday,
            Weekday::Fri => RunningDay::Friday,
            Weekday::Sat => RunningDay::Saturday,
            Weekday::Sun => RunningDay::Sunday,
        }
    }
}

/// A stop on the train's route.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub station_code: String,
    pub station_name: String,
    #[serde(with = "hhmm", default)]
    pub arrival_time: NaiveTime,
    #[serde(with = "hhmm", default)]
    pub departure_time: NaiveTime,
    #[serde(default)]
    pub distance: u32,
}

impl Station {
    fn matches(&self, needle: &str) -> bool {
        contains_ignore_case(&self.station_code, needle)
            || contains_ignore_case(&self.station_name, needle)
    }
}

/// Seat inventory and price for one class. Both must be set for the class to be bookable.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClassConfig {
    pub total_seats: Option<u32>,
    pub fare: Option<i64>,
}

/// Outcome of looking a class up in a train's class table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassLookup {
    Bookable { total_seats: u32, fare: i64 },
    /// The class has seats but nobody configured a price for it.
    FareMissing { total_seats: u32 },
    Unavailable,
}

/// Static train definition. Never mutated by booking activity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Train {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub train_number: String,
    pub train_name: String,
    pub source: String,
    pub destination: String,
    #[serde(default)]
    pub stations: Vec<Station>,
    #[serde(default)]
    pub classes: BTreeMap<FareClass, ClassConfig>,
    #[serde(default)]
    pub running_days: Vec<RunningDay>,
    pub duration: String,
}

impl Train {
    pub fn lookup_class(&self, class: FareClass) -> ClassLookup {
        match self.classes.get(&class) {
            Some(ClassConfig { total_seats: Some(total_seats), fare: Some(fare) }) => ClassLookup::Bookable {
                total_seats: *total_seats,
                fare: *fare,
            },
            Some(ClassConfig { total_seats: Some(total_seats), fare: None }) => ClassLookup::FareMissing {
                total_seats: *total_seats,
            },
            _ => ClassLookup::Unavailable,
        }
    }

    pub fn runs_on(&self, day: RunningDay) -> bool {
        self.running_days.contains(&day)
    }

    /// Source query: the train's origin or any stop, by code or name.
    pub fn matches_origin(&self, query: &str) -> bool {
        contains_ignore_case(&self.source, query) || self.stations.iter().any(|s| s.matches(query))
    }

    /// Destination query: the train's terminus or any stop, by code or name.
    pub fn matches_destination(&self, query: &str) -> bool {
        contains_ignore_case(&self.destination, query) || self.stations.iter().any(|s| s.matches(query))
    }

    /// Admin-side sanity checks before a train enters the catalog.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let required = [
            ("trainNumber", &self.train_number),
            ("trainName", &self.train_name),
            ("source", &self.source),
            ("destination", &self.destination),
            ("duration", &self.duration),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(CatalogError::MissingField(field));
            }
        }

        if self.classes.is_empty() {
            return Err(CatalogError::NoClasses);
        }

        for (class, config) in &self.classes {
            if matches!(config.fare, Some(fare) if fare < 0) {
                return Err(CatalogError::NegativeFare(*class));
            }
        }

        Ok(())
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Unknown class: {0}")]
    UnknownClass(String),

    #[error("Unknown running day: {0}")]
    UnknownDay(String),

    #[error("Train field '{0}' is required")]
    MissingField(&'static str),

    #[error("Train must define at least one class")]
    NoClasses,

    #[error("Fare for class {0} cannot be negative")]
    NegativeFare(FareClass),
}

mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(serde::de::Error::custom)
    }
}
