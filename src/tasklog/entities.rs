//! On-disk representation of the task log. The layout is a historical wire
//! format: one object with ordered `tasks` and `times` arrays, where marker
//! timestamps are written as 9-field broken-down local time tuples.

use serde::Deserialize;
use serde::Serialize;

use chrono::{DateTime, Local};

use crate::utils::clock::Clock;

use super::{Marker, TaskLog, TaskRecord};

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskLogDocument {
    #[serde(default)]
    pub tasks: Vec<TaskEntity>,
    #[serde(default)]
    pub times: Vec<MarkerEntity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEntity {
    pub name: String,
    #[serde(rename = "reportedTime")]
    pub reported_time: f64,
    pub active: bool,
}

/// The wire encoding of [Marker]. `name: null` encodes the idle marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerEntity {
    pub name: Option<String>,
    #[serde(with = "local_time_tuple")]
    pub time: DateTime<Local>,
}

/// Timestamps travel as `[year, month, day, hour, minute, second, weekday,
/// ordinal, isdst]` with Monday as weekday zero. Only the first six fields
/// carry information on the way back in; isdst is written as -1 to let the
/// local zone decide, the way `mktime` treats it.
mod local_time_tuple {
    use chrono::{DateTime, Datelike, Local, LocalResult, TimeZone, Timelike};
    use serde::{self, de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &DateTime<Local>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let tuple: [i64; 9] = [
            time.year() as i64,
            time.month() as i64,
            time.day() as i64,
            time.hour() as i64,
            time.minute() as i64,
            time.second() as i64,
            time.weekday().num_days_from_monday() as i64,
            time.ordinal() as i64,
            -1,
        ];
        serializer.collect_seq(tuple)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Local>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let fields = <[i64; 9]>::deserialize(deserializer)?;
        let invalid = || {
            de::Error::custom(format!(
                "no such local time {}-{}-{} {}:{}:{}",
                fields[0], fields[1], fields[2], fields[3], fields[4], fields[5]
            ))
        };
        if fields[1] < 0 || fields[2] < 0 || fields[3] < 0 || fields[4] < 0 || fields[5] < 0 {
            return Err(invalid());
        }
        match Local.with_ymd_and_hms(
            fields[0] as i32,
            fields[1] as u32,
            fields[2] as u32,
            fields[3] as u32,
            fields[4] as u32,
            fields[5] as u32,
        ) {
            LocalResult::Single(time) => Ok(time),
            // A fold during DST transitions, pick the earlier instant.
            LocalResult::Ambiguous(time, _) => Ok(time),
            LocalResult::None => Err(invalid()),
        }
    }
}

impl From<&TaskRecord> for TaskEntity {
    fn from(record: &TaskRecord) -> Self {
        Self {
            name: record.name.clone(),
            reported_time: record.reported_time,
            active: record.active,
        }
    }
}

impl From<TaskEntity> for TaskRecord {
    fn from(entity: TaskEntity) -> Self {
        Self {
            name: entity.name,
            reported_time: entity.reported_time,
            active: entity.active,
        }
    }
}

impl From<&Marker> for MarkerEntity {
    fn from(marker: &Marker) -> Self {
        Self {
            name: marker.task.clone(),
            time: marker.timestamp,
        }
    }
}

impl From<MarkerEntity> for Marker {
    fn from(entity: MarkerEntity) -> Self {
        Self {
            task: entity.name,
            timestamp: entity.time,
        }
    }
}

impl TaskLogDocument {
    pub fn from_log(log: &TaskLog) -> Self {
        Self {
            tasks: log.tasks().iter().map(TaskEntity::from).collect(),
            times: log.markers().iter().map(MarkerEntity::from).collect(),
        }
    }

    pub fn into_log(self, clock: Box<dyn Clock>) -> TaskLog {
        TaskLog::from_parts(
            self.tasks.into_iter().map(TaskRecord::from).collect(),
            self.times.into_iter().map(Marker::from).collect(),
            clock,
        )
    }
}
