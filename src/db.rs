use std::path::Path;

use anyhow::Context;
use rusqlite::Connection;

use crate::{classifier::Classification, reading::Reading};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogRecord {
    pub reading: Reading,
    pub classification: Classification,
}

/// Append-only sink for classified readings.
pub trait RecordStore {
    fn insert(&mut self, record: &LogRecord) -> Result<(), anyhow::Error>;
}

pub const TABLE: &str = "sensor_logs";

pub const COLUMNS: [&str; 12] = [
    "id",
    "timestamp",
    "temperature",
    "humidity",
    "pressure",
    "pitch",
    "roll",
    "yaw",
    "temperature_status",
    "humidity_status",
    "pressure_status",
    "orientation_status",
];

#[derive(Debug)]
pub struct DB {
    conn: Connection,
}

impl DB {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let conn = Connection::open(path).context("Failed to open database file")?;
        Ok(Self { conn })
    }

    pub fn init(&self) -> Result<(), anyhow::Error> {
        self.conn
            .execute_batch(
                r"
                CREATE TABLE IF NOT EXISTS sensor_logs (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    timestamp TEXT NOT NULL,
                    temperature REAL NOT NULL,
                    humidity REAL NOT NULL,
                    pressure REAL NOT NULL,
                    pitch REAL NOT NULL,
                    roll REAL NOT NULL,
                    yaw REAL NOT NULL,
                    temperature_status TEXT NOT NULL,
                    humidity_status TEXT NOT NULL,
                    pressure_status TEXT NOT NULL,
                    orientation_status TEXT NOT NULL
                );
                ",
            )
            .context("Failed to create table")?;
        self.check_columns()
    }

    /// A pre-existing table with a different layout would make every insert fail.
    fn check_columns(&self) -> Result<(), anyhow::Error> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({TABLE})"))
            .context("Failed to inspect table")?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))
            .context("Failed to inspect table")?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to inspect table")?;

        let missing: Vec<&str> = COLUMNS
            .iter()
            .copied()
            .filter(|c| !columns.iter().any(|existing| existing == c))
            .collect();
        if !missing.is_empty() {
            anyhow::bail!(
                "Table {TABLE} exists with an incompatible layout, missing columns: {}",
                missing.join(", ")
            );
        }
        Ok(())
    }
}

impl RecordStore for DB {
    fn insert(&mut self, record: &LogRecord) -> Result<(), anyhow::Error> {
        let r = &record.reading;
        let c = &record.classification;
        self.conn
            .execute(
                r"
                INSERT INTO sensor_logs (
                    timestamp, temperature, humidity, pressure, pitch, roll, yaw,
                    temperature_status, humidity_status, pressure_status, orientation_status
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                rusqlite::params![
                    r.timestamp.to_rfc3339(),
                    r.temperature,
                    r.humidity,
                    r.pressure,
                    r.pitch,
                    r.roll,
                    r.yaw,
                    c.temperature.as_str(),
                    c.humidity.as_str(),
                    c.pressure.as_str(),
                    c.orientation.as_str(),
                ],
            )
            .context("Failed to insert data into table")?;
        Ok(())
    }
}
