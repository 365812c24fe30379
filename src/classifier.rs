use std::fmt;

use serde::Deserialize;

use crate::reading::Reading;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Half-open: `min` itself is normal, `max` itself is high.
    pub fn level(&self, value: f64) -> Level {
        if value < self.min {
            Level::Low
        } else if value >= self.max {
            Level::High
        } else {
            Level::Normal
        }
    }

    /// Closed on both ends.
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct OrientationLimits {
    pub pitch: Range,
    pub roll: Range,
    pub yaw: Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Thresholds {
    pub temperature: Range,
    pub humidity: Range,
    pub pressure: Range,
    pub orientation: OrientationLimits,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            temperature: Range::new(18.0, 30.0),
            humidity: Range::new(30.0, 60.0),
            pressure: Range::new(980.0, 1030.0),
            orientation: OrientationLimits {
                pitch: Range::new(-10.0, 10.0),
                roll: Range::new(-10.0, 10.0),
                yaw: Range::new(0.0, 360.0),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    Normal,
    High,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Low => "low",
            Level::Normal => "normal",
            Level::High => "high",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Aligned,
    Tilted,
}

impl Alignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Alignment::Aligned => "aligned",
            Alignment::Tilted => "tilted",
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub temperature: Level,
    pub humidity: Level,
    pub pressure: Level,
    pub orientation: Alignment,
}

#[derive(Debug, Clone)]
pub struct Classifier {
    thresholds: Thresholds,
}

impl Classifier {
    pub fn new(thresholds: Thresholds) -> Self {
        Self { thresholds }
    }

    /// Each metric is classified independently; there is no combined label.
    pub fn classify(&self, reading: &Reading) -> Classification {
        let t = &self.thresholds;
        let o = &t.orientation;

        let aligned = o.pitch.contains(reading.pitch)
            && o.roll.contains(reading.roll)
            && o.yaw.contains(reading.yaw);

        Classification {
            temperature: t.temperature.level(reading.temperature),
            humidity: t.humidity.level(reading.humidity),
            pressure: t.pressure.level(reading.pressure),
            orientation: if aligned {
                Alignment::Aligned
            } else {
                Alignment::Tilted
            },
        }
    }
}
