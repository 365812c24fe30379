use chrono::{DateTime, Local};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Environment {
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orientation {
    pub pitch: f64,
    pub roll: f64,
    pub yaw: f64,
}

/// One timestamped sample of every metric the board exposes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub timestamp: DateTime<Local>,
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub pitch: f64,
    pub roll: f64,
    pub yaw: f64,
}

impl Reading {
    pub fn new(timestamp: DateTime<Local>, env: Environment, orientation: Orientation) -> Self {
        Self {
            timestamp,
            temperature: env.temperature,
            humidity: env.humidity,
            pressure: env.pressure,
            pitch: orientation.pitch,
            roll: orientation.roll,
            yaw: orientation.yaw,
        }
    }

    pub fn is_finite(&self) -> bool {
        [
            self.temperature,
            self.humidity,
            self.pressure,
            self.pitch,
            self.roll,
            self.yaw,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round1() {
        assert_eq!(round1(21.449), 21.4);
        assert_eq!(round1(21.46), 21.5);
        assert_eq!(round1(-3.26), -3.3);
    }

    #[test]
    fn test_is_finite() {
        let env = Environment {
            temperature: 21.0,
            humidity: 40.0,
            pressure: 1013.0,
        };
        let orientation = Orientation {
            pitch: 0.0,
            roll: 0.0,
            yaw: 0.0,
        };
        let reading = Reading::new(Local::now(), env, orientation);
        assert!(reading.is_finite());

        let broken = Reading {
            humidity: f64::NAN,
            ..reading
        };
        assert!(!broken.is_finite());
    }
}
