use chrono::Local;

use crate::{
    hts221::HTS221,
    lps25h::LPS25H,
    lsm9ds1::LSM9DS1,
    reading::{Environment, Orientation, Reading, round1},
};

pub trait SensorSource {
    fn read_environment(&mut self) -> Result<Environment, anyhow::Error>;

    fn read_orientation(&mut self) -> Result<Orientation, anyhow::Error>;

    /// Captures both metric groups under a single timestamp.
    fn read(&mut self) -> Result<Reading, anyhow::Error> {
        let env = self.read_environment()?;
        let orientation = self.read_orientation()?;
        Ok(Reading::new(Local::now(), env, orientation))
    }
}

#[derive(Debug)]
pub struct SenseHat {
    hts221: HTS221,
    lps25h: LPS25H,
    lsm9ds1: LSM9DS1,
    temperature_offset: f64,
}

impl SenseHat {
    pub fn new(temperature_offset: f64) -> Result<SenseHat, anyhow::Error> {
        Ok(SenseHat {
            hts221: HTS221::new()?,
            lps25h: LPS25H::new()?,
            lsm9ds1: LSM9DS1::new()?,
            temperature_offset,
        })
    }

    pub fn init(&mut self) -> Result<(), anyhow::Error> {
        self.hts221.init()?;
        self.lps25h.init()?;
        self.lsm9ds1.init()?;
        Ok(())
    }
}

impl SensorSource for SenseHat {
    fn read_environment(&mut self) -> Result<Environment, anyhow::Error> {
        let (humidity, temperature) = self.hts221.measure()?;
        let pressure = self.lps25h.read_pressure()?;

        Ok(Environment {
            temperature: round1(temperature + self.temperature_offset),
            humidity: round1(humidity),
            pressure: round1(pressure),
        })
    }

    fn read_orientation(&mut self) -> Result<Orientation, anyhow::Error> {
        let o = self.lsm9ds1.read_orientation()?;

        Ok(Orientation {
            pitch: round1(o.pitch),
            roll: round1(o.roll),
            yaw: round1(o.yaw) % 360.0,
        })
    }
}
