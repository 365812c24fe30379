//! HTS221 humidity and temperature sensor on the Sense HAT.

use anyhow::Context;
use rppal::i2c::I2c;

pub const ADDRESS: u16 = 0x5f;
pub const WHO_AM_I: u8 = 0x0f;
pub const DEVICE_ID: u8 = 0xbc;

pub const CTRL_REG1: u8 = 0x20;
// power on, block data update, 1 Hz
pub const CTRL_REG1_VALUE: u8 = 0x85;

pub const HUMIDITY_OUT_L: u8 = 0x28;
pub const CALIB_START: u8 = 0x30;

const AUTO_INCREMENT: u8 = 0x80;

/// Factory calibration points used for linear interpolation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub h0_rh: f64,
    pub h1_rh: f64,
    pub h0_out: i16,
    pub h1_out: i16,
    pub t0_deg_c: f64,
    pub t1_deg_c: f64,
    pub t0_out: i16,
    pub t1_out: i16,
}

impl Calibration {
    /// Decodes the 16 calibration registers starting at 0x30.
    pub fn from_registers(r: &[u8; 16]) -> Self {
        let t0_x8 = (u16::from(r[5] & 0x03) << 8) | u16::from(r[2]);
        let t1_x8 = (u16::from(r[5] & 0x0c) << 6) | u16::from(r[3]);

        Calibration {
            h0_rh: f64::from(r[0]) / 2.0,
            h1_rh: f64::from(r[1]) / 2.0,
            t0_deg_c: f64::from(t0_x8) / 8.0,
            t1_deg_c: f64::from(t1_x8) / 8.0,
            h0_out: i16::from_le_bytes([r[6], r[7]]),
            h1_out: i16::from_le_bytes([r[10], r[11]]),
            t0_out: i16::from_le_bytes([r[12], r[13]]),
            t1_out: i16::from_le_bytes([r[14], r[15]]),
        }
    }

    pub fn humidity(&self, raw: i16) -> f64 {
        let rh = interpolate(raw, self.h0_out, self.h1_out, self.h0_rh, self.h1_rh);
        rh.clamp(0.0, 100.0)
    }

    pub fn temperature(&self, raw: i16) -> f64 {
        interpolate(raw, self.t0_out, self.t1_out, self.t0_deg_c, self.t1_deg_c)
    }
}

fn interpolate(raw: i16, out0: i16, out1: i16, v0: f64, v1: f64) -> f64 {
    let span = f64::from(out1) - f64::from(out0);
    if span == 0.0 {
        return f64::NAN;
    }
    v0 + (f64::from(raw) - f64::from(out0)) * (v1 - v0) / span
}

#[derive(Debug)]
pub struct HTS221 {
    i2c: I2c,
    calibration: Option<Calibration>,
}

impl HTS221 {
    pub fn new() -> Result<HTS221, anyhow::Error> {
        let mut i2c = I2c::new().context("Failed to initialize I2C")?;
        i2c.set_slave_address(ADDRESS)
            .context("Failed to set HTS221 address")?;

        Ok(HTS221 {
            i2c,
            calibration: None,
        })
    }

    pub fn init(&mut self) -> Result<(), anyhow::Error> {
        let id = self
            .i2c
            .smbus_read_byte(WHO_AM_I)
            .context("Failed to read HTS221 WHO_AM_I")?;
        if id != DEVICE_ID {
            return Err(anyhow::anyhow!(
                "Unexpected HTS221 id: expected {:#x}, got {:#x}",
                DEVICE_ID,
                id
            ));
        }

        self.i2c
            .smbus_write_byte(CTRL_REG1, CTRL_REG1_VALUE)
            .context("Failed to configure HTS221")?;

        let mut registers = [0u8; 16];
        self.i2c
            .write_read(&[CALIB_START | AUTO_INCREMENT], &mut registers)
            .context("Failed to read HTS221 calibration")?;
        self.calibration = Some(Calibration::from_registers(&registers));

        Ok(())
    }

    /// Returns (relative humidity %, temperature °C).
    pub fn measure(&mut self) -> Result<(f64, f64), anyhow::Error> {
        let calibration = self
            .calibration
            .ok_or_else(|| anyhow::anyhow!("HTS221 is not initialized"))?;

        let mut out = [0u8; 4];
        self.i2c
            .write_read(&[HUMIDITY_OUT_L | AUTO_INCREMENT], &mut out)
            .context("Failed to read HTS221 output")?;

        let humidity = i16::from_le_bytes([out[0], out[1]]);
        let temperature = i16::from_le_bytes([out[2], out[3]]);

        Ok((
            calibration.humidity(humidity),
            calibration.temperature(temperature),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calibration() -> Calibration {
        // H0 = 20 %rH at 0 counts, H1 = 80 %rH at 6000 counts,
        // T0 = 10 °C at 100 counts, T1 = 30 °C at 500 counts.
        let mut r = [0u8; 16];
        r[0] = 40;
        r[1] = 160;
        r[2] = 80;
        r[3] = 240;
        r[5] = 0x00;
        r[6..8].copy_from_slice(&0i16.to_le_bytes());
        r[10..12].copy_from_slice(&6000i16.to_le_bytes());
        r[12..14].copy_from_slice(&100i16.to_le_bytes());
        r[14..16].copy_from_slice(&500i16.to_le_bytes());
        Calibration::from_registers(&r)
    }

    #[test]
    fn test_decode_calibration() {
        let c = calibration();
        assert_eq!(c.h0_rh, 20.0);
        assert_eq!(c.h1_rh, 80.0);
        assert_eq!(c.t0_deg_c, 10.0);
        assert_eq!(c.t1_deg_c, 30.0);
        assert_eq!(c.t1_out, 500);
    }

    #[test]
    fn test_temperature_msb_bits() {
        let mut r = [0u8; 16];
        r[2] = 0x10;
        r[3] = 0x20;
        r[5] = 0b0000_0110;
        let c = Calibration::from_registers(&r);
        assert_eq!(c.t0_deg_c, f64::from(0x210u16) / 8.0);
        assert_eq!(c.t1_deg_c, f64::from(0x120u16) / 8.0);
    }

    #[test]
    fn test_interpolation() {
        let c = calibration();
        assert_eq!(c.temperature(300), 20.0);
        assert_eq!(c.humidity(3000), 50.0);
        assert_eq!(c.humidity(12000), 100.0);
        assert_eq!(c.humidity(-6000), 0.0);
    }
}
