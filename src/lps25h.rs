//! LPS25H barometric pressure sensor on the Sense HAT.

use anyhow::Context;
use rppal::i2c::I2c;

pub const ADDRESS: u16 = 0x5c;
pub const WHO_AM_I: u8 = 0x0f;
pub const DEVICE_ID: u8 = 0xbd;

pub const CTRL_REG1: u8 = 0x20;
// power on, 1 Hz, block data update
pub const CTRL_REG1_VALUE: u8 = 0x94;

pub const PRESS_OUT_XL: u8 = 0x28;

const AUTO_INCREMENT: u8 = 0x80;
const COUNTS_PER_HPA: f64 = 4096.0;

/// Converts the 24-bit two's complement pressure output to hPa.
pub fn pressure_from_raw(out: [u8; 3]) -> f64 {
    // sign-extend through the top byte of an i32
    let raw = i32::from_le_bytes([0, out[0], out[1], out[2]]) >> 8;
    f64::from(raw) / COUNTS_PER_HPA
}

#[derive(Debug)]
pub struct LPS25H {
    i2c: I2c,
}

impl LPS25H {
    pub fn new() -> Result<LPS25H, anyhow::Error> {
        let mut i2c = I2c::new().context("Failed to initialize I2C")?;
        i2c.set_slave_address(ADDRESS)
            .context("Failed to set LPS25H address")?;

        Ok(LPS25H { i2c })
    }

    pub fn init(&mut self) -> Result<(), anyhow::Error> {
        let id = self
            .i2c
            .smbus_read_byte(WHO_AM_I)
            .context("Failed to read LPS25H WHO_AM_I")?;
        if id != DEVICE_ID {
            return Err(anyhow::anyhow!(
                "Unexpected LPS25H id: expected {:#x}, got {:#x}",
                DEVICE_ID,
                id
            ));
        }

        self.i2c
            .smbus_write_byte(CTRL_REG1, CTRL_REG1_VALUE)
            .context("Failed to configure LPS25H")?;

        Ok(())
    }

    /// Returns pressure in hPa.
    pub fn read_pressure(&mut self) -> Result<f64, anyhow::Error> {
        let mut out = [0u8; 3];
        self.i2c
            .write_read(&[PRESS_OUT_XL | AUTO_INCREMENT], &mut out)
            .context("Failed to read LPS25H pressure")?;

        Ok(pressure_from_raw(out))
    }
}
