//! LSM9DS1 accelerometer and magnetometer on the Sense HAT.
//!
//! Pitch and roll come from the gravity vector, yaw is the tilt-compensated
//! magnetic heading. No hard/soft iron calibration is applied.

use anyhow::Context;
use rppal::i2c::I2c;

use crate::reading::Orientation;

pub const AG_ADDRESS: u16 = 0x6a;
pub const MAG_ADDRESS: u16 = 0x1c;

pub const WHO_AM_I: u8 = 0x0f;
pub const AG_DEVICE_ID: u8 = 0x68;
pub const MAG_DEVICE_ID: u8 = 0x3d;

// 119 Hz, ±2 g
pub const CTRL_REG6_XL: u8 = 0x20;
pub const CTRL_REG6_XL_VALUE: u8 = 0x60;
pub const OUT_X_L_XL: u8 = 0x28;

// ultra-high performance XY at 10 Hz, ±4 gauss, continuous conversion, ultra-high performance Z
pub const CTRL_REG1_M: u8 = 0x20;
pub const CTRL_REG1_M_VALUE: u8 = 0x70;
pub const CTRL_REG2_M: u8 = 0x21;
pub const CTRL_REG2_M_VALUE: u8 = 0x00;
pub const CTRL_REG3_M: u8 = 0x22;
pub const CTRL_REG3_M_VALUE: u8 = 0x00;
pub const CTRL_REG4_M: u8 = 0x23;
pub const CTRL_REG4_M_VALUE: u8 = 0x0c;
pub const OUT_X_L_M: u8 = 0x28;

const MAG_AUTO_INCREMENT: u8 = 0x80;

// g per LSB at ±2 g
const ACCEL_SENSITIVITY: f64 = 0.000_061;
// gauss per LSB at ±4 gauss
const MAG_SENSITIVITY: f64 = 0.000_14;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    fn from_raw(out: &[u8; 6], scale: f64) -> Self {
        Vector3 {
            x: f64::from(i16::from_le_bytes([out[0], out[1]])) * scale,
            y: f64::from(i16::from_le_bytes([out[2], out[3]])) * scale,
            z: f64::from(i16::from_le_bytes([out[4], out[5]])) * scale,
        }
    }
}

/// Pitch and roll in (-180, 180], yaw in [0, 360), all in degrees.
pub fn orientation(accel: Vector3, mag: Vector3) -> Orientation {
    let roll = accel.y.atan2(accel.z);
    let pitch = (-accel.x).atan2((accel.y * accel.y + accel.z * accel.z).sqrt());

    let mx = mag.x * pitch.cos() + mag.z * pitch.sin();
    let my = mag.x * roll.sin() * pitch.sin() + mag.y * roll.cos()
        - mag.z * roll.sin() * pitch.cos();
    let yaw = (-my).atan2(mx).to_degrees().rem_euclid(360.0);

    Orientation {
        pitch: pitch.to_degrees(),
        roll: roll.to_degrees(),
        yaw: if yaw >= 360.0 { 0.0 } else { yaw },
    }
}

#[derive(Debug)]
pub struct LSM9DS1 {
    accel: I2c,
    mag: I2c,
}

impl LSM9DS1 {
    pub fn new() -> Result<LSM9DS1, anyhow::Error> {
        let mut accel = I2c::new().context("Failed to initialize I2C")?;
        accel
            .set_slave_address(AG_ADDRESS)
            .context("Failed to set LSM9DS1 accelerometer address")?;

        let mut mag = I2c::new().context("Failed to initialize I2C")?;
        mag.set_slave_address(MAG_ADDRESS)
            .context("Failed to set LSM9DS1 magnetometer address")?;

        Ok(LSM9DS1 { accel, mag })
    }

    pub fn init(&mut self) -> Result<(), anyhow::Error> {
        check_id(&self.accel, AG_DEVICE_ID, "accelerometer")?;
        check_id(&self.mag, MAG_DEVICE_ID, "magnetometer")?;

        self.accel
            .smbus_write_byte(CTRL_REG6_XL, CTRL_REG6_XL_VALUE)
            .context("Failed to configure LSM9DS1 accelerometer")?;

        for (register, value) in [
            (CTRL_REG1_M, CTRL_REG1_M_VALUE),
            (CTRL_REG2_M, CTRL_REG2_M_VALUE),
            (CTRL_REG3_M, CTRL_REG3_M_VALUE),
            (CTRL_REG4_M, CTRL_REG4_M_VALUE),
        ] {
            self.mag
                .smbus_write_byte(register, value)
                .context("Failed to configure LSM9DS1 magnetometer")?;
        }

        Ok(())
    }

    pub fn read_orientation(&mut self) -> Result<Orientation, anyhow::Error> {
        let mut out = [0u8; 6];
        self.accel
            .write_read(&[OUT_X_L_XL], &mut out)
            .context("Failed to read LSM9DS1 accelerometer")?;
        let accel = Vector3::from_raw(&out, ACCEL_SENSITIVITY);

        self.mag
            .write_read(&[OUT_X_L_M | MAG_AUTO_INCREMENT], &mut out)
            .context("Failed to read LSM9DS1 magnetometer")?;
        let mag = Vector3::from_raw(&out, MAG_SENSITIVITY);

        Ok(orientation(accel, mag))
    }
}

fn check_id(i2c: &I2c, expected: u8, name: &str) -> Result<(), anyhow::Error> {
    let id = i2c
        .smbus_read_byte(WHO_AM_I)
        .with_context(|| format!("Failed to read LSM9DS1 {name} WHO_AM_I"))?;
    if id != expected {
        return Err(anyhow::anyhow!(
            "Unexpected LSM9DS1 {name} id: expected {:#x}, got {:#x}",
            expected,
            id
        ));
    }
    Ok(())
}
