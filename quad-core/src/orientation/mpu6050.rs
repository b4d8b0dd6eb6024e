//! MPU-6050 accelerometer tilt source.
//!
//! Pitch and roll are derived from the gravity vector only, which is good
//! enough for level-hold at hover but drifts under sustained acceleration.

use embedded_hal_async::i2c::{Error as _, I2c};

use super::{Attitude, OrientationSource, SensorError};

/// I2C address with AD0 tied low.
pub const DEFAULT_ADDRESS: u8 = 0x68;

const REG_ACCEL_CONFIG: u8 = 0x1C;
const REG_ACCEL_XOUT_H: u8 = 0x3B;
const REG_PWR_MGMT_1: u8 = 0x6B;
const REG_WHO_AM_I: u8 = 0x75;

const WHO_AM_I_VALUE: u8 = 0x68;
/// Wake up, PLL with X-axis gyro reference.
const PWR_MGMT_1_CLK_PLL_X: u8 = 0x01;
/// ±2 g full scale.
const ACCEL_FS_2G: u8 = 0x00;

const RAD_TO_DEG: f32 = 180.0 / core::f32::consts::PI;

/// MPU-6050 on an async I2C bus.
pub struct Mpu6050<I> {
    i2c: I,
    address: u8,
}

impl<I: I2c> Mpu6050<I> {
    #[must_use]
    pub fn new(i2c: I) -> Self {
        Self::with_address(i2c, DEFAULT_ADDRESS)
    }

    #[must_use]
    pub fn with_address(i2c: I, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Release the bus.
    pub fn release(self) -> I {
        self.i2c
    }

    async fn write_register(&mut self, register: u8, value: u8) -> Result<(), SensorError> {
        self.i2c
            .write(self.address, &[register, value])
            .await
            .map_err(|e| SensorError::from(e.kind()))
    }

    /// Raw accelerometer sample (x, y, z).
    async fn read_accel(&mut self) -> Result<[i16; 3], SensorError> {
        let mut buf = [0u8; 6];
        self.i2c
            .write_read(self.address, &[REG_ACCEL_XOUT_H], &mut buf)
            .await
            .map_err(|e| SensorError::from(e.kind()))?;
        Ok([
            i16::from_be_bytes([buf[0], buf[1]]),
            i16::from_be_bytes([buf[2], buf[3]]),
            i16::from_be_bytes([buf[4], buf[5]]),
        ])
    }
}

/// Tilt angles from a gravity vector; the scale of the sample cancels out.
fn tilt([x, y, z]: [i16; 3]) -> Attitude {
    let (x, y, z) = (f32::from(x), f32::from(y), f32::from(z));
    Attitude {
        pitch: libm::atan2f(-x, libm::sqrtf(y * y + z * z)) * RAD_TO_DEG,
        roll: libm::atan2f(y, z) * RAD_TO_DEG,
    }
}

impl<I: I2c> OrientationSource for Mpu6050<I> {
    async fn initialize(&mut self) -> Result<(), SensorError> {
        self.write_register(REG_PWR_MGMT_1, PWR_MGMT_1_CLK_PLL_X).await?;
        self.write_register(REG_ACCEL_CONFIG, ACCEL_FS_2G).await
    }

    async fn identity_check(&mut self) -> bool {
        let mut id = [0u8; 1];
        match self
            .i2c
            .write_read(self.address, &[REG_WHO_AM_I], &mut id)
            .await
        {
            Ok(()) => id[0] == WHO_AM_I_VALUE,
            Err(_) => false,
        }
    }

    async fn pitch_angle(&mut self) -> Result<f32, SensorError> {
        Ok(self.attitude().await?.pitch)
    }

    async fn roll_angle(&mut self) -> Result<f32, SensorError> {
        Ok(self.attitude().await?.roll)
    }

    async fn attitude(&mut self) -> Result<Attitude, SensorError> {
        let sample = self.read_accel().await?;
        Ok(tilt(sample))
    }
}
