//! Orientation (pitch/roll) source trait and its startup availability gate.

use core::future::Future;

pub mod mpu6050;

pub use mpu6050::Mpu6050;

/// Pitch and roll angles in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Attitude {
    pub pitch: f32,
    pub roll: f32,
}

impl Attitude {
    pub const LEVEL: Self = Self {
        pitch: 0.0,
        roll: 0.0,
    };

    #[must_use]
    pub const fn new(pitch: f32, roll: f32) -> Self {
        Self { pitch, roll }
    }
}

/// Error type for orientation reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SensorError {
    /// Bus transaction failed.
    Bus,
    /// No sensor answered the identity check.
    NotPresent,
}

impl From<embedded_hal_async::i2c::ErrorKind> for SensorError {
    fn from(_: embedded_hal_async::i2c::ErrorKind) -> Self {
        Self::Bus
    }
}

/// Async trait for inertial angle estimators.
///
/// # `no_std` Compatibility
///
/// All implementations must be `#![no_std]` compatible with no heap allocation.
pub trait OrientationSource {
    /// Bring the sensor out of reset into measurement mode.
    fn initialize(&mut self) -> impl Future<Output = Result<(), SensorError>>;

    /// Check that the expected device is present.
    ///
    /// Bus errors count as "not present".
    fn identity_check(&mut self) -> impl Future<Output = bool>;

    /// Current pitch angle in degrees.
    fn pitch_angle(&mut self) -> impl Future<Output = Result<f32, SensorError>>;

    /// Current roll angle in degrees.
    fn roll_angle(&mut self) -> impl Future<Output = Result<f32, SensorError>>;

    /// Both angles. Sensors that can read them in one transaction should
    /// override this.
    fn attitude(&mut self) -> impl Future<Output = Result<Attitude, SensorError>> {
        async move {
            let pitch = self.pitch_angle().await?;
            let roll = self.roll_angle().await?;
            Ok(Attitude { pitch, roll })
        }
    }
}

/// Placeholder source for boards without an inertial sensor.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoSensor;

impl OrientationSource for NoSensor {
    async fn initialize(&mut self) -> Result<(), SensorError> {
        Err(SensorError::NotPresent)
    }

    async fn identity_check(&mut self) -> bool {
        false
    }

    async fn pitch_angle(&mut self) -> Result<f32, SensorError> {
        Err(SensorError::NotPresent)
    }

    async fn roll_angle(&mut self) -> Result<f32, SensorError> {
        Err(SensorError::NotPresent)
    }
}

/// Orientation source with its availability decided once at startup.
///
/// An absent sensor is never probed again; reads are skipped for the rest
/// of the process lifetime.
pub struct OrientationGate<O> {
    source: O,
    available: bool,
}

impl<O: OrientationSource> OrientationGate<O> {
    /// Run the identity check and, if it passes, initialize the sensor.
    pub async fn probe(mut source: O) -> Self {
        let available = if source.identity_check().await {
            match source.initialize().await {
                Ok(()) => true,
                Err(e) => {
                    warn!("orientation sensor init failed: {:?}", e);
                    false
                }
            }
        } else {
            false
        };
        info!("orientation sensor available: {}", available);
        Self { source, available }
    }

    /// Wrap a source that is known to be absent.
    #[must_use]
    pub fn unavailable(source: O) -> Self {
        Self {
            source,
            available: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Read the attitude if the sensor is available.
    ///
    /// A failed read is logged and reported as `None` for this cycle only.
    pub async fn read(&mut self) -> Option<Attitude> {
        if !self.available {
            return None;
        }
        match self.source.attitude().await {
            Ok(attitude) => Some(attitude),
            Err(e) => {
                warn!("orientation read failed: {:?}", e);
                None
            }
        }
    }

    /// Get a reference to the underlying source.
    pub fn source(&self) -> &O {
        &self.source
    }

    /// Get a mutable reference to the underlying source.
    pub fn source_mut(&mut self) -> &mut O {
        &mut self.source
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::block_on;

    /// Scripted source for tests.
    pub(crate) struct MockOrientation {
        pub present: bool,
        pub init_ok: bool,
        pub attitude: Result<Attitude, SensorError>,
        pub initialized: bool,
        pub reads: usize,
    }

    impl MockOrientation {
        pub(crate) fn present(attitude: Attitude) -> Self {
            Self {
                present: true,
                init_ok: true,
                attitude: Ok(attitude),
                initialized: false,
                reads: 0,
            }
        }

        pub(crate) fn absent() -> Self {
            Self {
                present: false,
                ..Self::present(Attitude::LEVEL)
            }
        }
    }

    impl OrientationSource for MockOrientation {
        async fn initialize(&mut self) -> Result<(), SensorError> {
            if self.init_ok {
                self.initialized = true;
                Ok(())
            } else {
                Err(SensorError::Bus)
            }
        }

        async fn identity_check(&mut self) -> bool {
            self.present
        }

        async fn pitch_angle(&mut self) -> Result<f32, SensorError> {
            self.reads += 1;
            self.attitude.map(|a| a.pitch)
        }

        async fn roll_angle(&mut self) -> Result<f32, SensorError> {
            self.reads += 1;
            self.attitude.map(|a| a.roll)
        }
    }

    #[test]
    fn test_probe_present_sensor() {
        let gate = block_on(OrientationGate::probe(MockOrientation::present(Attitude::LEVEL)));
        assert!(gate.is_available());
        assert!(gate.source().initialized);
    }

    #[test]
    fn test_probe_absent_sensor_skips_init() {
        let gate = block_on(OrientationGate::probe(MockOrientation::absent()));
        assert!(!gate.is_available());
        assert!(!gate.source().initialized);
    }

    #[test]
    fn test_probe_failed_init_is_unavailable() {
        let mut source = MockOrientation::present(Attitude::LEVEL);
        source.init_ok = false;
        let gate = block_on(OrientationGate::probe(source));
        assert!(!gate.is_available());
    }

    #[test]
    fn test_read_uses_default_attitude() {
        let mut gate =
            block_on(OrientationGate::probe(MockOrientation::present(Attitude::new(3.0, -2.0))));
        assert_eq!(block_on(gate.read()), Some(Attitude::new(3.0, -2.0)));
        assert_eq!(gate.source().reads, 2);
    }

    #[test]
    fn test_absent_sensor_is_never_read() {
        let mut gate = block_on(OrientationGate::probe(MockOrientation::absent()));
        assert_eq!(block_on(gate.read()), None);
        assert_eq!(gate.source().reads, 0);
    }

    #[test]
    fn test_failed_read_is_skipped() {
        let mut gate = block_on(OrientationGate::probe(MockOrientation::present(Attitude::LEVEL)));
        gate.source_mut().attitude = Err(SensorError::Bus);
        assert_eq!(block_on(gate.read()), None);
        // Still available; the next cycle tries again.
        assert!(gate.is_available());
    }

    #[test]
    fn test_no_sensor() {
        let mut gate = block_on(OrientationGate::probe(NoSensor));
        assert!(!gate.is_available());
        assert_eq!(block_on(gate.read()), None);
    }
}
