//! Fixed-period control loop: decode → indicate → sense → stabilize → mix → drive.

use embedded_hal_async::delay::DelayNs;
use quad_proto::{Command, DecodeError, RingBuffer};

use crate::command::CommandState;
use crate::config::{FlightConfig, LoopConfig};
use crate::indicator::{indicator_for, IndicatorState};
use crate::mixer::{MotorCommand, MotorMixer};
use crate::orientation::{Attitude, OrientationGate, OrientationSource};
use crate::output::{IndicatorDriver, MotorDriver, MotorShadow, OutputError};
use crate::pid::{Corrections, StabilizationController};

/// Monotonic microsecond clock used to measure PID elapsed time.
pub trait TickSource {
    fn now_us(&self) -> u64;
}

impl<T: TickSource + ?Sized> TickSource for &T {
    fn now_us(&self) -> u64 {
        T::now_us(self)
    }
}

/// Mutable state carried from one control cycle to the next.
#[derive(Clone, Debug)]
pub struct FlightContext {
    pub command: CommandState,
    pub stabilizer: StabilizationController,
    pub motors: MotorShadow,
}

impl FlightContext {
    #[must_use]
    pub fn new(config: &FlightConfig) -> Self {
        Self {
            command: CommandState::new(),
            stabilizer: StabilizationController::new(config.pitch, config.roll),
            motors: MotorShadow::new(),
        }
    }
}

/// What one control cycle saw and did.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CycleReport {
    /// Outcome of decoding this cycle's snapshot.
    pub decode: Result<Command, DecodeError>,
    /// Command acted on (the held one if decoding missed).
    pub command: Command,
    pub indicator: IndicatorState,
    /// `None` if the sensor is absent or the read failed.
    pub attitude: Option<Attitude>,
    pub corrections: Corrections,
    pub motors: MotorCommand,
    /// Number of motor channels actually written.
    pub written: Result<usize, OutputError>,
}

/// Sequences one receive buffer, the orientation source and the output
/// drivers into a periodic control cycle.
///
/// State that survives between cycles lives in [`FlightContext`], which the
/// caller owns and passes to every [`step`](Self::step).
pub struct ControlLoop<'a, const N: usize, O, M, L, C> {
    rx: &'a RingBuffer<N>,
    orientation: OrientationGate<O>,
    motors: M,
    indicator: L,
    clock: C,
    mixer: MotorMixer,
    config: LoopConfig,
}

impl<'a, const N: usize, O, M, L, C> ControlLoop<'a, N, O, M, L, C>
where
    O: OrientationSource,
    M: MotorDriver,
    L: IndicatorDriver,
    C: TickSource,
{
    pub fn new(
        rx: &'a RingBuffer<N>,
        orientation: OrientationGate<O>,
        motors: M,
        indicator: L,
        clock: C,
        config: &FlightConfig,
    ) -> Self {
        Self {
            rx,
            orientation,
            motors,
            indicator,
            clock,
            mixer: MotorMixer::new(config.duty),
            config: config.loop_config,
        }
    }

    /// Wait one period, run one cycle, repeat.
    ///
    /// This method never returns.
    pub async fn run<D: DelayNs>(&mut self, ctx: &mut FlightContext, mut delay: D) -> ! {
        loop {
            delay.delay_ms(self.config.period_ms).await;
            let report = self.step(ctx).await;
            trace!("cycle: {:?}", report);
        }
    }

    /// Run a single control cycle without the leading delay.
    pub async fn step(&mut self, ctx: &mut FlightContext) -> CycleReport {
        let snapshot = self.rx.snapshot();
        let decode = ctx.command.update(&snapshot);
        let command = ctx.command.current();
        debug!(
            "joystick = {:#x}; throttle = {:#x}",
            command.joystick, command.throttle
        );

        let indicator = indicator_for(command.joystick);
        if let Err(e) = self.indicator.show(indicator) {
            warn!("indicator write failed: {:?}", e);
        }

        let attitude = self.orientation.read().await;

        let corrections = match attitude {
            Some(measured) if self.config.stabilization => {
                ctx.stabilizer
                    .update(self.config.setpoint, measured, self.clock.now_us())
            }
            _ => Corrections::ZERO,
        };

        let motors = self.mixer.mix(command.throttle, corrections);
        let written = ctx.motors.apply(&mut self.motors, &motors);
        if let Err(e) = written {
            warn!("motor write failed: {:?}", e);
        }

        CycleReport {
            decode,
            command,
            indicator,
            attitude,
            corrections,
            motors,
            written,
        }
    }

    #[must_use]
    pub fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// Get a reference to the orientation gate.
    pub fn orientation(&self) -> &OrientationGate<O> {
        &self.orientation
    }

    /// Get a reference to the motor driver.
    pub fn motors(&self) -> &M {
        &self.motors
    }

    /// Get a reference to the indicator driver.
    pub fn indicator(&self) -> &L {
        &self.indicator
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::block_on;
    use crate::mixer::MotorChannel;
    use crate::orientation::tests::MockOrientation;
    use crate::orientation::NoSensor;
    use crate::pid::{PidConfig, PidGains};
    use core::cell::Cell;
    use std::vec::Vec;

    #[derive(Default)]
    struct MockMotors {
        writes: Vec<(MotorChannel, u8)>,
    }

    impl MotorDriver for MockMotors {
        fn set_duty(&mut self, channel: MotorChannel, duty: u8) -> Result<(), OutputError> {
            self.writes.push((channel, duty));
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockIndicator {
        shown: Vec<IndicatorState>,
    }

    impl IndicatorDriver for MockIndicator {
        fn show(&mut self, state: IndicatorState) -> Result<(), OutputError> {
            self.shown.push(state);
            Ok(())
        }
    }

    struct MockClock {
        now: Cell<u64>,
    }

    impl MockClock {
        fn new() -> Self {
            Self { now: Cell::new(0) }
        }

        fn advance_ms(&self, ms: u64) {
            self.now.set(self.now.get() + ms * 1000);
        }
    }

    impl TickSource for MockClock {
        fn now_us(&self) -> u64 {
            self.now.get()
        }
    }

    fn proportional_config(stabilization: bool) -> FlightConfig {
        let axis = PidConfig::new(PidGains::new(1.0, 0.0, 0.0), 100.0, 25.0);
        FlightConfig {
            pitch: axis,
            roll: axis,
            ..FlightConfig::DEFAULT
        }
        .with_stabilization(stabilization)
    }

    #[test]
    fn test_end_to_end_unwrapped_frame() {
        let ring: RingBuffer<10> = RingBuffer::new();
        ring.producer()
            .unwrap()
            .push_slice(&[0x23, 0x64, 0x04, 0x2F]);

        let config = FlightConfig::DEFAULT;
        let mut ctx = FlightContext::new(&config);
        let mut control = ControlLoop::new(
            &ring,
            OrientationGate::unavailable(NoSensor),
            MockMotors::default(),
            MockIndicator::default(),
            MockClock::new(),
            &config,
        );

        let report = block_on(control.step(&mut ctx));
        assert_eq!(report.decode, Ok(Command::new(0x64, 0x04)));
        assert_eq!(report.indicator, IndicatorState::rgb(false, true, false));
        assert_eq!(report.corrections, Corrections::ZERO);
        // 0x64 is exactly the top of the percent range.
        assert_eq!(report.motors, MotorCommand::uniform(100));
        assert_eq!(report.written, Ok(4));
        assert_eq!(control.indicator().shown, [IndicatorState::rgb(false, true, false)]);
    }

    #[test]
    fn test_end_to_end_wrapped_frame() {
        let ring: RingBuffer<10> = RingBuffer::new();
        let producer = ring.producer().unwrap();
        producer.push_slice(&[0; 8]);
        producer.push_slice(&[0x23, 0x64, 0x04, 0x2F]);
        let snapshot = ring.snapshot();
        assert_eq!(snapshot[1], 0x2F);
        assert_eq!(snapshot[8], 0x23);

        let config = FlightConfig::DEFAULT;
        let mut ctx = FlightContext::new(&config);
        let mut control = ControlLoop::new(
            &ring,
            OrientationGate::unavailable(NoSensor),
            MockMotors::default(),
            MockIndicator::default(),
            MockClock::new(),
            &config,
        );

        let report = block_on(control.step(&mut ctx));
        assert_eq!(report.command, Command::new(0x64, 0x04));
        assert_eq!(report.indicator, IndicatorState::rgb(false, true, false));
        assert_eq!(report.motors, MotorCommand::uniform(100));
    }

    #[test]
    fn test_decode_miss_holds_command_and_motors() {
        let ring: RingBuffer<10> = RingBuffer::new();
        let producer = ring.producer().unwrap();
        producer.push_slice(&[0x23, 0x28, 0x10, 0x2F]);

        let config = FlightConfig::DEFAULT;
        let mut ctx = FlightContext::new(&config);
        let mut control = ControlLoop::new(
            &ring,
            OrientationGate::unavailable(NoSensor),
            MockMotors::default(),
            MockIndicator::default(),
            MockClock::new(),
            &config,
        );

        let first = block_on(control.step(&mut ctx));
        assert_eq!(first.motors, MotorCommand::uniform(0x28));

        // Line noise wipes every marker out of the buffer.
        producer.push_slice(&[0; 10]);
        let second = block_on(control.step(&mut ctx));
        assert_eq!(second.decode, Err(DecodeError::MissingStart));
        assert_eq!(second.command, first.command);
        assert_eq!(second.indicator, IndicatorState::rgb(false, false, true));
        assert_eq!(second.motors, first.motors);
        // Unchanged duty: nothing was written the second time.
        assert_eq!(second.written, Ok(0));
        assert_eq!(control.motors().writes.len(), 4);
    }

    #[test]
    fn test_stabilization_disabled_ignores_attitude() {
        let ring: RingBuffer<10> = RingBuffer::new();
        ring.producer().unwrap().push_slice(&[0x23, 50, 0x01, 0x2F]);

        let config = proportional_config(false);
        let mut ctx = FlightContext::new(&config);
        let clock = MockClock::new();
        let orientation =
            block_on(OrientationGate::probe(MockOrientation::present(Attitude::new(10.0, 0.0))));
        let mut control = ControlLoop::new(
            &ring,
            orientation,
            MockMotors::default(),
            MockIndicator::default(),
            &clock,
            &config,
        );

        block_on(control.step(&mut ctx));
        clock.advance_ms(50);
        let report = block_on(control.step(&mut ctx));
        // The sensor is still read; its output just isn't used.
        assert_eq!(report.attitude, Some(Attitude::new(10.0, 0.0)));
        assert_eq!(report.corrections, Corrections::ZERO);
        assert_eq!(report.motors, MotorCommand::uniform(50));
    }

    #[test]
    fn test_stabilization_corrects_pitch() {
        let ring: RingBuffer<10> = RingBuffer::new();
        ring.producer().unwrap().push_slice(&[0x23, 50, 0x01, 0x2F]);

        let config = proportional_config(true);
        let mut ctx = FlightContext::new(&config);
        let clock = MockClock::new();
        let orientation =
            block_on(OrientationGate::probe(MockOrientation::present(Attitude::new(10.0, -4.0))));
        let mut control = ControlLoop::new(
            &ring,
            orientation,
            MockMotors::default(),
            MockIndicator::default(),
            &clock,
            &config,
        );

        // First cycle only establishes the PID timestamp.
        let first = block_on(control.step(&mut ctx));
        assert_eq!(first.corrections, Corrections::ZERO);

        clock.advance_ms(50);
        let report = block_on(control.step(&mut ctx));
        assert_eq!(
            report.motors,
            MotorCommand {
                front: 40,
                back: 60,
                left: 54,
                right: 46,
            }
        );
    }

    #[test]
    fn test_absent_sensor_gives_zero_corrections() {
        let ring: RingBuffer<10> = RingBuffer::new();
        ring.producer().unwrap().push_slice(&[0x23, 30, 0x80, 0x2F]);

        let config = proportional_config(true);
        let mut ctx = FlightContext::new(&config);
        let clock = MockClock::new();
        let orientation = block_on(OrientationGate::probe(MockOrientation::absent()));
        let mut control = ControlLoop::new(
            &ring,
            orientation,
            MockMotors::default(),
            MockIndicator::default(),
            &clock,
            &config,
        );

        block_on(control.step(&mut ctx));
        clock.advance_ms(50);
        let report = block_on(control.step(&mut ctx));
        assert_eq!(report.attitude, None);
        assert_eq!(report.corrections, Corrections::ZERO);
        assert_eq!(report.motors, MotorCommand::uniform(30));
        assert_eq!(report.indicator, IndicatorState::rgb(true, false, true));
        assert_eq!(control.orientation().source().reads, 0);
    }

    #[test]
    fn test_empty_buffer_keeps_motors_stopped() {
        let ring: RingBuffer<10> = RingBuffer::new();
        let config = FlightConfig::DEFAULT;
        let mut ctx = FlightContext::new(&config);
        let mut control = ControlLoop::new(
            &ring,
            OrientationGate::unavailable(NoSensor),
            MockMotors::default(),
            MockIndicator::default(),
            MockClock::new(),
            &config,
        );

        let report = block_on(control.step(&mut ctx));
        assert!(report.decode.is_err());
        assert_eq!(report.motors, MotorCommand::STOPPED);
        assert_eq!(report.indicator, IndicatorState::OFF);
    }
}
