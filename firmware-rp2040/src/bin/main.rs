#![no_std]
#![no_main]

use defmt::info;
use defmt_rtt as _;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Level, Output};
use embassy_rp::i2c::{self, I2c};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_rp::peripherals::{I2C0, UART1};
use embassy_rp::pwm::{self, Pwm};
use embassy_rp::uart::{self, UartRx};
use embassy_time::Delay;
use quadcopter_rp2040::{
    flight_config, led_polarity, ControlLoop, EmbassyClock, FlightContext, Mpu6050,
    OrientationGate, Polarity, PwmMotors, RgbLed, RingBuffer, SerialReceiver, RX_BUFFER_CAPACITY,
    SERIAL_BAUDRATE,
};

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    UART1_IRQ => uart::InterruptHandler<UART1>;
    I2C0_IRQ => i2c::InterruptHandler<I2C0>;
});

/// PWM counter wrap value; 125 MHz / 5000 = 25 kHz motor PWM.
const PWM_TOP: u16 = 4_999;

/// Bytes from the command link, written by the receive task only.
static RX_BUFFER: RingBuffer<RX_BUFFER_CAPACITY> = RingBuffer::new();

/// Runs the receive task above the control loop's priority.
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    unsafe { EXECUTOR_HIGH.on_interrupt() }
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Quadcopter flight controller starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());
    let config = flight_config();

    // --- Command link ---
    let mut uart_config = uart::Config::default();
    uart_config.baudrate = SERIAL_BAUDRATE;
    let uart_rx = UartRx::new(p.UART1, p.PIN_9, Irqs, p.DMA_CH0, uart_config);

    let producer = RX_BUFFER.producer().unwrap();
    interrupt::SWI_IRQ_1.set_priority(Priority::P2);
    let rx_spawner = EXECUTOR_HIGH.start(interrupt::SWI_IRQ_1);
    rx_spawner.spawn(serial_rx_task(SerialReceiver::new(uart_rx, producer)).unwrap());

    // --- Motors ---
    let mut pwm_config = pwm::Config::default();
    pwm_config.top = PWM_TOP;
    let (front, back) =
        Pwm::new_output_ab(p.PWM_SLICE1, p.PIN_2, p.PIN_3, pwm_config.clone()).split();
    let (left, right) =
        Pwm::new_output_ab(p.PWM_SLICE2, p.PIN_4, p.PIN_5, pwm_config).split();
    let motors = PwmMotors::new(front.unwrap(), back.unwrap(), left.unwrap(), right.unwrap());

    // --- Indicator ---
    let polarity = led_polarity();
    let off = match polarity {
        Polarity::ActiveHigh => Level::Low,
        Polarity::ActiveLow => Level::High,
    };
    let led = RgbLed::new(
        Output::new(p.PIN_6, off),
        Output::new(p.PIN_7, off),
        Output::new(p.PIN_8, off),
        polarity,
    );

    // --- Orientation sensor ---
    let i2c = I2c::new_async(p.I2C0, p.PIN_17, p.PIN_16, Irqs, i2c::Config::default());
    let orientation = OrientationGate::probe(Mpu6050::new(i2c)).await;

    let mut ctx = FlightContext::new(&config);
    let mut control = ControlLoop::new(
        &RX_BUFFER,
        orientation,
        motors,
        led,
        EmbassyClock,
        &config,
    );

    info!(
        "Flight controller initialized (stabilization: {}), waiting for commands...",
        config.loop_config.stabilization
    );
    control.run(&mut ctx, Delay).await
}

/// Receive task - pushes every UART byte into the command ring buffer.
#[embassy_executor::task]
async fn serial_rx_task(mut receiver: SerialReceiver<'static, 'static, RX_BUFFER_CAPACITY>) {
    receiver.run().await
}
