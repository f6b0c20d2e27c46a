//! Ramp a DC motor through an H-bridge and log its speed every 10ms.
//!
//! Wiring: H-bridge IN1/IN2 on pins 6/7, enable (PWM) on pin 5,
//! encoder channel A on pin 3 and channel B on pin 2.
#![no_std]
#![no_main]
use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::{
    gpio::{Input, Level, Output, Pull},
    pwm::{Config, Pwm, SetDutyCycle},
};
use embassy_time::{Instant, Timer};
use speed_estimator::{Direction, SharedPulseCounter, SpeedEstimator, SystemClock};
use {defmt_rtt as _, panic_probe as _};

//NOTE: Change these to match your motor.
const PULSES_PER_REVOLUTION: f32 = 22.0;
const GEAR_RATIO: f32 = 9.3;

static PULSES: SharedPulseCounter = SharedPulseCounter::new(0);

/// Count rising edges of channel A, using channel B to tell the direction.
#[embassy_executor::task]
async fn count_pulses(mut channel_a: Input<'static>, channel_b: Input<'static>) {
    loop {
        channel_a.wait_for_rising_edge().await;
        if channel_b.is_high() {
            PULSES.record(Direction::CounterClockwise);
        } else {
            PULSES.record(Direction::Clockwise);
        }
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Default::default());

    let _in1 = Output::new(p.PIN_6, Level::High);
    let _in2 = Output::new(p.PIN_7, Level::Low);

    let mut config = Config::default();
    config.top = 255;
    let mut pwm = Pwm::new_output_b(p.PWM_SLICE2, p.PIN_5, config);
    pwm.set_duty_cycle_fully_off().unwrap();

    let channel_a = Input::new(p.PIN_3, Pull::Up);
    let channel_b = Input::new(p.PIN_2, Pull::Up);
    unwrap!(spawner.spawn(count_pulses(channel_a, channel_b)));

    let mut estimator: SpeedEstimator<_> =
        SpeedEstimator::new(SystemClock, PULSES_PER_REVOLUTION, GEAR_RATIO);
    estimator.reset();

    loop {
        // Sweep the duty cycle over and over to have something to measure.
        let duty = (Instant::now().as_millis() / 10 % 256) as u16;
        pwm.set_duty_cycle_fraction(duty, 255).unwrap();

        let rpm = estimator.estimate_speed(PULSES.snapshot());
        info!("duty {} speed {} rpm", duty, rpm);

        Timer::after_millis(10).await;
    }
}
