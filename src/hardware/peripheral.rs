//! Peripheral capability providers: the motor driver and the sensor bank.

use super::PWM_SCALE;
use super::pin_map::PinFunction;
use crate::log_warn;

/// The capability contract every peripheral provides. The engine and the
/// pin router only ever talk to peripherals through these four calls.
pub trait Peripheral {
    fn supported_functions(&self) -> &'static [PinFunction];
    fn write(&mut self, function: PinFunction, value: f64);
    fn read_digital(&self, function: PinFunction) -> bool;
    fn read_analog(&self, function: PinFunction) -> f64;
}

/// Which motor a function addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorSide {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, Default)]
struct MotorChannel {
    forward_pwm: f64,
    backward_pwm: f64,
}

impl MotorChannel {
    /// Normalized speed: `(forward - backward) / 255`, clamped to [-1, 1].
    fn speed(&self) -> f64 {
        ((self.forward_pwm - self.backward_pwm) / PWM_SCALE).clamp(-1.0, 1.0)
    }
}

/// The H-bridge motor driver for both wheels.
///
/// Mutual exclusion: a positive PWM on a motor's forward function zeroes
/// that motor's backward PWM, and vice versa. An H-bridge cannot drive
/// both directions at once.
#[derive(Debug, Clone, Default)]
pub struct MotorDriver {
    left: MotorChannel,
    right: MotorChannel,
}

const MOTOR_FUNCTIONS: [PinFunction; 4] = [
    PinFunction::LeftMotorForward,
    PinFunction::LeftMotorBackward,
    PinFunction::RightMotorForward,
    PinFunction::RightMotorBackward,
];

impl MotorDriver {
    pub fn new() -> MotorDriver {
        MotorDriver::default()
    }

    fn channel(&self, side: MotorSide) -> &MotorChannel {
        match side {
            MotorSide::Left => &self.left,
            MotorSide::Right => &self.right,
        }
    }

    fn channel_mut(&mut self, side: MotorSide) -> &mut MotorChannel {
        match side {
            MotorSide::Left => &mut self.left,
            MotorSide::Right => &mut self.right,
        }
    }

    /// Normalized speed of one motor, in [-1, 1].
    pub fn speed(&self, side: MotorSide) -> f64 {
        self.channel(side).speed()
    }

    /// The PWM currently applied to one motor function.
    pub fn pwm(&self, function: PinFunction) -> f64 {
        match function {
            PinFunction::LeftMotorForward => self.left.forward_pwm,
            PinFunction::LeftMotorBackward => self.left.backward_pwm,
            PinFunction::RightMotorForward => self.right.forward_pwm,
            PinFunction::RightMotorBackward => self.right.backward_pwm,
            _ => 0.0,
        }
    }

    /// Zeroes every PWM on both motors.
    pub fn stop_all(&mut self) {
        self.left = MotorChannel::default();
        self.right = MotorChannel::default();
    }
}

impl Peripheral for MotorDriver {
    fn supported_functions(&self) -> &'static [PinFunction] {
        &MOTOR_FUNCTIONS
    }

    fn write(&mut self, function: PinFunction, value: f64) {
        let pwm = value.clamp(0.0, PWM_SCALE);
        let (side, forward) = match function {
            PinFunction::LeftMotorForward => (MotorSide::Left, true),
            PinFunction::LeftMotorBackward => (MotorSide::Left, false),
            PinFunction::RightMotorForward => (MotorSide::Right, true),
            PinFunction::RightMotorBackward => (MotorSide::Right, false),
            _ => {
                log_warn!("Motor driver cannot handle '{}'", function);
                return;
            }
        };
        let channel = self.channel_mut(side);
        if forward {
            channel.forward_pwm = pwm;
            if pwm > 0.0 {
                channel.backward_pwm = 0.0;
            }
        } else {
            channel.backward_pwm = pwm;
            if pwm > 0.0 {
                channel.forward_pwm = 0.0;
            }
        }
    }

    fn read_digital(&self, function: PinFunction) -> bool {
        self.pwm(function) > 0.0
    }

    fn read_analog(&self, function: PinFunction) -> f64 {
        self.pwm(function)
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct SensorChannel {
    digital: bool,
    analog: f64,
}

/// The line/obstacle sensor pair. Values are scripted by the embedding
/// driver or by tests, which keeps runs deterministic and replayable.
#[derive(Debug, Clone, Default)]
pub struct SensorBank {
    left: SensorChannel,
    right: SensorChannel,
}

const SENSOR_FUNCTIONS: [PinFunction; 2] = [PinFunction::LeftSensor, PinFunction::RightSensor];

impl SensorBank {
    pub fn new() -> SensorBank {
        SensorBank::default()
    }

    fn channel_mut(&mut self, function: PinFunction) -> Option<&mut SensorChannel> {
        match function {
            PinFunction::LeftSensor => Some(&mut self.left),
            PinFunction::RightSensor => Some(&mut self.right),
            _ => None,
        }
    }

    fn channel(&self, function: PinFunction) -> Option<&SensorChannel> {
        match function {
            PinFunction::LeftSensor => Some(&self.left),
            PinFunction::RightSensor => Some(&self.right),
            _ => None,
        }
    }

    /// Scripts a sensor's digital value.
    pub fn set_digital(&mut self, function: PinFunction, value: bool) {
        if let Some(channel) = self.channel_mut(function) {
            channel.digital = value;
        }
    }

    /// Scripts a sensor's analog value.
    pub fn set_analog(&mut self, function: PinFunction, value: f64) {
        if let Some(channel) = self.channel_mut(function) {
            channel.analog = value;
        }
    }
}

impl Peripheral for SensorBank {
    fn supported_functions(&self) -> &'static [PinFunction] {
        &SENSOR_FUNCTIONS
    }

    fn write(&mut self, function: PinFunction, _value: f64) {
        log_warn!("Sensor '{}' is not writable, dropping", function);
    }

    fn read_digital(&self, function: PinFunction) -> bool {
        self.channel(function).map(|c| c.digital).unwrap_or(false)
    }

    fn read_analog(&self, function: PinFunction) -> f64 {
        self.channel(function).map(|c| c.analog).unwrap_or(0.0)
    }
}

/// The closed registry of peripheral devices, dispatching the capability
/// contract to the concrete providers.
#[derive(Debug)]
pub enum PeripheralDevice {
    Motors(MotorDriver),
    Sensors(SensorBank),
}

impl Peripheral for PeripheralDevice {
    fn supported_functions(&self) -> &'static [PinFunction] {
        match self {
            PeripheralDevice::Motors(m) => m.supported_functions(),
            PeripheralDevice::Sensors(s) => s.supported_functions(),
        }
    }

    fn write(&mut self, function: PinFunction, value: f64) {
        match self {
            PeripheralDevice::Motors(m) => m.write(function, value),
            PeripheralDevice::Sensors(s) => s.write(function, value),
        }
    }

    fn read_digital(&self, function: PinFunction) -> bool {
        match self {
            PeripheralDevice::Motors(m) => m.read_digital(function),
            PeripheralDevice::Sensors(s) => s.read_digital(function),
        }
    }

    fn read_analog(&self, function: PinFunction) -> f64 {
        match self {
            PeripheralDevice::Motors(m) => m.read_analog(function),
            PeripheralDevice::Sensors(s) => s.read_analog(function),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn h_bridge_mutual_exclusion() {
        let mut motors = MotorDriver::new();
        motors.write(PinFunction::LeftMotorForward, 200.0);
        motors.write(PinFunction::LeftMotorBackward, 100.0);
        assert_eq!(motors.pwm(PinFunction::LeftMotorForward), 0.0);
        assert_eq!(motors.pwm(PinFunction::LeftMotorBackward), 100.0);
        assert!((motors.speed(MotorSide::Left) + 100.0 / 255.0).abs() < 1e-9);
    }

    #[test]
    fn zero_write_does_not_clear_the_opposite_direction() {
        let mut motors = MotorDriver::new();
        motors.write(PinFunction::RightMotorForward, 180.0);
        motors.write(PinFunction::RightMotorBackward, 0.0);
        assert_eq!(motors.pwm(PinFunction::RightMotorForward), 180.0);
    }

    #[test]
    fn pwm_is_clamped_to_full_scale() {
        let mut motors = MotorDriver::new();
        motors.write(PinFunction::LeftMotorForward, 1000.0);
        assert_eq!(motors.pwm(PinFunction::LeftMotorForward), 255.0);
        assert_eq!(motors.speed(MotorSide::Left), 1.0);
    }

    #[test]
    fn sensors_are_scripted() {
        let mut sensors = SensorBank::new();
        assert!(!sensors.read_digital(PinFunction::LeftSensor));
        sensors.set_digital(PinFunction::LeftSensor, true);
        assert!(sensors.read_digital(PinFunction::LeftSensor));
        sensors.set_analog(PinFunction::RightSensor, 0.75);
        assert_eq!(sensors.read_analog(PinFunction::RightSensor), 0.75);
    }
}
