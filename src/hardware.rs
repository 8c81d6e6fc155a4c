//! The hardware abstraction: routes numbered pins to named peripheral
//! capabilities and lets the routing be inferred from a running program's
//! variables instead of hard-coded.
//!
//! The engine only ever calls the four peripheral primitives (`write`,
//! `read_digital`, `read_analog`, plus the H-bridge bookkeeping inside the
//! motor driver) and the motion primitives; it never reaches into a
//! peripheral's fields.

use serde::{Deserialize, Serialize};

use crate::log_warn;
use crate::variable::VariableStore;

pub mod peripheral;
pub mod pin_map;

pub use peripheral::{MotorDriver, MotorSide, Peripheral, PeripheralDevice, SensorBank};
pub use pin_map::{DEFAULT_PIN_MAP, PinFunction, PinMap};

/// Differential PWM applied by the spin-turn motion primitives.
const TURN_PWM: f64 = 200.0;
/// Full-scale PWM for a normalized motion speed of 1.0.
pub const PWM_SCALE: f64 = 255.0;

/// The pin-addressed hardware layer: a live pin map plus the registered
/// peripherals.
#[derive(Debug)]
pub struct Hardware {
    pin_map: PinMap,
    peripherals: Vec<PeripheralDevice>,
    /// Sequence of dispatched pin writes, recorded for the determinism
    /// tests.
    #[cfg(test)]
    pub(crate) write_trace: Vec<(u8, f64)>,
}

impl Hardware {
    /// Creates the simulated vehicle hardware: the default pin map, a motor
    /// driver and a sensor bank.
    pub fn new() -> Hardware {
        Hardware {
            pin_map: PinMap::new(),
            peripherals: vec![
                PeripheralDevice::Motors(MotorDriver::new()),
                PeripheralDevice::Sensors(SensorBank::new()),
            ],
            #[cfg(test)]
            write_trace: Vec::new(),
        }
    }

    pub fn pin_map(&self) -> &PinMap {
        &self.pin_map
    }

    pub fn pin_map_mut(&mut self) -> &mut PinMap {
        &mut self.pin_map
    }

    /// Re-derives the live pin mapping from a program's variable snapshot.
    /// See [`PinMap::remap_from_variables`].
    pub fn remap_from_variables(&mut self, variables: &VariableStore) {
        self.pin_map.remap_from_variables(variables);
    }

    fn peripheral_for(&mut self, function: PinFunction) -> Option<&mut PeripheralDevice> {
        self.peripherals
            .iter_mut()
            .find(|p| p.supported_functions().contains(&function))
    }

    /// Writes an analog (PWM) value to a pin. An unmapped pin drops the
    /// write with a diagnostic.
    pub fn analog_write(&mut self, pin: u8, value: f64) {
        let Some(function) = self.pin_map.function_for(pin) else {
            log_warn!("Analog write to unmapped pin {}, dropping", pin);
            return;
        };
        let Some(peripheral) = self.peripheral_for(function) else {
            log_warn!("No peripheral handles '{}', dropping write", function);
            return;
        };
        peripheral.write(function, value);
        #[cfg(test)]
        self.write_trace.push((pin, value));
    }

    /// Reads a pin as a digital value. An unmapped pin reads false with a
    /// diagnostic.
    pub fn digital_read(&mut self, pin: u8) -> bool {
        let Some(function) = self.pin_map.function_for(pin) else {
            log_warn!("Digital read from unmapped pin {}, returning false", pin);
            return false;
        };
        match self.peripheral_for(function) {
            Some(peripheral) => peripheral.read_digital(function),
            None => {
                log_warn!("No peripheral handles '{}', returning false", function);
                false
            }
        }
    }

    /// Reads a pin as an analog value. An unmapped pin reads 0.
    pub fn analog_read(&mut self, pin: u8) -> f64 {
        let Some(function) = self.pin_map.function_for(pin) else {
            log_warn!("Analog read from unmapped pin {}, returning 0", pin);
            return 0.0;
        };
        match self.peripheral_for(function) {
            Some(peripheral) => peripheral.read_analog(function),
            None => 0.0,
        }
    }

    /// Drives both motors forward at a normalized speed (1.0 = full PWM).
    pub fn move_forward(&mut self, speed: f64) {
        let pwm = (speed.abs() * PWM_SCALE).clamp(0.0, PWM_SCALE);
        if let Some(motors) = self.motors_mut() {
            motors.write(PinFunction::LeftMotorForward, pwm);
            motors.write(PinFunction::RightMotorForward, pwm);
        }
    }

    /// Spins in place to the left. The angle is the caller's business (pose
    /// integration lives outside this layer); the motors get a fixed
    /// differential PWM.
    pub fn turn_left(&mut self, angle: f64) {
        crate::log_debug!("Turning left {} degrees", angle);
        if let Some(motors) = self.motors_mut() {
            motors.write(PinFunction::LeftMotorBackward, TURN_PWM);
            motors.write(PinFunction::RightMotorForward, TURN_PWM);
        }
    }

    /// Spins in place to the right.
    pub fn turn_right(&mut self, angle: f64) {
        crate::log_debug!("Turning right {} degrees", angle);
        if let Some(motors) = self.motors_mut() {
            motors.write(PinFunction::LeftMotorForward, TURN_PWM);
            motors.write(PinFunction::RightMotorBackward, TURN_PWM);
        }
    }

    /// Zeroes every motor PWM. Idempotent.
    pub fn stop(&mut self) {
        if let Some(motors) = self.motors_mut() {
            motors.stop_all();
        }
    }

    pub fn motors(&self) -> Option<&MotorDriver> {
        self.peripherals.iter().find_map(|p| match p {
            PeripheralDevice::Motors(m) => Some(m),
            _ => None,
        })
    }

    pub fn motors_mut(&mut self) -> Option<&mut MotorDriver> {
        self.peripherals.iter_mut().find_map(|p| match p {
            PeripheralDevice::Motors(m) => Some(m),
            _ => None,
        })
    }

    pub fn sensors_mut(&mut self) -> Option<&mut SensorBank> {
        self.peripherals.iter_mut().find_map(|p| match p {
            PeripheralDevice::Sensors(s) => Some(s),
            _ => None,
        })
    }

    /// A snapshot of the actuator state for reporting.
    pub fn motor_report(&self) -> MotorReport {
        match self.motors() {
            Some(motors) => MotorReport {
                left_speed: motors.speed(MotorSide::Left),
                right_speed: motors.speed(MotorSide::Right),
            },
            None => MotorReport::default(),
        }
    }
}

impl Default for Hardware {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalized motor speeds in [-1, 1], for the simulator's status output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MotorReport {
    pub left_speed: f64,
    pub right_speed: f64,
}
