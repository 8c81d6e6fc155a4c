use super::{engine_with, program_from_json};
use crate::hardware::{MotorSide, PinFunction};
use crate::vm::{Program, RuntimeNode, ValueRef};

#[test]
fn forever_analog_write_drives_the_left_motor() {
    let program = program_from_json(
        r#"{"roots":[{"type":"forever","body":[{"type":"analogWrite","pin":9,"value":200}]}]}"#,
    );
    let mut engine = engine_with(program);
    engine.tick();

    let motors = engine.hardware().motors().unwrap();
    assert_eq!(motors.pwm(PinFunction::LeftMotorForward), 200.0);
    assert!((motors.speed(MotorSide::Left) - 200.0 / 255.0).abs() < 1e-9);
}

#[test]
fn false_pin_condition_invokes_no_motion_primitive() {
    let program = program_from_json(
        r#"{"roots":[{"type":"if","pin":3,"body":[{"type":"forward","number":1}]}]}"#,
    );
    let mut engine = engine_with(program);
    engine.tick();

    let report = engine.hardware().motor_report();
    assert_eq!(report.left_speed, 0.0);
    assert_eq!(report.right_speed, 0.0);
}

#[test]
fn true_pin_condition_runs_the_body() {
    let program = program_from_json(
        r#"{"roots":[{"type":"if","pin":3,"body":[{"type":"forward","number":1}]}]}"#,
    );
    let mut engine = engine_with(program);
    engine
        .hardware_mut()
        .sensors_mut()
        .unwrap()
        .set_digital(PinFunction::RightSensor, true);
    engine.tick();

    let report = engine.hardware().motor_report();
    assert_eq!(report.left_speed, 1.0);
    assert_eq!(report.right_speed, 1.0);
}

#[test]
fn call_binds_its_argument_to_the_parameter() {
    let program = program_from_json(
        r#"{"roots":[
            {"type":"functionDefine","functionName":"Turn","parameter":"speed",
             "body":[{"type":"analogWrite","pin":10,"value":"speed"}]},
            {"type":"functionCall","functionName":"Turn","number":150}
        ]}"#,
    );
    let mut engine = engine_with(program);
    engine.tick();

    let motors = engine.hardware().motors().unwrap();
    assert_eq!(motors.pwm(PinFunction::RightMotorForward), 150.0);
}

#[test]
fn unresolved_calls_leave_the_actuators_untouched() {
    let program = program_from_json(
        r#"{"roots":[{"type":"functionCall","functionName":"Missing","number":150}]}"#,
    );
    let mut engine = engine_with(program);
    engine.tick();

    let report = engine.hardware().motor_report();
    assert_eq!(report.left_speed, 0.0);
    assert_eq!(report.right_speed, 0.0);
}

#[test]
fn omitted_fields_read_as_their_zero_values() {
    let program = program_from_json(r#"{"roots":[{"type":"forward"}]}"#);
    assert_eq!(program.roots[0], RuntimeNode::Forward { speed: 0.0 });

    let program = program_from_json(r#"{"roots":[{"type":"analogWrite","pin":9}]}"#);
    assert_eq!(
        program.roots[0],
        RuntimeNode::AnalogWrite {
            pin: 9,
            value: ValueRef::Literal(0.0),
        }
    );
}

#[test]
fn program_json_round_trips() {
    let program = program_from_json(
        r#"{"roots":[
            {"type":"functionDefine","functionName":"Turn","parameter":"speed",
             "body":[{"type":"analogWrite","pin":10,"value":"speed"}]},
            {"type":"forever","body":[
                {"type":"ifElse","conditionVar":"armed",
                 "body":[{"type":"functionCall","functionName":"Turn","number":150}],
                 "elseBody":[{"type":"stop"}]},
                {"type":"repeat","number":3,"body":[{"type":"wait","number":1}]}
            ]}
        ],
        "variables":{"armed":1.0}}"#,
    );
    let json = program.to_json().unwrap();
    assert_eq!(Program::from_json(&json).unwrap(), program);
}
