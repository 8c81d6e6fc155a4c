//! Function definition and call behavior, exercised through the whole
//! pipeline: block tree → text → lowering → engine.

use super::{engine_with, program_from_json};
use crate::blocks::BlockDocument;
use crate::blocks::testkit::*;
use crate::compiler;
use crate::hardware::PinFunction;
use crate::serializer;
use crate::variable::VariableStore;

#[test]
fn calls_resolve_even_when_the_text_places_them_first() {
    let definition = define("Turn", Some("speed"), vec![analog_write("10", "speed")]);
    let id = definition.define_id.clone().unwrap();
    let authored = BlockDocument {
        blocks: vec![forever(vec![call(&id, "150")]), definition],
    };

    let mut document = BlockDocument::new();
    let mut registry = VariableStore::new();
    serializer::deserialize(&serializer::serialize(&authored), &mut document, &mut registry);

    let mut engine = engine_with(compiler::lower_document(&document));
    engine.tick();

    let motors = engine.hardware().motors().unwrap();
    assert_eq!(motors.pwm(PinFunction::RightMotorForward), 150.0);
}

#[test]
fn each_call_gets_a_fresh_binding() {
    let program = program_from_json(
        r#"{"roots":[
            {"type":"functionDefine","functionName":"Write","parameter":"level",
             "body":[{"type":"analogWrite","pin":9,"value":"level"}]},
            {"type":"functionCall","functionName":"Write","number":80},
            {"type":"functionCall","functionName":"Write","number":30}
        ]}"#,
    );
    let mut engine = engine_with(program);
    engine.tick();
    assert_eq!(engine.hardware().write_trace, vec![(9, 80.0), (9, 30.0)]);
}

#[test]
fn callee_does_not_see_the_caller_scope() {
    // Outer binds `level`; Inner references it without declaring it, so the
    // read degrades to 0; there are no closures.
    let program = program_from_json(
        r#"{"roots":[
            {"type":"functionDefine","functionName":"Inner",
             "body":[{"type":"analogWrite","pin":9,"value":"level"}]},
            {"type":"functionDefine","functionName":"Outer","parameter":"level",
             "body":[{"type":"functionCall","functionName":"Inner","number":0}]},
            {"type":"functionCall","functionName":"Outer","number":200}
        ]}"#,
    );
    let mut engine = engine_with(program);
    engine.tick();
    assert_eq!(engine.hardware().write_trace, vec![(9, 0.0)]);
}

#[test]
fn parameter_shadows_a_global_of_the_same_name() {
    let program = program_from_json(
        r#"{"roots":[
            {"type":"functionDefine","functionName":"Write","parameter":"level",
             "body":[{"type":"analogWrite","pin":9,"value":"level"}]},
            {"type":"functionCall","functionName":"Write","number":80}
        ],"variables":{"level":250.0}}"#,
    );
    let mut engine = engine_with(program);
    engine.tick();
    assert_eq!(engine.hardware().write_trace, vec![(9, 80.0)]);
}

#[test]
fn argument_resolves_through_the_snapshot_at_lowering_time() {
    let definition = define("Turn", Some("speed"), vec![analog_write("10", "speed")]);
    let id = definition.define_id.clone().unwrap();
    let document = BlockDocument {
        blocks: vec![
            set_variable("cruise", "120"),
            definition,
            forever(vec![call(&id, "cruise")]),
        ],
    };
    let mut engine = engine_with(compiler::lower_document(&document));
    engine.tick();
    let motors = engine.hardware().motors().unwrap();
    assert_eq!(motors.pwm(PinFunction::RightMotorForward), 120.0);
}

#[test]
fn a_call_without_a_definition_never_fires() {
    let program = program_from_json(
        r#"{"roots":[{"type":"forever","body":[
            {"type":"functionCall","functionName":"Ghost","number":1}
        ]}]}"#,
    );
    let mut engine = engine_with(program);
    engine.tick();
    engine.tick();
    assert!(engine.hardware().write_trace.is_empty());
    let report = engine.hardware().motor_report();
    assert_eq!(report.left_speed, 0.0);
    assert_eq!(report.right_speed, 0.0);
}
