use crate::hardware::Hardware;
use crate::vm::{Engine, Program};

mod functions;
mod scenarios;

pub fn engine_with(program: Program) -> Engine {
    let mut engine = Engine::new(Hardware::new());
    engine.load(program);
    engine
}

pub fn program_from_json(json: &str) -> Program {
    Program::from_json(json).expect("test program must parse")
}
