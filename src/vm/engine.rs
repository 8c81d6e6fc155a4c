//! The tick-driven execution engine.
//!
//! Single-threaded, cooperative, no suspension: each `tick()` runs the
//! entire reachable node graph for that tick to completion before
//! returning. Given the same program and the same sequence of sensor
//! reads, two runs produce the same writes in the same order; children
//! execute left-to-right, top-to-bottom as declared.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::hardware::Hardware;
use crate::{log_debug, log_info, log_warn};

use super::program::{Condition, Program, RuntimeNode, ValueRef};

/// Engine lifecycle. There is no paused state at this layer: pausing is
/// the caller choosing not to invoke `tick()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Unloaded,
    /// A program is loaded; ticking has not started or was stopped.
    Loaded,
    Running,
}

/// A function body and its declared positional parameter.
#[derive(Debug)]
struct FunctionDef {
    parameter: Option<String>,
    body: Vec<RuntimeNode>,
}

/// The per-call parameter binding. Calls get a fresh scope; there are no
/// closures over the caller's scope.
#[derive(Debug, Clone)]
struct LocalScope {
    name: String,
    value: f64,
}

/// Runs a lowered [`Program`] against the hardware layer, one tick at a
/// time.
///
/// Phases: on the first tick after a load, the init-phase roots (everything
/// that is neither a `forever` nor a function definition) run exactly once;
/// on every tick, each `forever` root's body runs once. A program with no
/// `forever` root instead runs its remaining roots once per tick, which is
/// easy to misread as "runs once total".
pub struct Engine {
    hardware: Hardware,
    program: Option<Arc<Program>>,
    functions: HashMap<String, Arc<FunctionDef>>,
    state: EngineState,
    has_run_init: bool,
    unresolved_calls: HashSet<String>,
    wait_reported: bool,
}

impl Engine {
    pub fn new(hardware: Hardware) -> Engine {
        Engine {
            hardware,
            program: None,
            functions: HashMap::new(),
            state: EngineState::Unloaded,
            has_run_init: false,
            unresolved_calls: HashSet::new(),
            wait_reported: false,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn hardware(&self) -> &Hardware {
        &self.hardware
    }

    pub fn hardware_mut(&mut self) -> &mut Hardware {
        &mut self.hardware
    }

    /// Loads a program: re-derives the pin mapping from its variable
    /// snapshot, registers its function definitions, and arms the init
    /// phase. Loading again tears the previous program down and forces
    /// init to re-run.
    pub fn load(&mut self, program: Program) {
        self.hardware.remap_from_variables(&program.variables);

        self.functions.clear();
        for node in &program.roots {
            if let RuntimeNode::FunctionDefine {
                function_name,
                parameter,
                body,
            } = node
            {
                if function_name.is_empty() {
                    log_warn!("Skipping function definition without a name");
                    continue;
                }
                // First occurrence is authoritative.
                self.functions
                    .entry(function_name.clone())
                    .or_insert_with(|| {
                        Arc::new(FunctionDef {
                            parameter: parameter.clone(),
                            body: body.clone(),
                        })
                    });
            }
        }

        log_info!(
            "Program loaded: {} roots, {} functions, {} variables",
            program.roots.len(),
            self.functions.len(),
            program.variables.len()
        );

        self.program = Some(Arc::new(program));
        self.state = EngineState::Loaded;
        self.has_run_init = false;
        self.unresolved_calls.clear();
        self.wait_reported = false;
    }

    /// Runs one tick. A no-op when no program is loaded.
    pub fn tick(&mut self) {
        let Some(program) = self.program.clone() else {
            log_debug!("Tick with no program loaded, ignoring");
            return;
        };

        let has_forever = program.has_forever_root();

        if !self.has_run_init {
            self.has_run_init = true;
            if has_forever {
                for node in &program.roots {
                    if !node.is_forever() && !node.is_function_define() {
                        self.eval(&program, node, None);
                    }
                }
            }
        }
        self.state = EngineState::Running;

        for node in &program.roots {
            if node.is_forever() {
                self.eval(&program, node, None);
            } else if !has_forever && !node.is_function_define() {
                self.eval(&program, node, None);
            }
        }
    }

    /// Stops the run: zeroes every actuator output and returns the engine
    /// to `Loaded`. Idempotent. Does not reset the init flag: a bare
    /// stop/restart is pause/resume; only a reload re-runs init.
    pub fn stop(&mut self) {
        self.hardware.stop();
        if self.state == EngineState::Running {
            self.state = EngineState::Loaded;
        }
    }

    fn eval(&mut self, program: &Program, node: &RuntimeNode, scope: Option<&LocalScope>) {
        match node {
            RuntimeNode::Forever { body } => {
                for child in body {
                    self.eval(program, child, scope);
                }
            }
            RuntimeNode::If { condition, body } => {
                if self.truthy(program, condition, scope) {
                    for child in body {
                        self.eval(program, child, scope);
                    }
                }
            }
            RuntimeNode::IfElse {
                condition,
                body,
                else_body,
            } => {
                let branch = if self.truthy(program, condition, scope) {
                    body
                } else {
                    else_body
                };
                for child in branch {
                    self.eval(program, child, scope);
                }
            }
            RuntimeNode::Repeat { count, body } => {
                let iterations = count.round().max(0.0) as u64;
                for _ in 0..iterations {
                    for child in body {
                        self.eval(program, child, scope);
                    }
                }
            }
            RuntimeNode::AnalogWrite { pin, value } => {
                let value = self.resolve(program, value, scope);
                self.hardware.analog_write(*pin, value);
            }
            RuntimeNode::DigitalRead { pin } => {
                // The statement form discards the result; the value only
                // matters as the operand of a conditional.
                let _ = self.hardware.digital_read(*pin);
            }
            RuntimeNode::FunctionCall {
                function_name,
                arg,
            } => {
                let Some(def) = self.functions.get(function_name).cloned() else {
                    if self.unresolved_calls.insert(function_name.clone()) {
                        log_warn!("Call to unknown function '{}', ignoring", function_name);
                    }
                    return;
                };
                let value = self.resolve(program, arg, scope);
                let local = def.parameter.as_ref().map(|name| LocalScope {
                    name: name.clone(),
                    value,
                });
                for child in &def.body {
                    self.eval(program, child, local.as_ref());
                }
            }
            RuntimeNode::Wait { seconds } => {
                if !self.wait_reported {
                    self.wait_reported = true;
                    log_warn!(
                        "wait({}s) is not supported by the synchronous engine, skipping",
                        seconds
                    );
                }
            }
            RuntimeNode::Forward { speed } => self.hardware.move_forward(*speed),
            RuntimeNode::TurnLeft { angle } => self.hardware.turn_left(*angle),
            RuntimeNode::TurnRight { angle } => self.hardware.turn_right(*angle),
            RuntimeNode::Stop {} => self.hardware.stop(),
            RuntimeNode::FunctionDefine { .. } => {
                // Registered at load time, never evaluated in place.
            }
        }
    }

    /// Resolves a value operand: local scope, then the global snapshot,
    /// then zero with a diagnostic.
    fn resolve(&self, program: &Program, value: &ValueRef, scope: Option<&LocalScope>) -> f64 {
        match value {
            ValueRef::Literal(v) => *v,
            ValueRef::Variable(name) => self.resolve_name(program, name, scope),
        }
    }

    fn resolve_name(&self, program: &Program, name: &str, scope: Option<&LocalScope>) -> f64 {
        if let Some(local) = scope {
            if local.name == name {
                return local.value;
            }
        }
        if let Some(value) = program.variables.get(name) {
            return value;
        }
        log_warn!("Unknown variable '{}', reading 0", name);
        0.0
    }

    /// Condition truthiness: a pin condition digital-reads the pin; a
    /// variable condition tests `value > 0`.
    fn truthy(&mut self, program: &Program, condition: &Condition, scope: Option<&LocalScope>) -> bool {
        match condition {
            Condition::Pin { pin } => self.hardware.digital_read(*pin),
            Condition::Variable { condition_var } => {
                self.resolve_name(program, condition_var, scope) > 0.0
            }
        }
    }
}
