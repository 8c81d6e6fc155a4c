use trundle_core::blocks::BlockDocument;
use trundle_core::compiler;
use trundle_core::hardware::{Hardware, PinFunction};
use trundle_core::serializer;
use trundle_core::variable::VariableStore;
use trundle_core::vm::Engine;

fn main() {
    println!("=== Block Pipeline Example ===");

    let text = std::fs::read_to_string("demos/line_follower.blocks")
        .expect("run from the repository root");

    let mut document = BlockDocument::new();
    let mut registry = VariableStore::new();
    serializer::deserialize(&text, &mut document, &mut registry);
    println!(
        "Loaded {} top-level blocks, {} registered variables",
        document.blocks.len(),
        registry.len()
    );

    let program = compiler::lower_document(&document);
    println!("{}", program.to_json().expect("program encodes"));

    let mut engine = Engine::new(Hardware::new());
    engine.load(program);

    for tick in 0..10 {
        // Script the left line sensor: seen on every third tick.
        engine
            .hardware_mut()
            .sensors_mut()
            .unwrap()
            .set_digital(PinFunction::LeftSensor, tick % 3 == 0);
        engine.tick();

        let report = engine.hardware().motor_report();
        println!(
            "tick {:>2}: left {:+.3}  right {:+.3}",
            tick, report.left_speed, report.right_speed
        );
    }
    engine.stop();

    println!("=== Example Complete ===");
}
