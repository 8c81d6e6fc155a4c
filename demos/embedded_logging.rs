use std::thread;
use std::time::Duration;

use trundle_core::logger::{create_log_channel, get_logger, init_embedded};

fn main() {
    println!("=== Embedded Logging Example ===");

    // Create a channel for log communication
    let (log_sender, log_receiver) = create_log_channel();

    // Initialize the core logger in embedded mode
    init_embedded(log_sender);

    // Spawn a thread to receive and display logs
    let _log_handler = thread::spawn(move || {
        while let Ok(log_msg) = log_receiver.recv() {
            println!("[HOST LOG] {}", log_msg);
        }
    });

    // Core code now logs through the channel
    let logger = get_logger();
    logger.info("Core initialized in embedded mode".to_string());
    logger.warn("Pin 42 is not mapped".to_string());
    logger.info("Lowered 3 top-level blocks".to_string());

    // Give time for logs to be processed
    thread::sleep(Duration::from_millis(100));

    println!("=== Example Complete ===");
}
