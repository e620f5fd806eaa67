//! Background monitor that watches visible windows for numbered approval
//! prompts from a terminal coding assistant and answers them with a single
//! digit keystroke. Capture and input are OS backends behind traits; the
//! recognition and decision pipeline is platform-neutral.

pub mod config;
pub mod cooldown;
pub mod detect;
pub mod exec;
pub mod notify;
pub mod ocr;
pub mod scanner;
mod utils;
pub mod window;

pub use config::Config;
pub use scanner::{ScanController, ScanStats};
