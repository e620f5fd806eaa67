pub mod controller;
mod loop_worker;
pub mod phash;

pub use controller::ScanController;
pub use loop_worker::ScanStats;
