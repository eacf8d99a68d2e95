// Data models shared by the signal engine and any presentation layer
// consuming its output.
pub mod models;
pub mod utils;
