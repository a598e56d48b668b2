pub mod app;
pub mod utils;
pub mod debugging;

mod alloc;
pub use alloc::*;
