pub mod backend;
pub mod engine;
pub mod listener;
