pub mod devices;
pub mod engine;
pub mod signal;
pub mod timing;
pub mod worker;
