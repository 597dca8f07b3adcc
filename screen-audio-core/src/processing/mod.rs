pub mod converter;
pub mod levels;
pub mod mixer;
