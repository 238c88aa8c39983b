pub mod clock;
pub mod config;
pub mod test_helpers;
