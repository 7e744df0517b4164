pub mod bfir;
pub mod bfvm;
pub mod console;
pub mod driver;
pub mod errors;
pub mod instrlog;
pub mod tape;

#[cfg(test)]
mod property_tests;
