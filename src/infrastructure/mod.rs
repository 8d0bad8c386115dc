pub mod bluetooth;
pub mod console;
pub mod logging;
pub mod registry;

#[cfg(test)]
pub mod fake;
