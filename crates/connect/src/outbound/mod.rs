#[cfg(test)]
pub mod memory;
pub mod orm;
pub mod repository;
pub mod session;
