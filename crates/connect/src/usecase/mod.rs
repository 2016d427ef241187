pub mod connect;
pub mod converter;
pub mod registration;
