pub mod action;
pub mod profile;
pub mod registration;
pub mod relation;
pub mod user;
