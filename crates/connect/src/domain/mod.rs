pub mod entity;
pub mod inout;
pub mod merge;
