pub mod connect;

pub mod prelude {
    pub use super::connect::*;
}
