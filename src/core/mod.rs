pub mod error;
pub mod quota;
pub mod services;
pub mod traits;
pub mod views;
