pub mod entities;
pub mod repositories;
pub mod session;
pub mod storage;
pub mod store;
pub mod traits;
