pub mod coordinator;
pub mod data;
pub mod error;
pub mod session;
pub mod webapi;
