//! Background services for the auction server

pub mod expiry;

pub use expiry::ExpiryWatcher;
