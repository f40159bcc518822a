pub mod adapter;
pub mod bus;
pub mod catalog;
pub mod command;
pub mod config;
pub mod descriptor;
pub mod dispatch;
pub mod error;
pub mod io;
pub mod notify;
pub mod paths;
pub mod reconcile;
pub mod types;
pub mod wire;

pub use error::{RelayError, Result};
