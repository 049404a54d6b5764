//! Session Module
//!
//! Local session bookkeeping and the UI-free chat controller.

pub mod controller;
pub mod store;

pub use controller::{Command, Controller, Effect};
pub use store::{SessionEntry, SessionStore};
