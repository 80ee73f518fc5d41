//! REST API handlers

pub mod actions;
pub mod health;
pub mod invoices;
pub mod reminders;
pub mod shared;
pub mod status;
pub mod webhook;

pub use actions::*;
pub use health::*;
pub use invoices::*;
pub use reminders::*;
pub use status::*;
pub use webhook::*;
