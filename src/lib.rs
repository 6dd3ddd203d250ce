//! The backend for a student ambassador program.
//!
//! Members sign up for events and have their attendance confirmed by the
//! event's creator. Each member's service minutes, the total length of the
//! non-meeting events they attended, are kept on the member itself and
//! adjusted whenever an event or an attendance record changes. See
//! [accrual](crate::models::accrual) for how.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
pub mod util;

#[cfg(test)]
mod tests;
