//! Business logic services.

pub mod account;
pub mod activity;
pub mod auth;
pub mod checkin;
pub mod lockout;
pub mod session;
