//! Data models for accounts, lockout tracking, and audit records.

pub mod activity;
pub mod checkin;
pub mod lockout;
pub mod user;
