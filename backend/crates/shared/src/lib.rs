//! Shared Kernel - vocabulary used by every ShowerGPT crate
//!
//! This crate contains:
//! - The unified error type ([`error::app_error::AppError`]) and its kinds
//! - Typed, time-ordered identifiers ([`id::Id`])
//!
//! Anything domain specific (moods, templates, rate windows) lives in the
//! `thought` and `platform` crates instead.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
