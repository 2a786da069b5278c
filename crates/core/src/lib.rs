//! # Office Hours Core
//!
//! Domain model and booking consistency rules for student–professor
//! appointments. Storage is reached only through the traits in [`ledger`];
//! the coordinators in [`booking`], [`cancellation`], [`query`] and [`slots`]
//! enforce the invariants on top of them.

pub mod booking;
pub mod cancellation;
pub mod errors;
pub mod ledger;
pub mod memory;
pub mod models;
pub mod notify;
pub mod query;
pub mod slots;
pub mod validation;
