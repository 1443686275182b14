//! # homifi-domain
//!
//! Pure domain model for the homifi simulated device engine.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **device kinds** and their explicit state machines
//!   (light, curtain, lock, security, climate)
//! - Compute **transition paths** (ordered intermediate states toward a terminal target)
//! - Hold the read-only **transition descriptor table** (step delays, media portrayal)
//! - Describe **media assets** and **viewport geometry**
//! - Define diagnostic **events** recorded while devices change state
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or async runtimes.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod descriptor;
pub mod device;
pub mod event;
pub mod media;
pub mod transition;
pub mod viewport;
