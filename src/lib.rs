//! Workspace placeholder crate.
//!
//! This crate exists to expose a single dependency for host applications that
//! want the playback coordinator without wiring each workspace crate
//! individually. Enable the `service` feature (on by default) to pull in
//! `core-service` and `core-playback`.

#[cfg(feature = "service")]
pub use core_playback as playback;
#[cfg(feature = "service")]
pub use core_service as service;
