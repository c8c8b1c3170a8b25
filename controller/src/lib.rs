#![cfg_attr(not(test), no_std)]

//! MIDI-facing control layer for the gridstrument: channel allocation with
//! deferred reuse, outgoing message queueing, note routing, and settings
//! persistence over a byte-level storage boundary.

pub mod logging;
pub mod midi;
pub mod mpe;
pub mod storage;
pub mod voices;

pub use gridstrument_core::byte_buffer;
pub use gridstrument_core::channel_bucket;
