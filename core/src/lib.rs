#![cfg_attr(not(test), no_std)]

pub mod byte_buffer;
pub mod channel_bucket;
