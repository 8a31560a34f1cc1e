//! Minimal in-process pub/sub substrate satisfying [`dda_core::MessagingAdapter`].
//!
//! This is explicitly a test/demo stand-in for the real MQTT-5-like broker
//! named in the core's scope — it exists so the orchestration core's
//! end-to-end properties can be exercised without a live broker.

mod adapter;
mod broker;

pub use adapter::MemoryAdapter;
