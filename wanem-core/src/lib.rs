//! The impairment relay engine behind [`wanem`](https://docs.rs/wanem).
//!
//! A [`WanEmulator`] binds one UDP endpoint and relays datagrams between
//! two fixed peers, deciding per ingress datagram — through an
//! [`ImpairmentModel`] — when and how often it goes out again. Payloads
//! are opaque and forwarded verbatim.
//!
//! All live instances of a process are driven by one shared reactor
//! thread multiplexing non-blocking sockets; see [`WanEmulator`] for the
//! lifecycle rules.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod clock;
mod emulator;
mod model;
mod pool;
mod queue;
mod reactor;

pub use clock::{Clock, MonotonicClock};
pub use emulator::{EmulatorError, EmulatorOptions, EmulatorStats, WanEmulator};
pub use model::{ImpairmentModel, LinkProfile, SimpleModel};
pub use queue::{DeliveryQueue, ScheduledEntry};

/// Largest UDP payload in bytes that never fragments in the IPv4 layer:
/// the minimum supported IPv4 MTU (576 B) minus the maximum IPv4 header
/// (60 B) and the UDP header (8 B). The default `max_packet_size`.
pub const MINIMUM_PACKET_SIZE: usize = 576 - 60 - 8;

/// The usual IPv4 MTU in bytes, for links known to carry full-size frames.
pub const DEFAULT_PACKET_SIZE: usize = 1500;
