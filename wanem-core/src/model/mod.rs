use crate::queue::DeliveryQueue;

mod simple;
pub use simple::{LinkProfile, SimpleModel};

/// An impairment model decides when (and how often) a received datagram is
/// relayed.
///
/// `compute` is invoked once per ingress datagram, from the reactor thread
/// only and serially with respect to the instance, so implementations do
/// not need to synchronize per-instance state.
pub trait ImpairmentModel: Send + 'static {
    /// Appends zero or more delivery deadlines for a just-received datagram.
    ///
    /// * `now_ms` is the clock sample of the current reactor tick.
    /// * `pending` is a read-only view of the entries already queued for
    ///   this instance; duplicates appear once per pending send. The
    ///   reference model ignores it, but stateful models (bandwidth,
    ///   tail-drop) can inspect it.
    /// * `deadlines` arrives cleared. An empty result drops the datagram,
    ///   one entry relays it once, `n` entries relay it `n` times.
    fn compute(&mut self, now_ms: u64, pending: &DeliveryQueue, deadlines: &mut Vec<u64>);
}
