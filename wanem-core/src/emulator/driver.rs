use std::{io, net::UdpSocket};

use bytes::BytesMut;
use rustc_hash::FxHashMap;
use tracing::trace;

use super::{Config, EmulatorStats};
use crate::{
    model::ImpairmentModel,
    pool::BufferPool,
    queue::{DeliveryQueue, ScheduledEntry},
};

/// One received payload shared by every scheduled duplicate of it.
///
/// `remaining` is the duplicate counter: set to the number of deadlines
/// the model emitted, decremented per successful send. The buffer goes
/// back to the pool exactly when it reaches zero.
#[derive(Debug)]
struct PacketGroup {
    buf: BytesMut,
    len: usize,
    remaining: u32,
}

/// The per-instance packet path, touched only by the reactor thread.
pub(crate) struct Driver {
    pool: BufferPool,
    queue: DeliveryQueue,
    model: Box<dyn ImpairmentModel>,
    groups: FxHashMap<u64, PacketGroup>,
    /// Scratch list handed to the model, reused across ingress datagrams.
    deadlines: Vec<u64>,
    next_group: u64,
    next_seq: u64,
}

impl Driver {
    pub(crate) fn new(model: Box<dyn ImpairmentModel>, max_packet_size: usize) -> Self {
        Self {
            pool: BufferPool::new(max_packet_size),
            queue: DeliveryQueue::new(),
            model,
            groups: FxHashMap::default(),
            deadlines: Vec::new(),
            next_group: 0,
            next_seq: 0,
        }
    }

    /// Receives at most one datagram from the channel.
    ///
    /// Returns `Ok(true)` while the socket made progress (a datagram was
    /// consumed, even a stranger's) so the caller keeps draining, and
    /// `Ok(false)` once the socket would block.
    pub(crate) fn read(
        &mut self,
        socket: &UdpSocket,
        now: u64,
        config: &Config,
        stats: &EmulatorStats,
    ) -> io::Result<bool> {
        let mut buf = self.pool.acquire();
        let (len, src) = match socket.recv_from(&mut buf[..]) {
            Ok(received) => received,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                self.pool.release(buf);
                return Ok(false);
            }
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionRefused
                ) =>
            {
                // ICMP unreachable surfaces as a reset on some platforms.
                self.pool.release(buf);
                return Ok(true);
            }
            Err(e) => {
                self.pool.release(buf);
                return Err(e);
            }
        };

        let Some(destination) = config.opposite(src) else {
            trace!(%src, "dropping datagram from unrecognized source");
            stats.increment_stranger_drops();
            self.pool.release(buf);
            return Ok(true);
        };
        stats.increment_rx(len);

        let Self { pool, queue, model, groups, deadlines, next_group, next_seq } = self;
        deadlines.clear();
        model.compute(now, queue, deadlines);

        if deadlines.is_empty() {
            trace!(%src, "impairment dropped datagram");
            stats.increment_policy_drops();
            pool.release(buf);
            return Ok(true);
        }

        let group = *next_group;
        *next_group += 1;
        groups.insert(group, PacketGroup { buf, len, remaining: deadlines.len() as u32 });
        for &deadline in deadlines.iter() {
            queue.push(ScheduledEntry::new(deadline, *next_seq, destination, group));
            *next_seq += 1;
        }

        Ok(true)
    }

    /// Sends the queue head if it is due.
    ///
    /// Returns `Ok(true)` when an entry went out, `Ok(false)` when there
    /// is no due head or the kernel refused the send. A refused entry is
    /// re-pushed and keeps its queue position for the next tick.
    pub(crate) fn write(
        &mut self,
        socket: &UdpSocket,
        now: u64,
        stats: &EmulatorStats,
    ) -> io::Result<bool> {
        let Some(entry) = self.queue.pop_ready(now) else {
            return Ok(false);
        };
        let group =
            self.groups.get_mut(&entry.group()).expect("scheduled entry without a backing group");

        match socket.send_to(&group.buf[..group.len], entry.destination()) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                self.queue.push(entry);
                return Ok(false);
            }
            Err(e) => {
                self.queue.push(entry);
                return Err(e);
            }
        }

        stats.increment_tx(group.len);
        group.remaining -= 1;
        if group.remaining == 0 {
            let group = self.groups.remove(&entry.group()).expect("group present");
            self.pool.release(group.buf);
        }

        Ok(true)
    }

    #[cfg(test)]
    pub(crate) fn queue(&self) -> &DeliveryQueue {
        &self.queue
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &BufferPool {
        &self.pool
    }

    #[cfg(test)]
    pub(crate) fn group_remaining(&self, group: u64) -> Option<u32> {
        self.groups.get(&group).map(|g| g.remaining)
    }
}
