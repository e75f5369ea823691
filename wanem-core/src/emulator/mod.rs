use std::{
    io,
    net::{SocketAddr, UdpSocket},
    sync::{Arc, Mutex},
};

use thiserror::Error;
use tracing::debug;

use crate::{model::ImpairmentModel, reactor, MINIMUM_PACKET_SIZE};

mod driver;
mod stats;

use driver::Driver;
pub use stats::EmulatorStats;

#[derive(Debug, Error)]
pub enum EmulatorError {
    #[error("IO error: {0:?}")]
    Io(#[from] io::Error),
    /// The instance was stopped earlier; a stopped instance is not
    /// reusable, construct a new one instead.
    #[error("emulator channel closed")]
    ChannelClosed,
    #[error("emulator already started")]
    AlreadyStarted,
    /// The reactor worker was lost while shutting down.
    #[error("reactor worker lost during shutdown")]
    Interrupted,
}

/// Options for a [`WanEmulator`].
#[derive(Debug, Clone)]
pub struct EmulatorOptions {
    max_packet_size: usize,
}

impl Default for EmulatorOptions {
    fn default() -> Self {
        Self { max_packet_size: MINIMUM_PACKET_SIZE }
    }
}

impl EmulatorOptions {
    /// Sets the maximum datagram payload size in bytes. Larger datagrams
    /// are truncated by the kernel on receive.
    pub fn max_packet_size(mut self, max_packet_size: usize) -> Self {
        self.max_packet_size = max_packet_size;
        self
    }
}

/// The fixed addressing of one instance, immutable after construction.
#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub(crate) emulator_addr: SocketAddr,
    pub(crate) peer_a: SocketAddr,
    pub(crate) peer_b: SocketAddr,
    pub(crate) max_packet_size: usize,
}

impl Config {
    /// Maps a source peer to the peer its traffic is relayed to.
    /// `None` marks stranger traffic.
    pub(crate) fn opposite(&self, src: SocketAddr) -> Option<SocketAddr> {
        if src == self.peer_a {
            Some(self.peer_b)
        } else if src == self.peer_b {
            Some(self.peer_a)
        } else {
            None
        }
    }
}

/// Instance state shared between the caller-facing handle and the reactor.
pub(crate) struct Shared {
    config: Config,
    /// `Some` while the instance is running. Taken (not just dropped) on
    /// `stop` so a reactor tick racing the stop observes a missing socket
    /// and skips the instance.
    socket: Mutex<Option<Arc<UdpSocket>>>,
    driver: Mutex<Driver>,
    stats: EmulatorStats,
}

impl Shared {
    /// One reactor step for this instance: drain ingress until the socket
    /// would block, then drain egress until no head is due or the kernel
    /// refuses. `now` is the tick's single clock sample.
    pub(crate) fn tick(&self, now: u64) -> io::Result<()> {
        let socket = {
            let guard = self.socket.lock().expect("socket lock poisoned");
            match guard.as_ref() {
                Some(socket) => Arc::clone(socket),
                // stopped by another thread mid-iteration
                None => return Ok(()),
            }
        };

        let mut driver = self.driver.lock().expect("driver lock poisoned");
        while driver.read(&socket, now, &self.config, &self.stats)? {}
        while driver.write(&socket, now, &self.stats)? {}
        Ok(())
    }
}

enum Lifecycle {
    Idle,
    Running,
    Stopped,
}

/// A userspace UDP WAN emulator instance.
///
/// The emulator binds `emulator_addr` and relays datagrams between
/// `peer_a` and `peer_b`: traffic received from one peer is forwarded to
/// the other, after the impairment model decided when and how often. Both
/// peers must address the emulator, not each other; the source address
/// they observe is the emulator's.
///
/// All instances in a process share a single reactor thread, spawned with
/// the first [`start`](WanEmulator::start) and joined with the last
/// [`stop`](WanEmulator::stop).
///
/// ```no_run
/// use wanem_core::{LinkProfile, SimpleModel, WanEmulator};
///
/// let profile = LinkProfile::new(0.05, 0.0, 80, 20);
/// let mut emulator = WanEmulator::new(
///     "127.0.0.1:4000".parse().unwrap(),
///     "127.0.0.1:4001".parse().unwrap(),
///     "127.0.0.1:4002".parse().unwrap(),
///     SimpleModel::new(profile.clone()),
/// );
/// emulator.start().unwrap();
/// // peers exchange datagrams through 127.0.0.1:4000 here
/// profile.set_delay_ms(250); // tune the link while it runs
/// emulator.stop().unwrap();
/// ```
pub struct WanEmulator {
    shared: Arc<Shared>,
    lifecycle: Lifecycle,
}

impl WanEmulator {
    /// Creates an instance with default options. No I/O happens until
    /// [`start`](WanEmulator::start).
    pub fn new(
        emulator_addr: SocketAddr,
        peer_a: SocketAddr,
        peer_b: SocketAddr,
        model: impl ImpairmentModel,
    ) -> Self {
        Self::with_options(emulator_addr, peer_a, peer_b, model, EmulatorOptions::default())
    }

    /// Creates an instance with the given options.
    ///
    /// # Panics
    ///
    /// Panics if `max_packet_size` is zero.
    pub fn with_options(
        emulator_addr: SocketAddr,
        peer_a: SocketAddr,
        peer_b: SocketAddr,
        model: impl ImpairmentModel,
        options: EmulatorOptions,
    ) -> Self {
        assert!(options.max_packet_size > 0, "max_packet_size must be strictly positive");
        let config = Config { emulator_addr, peer_a, peer_b, max_packet_size: options.max_packet_size };
        Self {
            shared: Arc::new(Shared {
                driver: Mutex::new(Driver::new(Box::new(model), config.max_packet_size)),
                config,
                socket: Mutex::new(None),
                stats: EmulatorStats::default(),
            }),
            lifecycle: Lifecycle::Idle,
        }
    }

    /// Binds the emulator socket and registers the instance with the
    /// process-wide reactor, spawning the reactor thread if this is the
    /// first live instance.
    ///
    /// Fails with [`EmulatorError::ChannelClosed`] if the instance was
    /// stopped before; stopped instances are not reusable.
    pub fn start(&mut self) -> Result<(), EmulatorError> {
        match self.lifecycle {
            Lifecycle::Idle => {}
            Lifecycle::Running => return Err(EmulatorError::AlreadyStarted),
            Lifecycle::Stopped => return Err(EmulatorError::ChannelClosed),
        }

        let socket = UdpSocket::bind(self.shared.config.emulator_addr)?;
        socket.set_nonblocking(true)?;
        let local_addr = socket.local_addr()?;
        *self.shared.socket.lock().expect("socket lock poisoned") = Some(Arc::new(socket));

        if let Err(e) = reactor::register(Arc::clone(&self.shared)) {
            *self.shared.socket.lock().expect("socket lock poisoned") = None;
            return Err(e.into());
        }

        self.lifecycle = Lifecycle::Running;
        debug!(%local_addr, peer_a = %self.shared.config.peer_a, peer_b = %self.shared.config.peer_b, "emulation started");
        Ok(())
    }

    /// Deregisters the instance and closes its socket. If this was the
    /// last live instance, blocks until the reactor thread has exited.
    pub fn stop(&mut self) -> Result<(), EmulatorError> {
        if !matches!(self.lifecycle, Lifecycle::Running) {
            return Err(EmulatorError::ChannelClosed);
        }
        self.lifecycle = Lifecycle::Stopped;

        reactor::deregister(&self.shared)?;
        *self.shared.socket.lock().expect("socket lock poisoned") = None;
        debug!(addr = %self.shared.config.emulator_addr, "emulation stopped");
        Ok(())
    }

    /// The address the emulator socket is bound to, once started.
    /// Resolves port 0 in the configured address to the actual port.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        let guard = self.shared.socket.lock().expect("socket lock poisoned");
        guard.as_ref().and_then(|socket| socket.local_addr().ok())
    }

    /// Relay counters for this instance.
    pub fn stats(&self) -> &EmulatorStats {
        &self.shared.stats
    }
}

impl Drop for WanEmulator {
    fn drop(&mut self) {
        if matches!(self.lifecycle, Lifecycle::Running) {
            let _ = self.stop();
        }
    }
}
