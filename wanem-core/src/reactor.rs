use std::{
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread,
};

use tracing::{debug, error};

use crate::{
    clock::{Clock, MonotonicClock},
    emulator::{EmulatorError, Shared},
};

/// The process-wide reactor singleton. `Some` exactly while at least one
/// emulator instance is live.
static REACTOR: Mutex<Option<Reactor>> = Mutex::new(None);

struct Reactor {
    /// Number of registered instances. The worker exists iff this is > 0.
    instances: usize,
    /// Live instances, visited by the worker once per tick.
    registry: Arc<Mutex<Vec<Arc<Shared>>>>,
    shutdown: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
}

impl Reactor {
    fn spawn() -> io::Result<Self> {
        let registry: Arc<Mutex<Vec<Arc<Shared>>>> = Arc::new(Mutex::new(Vec::new()));
        let shutdown = Arc::new(AtomicBool::new(false));
        let worker = thread::Builder::new().name("wanem-reactor".to_string()).spawn({
            let registry = Arc::clone(&registry);
            let shutdown = Arc::clone(&shutdown);
            move || run(registry, shutdown, MonotonicClock::default())
        })?;
        Ok(Self { instances: 0, registry, shutdown, worker: Some(worker) })
    }
}

/// Adds an instance to the reactor, spawning the worker thread if this is
/// the first live instance.
pub(crate) fn register(shared: Arc<Shared>) -> io::Result<()> {
    let mut slot = REACTOR.lock().expect("reactor lock poisoned");
    if slot.is_none() {
        *slot = Some(Reactor::spawn()?);
        debug!("reactor spawned");
    }
    let reactor = slot.as_mut().expect("reactor initialized above");
    reactor.registry.lock().expect("registry lock poisoned").push(shared);
    reactor.instances += 1;
    Ok(())
}

/// Removes an instance from the reactor. The last deregistration signals
/// the worker, blocks until it has exited and tears the singleton down.
pub(crate) fn deregister(shared: &Arc<Shared>) -> Result<(), EmulatorError> {
    let mut slot = REACTOR.lock().expect("reactor lock poisoned");
    let Some(reactor) = slot.as_mut() else {
        return Ok(());
    };

    reactor
        .registry
        .lock()
        .expect("registry lock poisoned")
        .retain(|entry| !Arc::ptr_eq(entry, shared));
    reactor.instances -= 1;

    if reactor.instances == 0 {
        let mut reactor = slot.take().expect("reactor present");
        reactor.shutdown.store(true, Ordering::Release);
        let worker = reactor.worker.take().expect("worker handle present");
        worker.join().map_err(|_| EmulatorError::Interrupted)?;
        debug!("reactor torn down");
    }
    Ok(())
}

/// The reactor loop: one clock sample per tick, authoritative for every
/// deadline comparison in it; every instance drains its reads, then its
/// writes; a yield between ticks. The loop never blocks.
fn run(registry: Arc<Mutex<Vec<Arc<Shared>>>>, shutdown: Arc<AtomicBool>, clock: impl Clock) {
    debug!("reactor worker running");
    let mut scratch: Vec<Arc<Shared>> = Vec::new();

    while !shutdown.load(Ordering::Acquire) {
        let now = clock.now_millis();

        scratch.clear();
        scratch.extend(registry.lock().expect("registry lock poisoned").iter().cloned());

        for shared in &scratch {
            if let Err(e) = shared.tick(now) {
                error!(?e, "unrecoverable I/O error, reactor exiting");
                return;
            }
        }

        thread::yield_now();
    }
    debug!("reactor worker stopped");
}

#[cfg(test)]
pub(crate) fn worker_alive() -> bool {
    REACTOR.lock().expect("reactor lock poisoned").is_some()
}
