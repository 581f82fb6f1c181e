//! Shared fakes for integration testing.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fleet_autoshutdown::backend::{BackendServer, StaticRegistry};
use fleet_autoshutdown::clock::{Clock, MonotonicClock};
use fleet_autoshutdown::{BackendId, Notice, PollOutcome, ProbeError, RoutingLayer, Session};
use futures_util::future::BoxFuture;

/// Something the fake proxy observed, with the virtual time it happened at.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Kicked {
        session: String,
        notice: String,
        at: Duration,
    },
    Shutdown {
        at: Duration,
    },
}

/// A proxy whose occupancy the test controls.
pub struct FakeProxy {
    clock: MonotonicClock,
    online: AtomicUsize,
    events: Arc<Mutex<Vec<Event>>>,
}

impl FakeProxy {
    pub fn new(clock: MonotonicClock) -> Arc<Self> {
        Arc::new(Self {
            clock,
            online: AtomicUsize::new(0),
            events: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn set_online(&self, n: usize) {
        self.online.store(n, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Virtual times of every shutdown call.
    pub fn shutdowns(&self) -> Vec<Duration> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Shutdown { at } => Some(at),
                Event::Kicked { .. } => None,
            })
            .collect()
    }
}

struct FakeSession {
    name: String,
    clock: MonotonicClock,
    events: Arc<Mutex<Vec<Event>>>,
}

impl Session for FakeSession {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn disconnect(&self, reason: &Notice) {
        self.events.lock().unwrap().push(Event::Kicked {
            session: self.name.clone(),
            notice: reason.to_plain(),
            at: self.clock.now(),
        });
    }
}

impl RoutingLayer for FakeProxy {
    fn connected_sessions(&self) -> usize {
        self.online.load(Ordering::SeqCst)
    }

    fn sessions(&self) -> Vec<Arc<dyn Session>> {
        (0..self.connected_sessions())
            .map(|i| {
                Arc::new(FakeSession {
                    name: format!("player{i}"),
                    clock: self.clock,
                    events: self.events.clone(),
                }) as Arc<dyn Session>
            })
            .collect()
    }

    fn shutdown(&self) {
        self.events.lock().unwrap().push(Event::Shutdown {
            at: self.clock.now(),
        });
    }
}

#[derive(Default)]
struct BackendState {
    players: AtomicU32,
    down: AtomicBool,
    started: AtomicUsize,
    completed: AtomicUsize,
}

/// A backend whose reachability and player count the test controls.
#[derive(Clone)]
pub struct FakeBackend {
    id: BackendId,
    delay: Duration,
    state: Arc<BackendState>,
}

impl FakeBackend {
    pub fn new(name: &str) -> Self {
        Self {
            id: BackendId::new(name),
            delay: Duration::ZERO,
            state: Arc::default(),
        }
    }

    /// Every ping takes `delay` to answer.
    pub fn slow(name: &str, delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new(name)
        }
    }

    pub fn set_players(&self, n: u32) {
        self.state.players.store(n, Ordering::SeqCst);
    }

    pub fn set_down(&self, down: bool) {
        self.state.down.store(down, Ordering::SeqCst);
    }

    pub fn pings_started(&self) -> usize {
        self.state.started.load(Ordering::SeqCst)
    }

    pub fn pings_completed(&self) -> usize {
        self.state.completed.load(Ordering::SeqCst)
    }
}

impl BackendServer for FakeBackend {
    fn id(&self) -> &BackendId {
        &self.id
    }

    fn ping(&self) -> BoxFuture<'static, PollOutcome> {
        self.state.started.fetch_add(1, Ordering::SeqCst);
        let state = self.state.clone();
        let delay = self.delay;
        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            state.completed.fetch_add(1, Ordering::SeqCst);
            if state.down.load(Ordering::SeqCst) {
                PollOutcome::Failure(ProbeError::Io(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "connection refused",
                )))
            } else {
                PollOutcome::Success {
                    online: state.players.load(Ordering::SeqCst),
                }
            }
        })
    }
}

pub fn registry(backends: &[FakeBackend]) -> Arc<StaticRegistry> {
    Arc::new(StaticRegistry::new(
        backends
            .iter()
            .map(|b| Arc::new(b.clone()) as Arc<dyn BackendServer>)
            .collect(),
    ))
}

/// Sleep until `at` on the virtual clock.
pub async fn advance_to(clock: &MonotonicClock, at: Duration) {
    let now = clock.now();
    if at > now {
        tokio::time::sleep(at - now).await;
    }
}

pub fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

pub fn millis(ms: u64) -> Duration {
    Duration::from_millis(ms)
}
