//! Peer channel adapter: WebSocket endpoint plus broadcast fan-out.
//!
//! Inbound text frames land in the shared [`FrameInbox`]; the control
//! loop drains it.  Outbound broadcasts fan out to every live session.
//! Sends are best-effort: a dead session is pruned, never retried.

// ---------------------------------------------------------------------------
// Device implementation (esp-idf-svc HTTP server, WS endpoint)
// ---------------------------------------------------------------------------

#[cfg(all(target_os = "espidf", feature = "espidf"))]
mod platform {
    use std::sync::{Arc, Mutex};

    use esp_idf_svc::http::server::ws::EspHttpWsDetachedSender;
    use esp_idf_svc::http::server::{Configuration, EspHttpServer};
    use esp_idf_svc::ws::FrameType;
    use log::{info, warn};

    use crate::app::inbox::FrameInbox;
    use crate::app::ports::PeerPort;

    pub struct PeerHub {
        _server: EspHttpServer<'static>,
        inbox: Arc<Mutex<FrameInbox>>,
        sessions: Arc<Mutex<Vec<EspHttpWsDetachedSender>>>,
        greeting_pending: Arc<Mutex<bool>>,
    }

    impl PeerHub {
        pub fn start() -> anyhow::Result<Self> {
            let mut server = EspHttpServer::new(&Configuration::default())?;
            let inbox = Arc::new(Mutex::new(FrameInbox::new()));
            let sessions: Arc<Mutex<Vec<EspHttpWsDetachedSender>>> =
                Arc::new(Mutex::new(Vec::new()));
            let greeting_pending = Arc::new(Mutex::new(false));

            let cb_inbox = Arc::clone(&inbox);
            let cb_sessions = Arc::clone(&sessions);
            let cb_greeting = Arc::clone(&greeting_pending);
            server.ws_handler("/ws", move |conn| {
                if conn.is_new() {
                    info!("peer connected");
                    if let Ok(sender) = conn.create_detached_sender() {
                        cb_sessions.lock().unwrap().push(sender);
                    }
                    *cb_greeting.lock().unwrap() = true;
                    return Ok::<(), esp_idf_svc::sys::EspError>(());
                }
                if conn.is_closed() {
                    info!("peer disconnected");
                    return Ok(());
                }
                let (_frame_type, len) = conn.recv(&mut [])?;
                let mut buf = vec![0u8; len];
                conn.recv(&mut buf)?;
                cb_inbox.lock().unwrap().push(&buf);
                Ok(())
            })?;

            Ok(Self {
                _server: server,
                inbox,
                sessions,
                greeting_pending,
            })
        }

        /// Drain one inbound frame for the control loop.
        pub fn pop_frame(&self) -> Option<crate::app::inbox::Frame> {
            self.inbox.lock().unwrap().pop()
        }

        /// True exactly once after each new connection; the loop answers
        /// with the greeting frame.
        pub fn take_greeting_pending(&self) -> bool {
            core::mem::take(&mut *self.greeting_pending.lock().unwrap())
        }
    }

    impl PeerPort for PeerHub {
        fn broadcast(&mut self, payload: &[u8]) {
            let mut sessions = self.sessions.lock().unwrap();
            sessions.retain_mut(|sender| {
                if sender.is_closed() {
                    return false;
                }
                match sender.send(FrameType::Text(false), payload) {
                    Ok(()) => true,
                    Err(e) => {
                        warn!("peer send failed, pruning session: {e}");
                        false
                    }
                }
            });
        }

        fn peer_count(&self) -> usize {
            self.sessions.lock().unwrap().len()
        }
    }
}

#[cfg(all(target_os = "espidf", feature = "espidf"))]
pub use platform::PeerHub;

// ---------------------------------------------------------------------------
// Host simulation
// ---------------------------------------------------------------------------

/// In-memory peer hub: tests inject frames and inspect broadcasts.
#[cfg(not(target_os = "espidf"))]
pub struct PeerHub {
    inbox: core::cell::RefCell<crate::app::inbox::FrameInbox>,
    peers: usize,
    greeting_pending: bool,
    pub sent: Vec<Vec<u8>>,
}

#[cfg(not(target_os = "espidf"))]
impl PeerHub {
    pub fn start() -> anyhow::Result<Self> {
        Ok(Self {
            inbox: core::cell::RefCell::new(crate::app::inbox::FrameInbox::new()),
            peers: 0,
            greeting_pending: false,
            sent: Vec::new(),
        })
    }

    /// Simulate a client connecting.
    pub fn connect_peer(&mut self) {
        self.peers += 1;
        self.greeting_pending = true;
    }

    pub fn disconnect_peer(&mut self) {
        self.peers = self.peers.saturating_sub(1);
    }

    /// Simulate an inbound frame from a connected client.
    pub fn inject_frame(&mut self, payload: &[u8]) {
        self.inbox.borrow_mut().push(payload);
    }

    pub fn pop_frame(&self) -> Option<crate::app::inbox::Frame> {
        self.inbox.borrow_mut().pop()
    }

    pub fn take_greeting_pending(&mut self) -> bool {
        core::mem::take(&mut self.greeting_pending)
    }

    /// Broadcast payloads decoded as UTF-8, oldest first.
    pub fn sent_text(&self) -> Vec<&str> {
        self.sent
            .iter()
            .filter_map(|b| core::str::from_utf8(b).ok())
            .collect()
    }
}

#[cfg(not(target_os = "espidf"))]
impl crate::app::ports::PeerPort for PeerHub {
    fn broadcast(&mut self, payload: &[u8]) {
        if self.peers > 0 {
            self.sent.push(payload.to_vec());
        }
    }

    fn peer_count(&self) -> usize {
        self.peers
    }
}
