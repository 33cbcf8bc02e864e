//! Keep-alive heartbeat for long-running searches.
//!
//! One dedicated thread per search pings the backend at half the interval
//! the server reported (5s when it reported none). The owning action closes
//! the per-search done channel during reset or shutdown; a failed ping logs
//! and ends the thread without retrying.

use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{RecvTimeoutError, Sender, bounded};

use super::{Backend, SearchId};

/// Default cadence when the server reports no interval.
const DEFAULT_CADENCE: Duration = Duration::from_secs(5);
/// Floor so a tiny reported interval cannot spin the thread.
const MIN_CADENCE: Duration = Duration::from_secs(1);

/// Cadence derived from a server-reported interval.
pub fn cadence_for(interval: Option<Duration>) -> Duration {
    match interval {
        Some(i) => (i / 2).max(MIN_CADENCE),
        None => DEFAULT_CADENCE,
    }
}

/// Handle to a running keep-alive thread. Dropping it signals done and
/// joins the thread.
pub struct Keepalive {
    done: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Keepalive {
    /// Spawn the ping thread for `id`.
    pub fn spawn(backend: Arc<dyn Backend>, id: SearchId, interval: Option<Duration>) -> Self {
        let cadence = cadence_for(interval);
        let (done_tx, done_rx) = bounded::<()>(0);
        let handle = std::thread::spawn(move || {
            tracing::debug!(search = %id, ?cadence, "keepalive started");
            loop {
                match done_rx.recv_timeout(cadence) {
                    Err(RecvTimeoutError::Timeout) => {
                        if let Err(err) = backend.keepalive_search(&id) {
                            tracing::warn!(search = %id, %err, "keepalive ping failed; stopping");
                            return;
                        }
                    }
                    // Done channel closed or signalled: clean shutdown.
                    _ => {
                        tracing::debug!(search = %id, "keepalive stopped");
                        return;
                    }
                }
            }
        });
        Self {
            done: Some(done_tx),
            handle: Some(handle),
        }
    }

    /// Signal the thread and wait for it to exit.
    pub fn stop(&mut self) {
        // Dropping the sender closes the channel; recv returns Disconnected.
        self.done.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Keepalive {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryBackend;
    use std::sync::atomic::Ordering;
    use std::time::Instant;

    #[test]
    fn cadence_is_half_interval_with_floor() {
        assert_eq!(cadence_for(Some(Duration::from_secs(10))), Duration::from_secs(5));
        assert_eq!(cadence_for(Some(Duration::from_millis(500))), MIN_CADENCE);
        assert_eq!(cadence_for(None), DEFAULT_CADENCE);
    }

    #[test]
    fn stop_terminates_promptly() {
        let backend = Arc::new(MemoryBackend::with_demo_data());
        let mut ka = Keepalive::spawn(backend, SearchId("s1".into()), Some(Duration::from_secs(60)));
        let start = Instant::now();
        ka.stop();
        // recv_timeout wakes immediately on disconnect, well inside a cadence.
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn pings_flow_until_stopped() {
        let backend = Arc::new(MemoryBackend::with_demo_data());
        let search = backend
            .start_search("tag=default", Duration::from_secs(60))
            .unwrap();
        let mut ka = Keepalive::spawn(
            backend.clone(),
            search.id.clone(),
            Some(Duration::from_millis(2000)),
        );
        std::thread::sleep(Duration::from_millis(2600));
        ka.stop();
        assert!(backend.keepalive_count.load(Ordering::SeqCst) >= 1);
    }
}
