//! Process-signal handling for the solver.
//!
//! A single-slot registration protocol connects the OS signal watcher to
//! the active solver session: the session registers itself before solving
//! and deregisters afterwards. On SIGINT/SIGTERM/SIGABRT the watcher
//! requests a cooperative stop if a check is running, and otherwise prints
//! the current measurements and exits with a non-zero status. With no
//! session registered the process exits immediately.

use crate::measure::Measurements;
use signal_hook::consts::{SIGABRT, SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Once};

/// Handles shared between a solver session and the signal watcher.
#[derive(Clone)]
pub struct Session {
    /// Cooperative stop flag polled by the back-end search loop.
    pub stop: Arc<AtomicBool>,
    /// True while the back-end is inside a satisfiability check.
    pub searching: Arc<AtomicBool>,
    /// Snapshot of the measurements, refreshed by the session.
    pub measurements: Arc<Mutex<Measurements>>,
}

static SLOT: Mutex<Option<Session>> = Mutex::new(None);
static INSTALL: Once = Once::new();

/// Installs the signal watcher thread. Idempotent.
pub fn install_handlers() {
    INSTALL.call_once(|| {
        let mut signals =
            Signals::new([SIGINT, SIGTERM, SIGABRT]).expect("failed to register signal handlers");
        std::thread::spawn(move || {
            for _signal in signals.forever() {
                let slot = SLOT.lock().unwrap();
                match slot.as_ref() {
                    None => std::process::exit(1),
                    Some(session) => {
                        if session.searching.load(Ordering::SeqCst) {
                            // interrupt the running check; the driver keeps
                            // the last model as best-so-far and returns
                            session.stop.store(true, Ordering::SeqCst);
                        } else {
                            let measurements = session.measurements.lock().unwrap();
                            println!("{}", measurements.result_line());
                            std::process::exit(1);
                        }
                    }
                }
            }
        });
    });
}

/// Makes `session` the target of future signals, replacing any previous one.
pub fn register(session: Session) {
    *SLOT.lock().unwrap() = Some(session);
}

/// Detaches the current session; subsequent signals terminate the process.
pub fn deregister() {
    *SLOT.lock().unwrap() = None;
}
