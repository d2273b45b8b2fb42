use std::sync::atomic::{AtomicBool, Ordering};

static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Interrupts only raise a flag that blocking loops poll. The process keeps
/// running so that an interactive session ends through its normal return path.
pub fn install_signal_handler() {
    let _ = ctrlc::set_handler(|| record_interrupt(&SHUTDOWN_REQUESTED));
}

fn record_interrupt(flag: &AtomicBool) {
    if !flag.swap(true, Ordering::SeqCst) {
        tracing::debug!("interrupt received");
    }
}

pub fn shutdown_requested() -> bool {
    SHUTDOWN_REQUESTED.load(Ordering::SeqCst)
}
