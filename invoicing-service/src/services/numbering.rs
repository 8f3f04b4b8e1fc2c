use chrono::Utc;
use rand::Rng;
use std::sync::atomic::{AtomicI64, Ordering};

/// Produces invoice numbers of the form `INV-<millis>-<XXXX>`.
///
/// The millisecond part never repeats within a process, even when several
/// invoices are finalized in the same millisecond; the random hex suffix
/// separates numbers issued by different processes.
#[derive(Debug, Default)]
pub struct InvoiceNumberGenerator {
    last_millis: AtomicI64,
}

impl InvoiceNumberGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self) -> String {
        let millis = self.next_millis();
        let suffix: u16 = rand::thread_rng().gen();
        format!("INV-{}-{:04X}", millis, suffix)
    }

    fn next_millis(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let mut last = self.last_millis.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(last + 1);
            match self.last_millis.compare_exchange_weak(
                last,
                candidate,
                Ordering::SeqCst,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate,
                Err(actual) => last = actual,
            }
        }
    }
}
