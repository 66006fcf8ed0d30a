//! Cancellation signaling for in-flight syncs.
//!
//! Abstracts tokio's watch channel into a one-way cancellation flag. A sync
//! holds the receiver and checks it between stages; the caller keeps the
//! sender and flips it to request cancellation.
//!
//! Cancellation is cooperative and stage-granular: an already-issued external
//! call runs to completion, and a sync that has already swapped its table
//! never undoes the swap in response to cancellation.

use tokio::sync::watch;

/// Transmitter side of a cancellation signal.
pub type CancelTx = watch::Sender<bool>;

/// Receiver side of a cancellation signal.
pub type CancelRx = watch::Receiver<bool>;

/// Creates a new cancellation signal channel.
///
/// The channel starts un-cancelled. Calling [`request_cancel`] flips it;
/// there is no way to un-cancel.
pub fn create_cancel_signal() -> (CancelTx, CancelRx) {
    watch::channel(false)
}

/// Requests cancellation of every sync holding a receiver of this channel.
pub fn request_cancel(tx: &CancelTx) {
    // send only fails when every receiver is gone, in which case there is
    // nothing left to cancel.
    let _ = tx.send(true);
}

/// Returns whether cancellation has been requested on this channel.
pub fn is_cancelled(rx: &CancelRx) -> bool {
    *rx.borrow()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_uncancelled_and_flips_once_requested() {
        let (tx, rx) = create_cancel_signal();
        assert!(!is_cancelled(&rx));

        request_cancel(&tx);
        assert!(is_cancelled(&rx));
    }

    #[test]
    fn request_with_no_receivers_is_a_noop() {
        let (tx, rx) = create_cancel_signal();
        drop(rx);
        request_cancel(&tx);
    }
}
