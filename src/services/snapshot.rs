use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;

/// Last-request-wins gate for asynchronously computed views.
///
/// Every request takes a ticket up front. Results may finish in any order,
/// but a result is only delivered when its ticket is newer than the one last
/// delivered, so a slow stale computation never replaces a newer view.
#[derive(Default)]
pub struct SnapshotSlot {
    next_ticket: AtomicU64,
    delivered: Mutex<u64>,
}

impl SnapshotSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tickets start at 1 and strictly increase.
    pub fn issue(&self) -> u64 {
        self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Hands `value` to `deliver` if `ticket` is the newest seen so far.
    /// Delivery runs while the slot is held, so deliveries keep ticket order.
    /// Returns whether the value was delivered.
    pub async fn apply<T, F>(&self, ticket: u64, value: T, deliver: F) -> bool
    where
        F: FnOnce(T),
    {
        let mut delivered = self.delivered.lock().await;
        if ticket <= *delivered {
            tracing::debug!(ticket, latest = *delivered, "Dropping stale snapshot");
            return false;
        }
        *delivered = ticket;
        deliver(value);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_tickets_increase() {
        let slot = SnapshotSlot::new();
        assert_eq!(slot.issue(), 1);
        assert_eq!(slot.issue(), 2);
    }

    #[tokio::test]
    async fn test_stale_result_is_dropped() {
        let slot = SnapshotSlot::new();
        let first = slot.issue();
        let second = slot.issue();

        let mut seen = Vec::new();
        assert!(slot.apply(second, "second", |v| seen.push(v)).await);
        assert!(!slot.apply(first, "first", |v| seen.push(v)).await);
        assert_eq!(seen, vec!["second"]);
    }

    #[tokio::test]
    async fn test_same_ticket_delivers_once() {
        let slot = SnapshotSlot::new();
        let ticket = slot.issue();
        assert!(slot.apply(ticket, 1, |_| {}).await);
        assert!(!slot.apply(ticket, 2, |_| {}).await);
    }

    #[tokio::test]
    async fn test_slow_first_request_does_not_win() {
        let slot = Arc::new(SnapshotSlot::new());
        let delivered = Arc::new(Mutex::new(Vec::new()));

        let mut handles = Vec::new();
        for (label, delay_ms) in [("slow", 50u64), ("fast", 0)] {
            let ticket = slot.issue();
            let slot = slot.clone();
            let delivered = delivered.clone();
            handles.push(tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                let mut seen = Vec::new();
                slot.apply(ticket, label, |v| seen.push(v)).await;
                delivered.lock().await.extend(seen);
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(*delivered.lock().await, vec!["fast"]);
    }
}
