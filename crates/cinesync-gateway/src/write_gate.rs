use std::sync::{Arc, Mutex};
use tokio::sync::{watch, Semaphore};

/// Parks writes so tests can line up read-modify-write interleavings.
///
/// While held, every write waits for a permit. Permits are handed out in
/// arrival order.
pub(crate) struct WriteGate {
    held: Mutex<Option<Arc<Semaphore>>>,
    parked: watch::Sender<usize>,
}

impl WriteGate {
    pub(crate) fn new() -> Self {
        let (parked, _) = watch::channel(0);
        Self {
            held: Mutex::new(None),
            parked,
        }
    }

    pub(crate) fn hold(&self) {
        let mut held = self.held.lock().unwrap_or_else(|e| e.into_inner());
        if held.is_none() {
            *held = Some(Arc::new(Semaphore::new(0)));
        }
    }

    pub(crate) fn release(&self, writes: usize) {
        if let Some(semaphore) = self.held.lock().unwrap_or_else(|e| e.into_inner()).as_ref() {
            semaphore.add_permits(writes);
        }
    }

    pub(crate) fn resume(&self) {
        // Closing wakes every parked write; acquire then fails and the write proceeds.
        if let Some(semaphore) = self.held.lock().unwrap_or_else(|e| e.into_inner()).take() {
            semaphore.close();
        }
    }

    #[cfg(test)]
    pub(crate) fn parked(&self) -> usize {
        *self.parked.borrow()
    }

    pub(crate) async fn wait_for_parked(&self, count: usize) {
        let mut parked = self.parked.subscribe();
        // The sender lives as long as the gate, so this only returns once satisfied.
        let _ = parked.wait_for(|n| *n >= count).await;
    }

    pub(crate) async fn pass(&self) {
        let semaphore = self.held.lock().unwrap_or_else(|e| e.into_inner()).clone();
        let Some(semaphore) = semaphore else {
            return;
        };

        self.parked.send_modify(|n| *n += 1);
        let permit = semaphore.acquire().await;
        self.parked.send_modify(|n| *n -= 1);

        if let Ok(permit) = permit {
            permit.forget();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_open_gate_passes_immediately() {
        let gate = WriteGate::new();
        gate.pass().await;
        assert_eq!(gate.parked(), 0);
    }

    #[tokio::test]
    async fn test_held_gate_parks_until_released() {
        let gate = Arc::new(WriteGate::new());
        gate.hold();

        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.pass().await })
        };
        gate.wait_for_parked(1).await;
        assert!(!waiter.is_finished());

        gate.release(1);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("write should pass after release")
            .unwrap();
        assert_eq!(gate.parked(), 0);
    }

    #[tokio::test]
    async fn test_resume_releases_everyone() {
        let gate = Arc::new(WriteGate::new());
        gate.hold();

        let mut waiters = Vec::new();
        for _ in 0..3 {
            let gate = gate.clone();
            waiters.push(tokio::spawn(async move { gate.pass().await }));
        }
        gate.wait_for_parked(3).await;
        gate.resume();

        for waiter in waiters {
            tokio::time::timeout(Duration::from_secs(1), waiter)
                .await
                .expect("resume should release parked writes")
                .unwrap();
        }
        // Once resumed, writes no longer park.
        gate.pass().await;
    }
}
