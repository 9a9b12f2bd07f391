use std::net::Ipv6Addr;
use std::time::Duration;

use tokio::sync::mpsc::Sender;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Sole producer of the outbound address stream. Cycles through the
/// per-frame address lists forever, racing a rate ticker against each
/// frame's display deadline.
pub struct Scheduler {
    lists: Vec<Vec<Ipv6Addr>>,
    durations: Vec<Duration>,
    /// Rate tick period, the reciprocal of the configured draw rate.
    tick: Duration,
}

impl Scheduler {
    pub fn new(lists: Vec<Vec<Ipv6Addr>>, durations: Vec<Duration>, rate: u32) -> Self {
        debug_assert_eq!(lists.len(), durations.len());
        Self {
            lists,
            durations,
            tick: Duration::from_secs(1) / rate.max(1),
        }
    }

    pub async fn run(self, queue: Sender<Ipv6Addr>, cancel: CancellationToken) {
        if self.lists.is_empty() {
            return;
        }
        let mut idx = 0;
        loop {
            if !self.run_frame(idx, &queue, &cancel).await {
                break;
            }
            idx = (idx + 1) % self.lists.len();
        }
        log::info!("scheduler: stopped");
    }

    /// Plays one frame: pushes the full address list as a burst, re-pushing
    /// it on every rate tick, until the frame deadline fires. A deadline
    /// mid-burst abandons the remainder on the spot; the frame never
    /// carries over. Returns false on cancellation or when every worker is
    /// gone.
    async fn run_frame(
        &self,
        idx: usize,
        queue: &Sender<Ipv6Addr>,
        cancel: &CancellationToken,
    ) -> bool {
        let deadline = Instant::now() + self.durations[idx];
        let sleep = time::sleep_until(deadline);
        tokio::pin!(sleep);

        let mut ticker = time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately
        ticker.tick().await;

        loop {
            for &addr in &self.lists[idx] {
                tokio::select! {
                    _ = cancel.cancelled() => return false,
                    _ = &mut sleep => return true,
                    res = queue.send(addr) => {
                        if res.is_err() {
                            return false;
                        }
                    }
                }
            }
            tokio::select! {
                _ = cancel.cancelled() => return false,
                _ = &mut sleep => return true,
                _ = ticker.tick() => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    const A1: Ipv6Addr = Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0xff, 0, 0);
    const A2: Ipv6Addr = Ipv6Addr::new(0x2001, 0xdb8, 0, 1, 0, 0xff, 0, 0);
    const A3: Ipv6Addr = Ipv6Addr::new(0x2001, 0xdb8, 0, 2, 0, 0xff, 0, 0);
    const B1: Ipv6Addr = Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 1, 0, 0xff, 0);

    #[tokio::test(start_paused = true)]
    async fn test_full_list_repushed_until_deadline() {
        // rate 10/s => 100ms ticks; 250ms frame => exactly three bursts
        let sched = Scheduler::new(
            vec![vec![A1, A2, A3]],
            vec![Duration::from_millis(250)],
            10,
        );
        let (tx, mut rx) = mpsc::channel(100);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(sched.run(tx, cancel.clone()));

        let mut got = Vec::new();
        for _ in 0..9 {
            got.push(rx.recv().await.unwrap());
        }
        assert_eq!(got, vec![A1, A2, A3, A1, A2, A3, A1, A2, A3]);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_abandons_rest_of_burst() {
        // capacity 1 so the producer wedges on the second address of the
        // first frame until its 10ms deadline cuts the burst short
        let sched = Scheduler::new(
            vec![vec![A1, A2], vec![B1]],
            vec![Duration::from_millis(10), Duration::from_secs(3600)],
            1000,
        );
        let (tx, mut rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(sched.run(tx, cancel.clone()));

        time::sleep(Duration::from_millis(20)).await;

        // A2 was abandoned; the next cycle starts at address 0 of frame 1
        assert_eq!(rx.recv().await, Some(A1));
        assert_eq!(rx.recv().await, Some(B1));
        // and frame 1 keeps re-pushing its full list until its deadline
        assert_eq!(rx.recv().await, Some(B1));

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_frame_advances_at_deadline() {
        let sched = Scheduler::new(
            vec![vec![], vec![A1]],
            vec![Duration::from_millis(5), Duration::from_millis(5)],
            100,
        );
        let (tx, mut rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(sched.run(tx, cancel.clone()));

        assert_eq!(rx.recv().await, Some(A1));

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_workers_are_gone() {
        let sched = Scheduler::new(vec![vec![A1]], vec![Duration::from_secs(1)], 10);
        let (tx, rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(sched.run(tx, cancel));

        drop(rx);
        handle.await.unwrap();
    }
}
