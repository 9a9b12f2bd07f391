use std::sync::Arc;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::net::probe::ProbeSocket;
use crate::net::queue::AddrQueue;

/// One pool consumer: drains the shared queue and fires one probe per
/// address until cancelled. Send failures are logged and skipped; workers
/// share nothing but the queue.
pub async fn run(id: usize, queue: Arc<AddrQueue>, socket: ProbeSocket, cancel: CancellationToken) {
    log::info!("worker {id}: starting");
    let mut stream = AddrQueue::as_stream(queue);

    loop {
        let addr = tokio::select! {
            _ = cancel.cancelled() => break,
            addr = stream.next() => match addr {
                Some(addr) => addr,
                // producer gone and queue drained
                None => break,
            },
        };
        if let Err(e) = socket.send(addr) {
            log::warn!("worker {id}: could not send ping packet: {e}");
        }
    }

    log::info!("worker {id}: stopped");
}
