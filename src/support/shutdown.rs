//! Graceful shutdown coordination, shared by every background task a station
//! or the operator UI spawns (ATG loops, heartbeat timer, WS ping timer).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;

/// A shutdown signal that can be cloned and observed from many tasks.
#[derive(Clone)]
pub struct ShutdownSignal {
    sender: broadcast::Sender<()>,
    triggered: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(1);
        Self {
            sender,
            triggered: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered.load(Ordering::SeqCst)
    }

    pub fn trigger(&self) {
        if !self.triggered.swap(true, Ordering::SeqCst) {
            info!("shutdown signal triggered");
            let _ = self.sender.send(());
        }
    }

    /// A future that resolves once shutdown has been triggered, even if it
    /// already was before this call.
    pub fn notified(&self) -> ShutdownNotified {
        ShutdownNotified {
            receiver: self.sender.subscribe(),
            triggered: self.triggered.clone(),
        }
    }

    pub async fn wait(&self) {
        self.notified().wait().await
    }

    pub fn start_signal_listener(&self) {
        let signal = self.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("received ctrl-c");
            }
            signal.trigger();
        });
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ShutdownNotified {
    receiver: broadcast::Receiver<()>,
    triggered: Arc<AtomicBool>,
}

impl ShutdownNotified {
    pub async fn wait(mut self) {
        if self.triggered.load(Ordering::SeqCst) {
            return;
        }
        let _ = self.receiver.recv().await;
    }
}
