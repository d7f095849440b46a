use tokio::sync::broadcast;

/// Fan-out stop signal for virtual users and the spawner.
pub type ShutdownSender = broadcast::Sender<()>;
pub type ShutdownReceiver = broadcast::Receiver<()>;
