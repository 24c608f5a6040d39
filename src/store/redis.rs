use ::redis::aio::ConnectionManager;
use ::redis::AsyncCommands;
use ::redis::Client;
use tokio::sync::mpsc;

use crate::error::{AppError, AppResult};
use crate::store::KeyValueStore;

/// Creates a Redis client for the watched-list store
pub fn create_redis_client(redis_url: &str) -> AppResult<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Message for asynchronous store writes
struct WriteMessage {
    key: String,
    value: String,
}

/// Redis-backed store whose writes are handed to a background task.
///
/// Reads and the writer share one `ConnectionManager`, which reconnects on
/// its own after a dropped connection.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    write_tx: mpsc::UnboundedSender<WriteMessage>,
}

/// Handle for gracefully shutting down the store writer
pub struct RedisWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

impl RedisWriterHandle {
    /// Signals the writer and waits until every queued write reached Redis
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("Store writer shutdown signal sent");
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Store writer task failed");
        }
    }
}

impl RedisStore {
    /// Connects, then spawns the background writer
    pub async fn new(redis_client: Client) -> AppResult<(Self, RedisWriterHandle)> {
        let conn = ConnectionManager::new(redis_client).await?;
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let writer_conn = conn.clone();
        let task = tokio::spawn(async move {
            Self::writer_task(writer_conn, write_rx, shutdown_rx).await;
        });

        let store = Self { conn, write_tx };

        Ok((store, RedisWriterHandle { shutdown_tx, task }))
    }

    /// Applies queued writes in order. On shutdown, drains what is already queued.
    async fn writer_task(
        mut conn: ConnectionManager,
        mut write_rx: mpsc::UnboundedReceiver<WriteMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("Store writer task started");

        loop {
            tokio::select! {
                Some(msg) = write_rx.recv() => {
                    if let Err(e) = Self::write_to_redis(&mut conn, msg).await {
                        tracing::error!(error = %e, "Failed to write to Redis store");
                    }
                }
                _ = shutdown_rx.recv() => {
                    tracing::info!("Store writer shutting down, flushing remaining writes");

                    while let Ok(msg) = write_rx.try_recv() {
                        if let Err(e) = Self::write_to_redis(&mut conn, msg).await {
                            tracing::error!(error = %e, "Failed to flush store write during shutdown");
                        }
                    }

                    tracing::info!("Store writer task stopped");
                    break;
                }
            }
        }
    }

    async fn write_to_redis(conn: &mut ConnectionManager, msg: WriteMessage) -> AppResult<()> {
        let _: () = conn.set(msg.key, msg.value).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl KeyValueStore for RedisStore {
    async fn get_raw(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    /// Queues the write and returns immediately
    async fn set_raw(&self, key: &str, value: String) -> AppResult<()> {
        let msg = WriteMessage {
            key: key.to_string(),
            value,
        };

        if self.write_tx.send(msg).is_err() {
            tracing::error!(key = %key, "Store writer is gone, write dropped");
            return Err(AppError::Internal(
                "Redis store writer is not running".to_string(),
            ));
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
