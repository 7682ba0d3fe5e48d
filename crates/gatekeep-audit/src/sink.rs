//! Append-only audit sinks.
//!
//! [`MemoryAuditSink`] keeps records in process. [`ChannelAuditSink`] hands
//! records to a background writer: `append` returns as soon as the record is
//! queued, the queue is FIFO, and the writer drains everything queued before
//! it exits. A record the inner sink refuses poisons the channel sink: the
//! next `flush` and every later `append` return that write error.

use crate::record::{AuditFilter, AuditKind, AuditRecord};
use async_trait::async_trait;
use gatekeep_core::AuditError;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::error;

/// Destination for audit records.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append one record. Records are never mutated once appended.
    async fn append(&self, record: AuditRecord) -> Result<(), AuditError>;

    /// Wait until every appended record is durable.
    async fn flush(&self) -> Result<(), AuditError> {
        Ok(())
    }
}

/// In-memory sink with filtered reads.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: RwLock<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All records in emission order.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.read().clone()
    }

    /// Records passing `filter`, in emission order.
    pub fn query(&self, filter: &AuditFilter) -> Vec<AuditRecord> {
        self.records
            .read()
            .iter()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect()
    }

    /// Denial records.
    pub fn denials(&self) -> Vec<AuditRecord> {
        self.query(&AuditFilter::new().kind(AuditKind::Denial))
    }

    /// Mutation records.
    pub fn mutations(&self) -> Vec<AuditRecord> {
        self.query(&AuditFilter::new().kind(AuditKind::Mutation))
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn append(&self, record: AuditRecord) -> Result<(), AuditError> {
        self.records.write().push(record);
        Ok(())
    }
}

enum WriterCommand {
    Append(AuditRecord),
    Flush(oneshot::Sender<Result<(), AuditError>>),
}

/// Fire-and-forget sink backed by a background writer task.
#[derive(Debug, Clone)]
pub struct ChannelAuditSink {
    tx: mpsc::UnboundedSender<WriterCommand>,
    /// First write the inner sink refused. Sticky.
    failed: Arc<Mutex<Option<AuditError>>>,
}

impl std::fmt::Debug for WriterCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriterCommand::Append(record) => write!(f, "Append(seq={})", record.seq),
            WriterCommand::Flush(_) => f.write_str("Flush"),
        }
    }
}

impl ChannelAuditSink {
    /// Spawn the writer on the current Tokio runtime.
    ///
    /// The writer exits once every clone of the returned sink is dropped and
    /// the queue is drained; await the handle to be sure.
    pub fn spawn(inner: Arc<dyn AuditSink>) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<WriterCommand>();
        let failed = Arc::new(Mutex::new(None::<AuditError>));
        let writer_failed = Arc::clone(&failed);
        let handle = tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                match command {
                    WriterCommand::Append(record) => {
                        let seq = record.seq;
                        if let Err(e) = inner.append(record).await {
                            error!(seq, error = %e, "audit writer failed to persist record");
                            let mut failed = writer_failed.lock();
                            if failed.is_none() {
                                *failed = Some(e);
                            }
                        }
                    }
                    WriterCommand::Flush(ack) => {
                        let poisoned = writer_failed.lock().clone();
                        let result = match poisoned {
                            Some(e) => Err(e),
                            None => inner.flush().await,
                        };
                        let _ = ack.send(result);
                    }
                }
            }
        });
        (Self { tx, failed }, handle)
    }

    /// The write error that poisoned this sink, if any.
    pub fn failure(&self) -> Option<AuditError> {
        self.failed.lock().clone()
    }
}

#[async_trait]
impl AuditSink for ChannelAuditSink {
    async fn append(&self, record: AuditRecord) -> Result<(), AuditError> {
        if let Some(e) = self.failure() {
            return Err(e);
        }
        self.tx
            .send(WriterCommand::Append(record))
            .map_err(|_| AuditError::SinkClosed)
    }

    async fn flush(&self) -> Result<(), AuditError> {
        let (ack, done) = oneshot::channel();
        self.tx
            .send(WriterCommand::Flush(ack))
            .map_err(|_| AuditError::SinkClosed)?;
        done.await.map_err(|_| AuditError::SinkClosed)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::AuditOutcome;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn record(seq: u64, kind: AuditKind, actor: &str) -> AuditRecord {
        AuditRecord {
            seq,
            request_id: Uuid::nil(),
            kind,
            actor: actor.to_string(),
            operation: "createSchema".to_string(),
            target: "catalog:sales".to_string(),
            outcome: AuditOutcome::Success,
            detail: None,
            timestamp: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[tokio::test]
    async fn memory_sink_filters() {
        let sink = MemoryAuditSink::new();
        sink.append(record(1, AuditKind::Mutation, "alice")).await.unwrap();
        sink.append(record(2, AuditKind::Denial, "alice")).await.unwrap();
        sink.append(record(3, AuditKind::Mutation, "bob")).await.unwrap();

        assert_eq!(sink.len(), 3);
        assert_eq!(sink.denials().len(), 1);
        let alice = sink.query(&AuditFilter::new().actor("alice").kind(AuditKind::Mutation));
        assert_eq!(alice.len(), 1);
        assert_eq!(alice[0].seq, 1);
    }

    #[tokio::test]
    async fn channel_sink_preserves_order_and_drains_on_drop() {
        let inner = Arc::new(MemoryAuditSink::new());
        let (sink, handle) = ChannelAuditSink::spawn(inner.clone());
        for seq in 0..100 {
            sink.append(record(seq, AuditKind::Mutation, "alice")).await.unwrap();
        }
        drop(sink);
        handle.await.unwrap();

        let seqs: Vec<u64> = inner.records().iter().map(|r| r.seq).collect();
        assert_eq!(seqs, (0..100).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn flush_waits_for_queued_records() {
        let inner = Arc::new(MemoryAuditSink::new());
        let (sink, _handle) = ChannelAuditSink::spawn(inner.clone());
        sink.append(record(7, AuditKind::Denial, "carol")).await.unwrap();
        sink.flush().await.unwrap();
        assert_eq!(inner.denials().len(), 1);
    }

    struct RefusingSink;

    #[async_trait]
    impl AuditSink for RefusingSink {
        async fn append(&self, _record: AuditRecord) -> Result<(), AuditError> {
            Err(AuditError::write("disk full"))
        }
    }

    #[tokio::test]
    async fn refused_write_surfaces_on_flush_and_later_appends() {
        let (sink, _handle) = ChannelAuditSink::spawn(Arc::new(RefusingSink));
        sink.append(record(1, AuditKind::Mutation, "alice")).await.unwrap();

        assert_eq!(sink.flush().await, Err(AuditError::write("disk full")));
        assert_eq!(
            sink.append(record(2, AuditKind::Mutation, "alice")).await,
            Err(AuditError::write("disk full"))
        );
        assert_eq!(sink.flush().await, Err(AuditError::write("disk full")));
    }
}
