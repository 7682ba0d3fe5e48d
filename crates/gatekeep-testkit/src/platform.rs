//! Pre-wired platform fixture.

use gatekeep_audit::{AuditSink, MemoryAuditSink};
use gatekeep_catalog::{ColumnInfo, CreateSchema, CreateTable, Platform};
use gatekeep_core::{GatekeepConfig, Principal, RequestContext};
use gatekeep_grants::GrantStore;
use std::sync::Arc;

/// Platform with catalogs `main` and `sales`, schema `sales.orders` and table
/// `sales.orders.events`, created by the admin `bob`. The memory sink sees
/// every audit record.
pub struct TestPlatform {
    pub platform: Platform,
    pub sink: Arc<MemoryAuditSink>,
}

impl TestPlatform {
    /// Default fixture over an in-memory grant store.
    pub async fn sales() -> Self {
        let sink = Arc::new(MemoryAuditSink::new());
        let platform = Platform::start(config(), sink.clone()).await.unwrap();
        seed(&platform).await;
        Self { platform, sink }
    }

    /// Fixture over a caller-supplied grant store. Seeding runs with a
    /// principal-flag admin, so it works whatever state the store is in.
    pub async fn with_store(store: Arc<dyn GrantStore>) -> Self {
        let sink = Arc::new(MemoryAuditSink::new());
        let platform = Platform::start_with_store(config(), store, sink.clone())
            .await
            .unwrap();
        seed(&platform).await;
        Self { platform, sink }
    }

    /// Fixture writing audit records to `sink` instead of the memory sink.
    pub async fn with_sink(sink: Arc<dyn AuditSink>) -> Platform {
        let platform = Platform::start(config(), sink).await.unwrap();
        seed(&platform).await;
        platform
    }

    /// Like [`with_sink`](Self::with_sink), with `sink` behind the
    /// background audit writer.
    pub async fn with_async_sink(sink: Arc<dyn AuditSink>) -> Platform {
        let mut config = config();
        config.audit.async_writer = true;
        let platform = Platform::start(config, sink).await.unwrap();
        seed(&platform).await;
        platform.flush().await.unwrap();
        platform
    }
}

fn config() -> GatekeepConfig {
    let mut config = GatekeepConfig::default();
    config.audit.mirror_to_tracing = false;
    config.bootstrap.catalogs = vec!["sales".to_string()];
    config
}

async fn seed(platform: &Platform) {
    let bob = RequestContext::new(Principal::admin("bob"));
    platform
        .catalogs
        .create_schema(
            &bob,
            CreateSchema {
                catalog_name: "sales".into(),
                name: "orders".into(),
                comment: None,
            },
        )
        .await
        .unwrap();
    platform
        .catalogs
        .create_table(
            &bob,
            CreateTable {
                catalog_name: "sales".into(),
                schema_name: "orders".into(),
                name: "events".into(),
                columns: vec![(
                    "id".into(),
                    ColumnInfo {
                        data_type: "bigint".into(),
                        nullable: false,
                        comment: None,
                    },
                )],
                comment: None,
            },
        )
        .await
        .unwrap();
}
