//! Engine wiring: configuration in, guarded services out.

use crate::error::CatalogResult;
use crate::service::{CatalogService, ComputeService, GrantService, StorageService};
use crate::store::MetadataStore;
use gatekeep_audit::{AuditLog, AuditSink, ChannelAuditSink};
use gatekeep_authorization::Authorizer;
use gatekeep_core::{GatekeepConfig, RequestContext};
use gatekeep_grants::{GrantStore, InMemoryGrantStore};
use std::sync::Arc;
use tracing::info;

/// A running engine: one grant store, one audit log, one metadata store, and
/// the services over them.
#[derive(Debug, Clone)]
pub struct Platform {
    config: GatekeepConfig,
    metadata: Arc<MetadataStore>,
    authz: Authorizer,
    /// Catalogs, schemas, tables, columns, views
    pub catalogs: CatalogService,
    /// Volumes, storage credentials, external locations
    pub storage: StorageService,
    /// Compute endpoints and assignments
    pub compute: ComputeService,
    /// Grant administration
    pub access: GrantService,
}

impl Platform {
    /// Start with an in-memory grant store seeded from `[bootstrap]`.
    ///
    /// Must run inside a Tokio runtime when `audit.async_writer` is set.
    pub async fn start(config: GatekeepConfig, sink: Arc<dyn AuditSink>) -> CatalogResult<Self> {
        let grants = Arc::new(InMemoryGrantStore::from_bootstrap(&config.bootstrap));
        Self::start_with_store(config, grants, sink).await
    }

    /// Start over an existing grant store. Bootstrap grants are not applied.
    pub async fn start_with_store(
        config: GatekeepConfig,
        grants: Arc<dyn GrantStore>,
        sink: Arc<dyn AuditSink>,
    ) -> CatalogResult<Self> {
        let sink: Arc<dyn AuditSink> = if config.audit.async_writer {
            // The writer task ends once the last handle to the log is dropped.
            let (channel, _writer) = ChannelAuditSink::spawn(sink);
            Arc::new(channel)
        } else {
            sink
        };
        let audit = Arc::new(AuditLog::new(sink).with_tracing_mirror(config.audit.mirror_to_tracing));
        let authz = Authorizer::new(grants, audit);
        let metadata = Arc::new(MetadataStore::new());

        let platform = Self {
            catalogs: CatalogService::new(metadata.clone(), authz.clone()),
            storage: StorageService::new(metadata.clone(), authz.clone()),
            compute: ComputeService::new(
                metadata.clone(),
                authz.clone(),
                config.default_catalog.clone(),
            ),
            access: GrantService::new(metadata.clone(), authz.clone()),
            metadata,
            authz,
            config,
        };

        let mut names = vec![platform.config.default_catalog.clone()];
        names.extend(platform.config.bootstrap.catalogs.iter().cloned());
        names.dedup();
        let attached = platform
            .catalogs
            .attach_all(&RequestContext::system(), &names)
            .await?;
        info!(
            default_catalog = %platform.config.default_catalog,
            attached,
            async_audit = platform.config.audit.async_writer,
            "gatekeep platform started"
        );
        Ok(platform)
    }

    /// Effective configuration.
    pub fn config(&self) -> &GatekeepConfig {
        &self.config
    }

    /// Catalog metadata, for read paths.
    pub fn metadata(&self) -> &Arc<MetadataStore> {
        &self.metadata
    }

    /// The shared check routine.
    pub fn authorizer(&self) -> &Authorizer {
        &self.authz
    }

    /// The shared audit log.
    pub fn audit(&self) -> &Arc<AuditLog> {
        self.authz.audit()
    }

    /// Wait until every audit record emitted so far is persisted.
    pub async fn flush(&self) -> CatalogResult<()> {
        Ok(self.audit().flush().await?)
    }
}
