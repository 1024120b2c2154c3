//! Shared knowledge-graph service.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use notegraph_graph::{
    AnalyticsEngine, Cluster, Concept, ConceptExtractor, ConceptRank, Connection, GraphState,
    GraphStats, GraphStore, SearchEngine, SearchResult, StrengthGroups, UpdateEngine,
    UpdatePolicy, UpdateSummary,
};
use notegraph_watcher::{DocumentEvent, DocumentEventKind, NoteScanner, NoteWatcher, WatchConfig};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock, RwLockWriteGuard};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::VaultConfig;
use crate::error::{Result, VaultError};
use crate::storage::StateStore;

/// The knowledge graph shared by every caller.
///
/// All mutations take the write lock for their whole duration, and every
/// query takes the read lock, so readers always see a state between two
/// complete document updates. When persistence is enabled the state is
/// saved after each mutation, in mutation order.
///
/// Cloning is cheap and yields a handle to the same graph.
#[derive(Clone)]
pub struct KnowledgeGraph {
    store: Arc<RwLock<GraphStore>>,
    state: Option<Arc<Mutex<StateStore>>>,
    extractor: ConceptExtractor,
    updater: UpdateEngine,
}

impl KnowledgeGraph {
    /// Create a new knowledge graph builder.
    pub fn builder() -> KnowledgeGraphBuilder {
        KnowledgeGraphBuilder::new()
    }

    /// Open the graph described by `config`, loading any stored state.
    pub async fn open(config: &VaultConfig) -> Result<Self> {
        config.validate()?;

        let (store, state) = if config.persist {
            let state_store = StateStore::open(&config.state_dir).await?;
            let store = match state_store.load().await? {
                Some(state) => GraphStore::import_state(state)?,
                None => GraphStore::new(),
            };
            (store, Some(Arc::new(Mutex::new(state_store))))
        } else {
            (GraphStore::new(), None)
        };

        info!(
            "Opened knowledge graph with {} concepts and {} connections",
            store.concept_count(),
            store.connection_count()
        );

        Ok(Self {
            store: Arc::new(RwLock::new(store)),
            state,
            extractor: ConceptExtractor::new(),
            updater: UpdateEngine::new(config.update)?,
        })
    }

    /// An empty graph that is never persisted.
    pub fn in_memory(policy: UpdatePolicy) -> Result<Self> {
        Ok(Self {
            store: Arc::new(RwLock::new(GraphStore::new())),
            state: None,
            extractor: ConceptExtractor::new(),
            updater: UpdateEngine::new(policy)?,
        })
    }

    /// Directory the state is saved to, if persistence is enabled.
    pub async fn state_dir(&self) -> Option<PathBuf> {
        match &self.state {
            Some(state) => Some(state.lock().await.root().to_path_buf()),
            None => None,
        }
    }

    // ---- mutations ----

    /// A document was created or changed: extract its references and
    /// update the graph.
    pub async fn on_document_changed(
        &self,
        document_id: &str,
        content: &str,
    ) -> Result<UpdateSummary> {
        let concepts = self.extractor.extract(content);
        self.apply_document(document_id, &concepts).await
    }

    /// Apply an already extracted concept sequence.
    pub async fn apply_document(
        &self,
        document_id: &str,
        concepts: &[String],
    ) -> Result<UpdateSummary> {
        let mut store = self.store.write().await;
        let summary = self.updater.apply_document(&mut store, document_id, concepts);

        if summary.mentions > 0 {
            info!(
                "Applied {document_id}: {} mentions, {} new concepts, {} new connections, {} reinforced",
                summary.mentions,
                summary.concepts_created,
                summary.connections_created,
                summary.connections_strengthened
            );
            self.persist(store).await?;
        } else {
            debug!("No concept references in {document_id}");
        }
        Ok(summary)
    }

    /// Remove a concept and every connection touching it.
    pub async fn delete_concept(&self, name: &str) -> Result<Option<Concept>> {
        let mut store = self.store.write().await;
        let removed = store.delete_concept(name);
        if removed.is_some() {
            info!("Deleted concept {name}");
            self.persist(store).await?;
        }
        Ok(removed)
    }

    /// Set or clear a concept's description. Returns `false` if the concept
    /// doesn't exist.
    pub async fn set_description(&self, name: &str, description: Option<String>) -> Result<bool> {
        let mut store = self.store.write().await;
        let updated = store.set_description(name, description);
        if updated {
            debug!("Updated description of {name}");
            self.persist(store).await?;
        }
        Ok(updated)
    }

    /// Replace the whole graph with an imported snapshot.
    ///
    /// The snapshot is validated first; on error the current graph is kept.
    pub async fn import_state(&self, state: GraphState) -> Result<()> {
        let imported = GraphStore::import_state(state)?;
        let mut store = self.store.write().await;
        *store = imported;
        info!(
            "Imported {} concepts and {} connections",
            store.concept_count(),
            store.connection_count()
        );
        self.persist(store).await
    }

    /// Save the graph while still ordered behind the mutation that produced it.
    ///
    /// The state lock is taken before the write lock is released, so saves
    /// happen in the same order as the mutations.
    async fn persist(&self, store: RwLockWriteGuard<'_, GraphStore>) -> Result<()> {
        let Some(state) = &self.state else {
            return Ok(());
        };
        let snapshot = store.export_state();
        let state_store = state.lock().await;
        drop(store);
        state_store.save(&snapshot).await
    }

    // ---- queries ----

    /// Snapshot of the graph in its persisted layout.
    pub async fn export_state(&self) -> GraphState {
        self.store.read().await.export_state()
    }

    /// Look up a concept.
    pub async fn concept(&self, name: &str) -> Option<Concept> {
        self.store.read().await.get_concept(name).cloned()
    }

    /// Connections touching a concept.
    pub async fn connections_of(&self, name: &str) -> Vec<Connection> {
        self.store
            .read()
            .await
            .connections_of(name)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Number of connections touching a concept.
    pub async fn connection_count(&self, name: &str) -> usize {
        let store = self.store.read().await;
        AnalyticsEngine::new(&store).connection_count(name)
    }

    /// Connections partitioned into strong, medium and weak.
    pub async fn group_by_strength(&self) -> StrengthGroups {
        let store = self.store.read().await;
        AnalyticsEngine::new(&store).group_by_strength()
    }

    /// Graph density as a whole percentage.
    pub async fn density(&self) -> u32 {
        let store = self.store.read().await;
        AnalyticsEngine::new(&store).density()
    }

    /// Concepts ranked by connection count.
    pub async fn most_connected(&self, limit: Option<usize>) -> Vec<ConceptRank> {
        let store = self.store.read().await;
        AnalyticsEngine::new(&store).most_connected(limit)
    }

    /// One-hop clusters.
    pub async fn clusters(&self) -> Vec<Cluster> {
        let store = self.store.read().await;
        AnalyticsEngine::new(&store).clusters()
    }

    /// Search concepts and connections.
    pub async fn search(&self, query: &str) -> Vec<SearchResult> {
        let store = self.store.read().await;
        SearchEngine::new(&store).search(query)
    }

    /// Summary statistics.
    pub async fn stats(&self) -> GraphStats {
        let store = self.store.read().await;
        AnalyticsEngine::new(&store).stats()
    }

    // ---- notes folders ----

    /// Apply every note in a folder.
    pub async fn ingest_directory(&self, notes: &WatchConfig) -> Result<IngestReport> {
        let mut scanner = NoteScanner::new(notes.clone());
        self.ingest_changes(&mut scanner).await
    }

    /// Rescan with an existing scanner and apply only new or modified notes.
    pub async fn ingest_changes(&self, scanner: &mut NoteScanner) -> Result<IngestReport> {
        let scan = scanner.scan()?;
        let mut report = IngestReport::default();

        for note in scan.changed {
            match tokio::fs::read_to_string(&note.path).await {
                Ok(content) => {
                    let summary = self.on_document_changed(&note.document_id, &content).await?;
                    report.summaries.push(summary);
                }
                Err(e) => {
                    warn!("Skipping unreadable note {}: {e}", note.path.display());
                    report.skipped.push(note.document_id);
                }
            }
        }

        for note in &scan.removed {
            info!("Document removed: {}", note.document_id);
        }

        info!(
            "Ingested {} notes ({} skipped)",
            report.summaries.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    /// Handle a single watcher event.
    ///
    /// `Removed` events are only logged: concepts are never deleted because
    /// a document went away.
    pub async fn process_event(&self, event: &DocumentEvent) -> Result<Option<UpdateSummary>> {
        match event.kind {
            DocumentEventKind::Changed => {
                let content = tokio::fs::read_to_string(&event.path).await?;
                let summary = self.on_document_changed(&event.document_id, &content).await?;
                Ok(Some(summary))
            }
            DocumentEventKind::Removed => {
                info!("Document removed: {}", event.document_id);
                Ok(None)
            }
        }
    }

    /// Watch a notes folder and apply every change as it happens.
    ///
    /// The returned handle keeps the watcher alive; dropping it or calling
    /// [`WatchHandle::stop`] ends the watch.
    pub fn watch(&self, notes: WatchConfig) -> Result<WatchHandle> {
        let mut watcher = NoteWatcher::new(notes)?;
        let Some(mut events) = watcher.take_events() else {
            return Err(VaultError::Config("watcher events already taken".to_string()));
        };
        watcher.start()?;

        let graph = self.clone();
        let task = tokio::spawn(async move {
            // Editors often emit several events per save; only re-apply a
            // note when its content differs from what was last applied.
            let mut applied: HashMap<PathBuf, u64> = HashMap::new();

            while let Some(event) = events.recv().await {
                if !event.is_change() {
                    applied.remove(&event.path);
                    if let Err(e) = graph.process_event(&event).await {
                        error!("Failed to process {}: {e}", event.document_id);
                    }
                    continue;
                }

                let content = match tokio::fs::read_to_string(&event.path).await {
                    Ok(content) => content,
                    Err(e) => {
                        warn!("Skipping unreadable note {}: {e}", event.path.display());
                        continue;
                    }
                };
                let digest = content_digest(&content);
                if applied.get(&event.path) == Some(&digest) {
                    debug!("Skipping unchanged {}", event.document_id);
                    continue;
                }
                applied.insert(event.path.clone(), digest);

                if let Err(e) = graph.on_document_changed(&event.document_id, &content).await {
                    error!("Failed to apply {}: {e}", event.document_id);
                }
            }
            debug!("Watch event stream closed");
        });

        Ok(WatchHandle { watcher, task })
    }
}

fn content_digest(content: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
}

/// Outcome of ingesting a notes folder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestReport {
    /// One summary per applied note, in path order.
    pub summaries: Vec<UpdateSummary>,

    /// Notes that could not be read.
    pub skipped: Vec<String>,
}

impl IngestReport {
    /// Total concept references processed.
    pub fn mentions(&self) -> usize {
        self.summaries.iter().map(|s| s.mentions).sum()
    }
}

/// A running watch started by [`KnowledgeGraph::watch`].
pub struct WatchHandle {
    watcher: NoteWatcher,
    task: JoinHandle<()>,
}

impl WatchHandle {
    /// Root of the watched folder.
    pub fn path(&self) -> &Path {
        &self.watcher.config().path
    }

    /// Stop watching and wait for pending events to be applied.
    pub async fn stop(mut self) {
        self.watcher.stop();
        // Dropping the watcher closes the channel once its sender goes away.
        drop(self.watcher);
        if let Err(e) = self.task.await {
            error!("Watch task failed: {e}");
        }
    }
}

/// Builder for [`KnowledgeGraph`].
pub struct KnowledgeGraphBuilder {
    config: VaultConfig,
}

impl KnowledgeGraphBuilder {
    /// Create a new builder with the default configuration.
    pub fn new() -> Self {
        Self {
            config: VaultConfig::default(),
        }
    }

    /// Start from an existing configuration.
    pub fn with_config(mut self, config: VaultConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the state directory (and enable persistence).
    pub fn with_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.state_dir = dir.into();
        self.config.persist = true;
        self
    }

    /// Never write state to disk.
    pub fn in_memory(mut self) -> Self {
        self.config.persist = false;
        self
    }

    /// Set the update policy.
    pub fn with_update_policy(mut self, policy: UpdatePolicy) -> Self {
        self.config.update = policy;
        self
    }

    /// Build the graph.
    pub async fn build(self) -> Result<KnowledgeGraph> {
        KnowledgeGraph::open(&self.config).await
    }
}

impl Default for KnowledgeGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notegraph_graph::GraphError;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_in_memory_updates() {
        let graph = KnowledgeGraph::in_memory(UpdatePolicy::default()).unwrap();
        let summary = graph
            .on_document_changed("a.md", "[[A]] [[B]] [[C]]")
            .await
            .unwrap();

        assert_eq!(summary.concepts_created, 3);
        assert_eq!(summary.connections_created, 3);
        assert_eq!(graph.density().await, 100);
        assert_eq!(graph.state_dir().await, None);
    }

    #[tokio::test]
    async fn test_builder_persists() {
        let dir = TempDir::new().unwrap();
        let graph = KnowledgeGraph::builder()
            .with_state_dir(dir.path())
            .build()
            .await
            .unwrap();

        graph.on_document_changed("a.md", "[[A]] [[B]]").await.unwrap();
        assert_eq!(graph.state_dir().await, Some(dir.path().to_path_buf()));
        assert!(dir.path().join("concepts.json").exists());
        assert!(dir.path().join("connections.json").exists());
    }

    #[tokio::test]
    async fn test_document_without_references_is_not_saved() {
        let dir = TempDir::new().unwrap();
        let graph = KnowledgeGraph::builder()
            .with_state_dir(dir.path())
            .build()
            .await
            .unwrap();

        let summary = graph.on_document_changed("a.md", "no links here").await.unwrap();
        assert_eq!(summary.mentions, 0);
        assert!(!dir.path().join("concepts.json").exists());
    }

    #[tokio::test]
    async fn test_invalid_update_policy_is_rejected() {
        let policy = UpdatePolicy {
            increment: f64::NAN,
            ..UpdatePolicy::default()
        };
        assert!(matches!(
            KnowledgeGraph::in_memory(policy),
            Err(VaultError::Graph(GraphError::InvalidPolicy(_)))
        ));

        let result = KnowledgeGraph::builder()
            .with_config(VaultConfig::in_memory())
            .with_update_policy(UpdatePolicy {
                increment: -0.4,
                ..UpdatePolicy::default()
            })
            .build()
            .await;
        assert!(matches!(result, Err(VaultError::Config(_))));

        let graph = KnowledgeGraph::builder()
            .with_state_dir("/nonexistent/unused")
            .in_memory()
            .build()
            .await
            .unwrap();
        assert_eq!(graph.state_dir().await, None);
    }

    #[tokio::test]
    async fn test_ingest_after_removal_keeps_concepts() {
        let dir = TempDir::new().unwrap();
        let note = dir.path().join("a.md");
        std::fs::write(&note, "[[A]] [[B]]").unwrap();

        let graph = KnowledgeGraph::in_memory(UpdatePolicy::default()).unwrap();
        let mut scanner = NoteScanner::new(WatchConfig::new(dir.path()));
        let report = graph.ingest_changes(&mut scanner).await.unwrap();
        assert_eq!(report.summaries.len(), 1);

        std::fs::remove_file(&note).unwrap();
        let report = graph.ingest_changes(&mut scanner).await.unwrap();
        assert!(report.summaries.is_empty());
        assert!(report.skipped.is_empty());
        assert!(graph.concept("A").await.is_some());
        assert_eq!(graph.connection_count("B").await, 1);
    }

    #[tokio::test]
    async fn test_removed_event_keeps_concepts() {
        let graph = KnowledgeGraph::in_memory(UpdatePolicy::default()).unwrap();
        graph.on_document_changed("a.md", "[[A]] [[B]]").await.unwrap();

        let event = DocumentEvent::new(DocumentEventKind::Removed, "/notes/a.md", "a.md");
        assert_eq!(graph.process_event(&event).await.unwrap(), None);
        assert!(graph.concept("A").await.is_some());
        assert_eq!(graph.connection_count("A").await, 1);
    }
}
