//! Embedded SurrealDB persistence for generated documents.
//!
//! Every row carries the owning `project` id so one database can hold many
//! analyzed repositories, and entity ids live under their own column (`mid`,
//! `sid`, `eid`, `fid`) with the full entity nested in `data`. A `version`
//! row is appended per stored document.

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::engine::local::{Db, RocksDb};
use surrealdb::Surreal;

use crate::config::StoreConfig;
use crate::error::PkgError;
use crate::model::{Edge, EdgeKind, Endpoint, Feature, Module, Pkg, ProjectInfo, Symbol};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ProjectRow {
    project: String,
    name: String,
    data: ProjectInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ModuleRow {
    mid: String,
    project: String,
    path: String,
    data: Module,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SymbolRow {
    sid: String,
    project: String,
    module_id: String,
    name: String,
    data: Symbol,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EndpointRow {
    eid: String,
    project: String,
    path: String,
    handler_module_id: String,
    data: Endpoint,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FeatureRow {
    fid: String,
    project: String,
    path: String,
    data: Feature,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EdgeRow {
    from_id: String,
    to_id: String,
    kind: EdgeKind,
    weight: u32,
    project: String,
}

impl EdgeRow {
    fn into_edge(self) -> Edge {
        Edge {
            from: self.from_id,
            to: self.to_id,
            kind: self.kind,
            weight: self.weight,
        }
    }
}

/// One stored-document snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionRecord {
    pub project: String,
    pub version: String,
    pub generated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_sha: Option<String>,
    pub stored_at: String,
    pub module_count: usize,
    pub symbol_count: usize,
    pub endpoint_count: usize,
    pub edge_count: usize,
    pub feature_count: usize,
}

#[derive(Deserialize)]
struct CountResult {
    count: i64,
}

/// Graph database handle over an embedded RocksDB-backed SurrealDB.
#[derive(Clone)]
pub struct GraphStore {
    db: Surreal<Db>,
    config: StoreConfig,
}

impl GraphStore {
    /// Opens (or creates) a database at the given path and defines the
    /// schema.
    pub async fn open(path: &Path, config: StoreConfig) -> Result<Self, PkgError> {
        let db = Surreal::new::<RocksDb>(path).await?;
        db.use_ns(config.namespace.clone())
            .use_db(config.database.clone())
            .await?;

        let store = Self { db, config };
        store.define_schema().await?;
        Ok(store)
    }

    /// True when the schema marker row is present.
    pub async fn verify(&self) -> Result<bool, PkgError> {
        let marker: Option<serde_json::Value> = self
            .db
            .query("SELECT * FROM meta WHERE key = 'initialized'")
            .await?
            .take(0)?;
        Ok(marker.is_some())
    }

    /// Drops the handle; the embedded engine flushes on drop.
    pub async fn close(self) -> Result<(), PkgError> {
        Ok(())
    }

    async fn define_schema(&self) -> Result<(), PkgError> {
        self.db
            .query(
                r#"
                DEFINE TABLE project SCHEMALESS;
                DEFINE INDEX project_key ON project FIELDS project;
                "#,
            )
            .await?;

        self.db
            .query(
                r#"
                DEFINE TABLE module SCHEMALESS;
                DEFINE INDEX module_key ON module FIELDS mid;
                DEFINE INDEX module_project ON module FIELDS project;
                DEFINE INDEX module_path ON module FIELDS path;
                "#,
            )
            .await?;

        self.db
            .query(
                r#"
                DEFINE TABLE symbol SCHEMALESS;
                DEFINE INDEX symbol_key ON symbol FIELDS sid;
                DEFINE INDEX symbol_project ON symbol FIELDS project;
                DEFINE INDEX symbol_name ON symbol FIELDS name;
                DEFINE INDEX symbol_module ON symbol FIELDS module_id;
                "#,
            )
            .await?;

        self.db
            .query(
                r#"
                DEFINE TABLE endpoint SCHEMALESS;
                DEFINE INDEX endpoint_key ON endpoint FIELDS eid;
                DEFINE INDEX endpoint_project ON endpoint FIELDS project;
                DEFINE INDEX endpoint_path ON endpoint FIELDS path;
                DEFINE INDEX endpoint_module ON endpoint FIELDS handler_module_id;
                "#,
            )
            .await?;

        self.db
            .query(
                r#"
                DEFINE TABLE feature SCHEMALESS;
                DEFINE INDEX feature_key ON feature FIELDS fid;
                DEFINE INDEX feature_project ON feature FIELDS project;
                "#,
            )
            .await?;

        self.db
            .query(
                r#"
                DEFINE TABLE edge SCHEMALESS;
                DEFINE INDEX edge_from ON edge FIELDS from_id;
                DEFINE INDEX edge_to ON edge FIELDS to_id;
                DEFINE INDEX edge_kind ON edge FIELDS kind;
                DEFINE INDEX edge_project ON edge FIELDS project;
                "#,
            )
            .await?;

        self.db
            .query(
                r#"
                DEFINE TABLE version SCHEMALESS;
                DEFINE INDEX version_project ON version FIELDS project;
                "#,
            )
            .await?;

        self.db
            .query(
                r#"
                DEFINE TABLE meta SCHEMALESS;
                UPSERT meta:state CONTENT { key: 'initialized', schema_version: '1.0.0', updated_at: time::now() };
                "#,
            )
            .await?;

        Ok(())
    }

    /// Persists one document, replacing any prior data for the same project.
    pub async fn store_pkg(&self, pkg: &Pkg) -> Result<(), PkgError> {
        let project = pkg.project.id.clone();
        self.wipe_project(&project).await?;

        let _: Option<ProjectRow> = self
            .db
            .create("project")
            .content(ProjectRow {
                project: project.clone(),
                name: pkg.project.name.clone(),
                data: pkg.project.clone(),
            })
            .await?;

        let modules: Vec<ModuleRow> = pkg
            .modules
            .iter()
            .map(|m| ModuleRow {
                mid: m.id.clone(),
                project: project.clone(),
                path: m.path.clone(),
                data: m.clone(),
            })
            .collect();
        self.insert_batched("module", modules).await?;

        let symbols: Vec<SymbolRow> = pkg
            .symbols
            .iter()
            .map(|s| SymbolRow {
                sid: s.id.clone(),
                project: project.clone(),
                module_id: s.module_id.clone(),
                name: s.name.clone(),
                data: s.clone(),
            })
            .collect();
        self.insert_batched("symbol", symbols).await?;

        let endpoints: Vec<EndpointRow> = pkg
            .endpoints
            .iter()
            .map(|e| EndpointRow {
                eid: e.id.clone(),
                project: project.clone(),
                path: e.path.clone(),
                handler_module_id: e.handler_module_id.clone(),
                data: e.clone(),
            })
            .collect();
        self.insert_batched("endpoint", endpoints).await?;

        let features: Vec<FeatureRow> = pkg
            .features
            .iter()
            .flatten()
            .map(|f| FeatureRow {
                fid: f.id.clone(),
                project: project.clone(),
                path: f.path.clone(),
                data: f.clone(),
            })
            .collect();
        self.insert_batched("feature", features).await?;

        let edges: Vec<EdgeRow> = pkg
            .edges
            .iter()
            .map(|e| EdgeRow {
                from_id: e.from.clone(),
                to_id: e.to.clone(),
                kind: e.kind,
                weight: e.weight,
                project: project.clone(),
            })
            .collect();
        self.insert_batched("edge", edges).await?;

        let snapshot = VersionRecord {
            project,
            version: pkg.version.clone(),
            generated_at: pkg.generated_at.clone(),
            git_sha: pkg.git_sha.clone(),
            stored_at: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            module_count: pkg.modules.len(),
            symbol_count: pkg.symbols.len(),
            endpoint_count: pkg.endpoints.len(),
            edge_count: pkg.edges.len(),
            feature_count: pkg.features.as_ref().map(Vec::len).unwrap_or(0),
        };
        let _: Option<VersionRecord> = self.db.create("version").content(snapshot).await?;

        Ok(())
    }

    async fn wipe_project(&self, project: &str) -> Result<(), PkgError> {
        for table in ["project", "module", "symbol", "endpoint", "feature", "edge"] {
            self.db
                .query(format!("DELETE {table} WHERE project = $project"))
                .bind(("project", project.to_string()))
                .await?;
        }
        Ok(())
    }

    async fn insert_batched<T>(&self, table: &str, rows: Vec<T>) -> Result<(), PkgError>
    where
        T: Serialize + for<'de> Deserialize<'de> + Clone + Send + Sync + 'static,
    {
        for batch in rows.chunks(self.config.batch_size) {
            let _: Vec<T> = self.db.insert(table).content(batch.to_vec()).await?;
        }
        Ok(())
    }

    pub async fn fetch_project(&self) -> Result<Option<ProjectInfo>, PkgError> {
        let row: Option<ProjectInfo> = self
            .db
            .query("SELECT VALUE data FROM project LIMIT 1")
            .await?
            .take(0)?;
        Ok(row)
    }

    pub async fn fetch_modules(&self) -> Result<Vec<Module>, PkgError> {
        let rows: Vec<Module> = self
            .db
            .query("SELECT VALUE data FROM module")
            .await?
            .take(0)?;
        Ok(rows)
    }

    pub async fn fetch_module(&self, id: &str) -> Result<Option<Module>, PkgError> {
        let row: Option<Module> = self
            .db
            .query("SELECT VALUE data FROM module WHERE mid = $mid LIMIT 1")
            .bind(("mid", id.to_string()))
            .await?
            .take(0)?;
        Ok(row)
    }

    pub async fn fetch_symbols(&self) -> Result<Vec<Symbol>, PkgError> {
        let rows: Vec<Symbol> = self
            .db
            .query("SELECT VALUE data FROM symbol")
            .await?
            .take(0)?;
        Ok(rows)
    }

    pub async fn fetch_symbol(&self, id: &str) -> Result<Option<Symbol>, PkgError> {
        let row: Option<Symbol> = self
            .db
            .query("SELECT VALUE data FROM symbol WHERE sid = $sid LIMIT 1")
            .bind(("sid", id.to_string()))
            .await?
            .take(0)?;
        Ok(row)
    }

    pub async fn fetch_endpoints(&self) -> Result<Vec<Endpoint>, PkgError> {
        let rows: Vec<Endpoint> = self
            .db
            .query("SELECT VALUE data FROM endpoint")
            .await?
            .take(0)?;
        Ok(rows)
    }

    pub async fn fetch_endpoint(&self, id: &str) -> Result<Option<Endpoint>, PkgError> {
        let row: Option<Endpoint> = self
            .db
            .query("SELECT VALUE data FROM endpoint WHERE eid = $eid LIMIT 1")
            .bind(("eid", id.to_string()))
            .await?
            .take(0)?;
        Ok(row)
    }

    pub async fn fetch_endpoints_by_module(
        &self,
        module_id: &str,
    ) -> Result<Vec<Endpoint>, PkgError> {
        let rows: Vec<Endpoint> = self
            .db
            .query("SELECT VALUE data FROM endpoint WHERE handler_module_id = $mid")
            .bind(("mid", module_id.to_string()))
            .await?
            .take(0)?;
        Ok(rows)
    }

    pub async fn fetch_features(&self) -> Result<Vec<Feature>, PkgError> {
        let rows: Vec<Feature> = self
            .db
            .query("SELECT VALUE data FROM feature")
            .await?
            .take(0)?;
        Ok(rows)
    }

    pub async fn fetch_feature(&self, id: &str) -> Result<Option<Feature>, PkgError> {
        let row: Option<Feature> = self
            .db
            .query("SELECT VALUE data FROM feature WHERE fid = $fid LIMIT 1")
            .bind(("fid", id.to_string()))
            .await?
            .take(0)?;
        Ok(row)
    }

    pub async fn fetch_edges(&self) -> Result<Vec<Edge>, PkgError> {
        let rows: Vec<EdgeRow> = self
            .db
            .query("SELECT from_id, to_id, kind, weight, project FROM edge")
            .await?
            .take(0)?;
        Ok(rows.into_iter().map(EdgeRow::into_edge).collect())
    }

    /// Snapshot rows for a project, newest first.
    pub async fn version_history(&self, project: &str) -> Result<Vec<VersionRecord>, PkgError> {
        let rows: Vec<VersionRecord> = self
            .db
            .query("SELECT * FROM version WHERE project = $project ORDER BY stored_at DESC")
            .bind(("project", project.to_string()))
            .await?
            .take(0)?;
        Ok(rows)
    }

    pub async fn count_modules(&self) -> Result<usize, PkgError> {
        let result: Option<CountResult> = self
            .db
            .query("SELECT count() FROM module GROUP ALL")
            .await?
            .take(0)?;
        Ok(result.map(|r| r.count as usize).unwrap_or(0))
    }

    pub async fn count_edges(&self) -> Result<usize, PkgError> {
        let result: Option<CountResult> = self
            .db
            .query("SELECT count() FROM edge GROUP ALL")
            .await?
            .take(0)?;
        Ok(result.map(|r| r.count as usize).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_row_round_trip() {
        let row = EdgeRow {
            from_id: "mod:src/a.ts".to_string(),
            to_id: "mod:src/b.ts".to_string(),
            kind: EdgeKind::Imports,
            weight: 1,
            project: "demo".to_string(),
        };
        let edge = row.into_edge();
        assert_eq!(edge.from, "mod:src/a.ts");
        assert_eq!(edge.to, "mod:src/b.ts");
        assert_eq!(edge.kind, EdgeKind::Imports);
        assert_eq!(edge.weight, 1);
    }

    #[test]
    fn test_version_record_serialization() {
        let record = VersionRecord {
            project: "demo".to_string(),
            version: "1.0.0".to_string(),
            generated_at: "2024-01-01T00:00:00Z".to_string(),
            git_sha: None,
            stored_at: "2024-01-01T00:00:01Z".to_string(),
            module_count: 2,
            symbol_count: 5,
            endpoint_count: 1,
            edge_count: 7,
            feature_count: 1,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["project"], "demo");
        assert_eq!(json["module_count"], 2);
        assert!(json.get("git_sha").is_none());
    }
}
