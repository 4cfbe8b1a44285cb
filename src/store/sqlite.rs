use super::record_id::RecordId;
use super::traits::{
    DocumentStore, Filter, Namespace, Similarity, VectorHit, VectorIndexDefinition,
};
use super::vector::{score, vector_from_json};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use std::str::FromStr;

/// SQLite-backed document store: one JSON body per row, namespaced by
/// `database.collection`, plus a table of vector index definitions.
pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    /// Open (creating if needed) the database at `uri` and run migrations.
    pub async fn connect(uri: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(uri)?.create_if_missing(true);
        let max_connections = if uri.contains(":memory:") { 1 } else { 4 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        Self::new(pool).await
    }

    /// Wrap an existing pool and run migrations.
    pub async fn new(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (
                 seq        INTEGER PRIMARY KEY AUTOINCREMENT,
                 id         TEXT NOT NULL UNIQUE,
                 namespace  TEXT NOT NULL,
                 body       TEXT NOT NULL,
                 created_at TEXT NOT NULL
             )",
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_documents_namespace
                 ON documents(namespace, seq)",
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS vector_indexes (
                 name       TEXT PRIMARY KEY,
                 database   TEXT NOT NULL,
                 collection TEXT NOT NULL,
                 path       TEXT NOT NULL,
                 dimensions INTEGER NOT NULL,
                 similarity TEXT NOT NULL,
                 created_at TEXT NOT NULL
             )",
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn json_path(field: &str) -> String {
    format!("$.\"{}\"", field.replace('"', ""))
}

/// Append ` AND <condition>` for `filter` to a query already carrying a
/// WHERE clause.
fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &Filter) {
    match filter {
        Filter::All => {}
        Filter::Eq(field, value) => {
            let path = json_path(field);
            match value {
                Value::Null => {
                    qb.push(" AND (json_type(body, ")
                        .push_bind(path.clone())
                        .push(") IS NULL OR json_type(body, ")
                        .push_bind(path)
                        .push(") = 'null')");
                }
                Value::Bool(flag) => {
                    qb.push(" AND json_type(body, ")
                        .push_bind(path)
                        .push(if *flag { ") = 'true'" } else { ") = 'false'" });
                }
                Value::String(text) => {
                    qb.push(" AND json_type(body, ")
                        .push_bind(path.clone())
                        .push(") = 'text' AND json_extract(body, ")
                        .push_bind(path)
                        .push(") = ")
                        .push_bind(text.clone());
                }
                Value::Number(number) => {
                    qb.push(" AND json_extract(body, ").push_bind(path).push(") = ");
                    if let Some(int) = number.as_i64() {
                        qb.push_bind(int);
                    } else {
                        qb.push_bind(number.as_f64().unwrap_or(f64::NAN));
                    }
                }
                Value::Array(_) | Value::Object(_) => {
                    qb.push(" AND json(json_extract(body, ")
                        .push_bind(path)
                        .push(")) = json(")
                        .push_bind(value.to_string())
                        .push(")");
                }
            }
        }
        Filter::Prefix(field, prefix) => {
            let path = json_path(field);
            #[allow(clippy::cast_possible_wrap)]
            let len = prefix.chars().count() as i64;
            qb.push(" AND json_type(body, ")
                .push_bind(path.clone())
                .push(") = 'text' AND substr(json_extract(body, ")
                .push_bind(path)
                .push("), 1, ")
                .push_bind(len)
                .push(") = ")
                .push_bind(prefix.clone());
        }
        Filter::Exists(field) => {
            qb.push(" AND json_type(body, ")
                .push_bind(json_path(field))
                .push(") IS NOT NULL");
        }
    }
}

fn map_document_row(row: &SqliteRow) -> Result<Value, StoreError> {
    let id: String = row.try_get("id")?;
    let body: String = row.try_get("body")?;
    let mut document: Map<String, Value> = serde_json::from_str(&body)?;
    document.insert("_id".into(), Value::String(id));
    Ok(Value::Object(document))
}

fn map_index_row(row: &SqliteRow) -> Result<VectorIndexDefinition, StoreError> {
    let similarity_raw: String = row.try_get("similarity")?;
    let dimensions: i64 = row.try_get("dimensions")?;
    Ok(VectorIndexDefinition {
        name: row.try_get("name")?,
        namespace: Namespace::new(
            row.try_get::<String, _>("database")?,
            row.try_get::<String, _>("collection")?,
        ),
        path: row.try_get("path")?,
        dimensions: usize::try_from(dimensions)
            .map_err(|_| StoreError::Query(format!("negative index dimensions: {dimensions}")))?,
        similarity: Similarity::from_str(&similarity_raw).map_err(|_| {
            StoreError::Query(format!("unknown similarity in index row: {similarity_raw}"))
        })?,
    })
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn insert(
        &self,
        namespace: &Namespace,
        document: Value,
    ) -> Result<RecordId, StoreError> {
        let Value::Object(mut body) = document else {
            return Err(StoreError::NotAnObject);
        };
        body.remove("_id");

        let id = RecordId::generate();
        sqlx::query(
            "INSERT INTO documents (id, namespace, body, created_at)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(id.as_str())
        .bind(namespace.to_string())
        .bind(serde_json::to_string(&body)?)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn find_by_id(
        &self,
        namespace: &Namespace,
        id: &RecordId,
    ) -> Result<Option<Value>, StoreError> {
        let row = sqlx::query(
            "SELECT id, body FROM documents
             WHERE namespace = $1 AND id = $2",
        )
        .bind(namespace.to_string())
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| map_document_row(&r)).transpose()
    }

    async fn find(
        &self,
        namespace: &Namespace,
        filter: &Filter,
        limit: Option<usize>,
    ) -> Result<Vec<Value>, StoreError> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT id, body FROM documents WHERE namespace = ");
        qb.push_bind(namespace.to_string());
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY seq");
        if let Some(limit) = limit {
            qb.push(" LIMIT ")
                .push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(map_document_row).collect()
    }

    async fn delete_many(
        &self,
        namespace: &Namespace,
        filter: &Filter,
    ) -> Result<u64, StoreError> {
        let mut qb = QueryBuilder::<Sqlite>::new("DELETE FROM documents WHERE namespace = ");
        qb.push_bind(namespace.to_string());
        push_filter(&mut qb, filter);

        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn count(&self, namespace: &Namespace, filter: &Filter) -> Result<u64, StoreError> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM documents WHERE namespace = ");
        qb.push_bind(namespace.to_string());
        push_filter(&mut qb, filter);

        let count: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    async fn define_vector_index(
        &self,
        definition: &VectorIndexDefinition,
    ) -> Result<(), StoreError> {
        if definition.dimensions == 0 {
            return Err(StoreError::Query(format!(
                "vector index {} must have at least one dimension",
                definition.name
            )));
        }

        sqlx::query(
            "INSERT INTO vector_indexes
                 (name, database, collection, path, dimensions, similarity, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT(name) DO UPDATE SET
                 database = excluded.database,
                 collection = excluded.collection,
                 path = excluded.path,
                 dimensions = excluded.dimensions,
                 similarity = excluded.similarity",
        )
        .bind(&definition.name)
        .bind(&definition.namespace.database)
        .bind(&definition.namespace.collection)
        .bind(&definition.path)
        .bind(i64::try_from(definition.dimensions).unwrap_or(i64::MAX))
        .bind(definition.similarity.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn vector_index(&self, name: &str) -> Result<Option<VectorIndexDefinition>, StoreError> {
        let row = sqlx::query(
            "SELECT name, database, collection, path, dimensions, similarity
             FROM vector_indexes
             WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| map_index_row(&r)).transpose()
    }

    async fn vector_search(
        &self,
        index: &str,
        query: &[f32],
        k: usize,
        filter: Option<&Filter>,
    ) -> Result<Vec<VectorHit>, StoreError> {
        let definition = self
            .vector_index(index)
            .await?
            .ok_or_else(|| StoreError::UnknownIndex(index.to_string()))?;

        if query.len() != definition.dimensions {
            return Err(StoreError::Query(format!(
                "query vector has {} dimensions, index {index} expects {}",
                query.len(),
                definition.dimensions
            )));
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let candidates = self
            .find(&definition.namespace, filter.unwrap_or(&Filter::All), None)
            .await?;
        let scanned = candidates.len();

        let mut hits: Vec<VectorHit> = candidates
            .into_iter()
            .filter_map(|document| {
                let vector = document
                    .get(&definition.path)
                    .and_then(vector_from_json)
                    .filter(|v| v.len() == definition.dimensions)?;
                let id = document.get("_id")?.as_str()?.parse().ok()?;
                Some(VectorHit {
                    id,
                    score: score(definition.similarity, query, &vector),
                    document,
                })
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k);

        tracing::debug!(
            index,
            namespace = %definition.namespace,
            scanned,
            returned = hits.len(),
            "vector search"
        );
        Ok(hits)
    }
}
