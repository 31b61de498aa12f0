//! Database operations for the index module

use std::path::Path;

use chrono::Utc;
use libsql::{Connection, Row, Rows, Transaction, params};
use tracing::{debug, info, instrument};

use crate::archive::ThreadArchive;
use crate::index::error::DbError;
use crate::index::schema;
use crate::index::{IndexedThread, RetrievedChunk};
use crate::processor::EmbeddedChunk;

/// Format a vector as the JSON-style literal accepted by `vector32()`
pub fn vector_literal(values: &[f64]) -> String {
    let parts: Vec<String> = values.iter().map(|v| (*v as f32).to_string()).collect();
    format!("[{}]", parts.join(","))
}

async fn last_insert_id(tx: &Transaction) -> Result<i64, DbError> {
    let mut rows = tx
        .query("SELECT last_insert_rowid()", params![])
        .await
        .map_err(|e| DbError::Query(format!("Failed to get last insert ID: {}", e)))?;

    let row = match rows.next().await {
        Ok(Some(row)) => row,
        Ok(None) => {
            return Err(DbError::Data(
                "No ID returned from last_insert_rowid()".to_string(),
            ));
        }
        Err(e) => return Err(DbError::Data(format!("Failed to get ID: {}", e))),
    };

    row.get(0)
        .map_err(|e| DbError::Data(format!("Failed to get ID: {}", e)))
}

/// Database manager for the index
#[derive(Clone)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Wrap a connection, creating the schema if needed
    #[instrument(skip(conn))]
    pub async fn new(conn: Connection, dimensions: usize) -> Result<Self, DbError> {
        schema::initialize_schema(&conn, dimensions).await?;
        Ok(Self { conn })
    }

    /// Open or create a local database file
    pub async fn new_from_path(path: &Path, dimensions: usize) -> Result<Self, DbError> {
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DbError::Connection(format!("Failed to open database: {}", e)))?;

        let conn = db
            .connect()
            .map_err(|e| DbError::Connection(format!("Failed to connect to database: {}", e)))?;

        Self::new(conn, dimensions).await
    }

    /// Execute a custom query with parameters
    pub async fn execute_query<P>(&self, sql: &str, params: P) -> Result<Rows, DbError>
    where
        P: libsql::params::IntoParams,
    {
        self.conn
            .query(sql, params)
            .await
            .map_err(|e| DbError::Query(format!("Failed to execute query: {}", e)))
    }

    /// Store an archive and its embedded chunks, replacing any earlier index
    /// of the same thread. Runs in a single transaction.
    #[instrument(skip(self, archive, chunks), fields(url = %archive.thread_url, chunks = chunks.len()))]
    pub async fn replace_thread(
        &self,
        archive: &ThreadArchive,
        chunks: &[EmbeddedChunk],
    ) -> Result<i64, DbError> {
        let tx = self
            .conn
            .transaction()
            .await
            .map_err(|e| DbError::Transaction(format!("Failed to start transaction: {}", e)))?;

        tx.execute(
            "DELETE FROM chunks WHERE post_id IN (
                SELECT p.id FROM posts p JOIN threads t ON p.thread_id = t.id WHERE t.url = ?
            )",
            params![archive.thread_url.clone()],
        )
        .await
        .map_err(|e| DbError::Query(format!("Failed to delete chunks: {}", e)))?;

        tx.execute(
            "DELETE FROM posts WHERE thread_id IN (SELECT id FROM threads WHERE url = ?)",
            params![archive.thread_url.clone()],
        )
        .await
        .map_err(|e| DbError::Query(format!("Failed to delete posts: {}", e)))?;

        tx.execute(
            "DELETE FROM threads WHERE url = ?",
            params![archive.thread_url.clone()],
        )
        .await
        .map_err(|e| DbError::Query(format!("Failed to delete thread: {}", e)))?;

        tx.execute(
            "INSERT INTO threads (url, scrape_date, indexed_at) VALUES (?, ?, ?)",
            params![
                archive.thread_url.clone(),
                archive.scrape_date.to_rfc3339(),
                Utc::now().timestamp(),
            ],
        )
        .await
        .map_err(|e| DbError::Query(format!("Failed to add thread: {}", e)))?;
        let thread_id = last_insert_id(&tx).await?;

        let mut post_ids = Vec::with_capacity(archive.posts.len());
        for (position, post) in archive.posts.iter().enumerate() {
            tx.execute(
                "INSERT INTO posts (thread_id, position, post_number, username, date, content)
                 VALUES (?, ?, ?, ?, ?, ?)",
                params![
                    thread_id,
                    position as i64,
                    post.post_number.clone(),
                    post.username.clone(),
                    post.date.clone(),
                    post.content.clone(),
                ],
            )
            .await
            .map_err(|e| DbError::Query(format!("Failed to add post: {}", e)))?;
            post_ids.push(last_insert_id(&tx).await?);
        }

        for embedded in chunks {
            let post_id = post_ids.get(embedded.chunk.post_index).ok_or_else(|| {
                DbError::Data(format!(
                    "Chunk refers to post {} but the archive has {} posts",
                    embedded.chunk.post_index,
                    post_ids.len()
                ))
            })?;

            tx.execute(
                "INSERT INTO chunks (post_id, position, text, embedding) VALUES (?, ?, ?, vector32(?))",
                params![
                    *post_id,
                    embedded.chunk.position as i64,
                    embedded.chunk.text.clone(),
                    vector_literal(&embedded.embedding.vec),
                ],
            )
            .await
            .map_err(|e| DbError::Query(format!("Failed to add chunk: {}", e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::Transaction(format!("Failed to commit transaction: {}", e)))?;

        info!(
            "Indexed {} posts and {} chunks",
            archive.posts.len(),
            chunks.len()
        );
        Ok(thread_id)
    }

    /// Find the `limit` chunks closest to `embedding` by cosine distance,
    /// optionally restricted to one thread
    #[instrument(skip(self, embedding))]
    pub async fn nearest_chunks(
        &self,
        embedding: &[f64],
        limit: usize,
        thread_url: Option<&str>,
    ) -> Result<Vec<RetrievedChunk>, DbError> {
        let mut sql = String::from(
            "SELECT c.id, c.text, p.position, p.post_number, p.username, p.date,
                    vector_distance_cos(c.embedding, vector32(?)) AS distance
             FROM chunks c
             JOIN posts p ON c.post_id = p.id
             JOIN threads t ON p.thread_id = t.id",
        );

        let mut params: Vec<libsql::Value> = vec![vector_literal(embedding).into()];
        if let Some(url) = thread_url {
            sql.push_str(" WHERE t.url = ?");
            params.push(url.to_string().into());
        }
        sql.push_str(" ORDER BY distance ASC, c.id ASC LIMIT ?");
        params.push((limit as i64).into());

        let mut rows = self.execute_query(&sql, params).await?;

        let mut chunks = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DbError::Query(format!("Failed to read results: {}", e)))?
        {
            chunks.push(row_to_retrieved(&row)?);
        }

        debug!("Retrieved {} chunks", chunks.len());
        Ok(chunks)
    }

    /// List indexed threads with their post and chunk counts
    #[instrument(skip(self))]
    pub async fn list_threads(&self) -> Result<Vec<IndexedThread>, DbError> {
        let mut rows = self
            .execute_query(
                "SELECT t.id, t.url, t.scrape_date, t.indexed_at,
                    (SELECT COUNT(*) FROM posts p WHERE p.thread_id = t.id),
                    (SELECT COUNT(*) FROM chunks c JOIN posts p ON c.post_id = p.id
                     WHERE p.thread_id = t.id)
                 FROM threads t
                 ORDER BY t.id",
                params![],
            )
            .await?;

        let mut threads = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DbError::Query(format!("Failed to read threads: {}", e)))?
        {
            threads.push(row_to_thread(&row)?);
        }

        Ok(threads)
    }
}

fn row_to_thread(row: &Row) -> Result<IndexedThread, DbError> {
    Ok(IndexedThread {
        id: row
            .get(0)
            .map_err(|e| DbError::Data(format!("Failed to get id: {}", e)))?,
        url: row
            .get(1)
            .map_err(|e| DbError::Data(format!("Failed to get url: {}", e)))?,
        scrape_date: row
            .get(2)
            .map_err(|e| DbError::Data(format!("Failed to get scrape_date: {}", e)))?,
        indexed_at: row
            .get(3)
            .map_err(|e| DbError::Data(format!("Failed to get indexed_at: {}", e)))?,
        post_count: row
            .get(4)
            .map_err(|e| DbError::Data(format!("Failed to get post count: {}", e)))?,
        chunk_count: row
            .get(5)
            .map_err(|e| DbError::Data(format!("Failed to get chunk count: {}", e)))?,
    })
}

fn row_to_retrieved(row: &Row) -> Result<RetrievedChunk, DbError> {
    Ok(RetrievedChunk {
        chunk_id: row
            .get(0)
            .map_err(|e| DbError::Data(format!("Failed to get chunk id: {}", e)))?,
        text: row
            .get(1)
            .map_err(|e| DbError::Data(format!("Failed to get text: {}", e)))?,
        post_position: row
            .get(2)
            .map_err(|e| DbError::Data(format!("Failed to get position: {}", e)))?,
        post_number: row
            .get(3)
            .map_err(|e| DbError::Data(format!("Failed to get post_number: {}", e)))?,
        username: row
            .get(4)
            .map_err(|e| DbError::Data(format!("Failed to get username: {}", e)))?,
        date: row
            .get(5)
            .map_err(|e| DbError::Data(format!("Failed to get date: {}", e)))?,
        distance: row
            .get(6)
            .map_err(|e| DbError::Data(format!("Failed to get distance: {}", e)))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::Post;
    use crate::model::mock_model::MockEmbeddingModel;
    use crate::processor::PostChunk;
    use rig::embeddings::Embedding;
    use tempfile::tempdir;

    const DIMS: usize = 64;

    async fn setup_test_db() -> Result<(Database, tempfile::TempDir), DbError> {
        let temp_dir = tempdir().unwrap();
        let db = Database::new_from_path(&temp_dir.path().join("test.db"), DIMS).await?;
        Ok((db, temp_dir))
    }

    fn post(number: &str, username: &str, content: &str) -> Post {
        Post {
            post_number: Some(number.to_string()),
            username: Some(username.to_string()),
            date: Some("2016-03-01T10:00:00+0000".to_string()),
            content: content.to_string(),
        }
    }

    fn archive(url: &str) -> ThreadArchive {
        ThreadArchive::new(
            url,
            vec![
                post("1", "alice", "tweed jacket hackney"),
                post("2", "bob", "linen shirts summer"),
                Post {
                    post_number: None,
                    username: None,
                    date: None,
                    content: "shoe polish tips".to_string(),
                },
            ],
        )
    }

    fn embed(archive: &ThreadArchive) -> Vec<EmbeddedChunk> {
        let model = MockEmbeddingModel::new(DIMS);
        archive
            .posts
            .iter()
            .enumerate()
            .map(|(post_index, post)| EmbeddedChunk {
                chunk: PostChunk {
                    post_index,
                    position: 0,
                    text: post.content.clone(),
                },
                embedding: Embedding {
                    document: post.content.clone(),
                    vec: model.vector(&post.content),
                },
            })
            .collect()
    }

    #[test]
    fn test_vector_literal() {
        assert_eq!(vector_literal(&[1.0, 0.5, 0.0]), "[1,0.5,0]");
    }

    #[tokio::test]
    async fn test_database_initialization() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();

        let mut result = db
            .execute_query(
                "SELECT name FROM sqlite_master WHERE type='table' AND name IN ('threads', 'posts', 'chunks')",
                params![],
            )
            .await
            .unwrap();

        let mut tables = Vec::new();
        while let Ok(Some(row)) = result.next().await {
            let table_name: String = row.get(0).unwrap();
            tables.push(table_name);
        }

        assert_eq!(tables.len(), 3);
    }

    #[tokio::test]
    async fn test_nearest_chunk_comes_first() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let archive = archive("https://forum.example/threads/t.1/");
        db.replace_thread(&archive, &embed(&archive)).await.unwrap();

        let query = MockEmbeddingModel::new(DIMS).vector("linen shirts summer");
        let results = db.nearest_chunks(&query, 2, None).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].text, "linen shirts summer");
        assert_eq!(results[0].username.as_deref(), Some("bob"));
        assert_eq!(results[0].post_position, 1);
        assert!(results[0].distance <= results[1].distance);
    }

    #[tokio::test]
    async fn test_null_post_fields_survive() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let archive = archive("https://forum.example/threads/t.1/");
        db.replace_thread(&archive, &embed(&archive)).await.unwrap();

        let query = MockEmbeddingModel::new(DIMS).vector("shoe polish tips");
        let results = db.nearest_chunks(&query, 1, None).await.unwrap();

        assert_eq!(results[0].text, "shoe polish tips");
        assert_eq!(results[0].post_number, None);
        assert_eq!(results[0].username, None);
    }

    #[tokio::test]
    async fn test_reindex_replaces_thread() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let archive = archive("https://forum.example/threads/t.1/");

        db.replace_thread(&archive, &embed(&archive)).await.unwrap();
        db.replace_thread(&archive, &embed(&archive)).await.unwrap();

        let threads = db.list_threads().await.unwrap();
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].url, "https://forum.example/threads/t.1/");
        assert_eq!(threads[0].post_count, 3);
        assert_eq!(threads[0].chunk_count, 3);
    }

    #[tokio::test]
    async fn test_list_threads_reports_bad_rows() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let archive = archive("https://forum.example/threads/t.1/");
        db.replace_thread(&archive, &embed(&archive)).await.unwrap();

        db.conn
            .execute(
                "INSERT INTO threads (url, scrape_date, indexed_at) VALUES (?, x'00', 0)",
                params!["https://forum.example/threads/t.2/"],
            )
            .await
            .unwrap();

        let result = db.list_threads().await;
        assert!(matches!(result, Err(DbError::Data(_))));
    }

    #[tokio::test]
    async fn test_thread_filter() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let first = archive("https://forum.example/threads/t.1/");
        let second = ThreadArchive::new(
            "https://forum.example/threads/t.2/",
            vec![post("1", "carol", "linen shirts summer")],
        );
        db.replace_thread(&first, &embed(&first)).await.unwrap();
        db.replace_thread(&second, &embed(&second)).await.unwrap();

        let query = MockEmbeddingModel::new(DIMS).vector("linen shirts summer");
        let results = db
            .nearest_chunks(&query, 10, Some("https://forum.example/threads/t.2/"))
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].username.as_deref(), Some("carol"));
        assert_eq!(db.list_threads().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_chunk_for_unknown_post_is_rejected() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let archive = archive("https://forum.example/threads/t.1/");
        let mut chunks = embed(&archive);
        chunks[0].chunk.post_index = 99;

        let result = db.replace_thread(&archive, &chunks).await;
        assert!(matches!(result, Err(DbError::Data(_))));
        assert!(db.list_threads().await.unwrap().is_empty());
    }
}
