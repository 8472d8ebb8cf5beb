//! Stored response entries.
//!
//! Writes use UPSERT keyed on `(generation, key)`, so the last completed
//! write for a request wins.

use super::connection::CacheDb;
use crate::Error;
use crate::request::CachedResponse;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

const UPSERT_ENTRY: &str = "INSERT INTO entries (
        generation, key, url, status, headers_json, body, body_sha256, stored_at
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
    ON CONFLICT(generation, key) DO UPDATE SET
        url = excluded.url,
        status = excluded.status,
        headers_json = excluded.headers_json,
        body = excluded.body,
        body_sha256 = excluded.body_sha256,
        stored_at = excluded.stored_at";

/// A response prepared for storage, with its encoded headers and digest.
struct EntryRow {
    key: String,
    url: String,
    status: u16,
    headers_json: String,
    body: Vec<u8>,
    body_sha256: String,
}

impl EntryRow {
    fn new(key: &str, response: &CachedResponse) -> Result<Self, Error> {
        Ok(Self {
            key: key.to_string(),
            url: response.url.clone(),
            status: response.status,
            headers_json: response.headers_json()?,
            body: response.body.to_vec(),
            body_sha256: response.body_sha256(),
        })
    }

    fn insert(&self, conn: &rusqlite::Connection, generation: &str, stored_at: &str) -> Result<(), Error> {
        conn.execute(
            UPSERT_ENTRY,
            params![
                generation,
                &self.key,
                &self.url,
                self.status,
                &self.headers_json,
                &self.body,
                &self.body_sha256,
                stored_at,
            ],
        )?;
        Ok(())
    }
}

fn ensure_generation(conn: &rusqlite::Connection, generation: &str, now: &str) -> Result<(), Error> {
    conn.execute(
        "INSERT OR IGNORE INTO generations (name, created_at) VALUES (?1, ?2)",
        params![generation, now],
    )?;
    Ok(())
}

fn read_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, u16, String, Vec<u8>, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn into_response(
    (url, status, headers_json, body, stored_at): (String, u16, String, Vec<u8>, String),
) -> Result<CachedResponse, Error> {
    let headers = CachedResponse::headers_from_json(&headers_json)?;
    let mut response = CachedResponse::new(url, status, headers, body);
    response.stored_at = Some(stored_at);
    Ok(response)
}

impl CacheDb {
    /// Store a response under `key`, creating the generation if needed.
    pub async fn put_entry(&self, generation: &str, key: &str, response: &CachedResponse) -> Result<(), Error> {
        let row = EntryRow::new(key, response)?;
        let generation = generation.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                ensure_generation(conn, &generation, &now)?;
                row.insert(conn, &generation, &now)
            })
            .await
            .map_err(Error::from)
    }

    /// Store a batch of responses in one transaction.
    ///
    /// Either every entry is written or none is.
    pub async fn put_entries(&self, generation: &str, entries: &[(String, CachedResponse)]) -> Result<(), Error> {
        let rows = entries
            .iter()
            .map(|(key, response)| EntryRow::new(key, response))
            .collect::<Result<Vec<_>, _>>()?;
        let generation = generation.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                ensure_generation(&tx, &generation, &now)?;
                for row in &rows {
                    row.insert(&tx, &generation, &now)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get the entry for `key` in one generation.
    pub async fn get_entry(&self, generation: &str, key: &str) -> Result<Option<CachedResponse>, Error> {
        let generation = generation.to_string();
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CachedResponse>, Error> {
                let result = conn.query_row(
                    "SELECT url, status, headers_json, body, stored_at
                    FROM entries WHERE generation = ?1 AND key = ?2",
                    params![generation, key],
                    read_entry,
                );

                match result {
                    Ok(row) => into_response(row).map(Some),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Find `key` in any generation, searching the oldest generation first.
    pub async fn match_entry(&self, key: &str) -> Result<Option<CachedResponse>, Error> {
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CachedResponse>, Error> {
                let result = conn.query_row(
                    "SELECT e.url, e.status, e.headers_json, e.body, e.stored_at
                    FROM entries e JOIN generations g ON g.name = e.generation
                    WHERE e.key = ?1
                    ORDER BY g.rowid ASC
                    LIMIT 1",
                    params![key],
                    read_entry,
                );

                match result {
                    Ok(row) => into_response(row).map(Some),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Keys stored in a generation, in insertion order.
    pub async fn entry_keys(&self, generation: &str) -> Result<Vec<String>, Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT key FROM entries WHERE generation = ?1 ORDER BY rowid ASC")?;
                let keys = stmt
                    .query_map(params![generation], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_response(url: &str, body: &str) -> CachedResponse {
        CachedResponse::new(url, 200, vec![("content-type".into(), "text/html".into())], body.to_string())
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let response = make_response("http://localhost/index.html", "<h1>v1</h1>");

        db.put_entry("app-v3", "http://localhost/index.html", &response)
            .await
            .unwrap();

        let stored = db
            .get_entry("app-v3", "http://localhost/index.html")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.body, response.body);
        assert_eq!(stored.status, 200);
        assert_eq!(stored.content_type(), Some("text/html"));
        assert!(stored.stored_at.is_some());
        assert_eq!(db.generation_names().await.unwrap(), vec!["app-v3"]);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(db.get_entry("app-v3", "http://localhost/").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let key = "http://localhost/data.json";
        db.put_entry("app-v3", key, &make_response(key, "old")).await.unwrap();
        db.put_entry("app-v3", key, &make_response(key, "new")).await.unwrap();

        let stored = db.get_entry("app-v3", key).await.unwrap().unwrap();
        assert_eq!(&stored.body[..], b"new");
        assert_eq!(db.entry_keys("app-v3").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_put_entries_batch() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let batch = vec![
            ("http://localhost/".to_string(), make_response("http://localhost/", "root")),
            ("http://localhost/app.js".to_string(), make_response("http://localhost/app.js", "js")),
        ];

        db.put_entries("app-v3", &batch).await.unwrap();

        assert_eq!(
            db.entry_keys("app-v3").await.unwrap(),
            vec!["http://localhost/", "http://localhost/app.js"]
        );
    }

    #[tokio::test]
    async fn test_put_entries_rolls_back_on_failure() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.conn
            .call(|conn| -> Result<(), Error> {
                conn.execute_batch(
                    "CREATE TRIGGER reject_broken BEFORE INSERT ON entries
                     WHEN NEW.key = 'http://localhost/broken.js'
                     BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
            .unwrap();

        let batch = vec![
            ("http://localhost/".to_string(), make_response("http://localhost/", "root")),
            ("http://localhost/broken.js".to_string(), make_response("http://localhost/broken.js", "js")),
            ("http://localhost/app.css".to_string(), make_response("http://localhost/app.css", "css")),
        ];

        assert!(db.put_entries("app-v3", &batch).await.is_err());

        assert!(db.entry_keys("app-v3").await.unwrap().is_empty());
        assert!(db.match_entry("http://localhost/").await.unwrap().is_none());
        assert!(db.generation_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_match_entry_prefers_oldest_generation() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let key = "http://localhost/";
        db.put_entry("app-v2", key, &make_response(key, "v2")).await.unwrap();
        db.put_entry("app-v3", key, &make_response(key, "v3")).await.unwrap();

        let matched = db.match_entry(key).await.unwrap().unwrap();
        assert_eq!(&matched.body[..], b"v2");

        db.delete_generation("app-v2").await.unwrap();
        let matched = db.match_entry(key).await.unwrap().unwrap();
        assert_eq!(&matched.body[..], b"v3");
    }

    #[tokio::test]
    async fn test_delete_generation_cascades() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let key = "http://localhost/";
        db.put_entry("app-v2", key, &make_response(key, "v2")).await.unwrap();

        db.delete_generation("app-v2").await.unwrap();

        assert!(db.match_entry(key).await.unwrap().is_none());
        assert!(db.entry_keys("app-v2").await.unwrap().is_empty());
    }
}
