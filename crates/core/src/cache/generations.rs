//! Cache generation bookkeeping.
//!
//! A generation is a named, versioned bucket of entries. Deleting one drops
//! every entry it holds via the foreign-key cascade.

use super::connection::CacheDb;
use crate::Error;
use tokio_rusqlite::params;

impl CacheDb {
    /// Open a generation, creating it if it doesn't exist.
    ///
    /// Returns true if the generation was created by this call.
    pub async fn open_generation(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let inserted = conn.execute(
                    "INSERT OR IGNORE INTO generations (name, created_at) VALUES (?1, ?2)",
                    params![name, now],
                )?;
                Ok(inserted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Names of all generations, oldest first.
    pub async fn generation_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM generations ORDER BY rowid ASC")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a generation and all of its entries.
    ///
    /// Returns false if no such generation existed.
    pub async fn delete_generation(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM generations WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_generation_creates_once() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(db.open_generation("app-v3").await.unwrap());
        assert!(!db.open_generation("app-v3").await.unwrap());
        assert_eq!(db.generation_names().await.unwrap(), vec!["app-v3"]);
    }

    #[tokio::test]
    async fn test_generation_names_in_creation_order() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_generation("app-v2").await.unwrap();
        db.open_generation("app-v1").await.unwrap();
        db.open_generation("app-v3").await.unwrap();

        assert_eq!(db.generation_names().await.unwrap(), vec!["app-v2", "app-v1", "app-v3"]);
    }

    #[tokio::test]
    async fn test_delete_generation() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_generation("app-v2").await.unwrap();

        assert!(db.delete_generation("app-v2").await.unwrap());
        assert!(!db.delete_generation("app-v2").await.unwrap());
        assert!(db.generation_names().await.unwrap().is_empty());
    }
}
