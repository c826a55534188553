//! SQLite record store
//!
//! Records are upserted by canonical URL, so a product delivered twice
//! (retries, sibling colors pointing back) ends up as one row holding the
//! latest extraction.

use crate::output::stats::StoredStatistics;
use crate::output::traits::{OutputResult, RecordSink};
use crate::product::Product;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS products (
    canonical_url TEXT PRIMARY KEY,
    site TEXT NOT NULL,
    product_id TEXT NOT NULL,
    name TEXT NOT NULL,
    brand TEXT,
    currency TEXT,
    price REAL,
    list_price REAL,
    available INTEGER NOT NULL,
    crawl_index INTEGER NOT NULL,
    payload TEXT NOT NULL,
    first_seen_at TEXT NOT NULL,
    extracted_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_products_site ON products(site);
"#;

/// Product table in a SQLite database
pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    /// Opens (or creates) the database at `path`
    pub fn open(path: &Path) -> OutputResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> OutputResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self { conn })
    }

    pub fn count(&self) -> OutputResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Loads the stored record for a canonical URL
    pub fn get(&self, canonical_url: &str) -> OutputResult<Option<Product>> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload FROM products WHERE canonical_url = ?1",
                params![canonical_url],
                |row| row.get(0),
            )
            .optional()?;

        match payload {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    /// Aggregates what the database holds
    pub fn statistics(&self) -> OutputResult<StoredStatistics> {
        let mut stmt = self.conn.prepare(
            "SELECT site, COUNT(*), SUM(available), MAX(extracted_at)
             FROM products GROUP BY site ORDER BY site",
        )?;

        let mut stats = StoredStatistics::default();
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, Option<i64>>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        })?;

        for row in rows {
            let (site, count, available, last_extracted) = row?;
            stats.total_records += count as u64;
            stats.available_records += available.unwrap_or(0) as u64;
            stats.records_by_site.insert(site, count as u64);
            if last_extracted > stats.last_extracted_at {
                stats.last_extracted_at = last_extracted;
            }
        }

        Ok(stats)
    }
}

impl RecordSink for SqliteSink {
    fn write_record(&mut self, product: &Product) -> OutputResult<()> {
        let payload = serde_json::to_string(product)?;
        let extracted_at = product.extracted_at.to_rfc3339();
        let price = product.price.as_ref();

        self.conn.execute(
            "INSERT INTO products (canonical_url, site, product_id, name, brand, currency, price,
                                   list_price, available, crawl_index, payload, first_seen_at,
                                   extracted_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
             ON CONFLICT(canonical_url) DO UPDATE SET
                site = excluded.site,
                product_id = excluded.product_id,
                name = excluded.name,
                brand = excluded.brand,
                currency = excluded.currency,
                price = excluded.price,
                list_price = excluded.list_price,
                available = excluded.available,
                crawl_index = excluded.crawl_index,
                payload = excluded.payload,
                extracted_at = excluded.extracted_at",
            params![
                product.canonical_url,
                product.site,
                product.product_id,
                product.name,
                product.brand,
                price.map(|p| p.currency.as_str()),
                price.map(|p| p.current),
                price.and_then(|p| p.list),
                product.is_available(),
                product.crawl_index as i64,
                payload,
                extracted_at,
            ],
        )?;

        Ok(())
    }
}
