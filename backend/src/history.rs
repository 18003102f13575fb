//! SQLite record of generated decks plus a per-company research cache.
//!
//! Every call opens its own `Connection`; callers on the async side go through
//! `spawn_blocking`.

use common::model::history::DeckSummary;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use thiserror::Error;

use crate::pipeline::content::PitchContent;
use crate::pipeline::gamma::DeckResult;
use crate::pipeline::research::CompanyResearch;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("failed to encode history record: {0}")]
    Json(#[from] serde_json::Error),
}

/// Full stored record returned by `GET /api/history/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeckDetail {
    pub id: i64,
    pub job_id: String,
    pub company_name: String,
    pub contact_name: String,
    pub deck_url: String,
    pub pptx_url: String,
    pub pdf_url: String,
    pub gamma_id: String,
    pub research_data: Option<Value>,
    pub pitch_content: Option<Value>,
    pub mapped_services: Option<Value>,
    pub created_at: String,
}

/// Everything recorded about one successfully built deck.
pub struct NewDeck<'a> {
    pub job_id: &'a str,
    pub company_name: &'a str,
    pub contact_name: &'a str,
    pub deck: &'a DeckResult,
    pub research: &'a CompanyResearch,
    pub pitch: &'a PitchContent,
}

/// Trimmed, lowercased, with inner whitespace collapsed to single spaces.
pub fn normalize_company_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn parse_json_column(text: Option<String>) -> Option<Value> {
    text.and_then(|t| serde_json::from_str(&t).ok())
}

#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    /// Opens (creating if needed) the database at `path` and its tables.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, HistoryError> {
        let store = Self { path: path.into() };
        let conn = store.connect()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS generated_decks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                job_id TEXT NOT NULL,
                company_name TEXT NOT NULL,
                contact_name TEXT NOT NULL DEFAULT '',
                deck_url TEXT NOT NULL DEFAULT '',
                pptx_url TEXT NOT NULL DEFAULT '',
                pdf_url TEXT NOT NULL DEFAULT '',
                gamma_id TEXT NOT NULL DEFAULT '',
                research_data TEXT,
                pitch_content TEXT,
                mapped_services TEXT,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_generated_decks_job ON generated_decks(job_id);
            CREATE INDEX IF NOT EXISTS idx_generated_decks_company ON generated_decks(company_name);
            CREATE TABLE IF NOT EXISTS research_cache (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                company_name_normalized TEXT NOT NULL UNIQUE,
                research_data TEXT NOT NULL,
                created_at TEXT NOT NULL
            );",
        )?;
        Ok(store)
    }

    fn connect(&self) -> Result<Connection, HistoryError> {
        Ok(Connection::open(&self.path)?)
    }

    pub fn record_deck(&self, new: &NewDeck<'_>) -> Result<i64, HistoryError> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO generated_decks (
                job_id, company_name, contact_name, deck_url, pptx_url, pdf_url, gamma_id,
                research_data, pitch_content, mapped_services, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                new.job_id,
                new.company_name,
                new.contact_name,
                new.deck.url,
                new.deck.pptx_url,
                new.deck.pdf_url,
                new.deck.gamma_id,
                serde_json::to_string(new.research)?,
                serde_json::to_string(new.pitch)?,
                serde_json::to_string(&new.pitch.mapped_services)?,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// One page of decks, newest first, with the total count.
    pub fn list(&self, limit: u32, offset: u32) -> Result<(i64, Vec<DeckSummary>), HistoryError> {
        let conn = self.connect()?;
        let total: i64 = conn.query_row("SELECT COUNT(*) FROM generated_decks", [], |row| row.get(0))?;

        let mut stmt = conn.prepare(
            "SELECT id, job_id, company_name, contact_name, deck_url, pptx_url, gamma_id, created_at
             FROM generated_decks ORDER BY id DESC LIMIT ?1 OFFSET ?2",
        )?;
        let decks = stmt
            .query_map(params![limit, offset], |row| {
                Ok(DeckSummary {
                    id: row.get(0)?,
                    job_id: row.get(1)?,
                    company_name: row.get(2)?,
                    contact_name: row.get(3)?,
                    deck_url: row.get(4)?,
                    pptx_url: row.get(5)?,
                    gamma_id: row.get(6)?,
                    created_at: row.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((total, decks))
    }

    pub fn get(&self, id: i64) -> Result<Option<DeckDetail>, HistoryError> {
        let conn = self.connect()?;
        let detail = conn
            .query_row(
                "SELECT id, job_id, company_name, contact_name, deck_url, pptx_url, pdf_url, gamma_id,
                        research_data, pitch_content, mapped_services, created_at
                 FROM generated_decks WHERE id = ?1",
                params![id],
                |row| {
                    Ok(DeckDetail {
                        id: row.get(0)?,
                        job_id: row.get(1)?,
                        company_name: row.get(2)?,
                        contact_name: row.get(3)?,
                        deck_url: row.get(4)?,
                        pptx_url: row.get(5)?,
                        pdf_url: row.get(6)?,
                        gamma_id: row.get(7)?,
                        research_data: parse_json_column(row.get(8)?),
                        pitch_content: parse_json_column(row.get(9)?),
                        mapped_services: parse_json_column(row.get(10)?),
                        created_at: row.get(11)?,
                    })
                },
            )
            .optional()?;
        Ok(detail)
    }

    pub fn cached_research(&self, company_name: &str) -> Result<Option<CompanyResearch>, HistoryError> {
        let conn = self.connect()?;
        let stored: Option<String> = conn
            .query_row(
                "SELECT research_data FROM research_cache WHERE company_name_normalized = ?1",
                params![normalize_company_name(company_name)],
                |row| row.get(0),
            )
            .optional()?;

        match stored {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    pub fn store_research(&self, company_name: &str, research: &CompanyResearch) -> Result<(), HistoryError> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO research_cache (company_name_normalized, research_data, created_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(company_name_normalized)
             DO UPDATE SET research_data = excluded.research_data, created_at = excluded.created_at",
            params![
                normalize_company_name(company_name),
                serde_json::to_string(research)?,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(store: &HistoryStore, job_id: &str, company: &str) -> i64 {
        let deck = DeckResult {
            gamma_id: format!("gen_{}", company),
            url: format!("https://gamma.app/docs/{}", company),
            pptx_url: String::new(),
            pdf_url: String::new(),
        };
        let research = CompanyResearch {
            company_name: company.to_string(),
            overview: "overview".to_string(),
            ..CompanyResearch::default()
        };
        let pitch = PitchContent {
            company_name: company.to_string(),
            ..PitchContent::default()
        };
        store
            .record_deck(&NewDeck {
                job_id,
                company_name: company,
                contact_name: "Dana",
                deck: &deck,
                research: &research,
                pitch: &pitch,
            })
            .unwrap()
    }

    #[test]
    fn names_normalize() {
        assert_eq!(normalize_company_name("  Acme   Corp\t"), "acme corp");
    }

    #[test]
    fn list_is_newest_first_and_paginated() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::open(dir.path().join("h.sqlite")).unwrap();
        record(&store, "job1", "alpha");
        record(&store, "job1", "beta");
        record(&store, "job2", "gamma");

        let (total, page) = store.list(2, 0).unwrap();
        assert_eq!(total, 3);
        let names: Vec<&str> = page.iter().map(|d| d.company_name.as_str()).collect();
        assert_eq!(names, vec!["gamma", "beta"]);

        let (_, rest) = store.list(2, 2).unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].company_name, "alpha");
    }

    #[test]
    fn detail_includes_stored_json() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::open(dir.path().join("h.sqlite")).unwrap();
        let id = record(&store, "job1", "alpha");

        let detail = store.get(id).unwrap().unwrap();
        assert_eq!(detail.gamma_id, "gen_alpha");
        assert_eq!(detail.research_data.unwrap()["overview"], "overview");
        assert_eq!(detail.mapped_services, Some(Value::Array(vec![])));
        assert!(store.get(id + 100).unwrap().is_none());
    }

    #[test]
    fn research_cache_is_keyed_by_normalized_name() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::open(dir.path().join("h.sqlite")).unwrap();
        assert!(store.cached_research("Acme Corp").unwrap().is_none());

        let research = CompanyResearch {
            company_name: "Acme Corp".to_string(),
            pain_points: vec!["churn".to_string()],
            ..CompanyResearch::default()
        };
        store.store_research("Acme Corp", &research).unwrap();
        assert_eq!(store.cached_research(" acme  corp ").unwrap(), Some(research.clone()));

        let updated = CompanyResearch {
            overview: "newer".to_string(),
            ..research
        };
        store.store_research("ACME CORP", &updated).unwrap();
        assert_eq!(store.cached_research("Acme Corp").unwrap().unwrap().overview, "newer");
    }
}
