//! Warehouse and source data fixtures

use super::constants::*;
use anyhow::Result;
use rusqlite::Connection;
use sparkify_dwh::config::{AppConfig, BackendSettings, StorageSettings};
use sparkify_dwh::{run_job, JobError, JobKind};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const LOG_JSON_PATHS: &str = r#"{
    "jsonpaths": [
        "$['artist']",
        "$['auth']",
        "$['firstName']",
        "$['gender']",
        "$['itemInSession']",
        "$['lastName']",
        "$['length']",
        "$['level']",
        "$['location']",
        "$['method']",
        "$['page']",
        "$['registration']",
        "$['sessionId']",
        "$['song']",
        "$['status']",
        "$['ts']",
        "$['userAgent']",
        "$['userId']"
    ]
}"#;

pub fn song_document(
    song_id: &str,
    title: &str,
    artist_id: &str,
    artist_name: &str,
    year: i64,
    duration: f64,
) -> String {
    serde_json::json!({
        "num_songs": 1,
        "artist_id": artist_id,
        "artist_latitude": null,
        "artist_longitude": null,
        "artist_location": "",
        "artist_name": artist_name,
        "song_id": song_id,
        "title": title,
        "duration": duration,
        "year": year
    })
    .to_string()
}

#[allow(clippy::too_many_arguments)]
pub fn log_event(
    user_id: &str,
    first_name: &str,
    level: &str,
    page: &str,
    song: Option<&str>,
    artist: Option<&str>,
    session_id: i64,
    ts: i64,
) -> String {
    serde_json::json!({
        "artist": artist,
        "auth": "Logged In",
        "firstName": first_name,
        "gender": "F",
        "itemInSession": 0,
        "lastName": "Tester",
        "length": song.map(|_| 215.2),
        "level": level,
        "location": "Portland-South Portland, ME",
        "method": "PUT",
        "page": page,
        "registration": 1540940782796i64,
        "sessionId": session_id,
        "song": song,
        "status": 200,
        "ts": ts,
        "userAgent": "Mozilla/5.0",
        "userId": user_id
    })
    .to_string()
}

/// A scratch SQLite warehouse with local JSON sources laid out like the
/// S3 buckets: `song_data/<A>/<B>/<C>/*.json` and `log_data/<year>/<month>/*.json`.
pub struct TestWarehouse {
    pub dir: TempDir,
    pub config: AppConfig,
}

impl TestWarehouse {
    /// A warehouse whose sources hold the standard fixture data set.
    pub fn new() -> Result<Self> {
        let warehouse = Self::empty()?;
        warehouse.write_songs()?;
        warehouse.write_events()?;
        Ok(warehouse)
    }

    /// A warehouse whose source directories exist but hold no documents.
    pub fn empty() -> Result<Self> {
        let dir = TempDir::new()?;
        let song_data = dir.path().join("song_data");
        let log_data = dir.path().join("log_data");
        let log_jsonpath = dir.path().join("log_json_path.json");
        fs::create_dir_all(&song_data)?;
        fs::create_dir_all(&log_data)?;
        fs::write(&log_jsonpath, LOG_JSON_PATHS)?;

        let config = AppConfig {
            backend: BackendSettings::Sqlite {
                database: dir.path().join("dwh.db"),
            },
            storage: Some(StorageSettings {
                log_data: path_string(&log_data),
                log_jsonpath: path_string(&log_jsonpath),
                song_data: path_string(&song_data),
                region: None,
                iam_role_arn: None,
            }),
        };
        Ok(Self { dir, config })
    }

    pub fn database_path(&self) -> PathBuf {
        self.dir.path().join("dwh.db")
    }

    pub fn song_data(&self) -> PathBuf {
        self.dir.path().join("song_data")
    }

    pub fn log_data(&self) -> PathBuf {
        self.dir.path().join("log_data")
    }

    fn write_songs(&self) -> Result<()> {
        let song_data = self.song_data();
        fs::create_dir_all(song_data.join("A/A/A"))?;
        fs::create_dir_all(song_data.join("A/B/C"))?;
        fs::write(
            song_data.join("A/A/A/TRAAAAW128F429D538.json"),
            song_document("SOUPRIS12A8C13B6A1", "Uprising", "ARMUSE1187B9A4E5F", "Muse", 2009, 305.0),
        )?;
        // Same song exported twice.
        fs::write(
            song_data.join("A/B/C/TRABCEI128F424C983.json"),
            song_document("SOUPRIS12A8C13B6A1", "Uprising", "ARMUSE1187B9A4E5F", "Muse", 2009, 305.0),
        )?;
        fs::write(
            song_data.join("A/B/C/TRABCFL128F149BB0D.json"),
            song_document("SOSTARL12AB0187A3E", "Starlight", "ARMUSE1187B9A4E5F", "Muse", 2006, 240.5),
        )?;
        fs::write(
            song_data.join("A/A/A/TRAAABD128F429CF47.json"),
            song_document("SOHALOO12A6D4F7E21", "Halo", "ARBEYON1187FB4A3B2", "Beyonce", 2008, 261.6),
        )?;
        Ok(())
    }

    fn write_events(&self) -> Result<()> {
        let month = self.log_data().join("2018/11");
        fs::create_dir_all(&month)?;
        let events = [
            log_event("7", "Ada", "free", "NextSong", Some("Uprising"), Some("Muse"), 139, FIRST_PLAY_TS),
            log_event("7", "Ada", "free", "NextSong", Some("Unreleased Demo"), Some("Nobody"), 139, 1541106106796),
            // Browsing only, with a song that would otherwise match.
            log_event(BROWSING_USER_ID, "Bob", "free", "Home", Some("Halo"), Some("Beyonce"), 140, 1541106500796),
            log_event("9", "Cy", "paid", "NextSong", Some("Halo"), Some("Beyonce"), 141, 1541107053796),
            log_event("7", "Ada", "paid", "NextSong", Some("Starlight"), Some("Muse"), 142, 1541110994796),
        ];
        fs::write(month.join("2018-11-01-events.json"), events.join("\n"))?;
        Ok(())
    }

    /// Writes one song document under `song_data/<relative>`.
    pub fn add_song_file(&self, relative: &str, document: String) -> Result<()> {
        let path = self.song_data().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, document)?;
        Ok(())
    }

    /// Writes a log file under `log_data/` holding `events`, one per line.
    pub fn add_event_log(&self, name: &str, events: &[String]) -> Result<()> {
        fs::write(self.log_data().join(name), events.join("\n"))?;
        Ok(())
    }

    pub fn initialize(&self) -> Result<(), JobError> {
        run_job(JobKind::InitializeSchema, &self.config)?;
        Ok(())
    }

    pub fn load(&self) -> Result<(), JobError> {
        run_job(JobKind::Load, &self.config)?;
        Ok(())
    }

    pub fn connection(&self) -> Connection {
        Connection::open(self.database_path()).expect("Failed to open test warehouse")
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Runs a single-value `SELECT COUNT(...)` query.
pub fn count(conn: &Connection, sql: &str) -> u64 {
    conn.query_row(sql, [], |row| row.get::<_, i64>(0))
        .unwrap_or_else(|e| panic!("Query failed: {}: {}", sql, e)) as u64
}

/// Runs a query returning one text column.
pub fn query_strings(conn: &Connection, sql: &str) -> Vec<String> {
    let mut stmt = conn
        .prepare(sql)
        .unwrap_or_else(|e| panic!("Query failed: {}: {}", sql, e));
    let values = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .and_then(|rows| rows.collect::<rusqlite::Result<Vec<_>>>())
        .unwrap_or_else(|e| panic!("Query failed: {}: {}", sql, e));
    values
}
