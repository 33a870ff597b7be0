//! End-to-end tests for the initialize-schema job

mod common;

use common::{count, query_strings, TestWarehouse};
use sparkify_dwh::schema::{self, ALL_TABLES};
use sparkify_dwh::{JobError, SqliteWarehouse};

const TABLE_NAMES_SQL: &str =
    "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name";

#[test]
fn test_initialize_creates_every_table() {
    let warehouse = TestWarehouse::empty().unwrap();

    warehouse.initialize().unwrap();

    let tables = query_strings(&warehouse.connection(), TABLE_NAMES_SQL);
    assert_eq!(
        tables,
        vec![
            "artists",
            "songplays",
            "songs",
            "staging_events",
            "staging_songs",
            "time",
            "users"
        ]
    );

    let mut opened = SqliteWarehouse::open(&warehouse.database_path()).unwrap();
    schema::verify(&mut opened, &ALL_TABLES).unwrap();
}

#[test]
fn test_initialize_twice_is_idempotent() {
    let warehouse = TestWarehouse::empty().unwrap();

    warehouse.initialize().unwrap();
    let first = query_strings(
        &warehouse.connection(),
        "SELECT sql FROM sqlite_master WHERE type = 'table' ORDER BY name",
    );
    warehouse.initialize().unwrap();
    let second = query_strings(
        &warehouse.connection(),
        "SELECT sql FROM sqlite_master WHERE type = 'table' ORDER BY name",
    );

    assert_eq!(first, second);
}

#[test]
fn test_initialize_after_load_empties_every_table() {
    let warehouse = TestWarehouse::new().unwrap();
    warehouse.initialize().unwrap();
    warehouse.load().unwrap();
    assert!(count(&warehouse.connection(), "SELECT COUNT(*) FROM songplays") > 0);

    warehouse.initialize().unwrap();

    let conn = warehouse.connection();
    for table in ALL_TABLES {
        let sql = format!("SELECT COUNT(*) FROM {}", table.name);
        assert_eq!(count(&conn, &sql), 0, "{} should be empty", table.name);
    }
}

#[test]
fn test_initialize_replaces_tables_with_a_different_shape() {
    let warehouse = TestWarehouse::empty().unwrap();
    warehouse
        .connection()
        .execute_batch("CREATE TABLE users (id INTEGER); INSERT INTO users VALUES (1);")
        .unwrap();

    warehouse.initialize().unwrap();

    let conn = warehouse.connection();
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM users"), 0);
    let columns = query_strings(&conn, "SELECT name FROM pragma_table_info('users')");
    assert_eq!(
        columns,
        vec!["user_id", "first_name", "last_name", "gender", "level"]
    );
}

#[test]
fn test_initialize_on_unwritable_database_is_connection_error() {
    let warehouse = TestWarehouse::empty().unwrap();
    let mut config = warehouse.config.clone();
    config.backend = sparkify_dwh::config::BackendSettings::Sqlite {
        database: warehouse.dir.path().join("missing-dir").join("dwh.db"),
    };

    let result = sparkify_dwh::run_job(sparkify_dwh::JobKind::InitializeSchema, &config);

    assert!(matches!(result, Err(JobError::Connection(_))));
}
