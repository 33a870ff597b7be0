//! The statements making up each job.
//!
//! Drop and create steps come straight from the table definitions. Load steps
//! clear and bulk-load the staging tables, then fill the dimensions and
//! finally the fact table, which joins against `songs` and `artists`.

use crate::config::StorageSettings;
use crate::pipeline::{CopyCommand, JsonFormat, Pipeline, Statement, Step};
use crate::schema::{
    Table, ALL_TABLES, ARTISTS_TABLE, SONGPLAYS_TABLE, SONGS_TABLE, STAGING_EVENTS_TABLE,
    STAGING_SONGS_TABLE, TIME_TABLE, USERS_TABLE,
};
use crate::warehouse::{DatePart, Dialect};

/// Drop order: the fact table goes before the dimensions it references.
pub fn drop_table_steps() -> Vec<Step> {
    let tables: [&Table; 7] = [
        &STAGING_EVENTS_TABLE,
        &STAGING_SONGS_TABLE,
        &SONGPLAYS_TABLE,
        &USERS_TABLE,
        &SONGS_TABLE,
        &ARTISTS_TABLE,
        &TIME_TABLE,
    ];
    tables
        .iter()
        .map(|table| Step::sql(format!("drop {}", table.name), table.drop_sql()))
        .collect()
}

pub fn create_table_steps(dialect: Dialect) -> Vec<Step> {
    ALL_TABLES
        .iter()
        .map(|table| Step::sql(format!("create {}", table.name), table.create_sql(dialect)))
        .collect()
}

fn staging_load_step(table: &Table, copy: CopyCommand) -> Step {
    Step::new(
        format!("load {}", table.name),
        vec![
            Statement::Sql(format!("DELETE FROM {};", table.name)),
            Statement::Copy(copy),
        ],
    )
}

pub fn copy_table_steps(storage: &StorageSettings) -> Vec<Step> {
    let events = CopyCommand {
        table: STAGING_EVENTS_TABLE.name,
        columns: STAGING_EVENTS_TABLE.column_names(),
        source: storage.log_data.clone(),
        format: JsonFormat::JsonPaths(storage.log_jsonpath.clone()),
        iam_role: storage.iam_role_arn.clone(),
        region: storage.region.clone(),
    };
    let songs = CopyCommand {
        table: STAGING_SONGS_TABLE.name,
        columns: STAGING_SONGS_TABLE.column_names(),
        source: storage.song_data.clone(),
        format: JsonFormat::Auto,
        iam_role: storage.iam_role_arn.clone(),
        region: storage.region.clone(),
    };
    vec![
        staging_load_step(&STAGING_EVENTS_TABLE, events),
        staging_load_step(&STAGING_SONGS_TABLE, songs),
    ]
}

/// Latest known profile per user, from NextSong events only.
const USER_TABLE_INSERT: &str = "\
INSERT INTO users (user_id, first_name, last_name, gender, level)
SELECT user_id, first_name, last_name, gender, level
FROM (
    SELECT user_id, first_name, last_name, gender, level,
        ROW_NUMBER() OVER (PARTITION BY user_id ORDER BY ts DESC) AS rn
    FROM staging_events
    WHERE page = 'NextSong' AND user_id IS NOT NULL
) latest
WHERE rn = 1;";

const SONG_TABLE_INSERT: &str = "\
INSERT INTO songs (song_id, title, artist_id, year, duration)
SELECT song_id, title, artist_id, year, duration
FROM (
    SELECT song_id, title, artist_id, year, duration,
        ROW_NUMBER() OVER (PARTITION BY song_id ORDER BY title, artist_id) AS rn
    FROM staging_songs
    WHERE song_id IS NOT NULL AND artist_id IS NOT NULL
) ranked
WHERE rn = 1;";

const ARTIST_TABLE_INSERT: &str = "\
INSERT INTO artists (artist_id, name, location, latitude, longitude)
SELECT artist_id, artist_name, artist_location, artist_latitude, artist_longitude
FROM (
    SELECT artist_id, artist_name, artist_location, artist_latitude, artist_longitude,
        ROW_NUMBER() OVER (PARTITION BY artist_id ORDER BY artist_name) AS rn
    FROM staging_songs
    WHERE artist_id IS NOT NULL
) ranked
WHERE rn = 1;";

fn time_table_insert(dialect: Dialect) -> String {
    let parts = [
        DatePart::Hour,
        DatePart::Day,
        DatePart::Week,
        DatePart::Month,
        DatePart::Year,
        DatePart::Weekday,
    ]
    .iter()
    .map(|part| dialect.extract(*part, "start_time"))
    .collect::<Vec<_>>()
    .join(",\n    ");
    format!(
        "INSERT INTO time (start_time, hour, day, week, month, year, weekday)
SELECT start_time,
    {}
FROM (
    SELECT DISTINCT {} AS start_time
    FROM staging_events
    WHERE page = 'NextSong' AND ts IS NOT NULL
) plays;",
        parts,
        dialect.epoch_millis_to_timestamp("ts")
    )
}

/// Events whose song title and artist name both match a known song by that
/// artist. Unmatched events are dropped. Each (title, artist name) pair
/// resolves to one real `songs` row, so an event yields at most one play and
/// its song and artist ids always belong together.
fn songplay_table_insert(dialect: Dialect) -> String {
    format!(
        "INSERT INTO songplays (start_time, user_id, level, song_id, artist_id, session_id, location, user_agent)
SELECT {},
    e.user_id,
    e.level,
    m.song_id,
    m.artist_id,
    e.session_id,
    e.location,
    e.user_agent
FROM staging_events e
JOIN (
    SELECT s.title, a.name, s.song_id, s.artist_id,
        ROW_NUMBER() OVER (PARTITION BY s.title, a.name ORDER BY s.song_id) AS rn
    FROM songs s
    JOIN artists a ON a.artist_id = s.artist_id
) m ON m.title = e.song AND m.name = e.artist AND m.rn = 1
WHERE e.page = 'NextSong' AND e.user_id IS NOT NULL AND e.ts IS NOT NULL;",
        dialect.epoch_millis_to_timestamp("e.ts")
    )
}

/// Dimensions first, then the fact table that joins against them.
pub fn insert_table_steps(dialect: Dialect) -> Vec<Step> {
    vec![
        Step::sql("insert users", USER_TABLE_INSERT),
        Step::sql("insert songs", SONG_TABLE_INSERT),
        Step::sql("insert artists", ARTIST_TABLE_INSERT),
        Step::sql("insert time", time_table_insert(dialect)),
        Step::sql("insert songplays", songplay_table_insert(dialect)),
    ]
}

pub fn initialize_schema_pipeline(dialect: Dialect) -> Pipeline {
    let mut steps = drop_table_steps();
    steps.extend(create_table_steps(dialect));
    Pipeline::new("initialize-schema", steps)
}

pub fn load_pipeline(dialect: Dialect, storage: &StorageSettings) -> Pipeline {
    let mut steps = copy_table_steps(storage);
    steps.extend(insert_table_steps(dialect));
    Pipeline::new("run-load", steps)
}
