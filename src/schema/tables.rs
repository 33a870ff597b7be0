//! The staging tables and the star schema built from them.

use super::{Distribution, ForeignKey, SqlType, Table};
use crate::warehouse_column;

// =============================================================================
// Staging
// =============================================================================

/// Raw user-activity log rows, one per event. Column order matches the
/// jsonpaths file used to load it.
pub const STAGING_EVENTS_TABLE: Table = Table {
    name: "staging_events",
    columns: &[
        warehouse_column!("artist", &SqlType::Varchar(None)),
        warehouse_column!("auth", &SqlType::Varchar(Some(255))),
        warehouse_column!("first_name", &SqlType::Varchar(Some(255))),
        warehouse_column!("gender", &SqlType::Varchar(Some(255))),
        warehouse_column!("item_in_session", &SqlType::Integer),
        warehouse_column!("last_name", &SqlType::Varchar(Some(255))),
        warehouse_column!("length", &SqlType::Float),
        warehouse_column!("level", &SqlType::Varchar(Some(255))),
        warehouse_column!("location", &SqlType::Varchar(None)),
        warehouse_column!("method", &SqlType::Varchar(Some(255))),
        warehouse_column!("page", &SqlType::Varchar(Some(255))),
        warehouse_column!("registration", &SqlType::BigInt),
        warehouse_column!("session_id", &SqlType::Integer),
        warehouse_column!("song", &SqlType::Varchar(None)),
        warehouse_column!("status", &SqlType::Integer),
        warehouse_column!("ts", &SqlType::BigInt), // epoch millis
        warehouse_column!("user_agent", &SqlType::Varchar(None)),
        warehouse_column!("user_id", &SqlType::Varchar(Some(255))),
    ],
    distribution: Distribution::Default,
    sort_key: &[],
};

/// Raw song and artist metadata, one row per song document.
pub const STAGING_SONGS_TABLE: Table = Table {
    name: "staging_songs",
    columns: &[
        warehouse_column!("artist_id", &SqlType::Varchar(Some(255))),
        warehouse_column!("artist_location", &SqlType::Varchar(None)),
        warehouse_column!("artist_latitude", &SqlType::Float),
        warehouse_column!("artist_longitude", &SqlType::Float),
        warehouse_column!("artist_name", &SqlType::Varchar(None)),
        warehouse_column!("duration", &SqlType::Float),
        warehouse_column!("num_songs", &SqlType::Integer),
        warehouse_column!("song_id", &SqlType::Varchar(Some(255))),
        warehouse_column!("title", &SqlType::Varchar(None)),
        warehouse_column!("year", &SqlType::Integer),
    ],
    distribution: Distribution::Default,
    sort_key: &[],
};

// =============================================================================
// Dimensions
// =============================================================================

pub const USERS_TABLE: Table = Table {
    name: "users",
    columns: &[
        warehouse_column!("user_id", &SqlType::Varchar(Some(255)), is_primary_key = true),
        warehouse_column!("first_name", &SqlType::Varchar(Some(255))),
        warehouse_column!("last_name", &SqlType::Varchar(Some(255))),
        warehouse_column!("gender", &SqlType::Varchar(Some(255))),
        warehouse_column!("level", &SqlType::Varchar(Some(255))),
    ],
    distribution: Distribution::Auto,
    sort_key: &[],
};

/// Distributed on song_id like songplays; sorted by year to keep albums together.
pub const SONGS_TABLE: Table = Table {
    name: "songs",
    columns: &[
        warehouse_column!("song_id", &SqlType::Varchar(Some(255)), is_primary_key = true),
        warehouse_column!("title", &SqlType::Varchar(None)),
        warehouse_column!("artist_id", &SqlType::Varchar(Some(255)), non_null = true),
        warehouse_column!("year", &SqlType::Integer),
        warehouse_column!("duration", &SqlType::Float),
    ],
    distribution: Distribution::Key("song_id"),
    sort_key: &["year"],
};

pub const ARTISTS_TABLE: Table = Table {
    name: "artists",
    columns: &[
        warehouse_column!("artist_id", &SqlType::Varchar(Some(255)), is_primary_key = true),
        warehouse_column!("name", &SqlType::Varchar(None)),
        warehouse_column!("location", &SqlType::Varchar(None)),
        warehouse_column!("latitude", &SqlType::Float),
        warehouse_column!("longitude", &SqlType::Float),
    ],
    distribution: Distribution::All,
    sort_key: &[],
};

pub const TIME_TABLE: Table = Table {
    name: "time",
    columns: &[
        warehouse_column!("start_time", &SqlType::Timestamp, is_primary_key = true),
        warehouse_column!("hour", &SqlType::Integer),
        warehouse_column!("day", &SqlType::Integer),
        warehouse_column!("week", &SqlType::Integer),
        warehouse_column!("month", &SqlType::Integer),
        warehouse_column!("year", &SqlType::Integer),
        warehouse_column!("weekday", &SqlType::Integer),
    ],
    distribution: Distribution::Auto,
    sort_key: &[],
};

// =============================================================================
// Facts
// =============================================================================

const TIME_FK: ForeignKey = ForeignKey {
    foreign_table: "time",
    foreign_column: "start_time",
};

const USERS_FK: ForeignKey = ForeignKey {
    foreign_table: "users",
    foreign_column: "user_id",
};

const SONGS_FK: ForeignKey = ForeignKey {
    foreign_table: "songs",
    foreign_column: "song_id",
};

const ARTISTS_FK: ForeignKey = ForeignKey {
    foreign_table: "artists",
    foreign_column: "artist_id",
};

/// One row per NextSong event that resolved to a known song and artist.
pub const SONGPLAYS_TABLE: Table = Table {
    name: "songplays",
    columns: &[
        warehouse_column!("songplay_id", &SqlType::Identity, is_primary_key = true),
        warehouse_column!(
            "start_time",
            &SqlType::Timestamp,
            non_null = true,
            foreign_key = Some(&TIME_FK)
        ),
        warehouse_column!(
            "user_id",
            &SqlType::Varchar(Some(255)),
            non_null = true,
            foreign_key = Some(&USERS_FK)
        ),
        warehouse_column!("level", &SqlType::Varchar(Some(255))),
        warehouse_column!(
            "song_id",
            &SqlType::Varchar(Some(255)),
            non_null = true,
            foreign_key = Some(&SONGS_FK)
        ),
        warehouse_column!(
            "artist_id",
            &SqlType::Varchar(Some(255)),
            non_null = true,
            foreign_key = Some(&ARTISTS_FK)
        ),
        warehouse_column!("session_id", &SqlType::Integer),
        warehouse_column!("location", &SqlType::Varchar(None)),
        warehouse_column!("user_agent", &SqlType::Varchar(None)),
    ],
    distribution: Distribution::Key("song_id"),
    sort_key: &["start_time", "session_id"],
};

/// Every table in creation order: referenced dimensions precede the fact
/// table.
pub const ALL_TABLES: [&Table; 7] = [
    &STAGING_EVENTS_TABLE,
    &STAGING_SONGS_TABLE,
    &USERS_TABLE,
    &SONGS_TABLE,
    &ARTISTS_TABLE,
    &TIME_TABLE,
    &SONGPLAYS_TABLE,
];
