//! Shared constants for end-to-end tests
//!
//! The fixture data set has three distinct songs by two artists, one song
//! duplicated across two files, and five log events of which four are
//! NextSong plays and three match a known song.

/// Epoch milliseconds of the first NextSong event, 2018-11-01 20:57:10 UTC.
pub const FIRST_PLAY_TS: i64 = 1541105830796;

pub const FIRST_PLAY_START_TIME: &str = "2018-11-01 20:57:10";

/// Songs in the fixture, after deduplication.
pub const DISTINCT_SONGS: u64 = 3;

pub const DISTINCT_ARTISTS: u64 = 2;

/// NextSong events in the fixture log.
pub const NEXT_SONG_EVENTS: u64 = 4;

/// NextSong events whose title and artist match a known song.
pub const MATCHED_PLAYS: u64 = 3;

/// Users with at least one NextSong event.
pub const ACTIVE_USERS: u64 = 2;

/// User appearing only on a non-NextSong page.
pub const BROWSING_USER_ID: &str = "8";
