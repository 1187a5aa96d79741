pub mod club_matcher;
pub mod config;
pub mod differ;
pub mod error;
pub mod league_matcher;
pub mod matching;
pub mod memory_store;
pub mod normalize;
pub mod pg_store;
pub mod reconciler;
pub mod results;
pub mod similarity;
pub mod snapshot;
pub mod source;
pub mod store;
pub mod team_matcher;
pub mod types;
pub mod venue_matcher;
pub mod web;
