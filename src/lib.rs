//! Community cat tracker: cats, sightings and photo galleries served over HTTP.

pub mod config;
pub mod dates;
pub mod db;
pub mod error;
pub mod http;
pub mod images;
pub mod logging;
pub mod photos;
pub mod views;
