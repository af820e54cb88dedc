// Urnik - cached access to the Wise Timetable REST API
// Consumed by the page/route layer; no HTTP serving happens here

pub mod auth;
pub mod cache;
pub mod client;
pub mod constants;
pub mod error;
pub mod logging;
pub mod model;
pub mod resolver;
pub mod schedule;
