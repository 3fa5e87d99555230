// Web layer: sessions, dashboard query parsing, page view model and handlers

pub mod session;
pub mod query;
pub mod dashboard;
pub mod handlers;
