pub mod analytics;
pub mod config;
pub mod details;
pub mod facets;
pub mod forms;
pub mod history;
pub mod ordered;
pub mod state;
pub mod ticket;
pub mod transition;
