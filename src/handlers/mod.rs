pub mod analytics;
pub mod auth;
pub mod entries;
pub mod export;
pub mod health;
pub mod moods;
pub mod settings;
pub mod ws;
