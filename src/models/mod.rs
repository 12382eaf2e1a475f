pub mod mood;
pub mod mood_entry;
pub mod settings;
pub mod user;
