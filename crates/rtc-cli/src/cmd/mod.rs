pub mod completions;
pub mod config;
pub mod create;
pub mod find;
pub mod list;
pub mod move_cmd;
pub mod open;
pub mod planning;
pub mod query;
pub mod request;
pub mod show;
pub mod update;
