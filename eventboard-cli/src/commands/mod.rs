pub mod add;
pub mod day;
pub mod import;
pub mod list;
pub mod migrate;
