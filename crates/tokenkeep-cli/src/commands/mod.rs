pub mod maintenance;
pub mod records;
