pub mod failed;
pub mod processed;
pub mod raw;
