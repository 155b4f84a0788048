pub mod daily;
pub mod date;
pub mod logging;
pub mod models;
pub mod notify;
pub mod ordering;
pub mod snapshot;
pub mod storage;
