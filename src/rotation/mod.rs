pub mod clock;
pub mod config;
pub mod entry;
pub mod expiry;
pub mod fsops;
pub mod history;
pub mod mtime;
pub mod paths;
pub mod scan;
