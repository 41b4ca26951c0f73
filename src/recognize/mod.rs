pub mod aggregate;
pub mod google;
pub mod operation;
pub mod poller;
