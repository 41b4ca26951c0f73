pub mod naming;
pub mod transcoder;
