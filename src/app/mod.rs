pub mod response;

#[cfg(feature = "server")]
pub mod server;
