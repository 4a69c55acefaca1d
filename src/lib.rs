pub mod config;
pub mod credentials;
pub mod http_server;
pub mod logging;
pub mod persistence;
pub mod ports;
pub mod services;
pub mod slack_rs;
pub mod spotify_rs;

#[cfg(test)]
mod test_utils;
