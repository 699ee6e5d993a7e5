pub mod healthchecks;
pub mod pastebin;

#[cfg(test)]
mod testserver;

pub use healthchecks::HealthchecksClient;
pub use pastebin::PastebinClient;
