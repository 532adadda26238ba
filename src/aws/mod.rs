pub mod config;
pub mod demo;
pub mod sigv4;
pub mod storage;

#[derive(Debug, Clone)]
pub struct Client {
    pub(self) client: reqwest::Client,
}

impl Default for Client {
    fn default() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}
