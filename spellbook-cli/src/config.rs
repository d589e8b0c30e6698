//! CLI configuration

use spellbook_client::SpellbookClient;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the Spellbook API
    pub api_url: String,
    /// Identity to act as; most commands are rejected without one
    pub user: Option<String>,
}

impl Config {
    pub fn client(&self) -> SpellbookClient {
        let client = SpellbookClient::new(&self.api_url);
        match &self.user {
            Some(user) => client.with_user(user),
            None => client,
        }
    }
}
