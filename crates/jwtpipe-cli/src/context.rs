//! Shared state for commands: where the API lives and where credentials go.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use tracing::debug;

use jwtpipe::{ApiUrl, AuthSession, ClientConfig};
use jwtpipe_file::FileStore;

use crate::cli::Cli;

const USER_AGENT: &str = concat!("jwtpipe-cli/", env!("JWTPIPE_VERSION"));

#[derive(Debug)]
pub struct AppContext {
    pub api_url: ApiUrl,
    pub store_path: PathBuf,
    pub timeout: Duration,
}

impl AppContext {
    pub fn new(cli: &Cli) -> Result<Self> {
        let api_url = ApiUrl::new(&cli.api_url).context("Invalid API URL")?;
        let store_path = match &cli.store {
            Some(path) => path.clone(),
            None => default_store_path()?,
        };

        debug!(api = %api_url, store = %store_path.display(), "Resolved configuration");

        Ok(Self {
            api_url,
            store_path,
            timeout: Duration::from_secs(cli.timeout),
        })
    }

    pub fn store(&self) -> Result<Arc<FileStore>> {
        let store = FileStore::open(&self.store_path).context("Failed to open credentials file")?;
        Ok(Arc::new(store))
    }

    /// A session over the stored credentials, logged in or not.
    pub fn session(&self) -> Result<AuthSession> {
        let config = ClientConfig::new(self.api_url.clone())
            .with_timeout(self.timeout)
            .with_user_agent(USER_AGENT);
        AuthSession::connect(&config, self.store()?).context("Failed to create HTTP client")
    }

    /// A session that must already hold credentials.
    pub fn logged_in(&self) -> Result<AuthSession> {
        let session = self.session()?;
        if !session.is_authenticated() {
            bail!("Not logged in. Run 'jwtpipe login' first.");
        }
        Ok(session)
    }
}

fn default_store_path() -> Result<PathBuf> {
    let dirs =
        ProjectDirs::from("", "", "jwtpipe").context("Could not determine data directory")?;
    Ok(dirs.data_dir().join("credentials.json"))
}
