//! System setup and initialization

use crate::error::CliError;
use hafiz_config::{Catalog, Config};
use hafiz_events::EventSender;
use hafiz_install::Installer;
use hafiz_net::{NetClient, NetConfig};
use hafiz_store::ContentStore;
use tracing::debug;

/// Components a command runs against
pub struct SystemSetup {
    config: Config,
    catalog: Catalog,
    installer: Installer,
}

impl SystemSetup {
    /// Build the installer, prepare the content root and load the catalog
    /// when the command needs one.
    pub async fn initialize(
        config: Config,
        load_catalog: bool,
        event_sender: EventSender,
    ) -> Result<Self, CliError> {
        let installer = Installer::from_config(&config)?.with_event_sender(event_sender.clone());
        installer.store().ensure_layout().await?;
        debug!(root = %installer.store().root().display(), "content root ready");

        let catalog = if load_catalog {
            load_catalog_from(&config, &event_sender).await?
        } else {
            Catalog::default()
        };

        Ok(Self {
            config,
            catalog,
            installer,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn installer(&self) -> &Installer {
        &self.installer
    }

    pub fn store(&self) -> &ContentStore {
        self.installer.store()
    }
}

/// Read the catalog from disk, or over HTTP when the location is a URL
async fn load_catalog_from(config: &Config, tx: &EventSender) -> Result<Catalog, CliError> {
    let location = config.catalog_path();
    let location_str = location.to_string_lossy();

    if hafiz_net::is_remote(&location_str) {
        let client = NetClient::new(NetConfig::from(&config.network))?;
        let contents = hafiz_net::fetch_text(&client, &location_str, tx).await?;
        let catalog = Catalog::from_toml(&contents)?;
        debug!(url = %location_str, packages = catalog.len(), "loaded remote catalog");
        Ok(catalog)
    } else {
        Ok(Catalog::load_from_file(&location).await?)
    }
}
