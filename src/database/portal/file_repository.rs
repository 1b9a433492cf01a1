use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, de::DeserializeOwned};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, warn};

use super::model::{ActivePortal, PortalConfig, PortalMeta, PortalRepository, PortalSummary};
use crate::server::utils::hardware_utils::md5_hex;

const CONFIG_FILE: &str = "config.json";
const PLAYLIST_FILE: &str = "playlist.m3u8";
const META_FILE: &str = "meta.json";
const ACTIVE_FILE: &str = "active_portal.json";

static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9_.\- ]").expect("static regex should compile"));
static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("static regex should compile"));

/// `<display name>_<first 8 of md5(host::mac::serial)>`, the same portal always lands in the
/// same folder
pub fn portal_folder_name(display_name: &str, host: &str, mac: &str, serial: &str) -> String {
    let name = display_name.trim();
    let name = if name.is_empty() { "portal" } else { name };
    let safe = UNSAFE_CHARS.replace_all(name, "_");
    let safe = WHITESPACE.replace_all(&safe, "_");

    let seed = format!("{}::{}::{}", host, mac, serial);
    format!("{}_{}", safe, &md5_hex(&seed)[..8])
}

/// one folder per portal under the root, plus `active_portal.json` next to them
pub struct FilePortalRepository {
    root: PathBuf,
}

impl FilePortalRepository {
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .with_context(|| format!("failed to create portals dir {}", root.display()))?;

        let repository = Self { root };
        repository.ensure_active_pointer().await?;

        info!("portal store ready at {}", repository.root.display());
        Ok(repository)
    }

    // folder names come from urls so anything that could walk out of the root is rejected
    fn folder_path(&self, folder: &str) -> Option<PathBuf> {
        let valid = !folder.is_empty()
            && folder != "."
            && folder != ".."
            && !folder.contains('/')
            && !folder.contains('\\');
        valid.then(|| self.root.join(folder))
    }

    async fn folder_names(&self) -> Result<Vec<String>> {
        let mut entries = fs::read_dir(&self.root)
            .await
            .context("failed to read portals dir")?;

        let mut folders = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                folders.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        folders.sort();
        Ok(folders)
    }

    // first start with no pointer file picks the first folder it finds
    async fn ensure_active_pointer(&self) -> Result<()> {
        if fs::try_exists(self.root.join(ACTIVE_FILE)).await? {
            return Ok(());
        }

        let first = self.folder_names().await?.into_iter().next();
        self.set_active(first.as_deref()).await
    }

    async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
        if !fs::try_exists(path).await? {
            return Ok(None);
        }

        let text = fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;

        match serde_json::from_str(&text) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                // a broken file is treated like a missing one, same as before
                error!("failed to parse {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
        let text = serde_json::to_string_pretty(value)?;
        fs::write(path, text)
            .await
            .with_context(|| format!("failed to write {}", path.display()))
    }
}

#[async_trait::async_trait]
impl PortalRepository for FilePortalRepository {
    async fn list(&self) -> Result<Vec<PortalSummary>> {
        let active = self.get_active().await?;
        let mut summaries = Vec::new();

        for folder in self.folder_names().await? {
            let path = self.root.join(&folder);
            let config: PortalConfig = Self::read_json(&path.join(CONFIG_FILE))
                .await?
                .unwrap_or_default();

            summaries.push(PortalSummary {
                display_name: if config.display_name.is_empty() {
                    folder.clone()
                } else {
                    config.display_name.clone()
                },
                host: config.host,
                active: active.as_deref() == Some(folder.as_str()),
                has_saved_playlist: fs::try_exists(path.join(PLAYLIST_FILE)).await?,
                adult_filter: config.adult_filter,
                low_latency: config.low_latency,
                folder,
            });
        }

        Ok(summaries)
    }

    async fn get(&self, folder: &str) -> Result<Option<PortalConfig>> {
        let Some(path) = self.folder_path(folder) else {
            return Ok(None);
        };
        Self::read_json(&path.join(CONFIG_FILE)).await
    }

    async fn create(&self, config: &PortalConfig) -> Result<String> {
        let folder = portal_folder_name(
            &config.display_name,
            &config.host,
            &config.mac_address,
            &config.serial_number,
        );
        let path = self.root.join(&folder);

        fs::create_dir_all(&path)
            .await
            .with_context(|| format!("failed to create portal folder {}", folder))?;
        Self::write_json(&path.join(CONFIG_FILE), config).await?;

        if self.get_active().await?.is_none() {
            self.set_active(Some(&folder)).await?;
        }

        info!("created portal {}", folder);
        Ok(folder)
    }

    async fn update(&self, folder: &str, config: &PortalConfig) -> Result<bool> {
        let Some(path) = self.folder_path(folder) else {
            return Ok(false);
        };
        if !fs::try_exists(&path).await? {
            return Ok(false);
        }

        Self::write_json(&path.join(CONFIG_FILE), config).await?;
        info!("updated portal {}", folder);
        Ok(true)
    }

    async fn delete(&self, folder: &str) -> Result<bool> {
        let Some(path) = self.folder_path(folder) else {
            return Ok(false);
        };
        if !fs::try_exists(&path).await? {
            return Ok(false);
        }

        fs::remove_dir_all(&path)
            .await
            .with_context(|| format!("failed to delete portal {}", folder))?;

        if self.get_active().await?.as_deref() == Some(folder) {
            self.set_active(None).await?;
        }

        info!("deleted portal {}", folder);
        Ok(true)
    }

    async fn set_active(&self, folder: Option<&str>) -> Result<()> {
        let pointer = ActivePortal {
            active: folder.map(|f| f.to_string()),
        };
        Self::write_json(&self.root.join(ACTIVE_FILE), &pointer).await
    }

    async fn get_active(&self) -> Result<Option<String>> {
        let pointer: Option<ActivePortal> = Self::read_json(&self.root.join(ACTIVE_FILE)).await?;
        Ok(pointer.and_then(|p| p.active))
    }

    async fn save_playlist(&self, folder: &str, playlist: &str, meta: &PortalMeta) -> Result<()> {
        let path = self
            .folder_path(folder)
            .with_context(|| format!("invalid portal folder {}", folder))?;

        fs::create_dir_all(&path).await?;
        fs::write(path.join(PLAYLIST_FILE), playlist)
            .await
            .with_context(|| format!("failed to save playlist for {}", folder))?;
        Self::write_json(&path.join(META_FILE), meta).await?;

        info!("saved playlist for portal {}", folder);
        Ok(())
    }

    async fn load_saved(&self, folder: &str, file: &str) -> Result<Option<String>> {
        let Some(path) = self.folder_path(folder) else {
            return Ok(None);
        };

        // only ever serve a file directly inside the portal folder
        let Some(file) = Path::new(file).file_name() else {
            return Ok(None);
        };
        let path = path.join(file);

        if !fs::try_exists(&path).await? {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(Some(content))
    }

    async fn delete_saved(&self, folder: &str) -> Result<bool> {
        let Some(path) = self.folder_path(folder) else {
            return Ok(false);
        };

        let playlist = path.join(PLAYLIST_FILE);
        if !fs::try_exists(&playlist).await? {
            return Ok(false);
        }

        fs::remove_file(&playlist).await?;

        let meta = path.join(META_FILE);
        if fs::try_exists(&meta).await? {
            if let Err(e) = fs::remove_file(&meta).await {
                warn!("failed to remove meta for {}: {}", folder, e);
            }
        }

        Ok(true)
    }

    async fn load_meta(&self, folder: &str) -> Result<Option<PortalMeta>> {
        let Some(path) = self.folder_path(folder) else {
            return Ok(None);
        };
        Self::read_json(&path.join(META_FILE)).await
    }
}
