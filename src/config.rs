use crate::database::portal::PortalConfig;

#[derive(clap::ValueEnum, Clone, Debug, Copy)]
pub enum CargoEnv {
    Development,
    Production,
}

#[derive(clap::Parser, Debug, Clone)]
pub struct AppConfig {
    // production or development
    #[clap(long, env, value_enum, default_value = "development")]
    pub cargo_env: CargoEnv,

    // port that the app will bind to, this is also the port baked into every playlist origin so
    // saved playlists can be rewritten later
    #[clap(long, env, default_value = "8080")]
    pub port: u16,

    // where portal folders (config.json, playlist.m3u8, meta.json) live
    #[clap(long, env, default_value = "portals")]
    pub portals_dir: String,

    // every call to a portal gets this timeout so a hung upstream can't stall us
    #[clap(long, env, default_value = "15")]
    pub request_timeout_secs: u64,

    // the info entries at the top of the playlist need something playable
    #[clap(long, env, default_value = "https://tg-aadi.vercel.app/intro.m3u8")]
    pub info_stream_url: String,

    // this should be either * for allowing everything, or a comma seperated list of domains like
    // example.com,something.com
    #[clap(long, env, default_value = "*")]
    pub cors_origin: String,

    // optional sentry integration
    #[clap(long, env)]
    pub sentry_dsn: Option<String>,

    // single portal straight from the environment, only used when nothing is active in the
    // portal store
    #[clap(long, env)]
    pub portal_host: Option<String>,

    #[clap(long, env)]
    pub portal_mac: Option<String>,

    #[clap(long, env)]
    pub portal_serial: Option<String>,

    #[clap(long, env)]
    pub portal_device_id: Option<String>,

    #[clap(long, env)]
    pub portal_device_id_2: Option<String>,

    #[clap(long, env, default_value = "MAG250")]
    pub portal_stb_type: String,

    #[clap(long, env, default_value = "263")]
    pub portal_api_signature: String,
}

impl AppConfig {
    /// portal built from the environment, `None` when no host was given
    pub fn env_portal(&self) -> Option<PortalConfig> {
        let host = self.portal_host.clone().filter(|h| !h.trim().is_empty())?;

        Some(PortalConfig {
            display_name: "env".to_string(),
            host,
            mac_address: self.portal_mac.clone().unwrap_or_default(),
            serial_number: self.portal_serial.clone().unwrap_or_default(),
            device_id: self.portal_device_id.clone().unwrap_or_default(),
            device_id_2: self.portal_device_id_2.clone().unwrap_or_default(),
            stb_type: self.portal_stb_type.clone(),
            api_signature: self.portal_api_signature.clone(),
            ..PortalConfig::default()
        })
    }
}

impl Default for AppConfig {
    // defaults aren't really needed here but it's here as a bad fallback
    fn default() -> Self {
        Self {
            cargo_env: CargoEnv::Development,
            port: 8080,
            portals_dir: "portals".to_string(),
            request_timeout_secs: 15,
            info_stream_url: "https://tg-aadi.vercel.app/intro.m3u8".to_string(),
            cors_origin: "*".to_string(),
            sentry_dsn: None,
            portal_host: None,
            portal_mac: None,
            portal_serial: None,
            portal_device_id: None,
            portal_device_id_2: None,
            portal_stb_type: "MAG250".to_string(),
            portal_api_signature: "263".to_string(),
        }
    }
}
