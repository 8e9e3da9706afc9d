use crate::string::SmallString;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Base URLs of the collaborating services. The tag and user services are
/// consulted during privacy transitions and icon/banner updates; the CDN
/// serves previously uploaded originals back to us for cropping.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Services {
    pub tag_url: String,
    pub user_url: String,
    pub cdn_url: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjectStore {
    pub bucket: SmallString,
    pub region: SmallString,
    pub endpoint: Option<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Cache {
    pub url: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub scratch_dir: PathBuf,
    pub auth_secret: SmallString,
    pub log_filter: Option<String>,
    pub services: Services,
    pub object_store: ObjectStore,
    pub cache: Cache,
}

pub fn get() -> &'static Config {
    &CONFIG
}

pub fn scratch_dir() -> &'static Path {
    &CONFIG.scratch_dir
}

pub fn database_url() -> &'static str {
    static DATABASE_URL: LazyLock<String> = LazyLock::new(|| crate::db::create_url(None));
    &DATABASE_URL
}

pub fn port() -> u16 {
    const DEFAULT_PORT: u16 = 5001;
    std::env::var("SERVER_PORT")
        .ok()
        .and_then(|var| var.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

static CONFIG: LazyLock<Config> = LazyLock::new(|| {
    let config_string = std::fs::read_to_string(get_config_path()).unwrap();
    match toml::from_str(&config_string) {
        Ok(parsed) => parsed,
        Err(err) => {
            eprintln!(
                "Could not parse config.toml.

       Please ensure that your config is formatted correctly, that each field name
       matches the fields in config.toml.dist exactly, and that each field value
       has the proper type. Details:\n\n{err}"
            );
            std::process::exit(1)
        }
    }
});

fn get_config_path() -> PathBuf {
    // Use config.toml.dist if in test environment, config.toml if in production
    if cfg!(test) {
        let manifest_dir =
            std::env::var("CARGO_MANIFEST_DIR").expect("Test environment should have CARGO_MANIFEST_DIR defined");
        [&manifest_dir, "config.toml.dist"].iter().collect()
    } else {
        let exe_path = std::env::current_exe().unwrap();
        let parent_path = exe_path.parent().unwrap_or(Path::new("/"));
        [parent_path, Path::new("config.toml")].iter().collect()
    }
}
