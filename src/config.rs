use std::path::PathBuf;

use clap_serde_derive::ClapSerde;

pub const DEFAULT_STORE_FILE_NAME: &str = "watchdb";

// Use prefix `watchtower-`/`WATCHTOWER_`
#[derive(ClapSerde, Debug, Clone)]
pub struct WatchtowerConfig {
    /// watchtower base directory
    #[arg(
        name = "WATCHTOWER_BASE_DIR",
        long = "watchtower-base-dir",
        env,
        help = "base directory for the watchtower store [default: $BASE_DIR/watchtower]"
    )]
    pub base_dir: Option<PathBuf>,
}

impl WatchtowerConfig {
    pub fn store_path(&self) -> PathBuf {
        self.base_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("watchtower"))
            .join(DEFAULT_STORE_FILE_NAME)
    }
}
