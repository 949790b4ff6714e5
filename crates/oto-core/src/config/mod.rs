//! Configuration: generic YAML I/O, standard paths and the player settings
//!
//! ```ignore
//! use oto_core::config::{default_config_path, load_config, save_config, PlayerConfig};
//!
//! let path = default_config_path();
//! let config: PlayerConfig = load_config(&path);
//! save_config(&config, &path)?;
//! ```

mod io;
mod paths;
mod player;

pub use io::{load_config, save_config};
pub use paths::{config_dir, default_config_path};
pub use player::PlayerConfig;
