mod core;
mod loader;

pub use self::core::{InterfaceEmbedding, MethodSetConfig, ResolverConfig};
pub use self::loader::{
    directory_ancestors, load_config, load_config_from, load_config_from_path,
    parse_and_validate_config, CONFIG_FILE_NAME,
};
