pub mod importer {
    pub mod api_client;
    pub mod genshin_fandom_wiki;
    pub mod genshin_jmp_blue;
    pub mod gsi_fly_dev;
}

pub mod calculations;
pub mod export;
pub mod loader;
pub mod store;

pub mod error;
pub use error::{Error, Result};
