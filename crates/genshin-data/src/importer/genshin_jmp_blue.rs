//! Module for importer for https://genshin.jmp.blue/weapons

use serde::Deserialize;
use std::io::Read;

use super::api_client::{ApiEndpoint, DocumentSource};
use crate::Result;

type WeaponList = Vec<String>;

/// Parses the list of weapon slugs from https://genshin.jmp.blue/weapons/
pub fn read_weapon_list(reader: impl Read) -> Result<WeaponList> {
    let result: WeaponList = serde_json::from_reader(reader)?;
    Ok(result)
}

/// Parses a single weapon from https://genshin.jmp.blue/weapons/{slug}/
pub fn read_weapon(reader: impl Read) -> Result<Weapon> {
    let result: Weapon = serde_json::from_reader(reader)?;
    Ok(result)
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Weapon {
    pub name: String,
    #[serde(rename = "type")]
    pub weapon_type: String,
    pub rarity: u8,
    pub base_attack: u16,
    #[serde(default)]
    pub sub_stat: Option<String>,
    #[serde(default)]
    pub passive_name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

/// Fetches every weapon the API lists, in list order.
/// Weapons that fail to fetch or parse are logged and skipped.
pub async fn fetch_weapons(source: &impl DocumentSource) -> Result<Vec<Weapon>> {
    log::info!("Weapon data being gathered from the genshin.jmp.blue API");
    let slugs = read_weapon_list(source.fetch(&ApiEndpoint::WeaponList).await?)?;

    let mut weapons = Vec::with_capacity(slugs.len());
    for slug in slugs {
        match fetch_weapon(source, &slug).await {
            Ok(weapon) => weapons.push(weapon),
            Err(error) => log::warn!("Failed to fetch data for weapon {slug}: {error}"),
        }
        source.pause().await;
    }
    log::info!("Weapon API calls done, {} weapons gathered", weapons.len());
    Ok(weapons)
}

async fn fetch_weapon(source: &impl DocumentSource, slug: &str) -> Result<Weapon> {
    read_weapon(source.fetch(&ApiEndpoint::Weapon(slug.to_string())).await?)
}
