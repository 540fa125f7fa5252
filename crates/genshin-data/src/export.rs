//! CSV datasets for charting weapons, characters and artifacts.

use rusqlite::Connection;
use serde::Serialize;
use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};

use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeaponStat {
    pub name: String,
    #[serde(rename = "type")]
    pub weapon_type: Option<String>,
    pub rarity: u8,
    #[serde(rename = "damage")]
    pub base_attack: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CharacterStat {
    pub name: String,
    pub rarity: u8,
    pub weapon: Option<String>,
    pub vision: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactStat {
    pub name: String,
    pub max_set_quality: u8,
}

pub fn weapon_stats(conn: &Connection) -> Result<Vec<WeaponStat>> {
    let mut statement = conn.prepare(
        "SELECT Weapons.name, WeaponTypes.weapon_type, Weapons.rarity, Weapons.base_attack
        FROM Weapons LEFT JOIN WeaponTypes
        ON Weapons.weapon_type_id = WeaponTypes.id
        ORDER BY Weapons.id",
    )?;
    let stats = statement
        .query_map([], |row| {
            Ok(WeaponStat {
                name: row.get(0)?,
                weapon_type: row.get(1)?,
                rarity: row.get(2)?,
                base_attack: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<_>>()?;
    Ok(stats)
}

pub fn character_stats(conn: &Connection) -> Result<Vec<CharacterStat>> {
    let mut statement = conn.prepare(
        "SELECT Characters.name, Characters.rarity, WeaponTypes.weapon_type, CharacterVisions.vision
        FROM Characters
        LEFT JOIN WeaponTypes ON Characters.weapon_id = WeaponTypes.id
        LEFT JOIN CharacterVisions ON Characters.vision_id = CharacterVisions.id
        ORDER BY Characters.id",
    )?;
    let stats = statement
        .query_map([], |row| {
            Ok(CharacterStat {
                name: row.get(0)?,
                rarity: row.get(1)?,
                weapon: row.get(2)?,
                vision: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<_>>()?;
    Ok(stats)
}

pub fn artifact_stats(conn: &Connection) -> Result<Vec<ArtifactStat>> {
    let mut statement =
        conn.prepare("SELECT name, max_set_quality FROM Artifacts ORDER BY id")?;
    let stats = statement
        .query_map([], |row| {
            Ok(ArtifactStat {
                name: row.get(0)?,
                max_set_quality: row.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<_>>()?;
    Ok(stats)
}

/// Writes `records` as CSV with a header row.
pub fn write_csv<T: Serialize>(records: &[T], writer: impl Write) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub const WEAPONS_FILE: &str = "weapons.csv";
pub const CHARACTERS_FILE: &str = "characters.csv";
pub const ARTIFACTS_FILE: &str = "artifacts.csv";

/// Writes all three datasets into `dir`, returning the paths written.
pub fn export_all(conn: &Connection, dir: &Path) -> Result<Vec<PathBuf>> {
    let weapons = dir.join(WEAPONS_FILE);
    write_csv(&weapon_stats(conn)?, File::create(&weapons)?)?;
    log::info!("Wrote {}", weapons.display());

    let characters = dir.join(CHARACTERS_FILE);
    write_csv(&character_stats(conn)?, File::create(&characters)?)?;
    log::info!("Wrote {}", characters.display());

    let artifacts = dir.join(ARTIFACTS_FILE);
    write_csv(&artifact_stats(conn)?, File::create(&artifacts)?)?;
    log::info!("Wrote {}", artifacts.display());

    Ok(vec![weapons, characters, artifacts])
}
