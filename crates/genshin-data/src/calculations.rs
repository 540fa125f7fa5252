//! Aggregate calculations over the loaded tables, and the plain-text report of them.

use derive_getters::Getters;
use rusqlite::Connection;
use std::{collections::BTreeMap, io::Write, ops::RangeInclusive};

use crate::Result;

/// Weapon rarities and artifact qualities both run from one to five stars.
pub const STARS: RangeInclusive<u8> = 1..=5;

const SEPARATOR: &str = "------------------------------";

/// A labelled difference between two averages, e.g. "5-3": 12.50
#[derive(Debug, Clone, PartialEq)]
pub struct Difference {
    pub label: String,
    pub value: f64,
}

pub fn format_value(value: f64) -> String {
    format!("{value:04.2}")
}

fn is_zero(value: f64) -> bool {
    matches!(format_value(value).as_str(), "0.00" | "-0.00")
}

/// Average base attack of the weapons of each rarity. Rarities without weapons map to `None`.
pub fn average_attack_per_rarity(conn: &Connection) -> Result<BTreeMap<u8, Option<f64>>> {
    let mut statement =
        conn.prepare("SELECT rarity, AVG(base_attack) FROM Weapons GROUP BY rarity")?;
    let found: BTreeMap<u8, f64> = statement
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<_>>()?;
    Ok(STARS
        .map(|rarity| (rarity, found.get(&rarity).copied()))
        .collect())
}

/// For each rarity `p`, the differences `avg[n] - avg[p]` for `n` from 5 down to 1,
/// leaving out differences that round to zero.
pub fn rarity_differences(averages: &BTreeMap<u8, Option<f64>>) -> Vec<(u8, Vec<Difference>)> {
    let average = |rarity: u8| averages.get(&rarity).copied().flatten();
    STARS
        .map(|base| {
            let differences = STARS
                .rev()
                .filter_map(|other| {
                    let value = average(other)? - average(base)?;
                    (!is_zero(value)).then(|| Difference {
                        label: format!("{other}-{base}"),
                        value,
                    })
                })
                .collect();
            (base, differences)
        })
        .collect()
}

/// Average base attack per weapon type, types in the order their first weapon was stored.
pub fn average_attack_per_type(conn: &Connection) -> Result<Vec<(String, f64)>> {
    let mut statement = conn.prepare(
        "SELECT WeaponTypes.weapon_type, AVG(Weapons.base_attack)
        FROM Weapons JOIN WeaponTypes
        ON Weapons.weapon_type_id = WeaponTypes.id
        GROUP BY WeaponTypes.id
        ORDER BY MIN(Weapons.id)",
    )?;
    let averages = statement
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<_>>()?;
    Ok(averages)
}

/// For each type, the difference from every other type. Zero differences between
/// distinct types are kept.
pub fn type_differences(averages: &[(String, f64)]) -> Vec<(String, Vec<Difference>)> {
    averages
        .iter()
        .map(|(base, base_average)| {
            let differences = averages
                .iter()
                .filter(|(other, _)| other != base)
                .map(|(other, other_average)| Difference {
                    label: format!("{other}-{base}"),
                    value: other_average - base_average,
                })
                .collect();
            (base.clone(), differences)
        })
        .collect()
}

/// Number of artifact pieces of each max set quality from 1 to 5.
pub fn artifacts_per_quality(conn: &Connection) -> Result<BTreeMap<u8, u32>> {
    let mut statement = conn
        .prepare("SELECT max_set_quality, COUNT(*) FROM Artifacts GROUP BY max_set_quality")?;
    let found: BTreeMap<u8, u32> = statement
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<_>>()?;
    Ok(STARS
        .map(|quality| (quality, found.get(&quality).copied().unwrap_or(0)))
        .collect())
}

/// Total media appearances per character, sorted by name. Characters without a
/// media row count zero.
pub fn media_per_character(conn: &Connection) -> Result<Vec<(String, u32)>> {
    let mut statement = conn.prepare(
        "SELECT
            Characters.name,
            COALESCE(Media.promotion + Media.holiday + Media.birthday
                + Media.videos + Media.cameos + Media.artwork, 0)
        FROM Characters LEFT JOIN Media
        ON Media.character_id = Characters.id
        ORDER BY Characters.name",
    )?;
    let totals = statement
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<rusqlite::Result<_>>()?;
    Ok(totals)
}

#[derive(Debug, Clone, PartialEq, Getters)]
pub struct Report {
    attack_per_rarity: BTreeMap<u8, Option<f64>>,
    rarity_differences: Vec<(u8, Vec<Difference>)>,
    attack_per_type: Vec<(String, f64)>,
    type_differences: Vec<(String, Vec<Difference>)>,
    artifacts_per_quality: BTreeMap<u8, u32>,
    media_per_character: Vec<(String, u32)>,
}

impl Report {
    pub fn gather(conn: &Connection) -> Result<Report> {
        let attack_per_rarity = average_attack_per_rarity(conn)?;
        let attack_per_type = average_attack_per_type(conn)?;
        Ok(Report {
            rarity_differences: rarity_differences(&attack_per_rarity),
            type_differences: type_differences(&attack_per_type),
            attack_per_rarity,
            attack_per_type,
            artifacts_per_quality: artifacts_per_quality(conn)?,
            media_per_character: media_per_character(conn)?,
        })
    }

    pub fn write_to(&self, mut writer: impl Write) -> Result<()> {
        let w = &mut writer;

        section(
            w,
            1,
            "Average Weapon Damage Per Rarity",
            "This section shows the average base attack for weapons of each rarity (1 to 5 stars).",
        )?;
        for (rarity, average) in &self.attack_per_rarity {
            let average = average.map_or_else(|| "n/a".to_string(), format_value);
            writeln!(w, "    Rarity {rarity}: {average}")?;
        }
        end_section(w)?;

        section(
            w,
            2,
            "Difference in Average Weapon Damage Per Rarity",
            "These calculations show the difference in average base attack between weapons of different rarities.",
        )?;
        for (rarity, differences) in &self.rarity_differences {
            writeln!(w, "    Rarity {rarity} differences:")?;
            write_differences(w, differences)?;
        }
        end_section(w)?;

        section(
            w,
            3,
            "Average Weapon Damage Per Type",
            "This section shows the average base attack for each weapon type.",
        )?;
        for (weapon_type, average) in &self.attack_per_type {
            writeln!(w, "    Weapon Type {weapon_type}: {}", format_value(*average))?;
        }
        end_section(w)?;

        section(
            w,
            4,
            "Difference in Average Weapon Damage Per Type",
            "These calculations show the difference in average base attack between different weapon types.",
        )?;
        for (weapon_type, differences) in &self.type_differences {
            writeln!(w, "    Weapon Type {weapon_type} differences:")?;
            write_differences(w, differences)?;
        }
        end_section(w)?;

        section(
            w,
            5,
            "Number of Artifacts Per Quality",
            "This section shows the count of artifacts for each max quality (1 to 5 stars).",
        )?;
        for (quality, count) in &self.artifacts_per_quality {
            writeln!(w, "    Max Quality {quality}: {count}")?;
        }
        end_section(w)?;

        section(
            w,
            6,
            "Number of Media Appearances Per Character",
            "This section shows the total media appearances (promotion, holiday, birthday, videos, cameos, artwork) for each character.",
        )?;
        for (character, count) in &self.media_per_character {
            writeln!(w, "    Character {character}: {count}")?;
        }
        end_section(w)?;

        w.flush()?;
        Ok(())
    }
}

fn section(w: &mut impl Write, number: u8, title: &str, description: &str) -> Result<()> {
    if number > 1 {
        writeln!(w, "{SEPARATOR}")?;
    }
    writeln!(w, "FUNCTION / CALCULATION {number}:\n{title}:\n")?;
    writeln!(w, "{description}")?;
    Ok(())
}

fn end_section(w: &mut impl Write) -> Result<()> {
    writeln!(w, "{SEPARATOR}\n\n")?;
    Ok(())
}

fn write_differences(w: &mut impl Write, differences: &[Difference]) -> Result<()> {
    for difference in differences {
        writeln!(
            w,
            "        {}: {}",
            difference.label,
            format_value(difference.value)
        )?;
    }
    Ok(())
}
