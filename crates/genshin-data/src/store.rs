//! SQLite persistence for the loaded game data.
//!
//! Lookup tables (WeaponTypes, CharacterVisions, ArtifactSets) are seeded from the
//! fetched records, and main tables refer to them through name subqueries, so a
//! name that was never seeded stores NULL.

use itertools::Itertools;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::path::Path;

use crate::importer::{
    genshin_fandom_wiki::Artifact,
    genshin_jmp_blue::Weapon,
    gsi_fly_dev::{Banner, Character, MediaRecord},
};
use crate::loader::{Loadable, Table};
use crate::Result;

pub const DEFAULT_DATABASE: &str = "genshin_impact_data.db";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS WeaponTypes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        weapon_type TEXT UNIQUE NOT NULL
    );

    CREATE TABLE IF NOT EXISTS Weapons (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT UNIQUE NOT NULL,
        weapon_type_id INTEGER,
        rarity INTEGER NOT NULL,
        base_attack INTEGER NOT NULL,
        sub_stat TEXT,
        passive_name TEXT,
        location TEXT,
        FOREIGN KEY (weapon_type_id) REFERENCES WeaponTypes (id)
    );

    CREATE TABLE IF NOT EXISTS CharacterVisions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        vision TEXT UNIQUE NOT NULL
    );

    -- id is the upstream character id, which the media endpoint is keyed by
    CREATE TABLE IF NOT EXISTS Characters (
        id INTEGER PRIMARY KEY,
        name TEXT UNIQUE NOT NULL,
        rarity INTEGER NOT NULL,
        vision_id INTEGER,
        weapon_id INTEGER,
        FOREIGN KEY (vision_id) REFERENCES CharacterVisions (id),
        FOREIGN KEY (weapon_id) REFERENCES WeaponTypes (id)
    );

    -- id is the upstream banner id
    CREATE TABLE IF NOT EXISTS Banners (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        banner_type TEXT NOT NULL,
        version TEXT,
        start_date TEXT,
        end_date TEXT,
        five_star_id INTEGER,
        first_four_star_id INTEGER,
        second_four_star_id INTEGER,
        third_four_star_id INTEGER,
        FOREIGN KEY (five_star_id) REFERENCES Characters (id),
        FOREIGN KEY (first_four_star_id) REFERENCES Characters (id),
        FOREIGN KEY (second_four_star_id) REFERENCES Characters (id),
        FOREIGN KEY (third_four_star_id) REFERENCES Characters (id)
    );

    CREATE TABLE IF NOT EXISTS ArtifactSets (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT UNIQUE NOT NULL,
        max_set_quality INTEGER NOT NULL,
        piece_count INTEGER NOT NULL,
        two_piece_bonus TEXT,
        four_piece_bonus TEXT
    );

    CREATE TABLE IF NOT EXISTS Artifacts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT UNIQUE NOT NULL,
        set_id INTEGER,
        max_set_quality INTEGER NOT NULL,
        url TEXT,
        FOREIGN KEY (set_id) REFERENCES ArtifactSets (id)
    );

    CREATE TABLE IF NOT EXISTS Media (
        character_id INTEGER PRIMARY KEY,
        promotion INTEGER NOT NULL DEFAULT 0,
        holiday INTEGER NOT NULL DEFAULT 0,
        birthday INTEGER NOT NULL DEFAULT 0,
        videos INTEGER NOT NULL DEFAULT 0,
        cameos INTEGER NOT NULL DEFAULT 0,
        artwork INTEGER NOT NULL DEFAULT 0,
        FOREIGN KEY (character_id) REFERENCES Characters (id)
    );
";

pub struct Store {
    conn: Connection,
}

impl Store {
    /// Opens (creating if needed) the database file and sets up every table.
    pub fn open(path: impl AsRef<Path>) -> Result<Store> {
        Store::from_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Store> {
        Store::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Store> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        let store = Store { conn };
        store.setup_tables()?;
        Ok(store)
    }

    pub fn setup_tables(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn transaction(&mut self) -> Result<Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }

    pub fn row_count(&self, table: Table) -> Result<usize> {
        row_count(&self.conn, table)
    }

    /// Every stored character as `(id, name)`, in id order.
    pub fn characters(&self) -> Result<Vec<(i64, String)>> {
        let mut statement = self
            .conn
            .prepare("SELECT id, name FROM Characters ORDER BY id")?;
        let characters: Vec<(i64, String)> = statement
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<_>>()?;
        Ok(characters)
    }

    pub fn character_id(&self, name: &str) -> Result<Option<i64>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id FROM Characters WHERE name = ?1",
                [name],
                |row| row.get(0),
            )
            .optional()?)
    }
}

pub fn row_count(conn: &Connection, table: Table) -> Result<usize> {
    // Table names come from the enum, never from input.
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", table.sql_name()),
        [],
        |row| row.get(0),
    )?;
    Ok(count as usize)
}

fn exists(conn: &Connection, query: &str, key: impl rusqlite::ToSql) -> Result<bool> {
    Ok(conn.query_row(query, [key], |row| row.get(0))?)
}

fn seed_weapon_types<'a>(conn: &Connection, types: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut statement =
        conn.prepare("INSERT OR IGNORE INTO WeaponTypes (weapon_type) VALUES (?1)")?;
    for weapon_type in types.unique() {
        statement.execute([weapon_type])?;
    }
    Ok(())
}

impl Loadable for Weapon {
    const TABLE: Table = Table::Weapons;

    fn is_stored(&self, conn: &Connection) -> Result<bool> {
        exists(conn, "SELECT EXISTS (SELECT 1 FROM Weapons WHERE name = ?1)", &self.name)
    }

    fn prepare(records: &[Self], conn: &Connection) -> Result<()> {
        seed_weapon_types(conn, records.iter().map(|w| w.weapon_type.as_str()))
    }

    fn insert(&self, conn: &Connection) -> Result<bool> {
        let changed = conn.execute(
            "INSERT OR IGNORE INTO Weapons
            (name, weapon_type_id, rarity, base_attack, sub_stat, passive_name, location)
            VALUES (
                ?1,
                (SELECT id FROM WeaponTypes WHERE weapon_type = ?2),
                ?3,
                ?4,
                ?5,
                ?6,
                ?7
            )",
            params![
                self.name,
                self.weapon_type,
                self.rarity,
                self.base_attack,
                self.sub_stat,
                self.passive_name,
                self.location,
            ],
        )?;
        Ok(changed != 0)
    }
}

impl Loadable for Character {
    const TABLE: Table = Table::Characters;

    fn is_stored(&self, conn: &Connection) -> Result<bool> {
        Ok(conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM Characters WHERE id = ?1 OR name = ?2)",
            params![self.id, self.name],
            |row| row.get(0),
        )?)
    }

    fn prepare(records: &[Self], conn: &Connection) -> Result<()> {
        // Characters may be loaded before any weapons, so seed their weapon types too.
        seed_weapon_types(conn, records.iter().map(|c| c.weapon.as_str()))?;
        let mut statement =
            conn.prepare("INSERT OR IGNORE INTO CharacterVisions (vision) VALUES (?1)")?;
        for vision in records.iter().map(|c| c.vision.as_str()).unique() {
            statement.execute([vision])?;
        }
        Ok(())
    }

    fn insert(&self, conn: &Connection) -> Result<bool> {
        let changed = conn.execute(
            "INSERT OR IGNORE INTO Characters
            (id, name, rarity, vision_id, weapon_id)
            VALUES (
                ?1,
                ?2,
                ?3,
                (SELECT id FROM CharacterVisions WHERE vision = ?4),
                (SELECT id FROM WeaponTypes WHERE weapon_type = ?5)
            )",
            params![self.id, self.name, self.rarity, self.vision, self.weapon],
        )?;
        Ok(changed != 0)
    }
}

impl Loadable for Banner {
    const TABLE: Table = Table::Banners;

    fn is_stored(&self, conn: &Connection) -> Result<bool> {
        exists(conn, "SELECT EXISTS (SELECT 1 FROM Banners WHERE id = ?1)", self.id)
    }

    fn insert(&self, conn: &Connection) -> Result<bool> {
        let [first_four_star, second_four_star, third_four_star] = self.four_stars();
        let changed = conn.execute(
            "INSERT OR IGNORE INTO Banners
            (id, name, banner_type, version, start_date, end_date,
             five_star_id, first_four_star_id, second_four_star_id, third_four_star_id)
            VALUES (
                ?1,
                ?2,
                ?3,
                ?4,
                ?5,
                ?6,
                (SELECT id FROM Characters WHERE name = ?7),
                (SELECT id FROM Characters WHERE name = ?8),
                (SELECT id FROM Characters WHERE name = ?9),
                (SELECT id FROM Characters WHERE name = ?10)
            )",
            params![
                self.id,
                self.name,
                self.banner_type,
                self.version,
                self.start.map(|date| date.to_string()),
                self.end_date().map(|date| date.to_string()),
                self.five_star(),
                first_four_star,
                second_four_star,
                third_four_star,
            ],
        )?;
        Ok(changed != 0)
    }
}

impl Loadable for Artifact<'_> {
    const TABLE: Table = Table::Artifacts;

    fn is_stored(&self, conn: &Connection) -> Result<bool> {
        exists(conn, "SELECT EXISTS (SELECT 1 FROM Artifacts WHERE name = ?1)", self.name)
    }

    fn prepare(records: &[Self], conn: &Connection) -> Result<()> {
        let mut statement = conn.prepare(
            "INSERT OR IGNORE INTO ArtifactSets
            (name, max_set_quality, piece_count, two_piece_bonus, four_piece_bonus)
            VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for set in records.iter().map(|a| a.set).unique_by(|set| set.name.clone()) {
            statement.execute(params![
                set.name,
                set.max_quality,
                set.pieces.len() as u32,
                set.bonus(2),
                set.bonus(4),
            ])?;
        }
        Ok(())
    }

    fn insert(&self, conn: &Connection) -> Result<bool> {
        let changed = conn.execute(
            "INSERT OR IGNORE INTO Artifacts
            (name, set_id, max_set_quality, url)
            VALUES (
                ?1,
                (SELECT id FROM ArtifactSets WHERE name = ?2),
                ?3,
                ?4
            )",
            params![self.name, self.set.name, self.set.max_quality, self.url],
        )?;
        Ok(changed != 0)
    }
}

impl Loadable for MediaRecord {
    const TABLE: Table = Table::Media;

    fn is_stored(&self, conn: &Connection) -> Result<bool> {
        exists(
            conn,
            "SELECT EXISTS (SELECT 1 FROM Media WHERE character_id = ?1)",
            self.character_id,
        )
    }

    // Counts change upstream over time, so media rows are replaced rather than ignored.
    fn insert(&self, conn: &Connection) -> Result<bool> {
        let changed = conn.execute(
            "INSERT OR REPLACE INTO Media
            (character_id, promotion, holiday, birthday, videos, cameos, artwork)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                self.character_id,
                self.counts.promotion,
                self.counts.holiday,
                self.counts.birthday,
                self.counts.videos,
                self.counts.cameos,
                self.counts.artwork,
            ],
        )?;
        Ok(changed != 0)
    }
}

#[cfg(test)]
mod tests;
