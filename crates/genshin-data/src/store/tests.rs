use super::*;
use crate::importer::genshin_fandom_wiki::{ArtifactPiece, ArtifactSet, SetBonus};
use crate::importer::gsi_fly_dev::{FeaturedCharacter, MediaCounts};
use chrono::NaiveDate;

fn weapon(name: &str, weapon_type: &str, rarity: u8, base_attack: u16) -> Weapon {
    Weapon {
        name: name.to_string(),
        weapon_type: weapon_type.to_string(),
        rarity,
        base_attack,
        sub_stat: None,
        passive_name: None,
        location: None,
    }
}

fn character(id: u32, name: &str, vision: &str, weapon: &str) -> Character {
    Character {
        id,
        name: name.to_string(),
        rarity: 5,
        vision: vision.to_string(),
        weapon: weapon.to_string(),
    }
}

#[test]
fn setup_tables_is_idempotent() {
    let store = Store::open_in_memory().unwrap();
    store.setup_tables().unwrap();
    for table in [
        Table::Weapons,
        Table::Characters,
        Table::Banners,
        Table::Artifacts,
        Table::Media,
    ] {
        assert_eq!(store.row_count(table).unwrap(), 0);
    }
}

#[test]
fn foreign_keys_are_enforced() {
    let store = Store::open_in_memory().unwrap();
    let enabled: i64 = store
        .connection()
        .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);

    let orphan = MediaRecord {
        character_id: 42,
        counts: MediaCounts::default(),
    };
    orphan.insert(store.connection()).unwrap_err();
}

#[test]
fn weapon_insert_or_ignore_on_name() {
    let store = Store::open_in_memory().unwrap();
    let conn = store.connection();
    let weapons = vec![
        weapon("Amos' Bow", "Bow", 5, 46),
        weapon("Amos' Bow", "Bow", 5, 46),
    ];
    Weapon::prepare(&weapons, conn).unwrap();
    assert!(weapons[0].insert(conn).unwrap());
    assert!(!weapons[1].insert(conn).unwrap());
    assert_eq!(store.row_count(Table::Weapons).unwrap(), 1);

    let weapon_type: String = conn
        .query_row(
            "SELECT weapon_type FROM Weapons JOIN WeaponTypes ON Weapons.weapon_type_id = WeaponTypes.id",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(weapon_type, "Bow");
}

#[test]
fn unseeded_lookup_stores_null() {
    let store = Store::open_in_memory().unwrap();
    let conn = store.connection();
    assert!(weapon("Dull Blade", "Sword", 1, 23).insert(conn).unwrap());
    let weapon_type_id: Option<i64> = conn
        .query_row("SELECT weapon_type_id FROM Weapons", [], |row| row.get(0))
        .unwrap();
    assert_eq!(weapon_type_id, None);
}

#[test]
fn characters_seed_visions_and_weapon_types() {
    let store = Store::open_in_memory().unwrap();
    let conn = store.connection();
    let characters = vec![
        character(1, "Albedo", "Geo", "Sword"),
        character(2, "Venti", "Anemo", "Bow"),
        character(3, "Zhongli", "Geo", "Polearm"),
    ];
    Character::prepare(&characters, conn).unwrap();
    for character in &characters {
        assert!(character.insert(conn).unwrap());
    }

    let visions: i64 = conn
        .query_row("SELECT COUNT(*) FROM CharacterVisions", [], |row| row.get(0))
        .unwrap();
    assert_eq!(visions, 2);
    let weapon_types: i64 = conn
        .query_row("SELECT COUNT(*) FROM WeaponTypes", [], |row| row.get(0))
        .unwrap();
    assert_eq!(weapon_types, 3);

    assert_eq!(
        store.characters().unwrap(),
        vec![
            (1, "Albedo".to_string()),
            (2, "Venti".to_string()),
            (3, "Zhongli".to_string())
        ]
    );
    assert_eq!(store.character_id("Venti").unwrap(), Some(2));
    assert_eq!(store.character_id("Paimon").unwrap(), None);
}

#[test]
fn banner_references_characters_by_name() {
    let store = Store::open_in_memory().unwrap();
    let conn = store.connection();
    let characters = vec![
        character(1, "Venti", "Anemo", "Bow"),
        character(2, "Barbara", "Hydro", "Catalyst"),
    ];
    Character::prepare(&characters, conn).unwrap();
    for character in &characters {
        character.insert(conn).unwrap();
    }

    let banner = Banner {
        id: 7,
        name: "Ballad in Goblets".to_string(),
        banner_type: "Character Event Wish".to_string(),
        version: Some("1.0".to_string()),
        start: NaiveDate::from_ymd_opt(2020, 9, 28),
        end: NaiveDate::from_ymd_opt(2020, 10, 18),
        featured: ["Venti", "Barbara", "Unknown"]
            .iter()
            .map(|name| FeaturedCharacter {
                name: name.to_string(),
            })
            .collect(),
    };
    assert!(banner.insert(conn).unwrap());
    assert!(!banner.insert(conn).unwrap());

    let row: (i64, Option<i64>, Option<i64>, Option<i64>, Option<i64>, String, Option<String>) = conn
        .query_row(
            "SELECT id, five_star_id, first_four_star_id, second_four_star_id, third_four_star_id, start_date, end_date FROM Banners",
            [],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                ))
            },
        )
        .unwrap();
    assert_eq!(
        row,
        (
            7,
            Some(1),
            Some(2),
            None,
            None,
            "2020-09-28".to_string(),
            Some("2020-10-18".to_string())
        )
    );
}

#[test]
fn artifacts_seed_their_sets() {
    let store = Store::open_in_memory().unwrap();
    let conn = store.connection();
    let set = ArtifactSet {
        name: "Gladiator's Finale".to_string(),
        max_quality: 5,
        pieces: vec![
            ArtifactPiece {
                name: "Gladiator's Nostalgia".to_string(),
                url: None,
            },
            ArtifactPiece {
                name: "Gladiator's Destiny".to_string(),
                url: Some("https://example.invalid/destiny".to_string()),
            },
        ],
        bonuses: vec![SetBonus {
            pieces: 2,
            bonus: "ATK +18%.".to_string(),
        }],
    };
    let sets = vec![set];
    let records = crate::importer::genshin_fandom_wiki::artifacts(&sets);
    Artifact::prepare(&records, conn).unwrap();
    for record in &records {
        assert!(record.insert(conn).unwrap());
    }

    let (piece_count, two_piece, four_piece): (i64, Option<String>, Option<String>) = conn
        .query_row(
            "SELECT piece_count, two_piece_bonus, four_piece_bonus FROM ArtifactSets",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(piece_count, 2);
    assert_eq!(two_piece.as_deref(), Some("ATK +18%."));
    assert_eq!(four_piece, None);

    let linked: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM Artifacts JOIN ArtifactSets ON Artifacts.set_id = ArtifactSets.id",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(linked, 2);
}

#[test]
fn media_is_replaced_in_place() {
    let store = Store::open_in_memory().unwrap();
    let conn = store.connection();
    let albedo = character(1, "Albedo", "Geo", "Sword");
    Character::prepare(std::slice::from_ref(&albedo), conn).unwrap();
    albedo.insert(conn).unwrap();

    let mut record = MediaRecord {
        character_id: 1,
        counts: MediaCounts {
            promotion: 1,
            ..MediaCounts::default()
        },
    };
    assert!(record.insert(conn).unwrap());
    record.counts.videos = 4;
    assert!(record.insert(conn).unwrap());

    assert_eq!(store.row_count(Table::Media).unwrap(), 1);
    let (promotion, videos): (i64, i64) = conn
        .query_row("SELECT promotion, videos FROM Media", [], |row| {
            Ok((row.get(0)?, row.get(1)?))
        })
        .unwrap();
    assert_eq!((promotion, videos), (1, 4));
}

#[test]
fn stored_records_are_recognised_by_natural_key() {
    let store = Store::open_in_memory().unwrap();
    let conn = store.connection();

    let amos = weapon("Amos' Bow", "Bow", 5, 46);
    assert!(!amos.is_stored(conn).unwrap());
    Weapon::prepare(std::slice::from_ref(&amos), conn).unwrap();
    amos.insert(conn).unwrap();
    assert!(amos.is_stored(conn).unwrap());
    assert!(!weapon("Dull Blade", "Sword", 1, 23).is_stored(conn).unwrap());

    let venti = character(22, "Venti", "Anemo", "Bow");
    Character::prepare(std::slice::from_ref(&venti), conn).unwrap();
    venti.insert(conn).unwrap();
    assert_eq!(store.character_id("Venti").unwrap(), Some(22));
    // Same name under a new upstream id is still the same character.
    assert!(character(99, "Venti", "Anemo", "Bow").is_stored(conn).unwrap());

    let media = MediaRecord {
        character_id: 22,
        counts: MediaCounts::default(),
    };
    assert!(!media.is_stored(conn).unwrap());
    media.insert(conn).unwrap();
    assert!(media.is_stored(conn).unwrap());
}
