use super::*;
use crate::importer::genshin_jmp_blue::Weapon;
use crate::importer::gsi_fly_dev::{MediaCounts, MediaRecord};
use std::str::FromStr;
use strum::IntoEnumIterator;

fn weapons(names: &[&str]) -> Vec<Weapon> {
    names
        .iter()
        .map(|name| Weapon {
            name: name.to_string(),
            weapon_type: "Sword".to_string(),
            rarity: 3,
            base_attack: 39,
            sub_stat: None,
            passive_name: None,
            location: None,
        })
        .collect()
}

fn limited(limit: usize) -> BatchOptions {
    BatchOptions {
        limit: Some(limit),
        rescan: false,
    }
}

fn stored_names(store: &Store) -> Vec<String> {
    let mut statement = store
        .connection()
        .prepare("SELECT name FROM Weapons ORDER BY id")
        .unwrap();
    let names = statement
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<rusqlite::Result<Vec<String>>>()
        .unwrap();
    names
}

#[test]
fn table_names_round_trip_through_strings() {
    assert_eq!(Table::from_str("weapons").unwrap(), Table::Weapons);
    assert_eq!(Table::Media.to_string(), "media");
    assert!(Table::from_str("Paimon").is_err());
    assert_eq!(
        Table::VARIANTS,
        ["weapons", "characters", "banners", "artifacts", "media"]
    );
}

#[test]
fn tables_iterate_in_dependency_order() {
    let tables: Vec<Table> = Table::iter().collect();
    let position = |table| tables.iter().position(|t| *t == table).unwrap();
    assert!(position(Table::Weapons) < position(Table::Characters));
    assert!(position(Table::Characters) < position(Table::Banners));
    assert!(position(Table::Characters) < position(Table::Media));
}

#[test]
fn empty_source_is_complete() {
    let mut store = Store::open_in_memory().unwrap();
    let report = load_batch::<Weapon>(&mut store, &[], &BatchOptions::default()).unwrap();
    assert!(*report.complete());
    assert_eq!(*report.inserted(), 0);
    assert_eq!(*report.rows(), 0);
}

#[test]
fn batches_resume_past_stored_records() {
    let mut store = Store::open_in_memory().unwrap();
    let records = weapons(&["a", "b", "c", "d", "e"]);

    let first = load_batch(&mut store, &records, &limited(2)).unwrap();
    assert_eq!(*first.watermark(), 0);
    assert_eq!(*first.inserted(), 2);
    assert_eq!(*first.rows(), 2);
    assert!(!*first.complete());
    assert_eq!(
        first.to_string(),
        "2 / 5 total rows of weapon data added to the database. Run again!"
    );

    let second = load_batch(&mut store, &records, &limited(2)).unwrap();
    assert_eq!(*second.watermark(), 2);
    assert_eq!(*second.skipped(), 2);
    assert_eq!(*second.inserted(), 2);
    assert_eq!(*second.ignored(), 0);
    assert!(!*second.complete());

    let third = load_batch(&mut store, &records, &limited(2)).unwrap();
    assert_eq!(*third.watermark(), 4);
    assert_eq!(*third.skipped(), 4);
    assert_eq!(*third.inserted(), 1);
    assert!(*third.complete());
    assert_eq!(
        third.to_string(),
        "All weapon data added to the database (5 rows, 1 new this run)."
    );

    assert_eq!(stored_names(&store), ["a", "b", "c", "d", "e"]);
}

#[test]
fn rerun_after_completion_inserts_nothing() {
    let mut store = Store::open_in_memory().unwrap();
    let records = weapons(&["a", "b", "c"]);
    load_batch(&mut store, &records, &BatchOptions::unlimited()).unwrap();

    let again = load_batch(&mut store, &records, &BatchOptions::unlimited()).unwrap();
    assert_eq!(*again.watermark(), 3);
    assert_eq!(*again.skipped(), 3);
    assert_eq!(*again.inserted(), 0);
    assert!(*again.complete());

    let rescan = load_batch(
        &mut store,
        &records,
        &BatchOptions {
            limit: None,
            rescan: true,
        },
    )
    .unwrap();
    assert_eq!(*rescan.skipped(), 0);
    assert_eq!(*rescan.inserted(), 0);
    assert_eq!(*rescan.ignored(), 3);
    assert_eq!(*rescan.rows(), 3);
}

#[test]
fn limited_runs_converge_with_source_duplicates() {
    let records = weapons(&["a", "a", "b", "c", "b", "d"]);

    let mut unlimited_store = Store::open_in_memory().unwrap();
    load_batch(&mut unlimited_store, &records, &BatchOptions::unlimited()).unwrap();

    let mut limited_store = Store::open_in_memory().unwrap();
    let mut runs = 0;
    loop {
        runs += 1;
        assert!(runs < 10, "loader did not converge");
        if *load_batch(&mut limited_store, &records, &limited(1))
            .unwrap()
            .complete()
        {
            break;
        }
    }

    assert_eq!(stored_names(&limited_store), ["a", "b", "c", "d"]);
    assert_eq!(stored_names(&limited_store), stored_names(&unlimited_store));
}

#[test]
fn limit_counts_only_new_rows() {
    let mut store = Store::open_in_memory().unwrap();
    let records = weapons(&["a", "b", "c", "d"]);
    load_batch(&mut store, &records[..2], &BatchOptions::unlimited()).unwrap();

    let report = load_batch(
        &mut store,
        &records,
        &BatchOptions {
            limit: Some(1),
            rescan: true,
        },
    )
    .unwrap();
    assert_eq!(*report.ignored(), 2);
    assert_eq!(*report.inserted(), 1);
    assert!(!*report.complete());
    assert_eq!(stored_names(&store), ["a", "b", "c"]);
}

#[test]
fn failed_batch_rolls_back() {
    let mut store = Store::open_in_memory().unwrap();
    // Character 99 does not exist, so the second media row violates its foreign key.
    store
        .connection()
        .execute("INSERT INTO Characters (name, rarity) VALUES ('Albedo', 5)", [])
        .unwrap();
    let records = vec![
        MediaRecord {
            character_id: 1,
            counts: MediaCounts::default(),
        },
        MediaRecord {
            character_id: 99,
            counts: MediaCounts::default(),
        },
    ];
    load_batch(&mut store, &records, &BatchOptions::unlimited()).unwrap_err();
    assert_eq!(store.row_count(Table::Media).unwrap(), 0);
}

#[test]
fn media_batches_skip_stored_characters() {
    let mut store = Store::open_in_memory().unwrap();
    for name in ["Albedo", "Venti", "Zhongli"] {
        store
            .connection()
            .execute("INSERT INTO Characters (name, rarity) VALUES (?1, 5)", [name])
            .unwrap();
    }
    let records: Vec<MediaRecord> = (1..=3)
        .map(|character_id| MediaRecord {
            character_id,
            counts: MediaCounts {
                artwork: character_id as u32,
                ..MediaCounts::default()
            },
        })
        .collect();

    let first = load_batch(&mut store, &records, &limited(2)).unwrap();
    assert_eq!(*first.rows(), 2);
    let second = load_batch(&mut store, &records, &limited(2)).unwrap();
    assert_eq!(*second.watermark(), 2);
    assert_eq!(*second.skipped(), 2);
    assert_eq!(*second.inserted(), 1);
    assert!(*second.complete());
    assert_eq!(store.row_count(Table::Media).unwrap(), 3);
}

#[test]
fn shrunken_source_does_not_lose_records() {
    let mut store = Store::open_in_memory().unwrap();
    let records = weapons(&["a", "b", "c", "d", "e"]);
    load_batch(&mut store, &records, &limited(2)).unwrap();

    // "a" failed to fetch this time, so every later record moved up one place.
    let without_a = load_batch(&mut store, &records[1..], &limited(2)).unwrap();
    assert_eq!(*without_a.skipped(), 1);
    assert_eq!(*without_a.inserted(), 2);
    assert!(!*without_a.complete());
    assert_eq!(stored_names(&store), ["a", "b", "c", "d"]);

    let recovered = load_batch(&mut store, &records, &limited(2)).unwrap();
    assert_eq!(*recovered.inserted(), 1);
    assert!(*recovered.complete());
    assert_eq!(stored_names(&store), ["a", "b", "c", "d", "e"]);
}

#[test]
fn record_missing_from_an_earlier_run_is_loaded_later() {
    let mut store = Store::open_in_memory().unwrap();
    let partial = weapons(&["a", "c"]);
    let report = load_batch(&mut store, &partial, &BatchOptions::default()).unwrap();
    assert!(*report.complete());

    let full = weapons(&["a", "b", "c"]);
    let report = load_batch(&mut store, &full, &BatchOptions::default()).unwrap();
    assert_eq!(*report.watermark(), 2);
    assert_eq!(*report.inserted(), 1);
    assert!(*report.complete());
    assert_eq!(stored_names(&store), ["a", "c", "b"]);
}

#[test]
fn media_rescan_refreshes_counts() {
    let mut store = Store::open_in_memory().unwrap();
    store
        .connection()
        .execute("INSERT INTO Characters (id, name, rarity) VALUES (1, 'Albedo', 5)", [])
        .unwrap();
    let mut record = MediaRecord {
        character_id: 1,
        counts: MediaCounts::default(),
    };
    load_batch(&mut store, &[record], &BatchOptions::default()).unwrap();

    record.counts.artwork = 3;
    let skipped = load_batch(&mut store, &[record], &BatchOptions::default()).unwrap();
    assert_eq!(*skipped.inserted(), 0);

    let rescan = BatchOptions {
        limit: None,
        rescan: true,
    };
    let refreshed = load_batch(&mut store, &[record], &rescan).unwrap();
    assert_eq!(*refreshed.inserted(), 1);
    let artwork: i64 = store
        .connection()
        .query_row("SELECT artwork FROM Media WHERE character_id = 1", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(artwork, 3);
}

#[tokio::test]
async fn fetch_and_load_reads_from_any_document_source() {
    use crate::importer::api_client::{memory::MemoryDocuments, ApiEndpoint};

    let documents = MemoryDocuments::new()
        .with(ApiEndpoint::WeaponList, r#"["dull-blade", "missing"]"#)
        .with(
            ApiEndpoint::Weapon("dull-blade".to_string()),
            r#"{"name": "Dull Blade", "type": "Sword", "rarity": 1, "baseAttack": 23}"#,
        );
    let mut store = Store::open_in_memory().unwrap();

    let report = fetch_and_load(&documents, &mut store, Table::Weapons, &BatchOptions::default())
        .await
        .unwrap();
    assert_eq!(*report.source_len(), 1);
    assert!(*report.complete());
    assert_eq!(stored_names(&store), ["Dull Blade"]);
}
