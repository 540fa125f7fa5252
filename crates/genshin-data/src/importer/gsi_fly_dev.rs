//! Module for importers for https://gsi.fly.dev/ resources: characters, banners and
//! per-character media.

use chrono::NaiveDate;
use serde::{de::DeserializeOwned, de::IgnoredAny, Deserialize};
use std::io::Read;

use super::api_client::{ApiEndpoint, DocumentSource};
use crate::{Error, Result};

/// Page size requested from listing endpoints.
pub const PAGE_LIMIT: u32 = 25;
/// Upper bound on pages walked per listing, in case the API ignores `limit`.
pub const MAX_PAGES: u32 = 20;

/// A page of a listing endpoint, e.g. `/banners?limit=25&page=1`.
/// Paging metadata is ignored; a short page marks the end.
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    pub results: Vec<T>,
}

/// A single resource, e.g. `/characters/1/media`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub result: Option<T>,
}

pub fn read_page<T: DeserializeOwned>(reader: impl Read) -> Result<Page<T>> {
    let result: Page<T> = serde_json::from_reader(reader)?;
    Ok(result)
}

pub fn read_envelope<T: DeserializeOwned>(reader: impl Read) -> Result<Envelope<T>> {
    let result: Envelope<T> = serde_json::from_reader(reader)?;
    Ok(result)
}

/// Parses "5_star" (or "5") to 5.
pub fn parse_star_rarity(rarity: &str) -> Result<u8> {
    let digits: &str = rarity
        .split(|c: char| !c.is_ascii_digit())
        .next()
        .unwrap_or_default();
    digits
        .parse()
        .map_err(|_| Error::InvalidRarity(rarity.to_string()))
}

mod star_rarity_format {
    use serde::{self, Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<u8, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_star_rarity(&s).map_err(serde::de::Error::custom)
    }
}

mod banner_date_format {
    // https://serde.rs/custom-date-format.html, but tolerant: a date we can't read is
    // logged and dropped rather than failing the whole page.
    use chrono::NaiveDate;
    use serde::{self, Deserialize, Deserializer};

    const FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

    pub fn parse(s: &str) -> Option<NaiveDate> {
        // Some entries carry a time after the date.
        let date_part = s.split(['T', ' ']).next().unwrap_or_default();
        FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(date_part, format).ok())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(s) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        let date = parse(&s);
        if date.is_none() {
            log::warn!("Unreadable banner date {s:?}, storing NULL");
        }
        Ok(date)
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Character {
    /// Stored as the character's primary key, and used to request its media.
    pub id: u32,
    pub name: String,
    #[serde(with = "star_rarity_format")]
    pub rarity: u8,
    pub vision: String,
    pub weapon: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Banner {
    pub id: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub banner_type: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default, with = "banner_date_format")]
    pub start: Option<NaiveDate>,
    #[serde(default, with = "banner_date_format")]
    pub end: Option<NaiveDate>,
    #[serde(default)]
    pub featured: Vec<FeaturedCharacter>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct FeaturedCharacter {
    pub name: String,
}

impl Banner {
    pub fn is_permanent(&self) -> bool {
        self.banner_type == "Permanent"
    }

    /// Permanent banners never end, whatever the API says.
    pub fn end_date(&self) -> Option<NaiveDate> {
        if self.is_permanent() {
            None
        } else {
            self.end
        }
    }

    pub fn five_star(&self) -> Option<&str> {
        self.featured.first().map(|c| c.name.as_str())
    }

    pub fn four_stars(&self) -> [Option<&str>; 3] {
        [1, 2, 3].map(|index| self.featured.get(index).map(|c| c.name.as_str()))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CharacterMedia {
    pub character: FeaturedCharacter,
    #[serde(default)]
    pub promotion: Vec<IgnoredAny>,
    #[serde(default)]
    pub holiday: Vec<IgnoredAny>,
    #[serde(default)]
    pub birthday: Vec<IgnoredAny>,
    #[serde(default)]
    pub videos: Vec<IgnoredAny>,
    #[serde(default)]
    pub cameos: Vec<IgnoredAny>,
    #[serde(default)]
    pub artwork: Vec<IgnoredAny>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MediaCounts {
    pub promotion: u32,
    pub holiday: u32,
    pub birthday: u32,
    pub videos: u32,
    pub cameos: u32,
    pub artwork: u32,
}

impl MediaCounts {
    pub fn total(&self) -> u32 {
        self.promotion + self.holiday + self.birthday + self.videos + self.cameos + self.artwork
    }
}

impl CharacterMedia {
    pub fn counts(&self) -> MediaCounts {
        let count = |items: &Vec<IgnoredAny>| items.len() as u32;
        MediaCounts {
            promotion: count(&self.promotion),
            holiday: count(&self.holiday),
            birthday: count(&self.birthday),
            videos: count(&self.videos),
            cameos: count(&self.cameos),
            artwork: count(&self.artwork),
        }
    }
}

/// Media counts resolved against a stored character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaRecord {
    pub character_id: i64,
    pub counts: MediaCounts,
}

/// Walks a listing from page 1 until a short page, reading at most `MAX_PAGES` pages.
async fn fetch_all_pages<T, F>(source: &impl DocumentSource, endpoint: F) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    F: Fn(u32, u32) -> ApiEndpoint,
{
    let mut all = Vec::new();
    for page in 1..=MAX_PAGES {
        let results = read_page::<T>(source.fetch(&endpoint(page, PAGE_LIMIT)).await?)?.results;
        let short_page = results.len() < PAGE_LIMIT as usize;
        all.extend(results);
        if short_page {
            break;
        }
        source.pause().await;
    }
    Ok(all)
}

pub async fn fetch_characters(source: &impl DocumentSource) -> Result<Vec<Character>> {
    log::info!("Character data being gathered from the gsi.fly.dev API");
    let characters =
        fetch_all_pages(source, |page, limit| ApiEndpoint::CharacterPage { page, limit }).await?;
    log::info!("Character API calls done, {} characters gathered", characters.len());
    Ok(characters)
}

pub async fn fetch_banners(source: &impl DocumentSource) -> Result<Vec<Banner>> {
    log::info!("Banner data being gathered from the gsi.fly.dev API");
    let banners =
        fetch_all_pages(source, |page, limit| ApiEndpoint::BannerPage { page, limit }).await?;
    log::info!("Banner API calls done, {} banners gathered", banners.len());
    Ok(banners)
}

/// Fetches media for each stored `(id, name)` character and resolves the media
/// document's character name back to a stored id. Failures are logged and skipped.
pub async fn fetch_media(
    source: &impl DocumentSource,
    characters: &[(i64, String)],
) -> Result<Vec<MediaRecord>> {
    log::info!("Media data being gathered from the gsi.fly.dev API");
    let mut records = Vec::with_capacity(characters.len());
    for (id, name) in characters {
        match fetch_character_media(source, *id).await {
            Ok(Some(media)) => match resolve_media(&media, characters) {
                Some(record) => records.push(record),
                None => log::warn!(
                    "Media for character ID {id} names unknown character {:?}",
                    media.character.name
                ),
            },
            Ok(None) => log::warn!("No media found for character ID {id} ({name})"),
            Err(error) => log::warn!("Failed to fetch media for character ID {id} ({name}): {error}"),
        }
        source.pause().await;
    }
    log::info!("Media API calls done, {} characters gathered", records.len());
    Ok(records)
}

async fn fetch_character_media(source: &impl DocumentSource, id: i64) -> Result<Option<CharacterMedia>> {
    let envelope =
        read_envelope::<CharacterMedia>(source.fetch(&ApiEndpoint::CharacterMedia(id)).await?)?;
    Ok(envelope.result)
}

pub fn resolve_media(media: &CharacterMedia, characters: &[(i64, String)]) -> Option<MediaRecord> {
    characters
        .iter()
        .find(|(_, name)| *name == media.character.name)
        .map(|(character_id, _)| MediaRecord {
            character_id: *character_id,
            counts: media.counts(),
        })
}
