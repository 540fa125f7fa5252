//! Module for importer from https://genshin-impact.fandom.com/wiki/Artifact/Sets
//!
//! The page lists one artifact set per row of the first `wikitable`:
//! set name, quality range, pieces (`span.item` links) and set bonuses.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::io::Read;
use url::Url;

use super::api_client::{ApiEndpoint, DocumentSource};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    pub name: String,
    /// Highest digit in the quality cell, 0 if there was none.
    pub max_quality: u8,
    pub pieces: Vec<ArtifactPiece>,
    pub bonuses: Vec<SetBonus>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPiece {
    pub name: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetBonus {
    pub pieces: u8,
    pub bonus: String,
}

impl ArtifactSet {
    pub fn bonus(&self, pieces: u8) -> Option<&str> {
        self.bonuses
            .iter()
            .find(|bonus| bonus.pieces == pieces)
            .map(|bonus| bonus.bonus.as_str())
    }
}

/// One artifact piece, the unit stored in the Artifacts table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Artifact<'a> {
    pub name: &'a str,
    pub url: Option<&'a str>,
    pub set: &'a ArtifactSet,
}

/// Flattens sets to their pieces, in page order.
pub fn artifacts(sets: &[ArtifactSet]) -> Vec<Artifact<'_>> {
    sets.iter()
        .flat_map(|set| {
            set.pieces.iter().map(move |piece| Artifact {
                name: &piece.name,
                url: piece.url.as_deref(),
                set,
            })
        })
        .collect()
}

fn cell_text(cell: &ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}

fn max_quality(text: &str) -> u8 {
    let digit_regex = Regex::new(r"\d").unwrap();
    digit_regex
        .find_iter(text)
        .filter_map(|digit| digit.as_str().parse::<u8>().ok())
        .max()
        .unwrap_or(0)
}

/// Splits "2 Piece: first 4 Piece: second" into its numbered segments.
fn parse_bonuses(text: &str) -> Vec<SetBonus> {
    let bonus_regex = Regex::new(r"(\d+)\s*Piece:\s*").unwrap();
    let markers: Vec<(u8, usize, usize)> = bonus_regex
        .captures_iter(text)
        .filter_map(|captures| {
            let whole = captures.get(0)?;
            let pieces = captures[1].parse().ok()?;
            Some((pieces, whole.start(), whole.end()))
        })
        .collect();

    markers
        .iter()
        .enumerate()
        .map(|(index, &(pieces, _, text_start))| {
            let text_end = markers
                .get(index + 1)
                .map_or(text.len(), |&(_, next_start, _)| next_start);
            SetBonus {
                pieces,
                bonus: text[text_start..text_end].trim().to_string(),
            }
        })
        .collect()
}

/// Parses the artifact sets table from the page HTML. Relative piece links are
/// resolved against `page_url`.
pub fn read_artifact_sets(mut reader: impl Read, page_url: &Url) -> Result<Vec<ArtifactSet>> {
    let mut page = String::new();
    reader.read_to_string(&mut page)?;
    let document = Html::parse_document(&page);

    // Constant selectors, these cannot fail to parse.
    let table_selector = Selector::parse("table.wikitable").unwrap();
    let row_selector = Selector::parse("tr").unwrap();
    let cell_selector = Selector::parse("td").unwrap();
    let piece_selector = Selector::parse("span.item").unwrap();
    let link_selector = Selector::parse("a").unwrap();

    let table = document
        .select(&table_selector)
        .next()
        .ok_or(Error::MissingArtifactTable)?;

    let mut sets = Vec::new();
    for row in table.select(&row_selector) {
        let cells: Vec<ElementRef> = row.select(&cell_selector).collect();
        // Header rows use th, and a few spacer rows are short.
        if cells.len() < 4 {
            continue;
        }

        let name = cell_text(&cells[0]);
        let mut pieces = Vec::new();
        for piece in cells[2].select(&piece_selector) {
            let Some(link) = piece.select(&link_selector).next() else {
                continue;
            };
            let Some(title) = link.attr("title") else {
                log::warn!("Artifact piece without a title in set {name:?}, skipping");
                continue;
            };
            pieces.push(ArtifactPiece {
                name: title.to_string(),
                url: link
                    .attr("href")
                    .and_then(|href| page_url.join(href).ok())
                    .map(String::from),
            });
        }

        sets.push(ArtifactSet {
            max_quality: max_quality(&cell_text(&cells[1])),
            bonuses: parse_bonuses(&cell_text(&cells[3])),
            name,
            pieces,
        });
    }

    Ok(sets)
}

pub async fn fetch_artifact_sets(source: &impl DocumentSource) -> Result<Vec<ArtifactSet>> {
    let page_url = source.artifact_sets_page();
    log::info!("Artifact data being gathered from {page_url}");
    let sets = read_artifact_sets(source.fetch(&ApiEndpoint::ArtifactSets).await?, page_url)?;
    log::info!(
        "Artifact web scraping done, {} sets with {} pieces",
        sets.len(),
        sets.iter().map(|set| set.pieces.len()).sum::<usize>()
    );
    Ok(sets)
}
