//! Module for HTTPS client for https://genshin.jmp.blue/, https://gsi.fly.dev/ and
//! https://genshin-impact.fandom.com/wiki/Artifact/Sets
//!
//! Importers read documents through [`DocumentSource`], so the same code can run
//! against the live APIs or against documents saved earlier by `gsd-api-dump`.

use reqwest::{Client as ReqwestClient, ClientBuilder as ReqwestBuilder};
use std::{
    collections::VecDeque,
    fs::File,
    future::Future,
    io::{BufReader, Read},
    path::PathBuf,
    time::Duration,
};
use url::Url;

use crate::Result;

pub const JMP_BLUE_BASE: &str = "https://genshin.jmp.blue/";
pub const GSI_BASE: &str = "https://gsi.fly.dev/";
pub const ARTIFACT_SETS_PAGE: &str = "https://genshin-impact.fandom.com/wiki/Artifact/Sets";

const USER_AGENT: &str = concat!("genshin-data/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(250);

pub struct ClientBuilder {
    jmp_blue_base: Option<String>,
    gsi_base: Option<String>,
    artifact_sets_page: Option<String>,
    request_delay: Duration,
}

/// Parse a base URL, making sure it ends in `/` so `Url::join` appends rather than replaces.
fn parse_base(base: &str) -> Result<Url> {
    if base.ends_with('/') {
        Ok(base.parse()?)
    } else {
        Ok(format!("{base}/").parse()?)
    }
}

impl ClientBuilder {
    pub fn new() -> ClientBuilder {
        ClientBuilder {
            jmp_blue_base: None,
            gsi_base: None,
            artifact_sets_page: None,
            request_delay: DEFAULT_REQUEST_DELAY,
        }
    }

    pub fn build(self) -> Result<Client> {
        let client = ReqwestBuilder::new()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Client {
            client,
            jmp_blue_base: parse_base(self.jmp_blue_base.as_deref().unwrap_or(JMP_BLUE_BASE))?,
            gsi_base: parse_base(self.gsi_base.as_deref().unwrap_or(GSI_BASE))?,
            artifact_sets_page: self
                .artifact_sets_page
                .as_deref()
                .unwrap_or(ARTIFACT_SETS_PAGE)
                .parse()?,
            request_delay: self.request_delay,
        })
    }

    pub fn jmp_blue_base(mut self, base: String) -> ClientBuilder {
        self.jmp_blue_base = Some(base);
        self
    }

    pub fn gsi_base(mut self, base: String) -> ClientBuilder {
        self.gsi_base = Some(base);
        self
    }

    pub fn artifact_sets_page(mut self, page: String) -> ClientBuilder {
        self.artifact_sets_page = Some(page);
        self
    }

    /// Pause inserted between consecutive per-item requests.
    pub fn request_delay(mut self, delay: Duration) -> ClientBuilder {
        self.request_delay = delay;
        self
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiEndpoint {
    // https://genshin.jmp.blue/
    WeaponList,
    Weapon(String),

    // https://gsi.fly.dev/
    CharacterPage { page: u32, limit: u32 },
    CharacterMedia(i64),
    BannerPage { page: u32, limit: u32 },

    // https://genshin-impact.fandom.com/
    ArtifactSets,
}

impl ApiEndpoint {
    /// Relative path the endpoint's document is saved under by `gsd-api-dump`.
    pub fn document_path(&self) -> String {
        use ApiEndpoint::*;
        match self {
            WeaponList => "jmp_blue/weapons.json".to_string(),
            Weapon(slug) => format!("jmp_blue/{slug}.json"),

            CharacterPage { page, .. } => format!("gsi_fly_dev/characters_page_{page}.json"),
            CharacterMedia(id) => format!("gsi_fly_dev/character_{id}_media.json"),
            BannerPage { page, .. } => format!("gsi_fly_dev/banners_page_{page}.json"),

            ArtifactSets => "fandom/artifact_sets.html".to_string(),
        }
    }
}

/// Where importers get their documents from.
pub trait DocumentSource {
    /// The document behind `endpoint`. Missing documents and non-success statuses are errors.
    fn fetch(&self, endpoint: &ApiEndpoint) -> impl Future<Output = Result<Box<dyn Read>>>;

    /// The artifact sets page URL, which relative piece links are resolved against.
    fn artifact_sets_page(&self) -> &Url;

    /// Called between consecutive per-item requests.
    fn pause(&self) -> impl Future<Output = ()> {
        async {}
    }
}

pub struct Client {
    client: ReqwestClient,
    jmp_blue_base: Url,
    gsi_base: Url,
    artifact_sets_page: Url,
    request_delay: Duration,
}

impl Client {
    pub fn url_for_endpoint(&self, endpoint: &ApiEndpoint) -> Result<Url> {
        use ApiEndpoint::*;
        let url = match endpoint {
            WeaponList => self.jmp_blue_base.join("weapons/")?,
            Weapon(slug) => self.jmp_blue_base.join(&format!("weapons/{slug}/"))?,

            CharacterPage { page, limit } => {
                paged(self.gsi_base.join("characters")?, *page, *limit)
            }
            CharacterMedia(id) => self.gsi_base.join(&format!("characters/{id}/media"))?,
            BannerPage { page, limit } => paged(self.gsi_base.join("banners")?, *page, *limit),

            ArtifactSets => self.artifact_sets_page.clone(),
        };
        Ok(url)
    }
}

impl DocumentSource for Client {
    async fn fetch(&self, endpoint: &ApiEndpoint) -> Result<Box<dyn Read>> {
        let url = self.url_for_endpoint(endpoint)?;
        log::debug!("GET {url}");
        let body_text = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(Box::new(VecDeque::from(body_text.into_bytes())))
    }

    fn artifact_sets_page(&self) -> &Url {
        &self.artifact_sets_page
    }

    /// Be polite to the free APIs between per-item requests.
    async fn pause(&self) {
        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }
    }
}

/// Documents saved under a directory by `gsd-api-dump`, laid out per
/// [`ApiEndpoint::document_path`]. Needs no network.
pub struct DocumentDir {
    dir: PathBuf,
    artifact_sets_page: Url,
}

impl DocumentDir {
    pub fn new(dir: PathBuf) -> Result<DocumentDir> {
        Ok(DocumentDir {
            dir,
            artifact_sets_page: ARTIFACT_SETS_PAGE.parse()?,
        })
    }

    /// The page the saved artifact sets document came from.
    pub fn artifact_sets_page_url(mut self, page: Url) -> DocumentDir {
        self.artifact_sets_page = page;
        self
    }

    pub fn path_for_endpoint(&self, endpoint: &ApiEndpoint) -> PathBuf {
        self.dir.join(endpoint.document_path())
    }
}

impl DocumentSource for DocumentDir {
    async fn fetch(&self, endpoint: &ApiEndpoint) -> Result<Box<dyn Read>> {
        let path = self.path_for_endpoint(endpoint);
        log::debug!("Reading {}", path.display());
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }

    fn artifact_sets_page(&self) -> &Url {
        &self.artifact_sets_page
    }
}

fn paged(mut url: Url, page: u32, limit: u32) -> Url {
    url.query_pairs_mut()
        .append_pair("limit", &limit.to_string())
        .append_pair("page", &page.to_string());
    url
}
