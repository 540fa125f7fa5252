use bpaf::*;
use genshin_data::{
    importer::api_client::{ClientBuilder, DocumentDir},
    loader::{BatchOptions, Table, DEFAULT_BATCH_LIMIT},
    store::DEFAULT_DATABASE,
};
use itertools::Itertools;
use log::LevelFilter;
use std::path::PathBuf;
use strum::{IntoEnumIterator, VariantNames};

/// Logs at `info` unless `RUST_LOG` says otherwise.
pub fn init_logging() {
    pretty_env_logger::formatted_timed_builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();
}

pub fn database_path_parser() -> impl Parser<PathBuf> {
    long("db")
        .env("GENSHIN_DB")
        .help("The SQLite database file to use, created if missing")
        .argument::<PathBuf>("DB")
        .fallback(PathBuf::from(DEFAULT_DATABASE))
        .debug_fallback()
}

/// Overrides for the upstream locations, e.g. to point at a local mirror or at
/// documents saved by gsd-api-dump.
#[derive(Debug, Clone)]
pub struct SourceOptions {
    pub jmp_blue_url: Option<String>,
    pub gsi_url: Option<String>,
    pub wiki_url: Option<String>,
    pub documents: Option<PathBuf>,
}

pub fn source_options_parser() -> impl Parser<SourceOptions> {
    let jmp_blue_url = long("jmp-blue-url")
        .help("Base URL of the weapons API, default https://genshin.jmp.blue/")
        .argument::<String>("URL")
        .optional();
    let gsi_url = long("gsi-url")
        .help("Base URL of the characters, banners and media API, default https://gsi.fly.dev/")
        .argument::<String>("URL")
        .optional();
    let wiki_url = long("wiki-url")
        .help("The artifact sets wiki page, default https://genshin-impact.fandom.com/wiki/Artifact/Sets")
        .argument::<String>("URL")
        .optional();
    let documents = long("documents")
        .help("Read documents saved by gsd-api-dump from this directory instead of the network")
        .argument::<PathBuf>("DIR")
        .optional();
    construct!(SourceOptions {
        jmp_blue_url,
        gsi_url,
        wiki_url,
        documents
    })
}

pub fn source_options_applier(args: &SourceOptions, mut builder: ClientBuilder) -> ClientBuilder {
    if let Some(jmp_blue_url) = &args.jmp_blue_url {
        builder = builder.jmp_blue_base(jmp_blue_url.clone());
    }
    if let Some(gsi_url) = &args.gsi_url {
        builder = builder.gsi_base(gsi_url.clone());
    }
    if let Some(wiki_url) = &args.wiki_url {
        builder = builder.artifact_sets_page(wiki_url.clone());
    }
    builder
}

/// The saved documents to read from, if `--documents` was given. `--wiki-url` names
/// the page the saved artifact sets came from.
pub fn document_dir_applier(args: &SourceOptions) -> anyhow::Result<Option<DocumentDir>> {
    let Some(dir) = &args.documents else {
        return Ok(None);
    };
    let mut documents = DocumentDir::new(dir.clone())?;
    if let Some(wiki_url) = &args.wiki_url {
        documents = documents.artifact_sets_page_url(wiki_url.parse()?);
    }
    Ok(Some(documents))
}

pub fn batch_options_parser() -> impl Parser<BatchOptions> {
    let all = long("all")
        .help("Load every remaining row in one run")
        .req_flag(None);
    let limit = long("limit")
        .help("Maximum number of new rows per table this run")
        .argument::<usize>("N")
        .map(Some);
    let limit = construct!([all, limit]).fallback(Some(DEFAULT_BATCH_LIMIT));
    let rescan = long("rescan")
        .help("Write records again even if already stored, e.g. to refresh media counts")
        .switch();
    construct!(BatchOptions { limit, rescan })
}

// Per https://github.com/pacak/bpaf/discussions/197
pub fn tables_parser() -> impl Parser<Vec<Table>> {
    let mut help_msg = Doc::from("A table to fill, may be repeated. Default is all of them.\n One of ");

    for (index, &text) in itertools::intersperse(Table::VARIANTS, &", ").enumerate() {
        if index % 2 == 0 {
            help_msg.literal(text)
        } else {
            help_msg.text(text)
        }
    }

    long("table")
        .help(help_msg)
        .argument::<String>("TABLE")
        .parse(|x| x.parse::<Table>())
        .many()
}

/// The chosen tables in dependency order, or every table if none were chosen.
pub fn selected_tables(tables: &[Table]) -> Vec<Table> {
    if tables.is_empty() {
        Table::iter().collect()
    } else {
        tables.iter().copied().sorted().dedup().collect()
    }
}
