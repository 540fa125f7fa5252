use anyhow::Result;
use genshin_data::importer::{
    api_client::{ApiEndpoint, Client, ClientBuilder, DocumentSource},
    genshin_fandom_wiki, genshin_jmp_blue, gsi_fly_dev,
};
use genshin_data_cli_tools::cli_helpers;
use jsonxf::Formatter;
use std::{collections::VecDeque, fs, io::Read, path::PathBuf};
use url::Url;

pub(crate) mod args {
    use bpaf::*;
    use genshin_data_cli_tools::cli_helpers::{self, SourceOptions};
    use std::path::PathBuf;

    #[derive(Debug, Clone)]
    pub(crate) struct Options {
        pub(crate) sources: SourceOptions,
        pub(crate) dir: PathBuf,
    }

    pub fn options() -> OptionParser<Options> {
        let sources = cli_helpers::source_options_parser();
        let dir = long("dir")
            .help("Directory to write the documents into, readable later with gsd-fill --documents")
            .argument::<PathBuf>("DIR")
            .fallback(PathBuf::from("tests/fixtures"))
            .debug_fallback();
        construct!(Options { sources, dir })
            .to_options()
            .descr("A tool to save every document the Genshin Impact data sources serve")
    }

    #[test]
    fn gsd_api_dump_check_options() {
        options().check_invariants(false)
    }
}

/// Saves every document it passes through under `dir`, at the path gsd-fill reads it from.
struct Recorder {
    client: Client,
    dir: PathBuf,
}

fn pretty_printer() -> Formatter {
    let mut formatter = Formatter::pretty_printer();
    formatter.indent = "    ".to_string();
    formatter.trailing_output = "\n".to_string();
    formatter
}

impl Recorder {
    fn save(&self, endpoint: &ApiEndpoint, data: &str) -> Result<()> {
        let path = self.dir.join(endpoint.document_path());
        let data = match endpoint {
            ApiEndpoint::ArtifactSets => data.to_string(),
            _ => pretty_printer().format(data).map_err(anyhow::Error::msg)?,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        // jsonxf leaves a leading newline.
        fs::write(&path, data.trim_start())?;
        log::info!("Wrote {}", path.display());
        Ok(())
    }
}

impl DocumentSource for Recorder {
    async fn fetch(&self, endpoint: &ApiEndpoint) -> genshin_data::Result<Box<dyn Read>> {
        let mut data = String::new();
        self.client.fetch(endpoint).await?.read_to_string(&mut data)?;
        if let Err(error) = self.save(endpoint, &data) {
            log::warn!("Failed to save {}: {error}", endpoint.document_path());
        }
        Ok(Box::new(VecDeque::from(data.into_bytes())))
    }

    fn artifact_sets_page(&self) -> &Url {
        self.client.artifact_sets_page()
    }

    async fn pause(&self) {
        self.client.pause().await
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    cli_helpers::init_logging();
    let args = args::options().run();

    let client =
        cli_helpers::source_options_applier(&args.sources, ClientBuilder::new()).build()?;
    let recorder = Recorder {
        client,
        dir: args.dir,
    };

    genshin_jmp_blue::fetch_weapons(&recorder).await?;
    let characters = gsi_fly_dev::fetch_characters(&recorder).await?;
    gsi_fly_dev::fetch_banners(&recorder).await?;
    genshin_fandom_wiki::fetch_artifact_sets(&recorder).await?;

    let characters: Vec<(i64, String)> = characters
        .into_iter()
        .map(|character| (i64::from(character.id), character.name))
        .collect();
    gsi_fly_dev::fetch_media(&recorder, &characters).await?;

    Ok(())
}
