use anyhow::{Context, Result};
use genshin_data::{
    importer::api_client::{ClientBuilder, DocumentSource},
    loader::{self, BatchOptions, Table},
    store::Store,
};
use genshin_data_cli_tools::cli_helpers;

pub(crate) mod args {
    use bpaf::*;
    use genshin_data::loader::{BatchOptions, Table};
    use genshin_data_cli_tools::cli_helpers::{self, SourceOptions};
    use std::path::PathBuf;

    #[derive(Debug, Clone)]
    pub(crate) struct Options {
        pub(crate) database: PathBuf,
        pub(crate) sources: SourceOptions,
        pub(crate) batch: BatchOptions,
        pub(crate) tables: Vec<Table>,
    }

    pub fn options() -> OptionParser<Options> {
        let database = cli_helpers::database_path_parser();
        let sources = cli_helpers::source_options_parser();
        let batch = cli_helpers::batch_options_parser();
        let tables = cli_helpers::tables_parser();
        construct!(Options {
            database,
            sources,
            batch,
            tables
        })
        .to_options()
        .descr("A tool to fetch Genshin Impact data and add the next batch of rows to the database.")
        .footer("Run it again until every table reports that all data was added.")
    }

    #[test]
    fn gsd_fill_check_options() {
        options().check_invariants(false)
    }
}

async fn fill(
    source: &impl DocumentSource,
    store: &mut Store,
    tables: &[Table],
    batch: &BatchOptions,
) -> Result<()> {
    for &table in tables {
        let report = loader::fetch_and_load(source, store, table, batch)
            .await
            .with_context(|| format!("loading {table}"))?;
        println!("{report}");
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    cli_helpers::init_logging();
    let args = args::options().run();

    let mut store = Store::open(&args.database)
        .with_context(|| format!("opening {}", args.database.display()))?;
    let tables = cli_helpers::selected_tables(&args.tables);

    match cli_helpers::document_dir_applier(&args.sources)? {
        Some(documents) => fill(&documents, &mut store, &tables, &args.batch).await,
        None => {
            let client =
                cli_helpers::source_options_applier(&args.sources, ClientBuilder::new()).build()?;
            fill(&client, &mut store, &tables, &args.batch).await
        }
    }
}
