use anyhow::{Context, Result};
use genshin_data::{export, store::Store};
use genshin_data_cli_tools::cli_helpers;
use std::fs;

pub(crate) mod args {
    use bpaf::*;
    use genshin_data_cli_tools::cli_helpers;
    use std::path::PathBuf;

    #[derive(Debug, Clone)]
    pub(crate) struct Options {
        pub(crate) database: PathBuf,
        pub(crate) dir: PathBuf,
    }

    pub fn options() -> OptionParser<Options> {
        let database = cli_helpers::database_path_parser();
        let dir = long("dir")
            .help("Directory to write weapons.csv, characters.csv and artifacts.csv into")
            .argument::<PathBuf>("DIR")
            .fallback(PathBuf::from("."))
            .debug_fallback();
        construct!(Options { database, dir })
            .to_options()
            .descr("A tool to export the weapon, character and artifact datasets as CSV for charting.")
    }

    #[test]
    fn gsd_export_check_options() {
        options().check_invariants(false)
    }
}

fn main() -> Result<()> {
    cli_helpers::init_logging();
    let args = args::options().run();

    let store = Store::open(&args.database)
        .with_context(|| format!("opening {}", args.database.display()))?;
    fs::create_dir_all(&args.dir)?;

    for path in export::export_all(store.connection(), &args.dir)? {
        println!("{}", path.display());
    }

    Ok(())
}
