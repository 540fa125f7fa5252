use anyhow::{Context, Result};
use genshin_data::{calculations::Report, store::Store};
use genshin_data_cli_tools::cli_helpers;
use std::{
    fs::File,
    io::{self, BufWriter},
};

pub(crate) mod args {
    use bpaf::*;
    use genshin_data_cli_tools::cli_helpers;
    use std::path::PathBuf;

    #[derive(Debug, Clone)]
    pub(crate) struct Options {
        pub(crate) database: PathBuf,
        pub(crate) output: Option<PathBuf>,
    }

    pub fn options() -> OptionParser<Options> {
        let database = cli_helpers::database_path_parser();
        let output = long("output")
            .short('o')
            .help("Write the report to this file instead of stdout")
            .argument::<PathBuf>("PATH")
            .optional();
        construct!(Options { database, output })
            .to_options()
            .descr("A tool to report averages and counts over the Genshin Impact database.")
    }

    #[test]
    fn gsd_calculations_check_options() {
        options().check_invariants(false)
    }
}

fn main() -> Result<()> {
    cli_helpers::init_logging();
    let args = args::options().run();

    let store = Store::open(&args.database)
        .with_context(|| format!("opening {}", args.database.display()))?;
    let report = Report::gather(store.connection())?;

    match &args.output {
        Some(path) => {
            let file =
                File::create(path).with_context(|| format!("creating {}", path.display()))?;
            report.write_to(BufWriter::new(file))?;
            log::info!("Calculations written to {}", path.display());
        }
        None => report.write_to(io::stdout().lock())?,
    }

    Ok(())
}
