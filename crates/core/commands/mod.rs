use crate::output::Processor;

use unpaywall::{normalize, Client, SearchRequest, Unpaywall};

use clap::Subcommand;
use eyre::WrapErr;
use log::{info, trace};

#[derive(Subcommand)]
#[non_exhaustive]
pub enum Commands {
    /// Look up the open access status of one or more DOIs
    ///
    /// One row is printed for each DOI. The first DOI that cannot be looked up stops the whole
    /// run and nothing is printed.
    #[clap(arg_required_else_help = true)]
    Lookup {
        /// The DOIs to look up
        #[clap(required = true)]
        dois: Vec<String>,
    },
    /// Search the titles indexed by Unpaywall
    #[clap(arg_required_else_help = true)]
    Search {
        /// The text to search for
        query: String,

        /// Only return open access entries
        #[clap(long)]
        only_open_access: bool,

        /// Only return entries without an open access copy, this wins over --only-open-access
        #[clap(long)]
        only_non_open_access: bool,

        /// Page number to return, 0 leaves the choice to the API
        #[clap(long, default_value = "1")]
        page: u32,
    },
}

impl Commands {
    pub fn execute<C: Client>(
        self,
        api: &Unpaywall<C>,
        processor: &mut Processor,
    ) -> eyre::Result<()> {
        match self {
            Commands::Lookup { dois } => {
                for doi in dois {
                    let record = api
                        .lookup(&doi)
                        .wrap_err_with(|| format!("Failed to look up '{doi}'"))?;
                    processor.process(normalize::flatten(&record));
                }
            }
            Commands::Search {
                query,
                only_open_access,
                only_non_open_access,
                page,
            } => {
                let request =
                    search_request(query, only_open_access, only_non_open_access, page);
                let results = api
                    .search(&request)
                    .wrap_err_with(|| format!("Failed to search for '{}'", request.query()))?;

                info!("{} results found", results.len());
                for result in &results {
                    processor.process(normalize::flatten_search(result));
                }
            }
        }
        Ok(())
    }
}

fn search_request(
    query: String,
    only_open_access: bool,
    only_non_open_access: bool,
    page: u32,
) -> SearchRequest {
    let mut request = SearchRequest::new(query);
    if only_non_open_access {
        trace!("Filtering on entries without open access");
        request = request.is_oa(false);
    } else if only_open_access {
        trace!("Filtering on open access entries");
        request = request.is_oa(true);
    }
    if page > 0 {
        request = request.page(page);
    }
    request
}
