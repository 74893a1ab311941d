use crate::CLAP_STYLING;
use clap::{arg, command};
use url::Url;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("linkmatrix")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("linkmatrix")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("scrape")
                .about(
                    "Start a scrape job on the crawl service, stream its results and print the \
                internal link matrix.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(false)
                        .help("The start URL to scrape")
                        .value_parser(clap::value_parser!(Url))
                        .conflicts_with("hosts-file"),
                )
                .arg(
                    arg!(-H --"hosts-file" <PATH>)
                        .required(false)
                        .help("Path to a newline-delimited file of start URLs (at most 10 are used)")
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                        .conflicts_with("url"),
                )
                .arg(
                    arg!(--"service-url" <URL>)
                        .required(false)
                        .help(
                            "Base URL of the crawl service (default: $LINKMATRIX_SERVICE_URL or \
                        http://localhost:8000)",
                        ),
                )
                .arg(
                    arg!(--"target-class" <CLASS>)
                        .required(false)
                        .help("Only extract content from elements with this CSS class"),
                )
                .arg(
                    arg!(--"strict-end")
                        .required(false)
                        .help("Treat a stream that ends without a completion event as a failure")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save the collected pages as JSON"),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                )
                .arg(
                    arg!(--"inbound-evidence")
                        .required(false)
                        .help("Also count each page's inbound link list when building the matrix")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            command!("matrix")
                .about("Build the internal link matrix from a saved pages file")
                .arg(
                    arg!(-i --"input" <PATH>)
                        .required(true)
                        .help("JSON file of pages, as written by `scrape --output`"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)"),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                )
                .arg(
                    arg!(--"inbound-evidence")
                        .required(false)
                        .help("Also count each page's inbound link list when building the matrix")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
}
