pub mod crawl;
pub mod map;
pub mod matrix;
pub mod normalize;
pub mod report;

pub use map::{LinkGraph, LinkGraphBuilder, build_graph};
pub use matrix::{MatrixEngine, MatrixSummary, PageDegree};
pub use normalize::normalize_url;

use colored::Colorize;

const BANNER: &str = r#"
  _ _       _                    _        _
 | (_)_ __ | | ___ __ ___   __ _| |_ _ __(_)_  __
 | | | '_ \| |/ / '_ ` _ \ / _` | __| '__| \ \/ /
 | | | | | |   <| | | | | | (_| | |_| |  | |>  <
 |_|_|_| |_|_|\_\_| |_| |_|\__,_|\__|_|  |_/_/\_\
"#;

pub fn print_banner() {
    println!("{}", BANNER.bright_cyan().bold());
    println!(
        "  {} v{}\n",
        "scrape streams and internal link matrices".bright_white(),
        env!("CARGO_PKG_VERSION")
    );
}
