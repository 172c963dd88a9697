mod fetcher;
mod parser;
mod refresher;

pub use fetcher::{ChartFetcher, ChartSource};
pub use parser::{plain_text, ChartDocument};
pub use refresher::Refresher;
