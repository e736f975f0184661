//! Network services behind the `generateContent` and `scrapeWebsite` tools.

mod generation;
mod scraper;

pub use generation::{ContentGenerator, HttpContentGenerator};
pub use scraper::{FirecrawlScraper, ScrapedPage, Scraper};

#[cfg(test)]
pub use generation::MockContentGenerator;
#[cfg(test)]
pub use scraper::MockScraper;
