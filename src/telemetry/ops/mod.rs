pub mod scrape;
pub mod validate;
