pub mod config;
pub mod ctx;
pub mod emit;
pub mod ops;

use ctx::LogCtx;

pub fn scrape() -> LogCtx<ops::scrape::Scrape> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
pub fn validate() -> LogCtx<ops::validate::Validate> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
