use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Scrape;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Login, ListPage, FetchDetail, Fallback, Export, Heal, Report }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Login => "login",
        Phase::ListPage => "list_page",
        Phase::FetchDetail => "fetch_detail",
        Phase::Fallback => "fallback",
        Phase::Export => "export",
        Phase::Heal => "heal",
        Phase::Report => "report",
    }}
    fn span(&self) -> Span { match self {
        Phase::Login => info_span!("login"),
        Phase::ListPage => info_span!("list_page"),
        Phase::FetchDetail => info_span!("fetch_detail"),
        Phase::Fallback => info_span!("fallback"),
        Phase::Export => info_span!("export"),
        Phase::Heal => info_span!("heal"),
        Phase::Report => info_span!("report"),
    }}
}

impl OpMarker for Scrape {
    const NAME: &'static str = "scrape";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("scrape") }
}
