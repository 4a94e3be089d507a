use tracing::Span;
use tracing::info_span;

use crate::telemetry::ctx::{OpMarker, PhaseSpan};

#[derive(Copy, Clone, Debug)]
pub struct Validate;

#[derive(Copy, Clone, Debug)]
pub enum Phase { Read, Check }

impl PhaseSpan for Phase {
    fn name(&self) -> &'static str { match self {
        Phase::Read => "read",
        Phase::Check => "check",
    }}
    fn span(&self) -> Span { match self {
        Phase::Read => info_span!("read"),
        Phase::Check => info_span!("check"),
    }}
}

impl OpMarker for Validate {
    const NAME: &'static str = "validate";
    type Phase = Phase;
    fn root_span() -> Span { info_span!("validate") }
}
