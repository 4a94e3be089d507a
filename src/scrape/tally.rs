use serde::Serialize;

use crate::detail::DataSource;

/// Running count of how each detail record was obtained.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ScrapeTally {
    pub success_count: usize,
    pub fallback_count: usize,
}

impl ScrapeTally {
    pub fn record(&mut self, source: DataSource) {
        if source.is_fallback() { self.fallback_count += 1; } else { self.success_count += 1; }
    }

    pub fn total(&self) -> usize { self.success_count + self.fallback_count }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_fallback_kinds_count_as_fallback() {
        let mut t = ScrapeTally::default();
        t.record(DataSource::DetailPage);
        t.record(DataSource::MainListFallback);
        t.record(DataSource::MinimalFallback);
        assert_eq!(t, ScrapeTally { success_count: 1, fallback_count: 2 });
        assert_eq!(t.total(), 3);
    }
}
