//! Tracks the active list filter and reports when a re-fetch is due.

use taskdeck_core::model::{Filter, FilterPatch};

#[derive(Debug, Clone, Default)]
pub struct FilterController {
    filter: Filter,
}

impl FilterController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// Merge `patch` into the active filter. Returns the new filter only when it differs,
    /// so repeated identical edits trigger a single fetch.
    pub fn set_filter(&mut self, patch: FilterPatch) -> Option<Filter> {
        let next = self.filter.merged(&patch);
        if next == self.filter {
            return None;
        }
        self.filter = next;
        Some(self.filter.clone())
    }

    pub fn clear(&mut self) -> Option<Filter> {
        if self.filter.is_empty() {
            return None;
        }
        self.filter = Filter::default();
        Some(self.filter.clone())
    }

    pub fn summary(&self) -> Option<String> {
        self.filter.summary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use taskdeck_core::model::{Priority, TaskStatus};

    #[test]
    fn reports_only_distinct_values() {
        let mut filters = FilterController::new();

        let changed = filters.set_filter(FilterPatch::status(Some(TaskStatus::Pending)));
        assert_eq!(
            changed,
            Some(Filter {
                status: Some(TaskStatus::Pending),
                ..Filter::default()
            })
        );
        assert_eq!(
            filters.set_filter(FilterPatch::status(Some(TaskStatus::Pending))),
            None
        );
        assert_eq!(filters.set_filter(FilterPatch::default()), None);
    }

    #[test]
    fn patches_keep_untouched_dimensions() {
        let mut filters = FilterController::new();
        filters.set_filter(FilterPatch::search("tax"));
        filters.set_filter(FilterPatch::priority(Some(Priority::High)));

        assert_eq!(filters.filter().search, "tax");
        assert_eq!(filters.summary().as_deref(), Some("search:tax | priority:high"));
    }

    #[test]
    fn clear_only_reports_when_something_was_set() {
        let mut filters = FilterController::new();
        assert_eq!(filters.clear(), None);

        filters.set_filter(FilterPatch::search("rent"));
        assert_eq!(filters.clear(), Some(Filter::default()));
        assert!(filters.filter().is_empty());
    }
}
