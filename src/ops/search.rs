use std::ops::Range;

use regex::Regex;

use crate::io::kv::KvStore;
use crate::model::task::{Task, TaskId};
use crate::ops::store::Store;

/// Which tasks a search looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// Every task, ignoring view and filters
    Everything,
    /// Only what the current view and filters show
    Visible,
}

/// A description match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub task_id: TaskId,
    /// Byte ranges of each match within the description
    pub spans: Vec<Range<usize>>,
}

/// Collect all non-overlapping match byte-ranges for a regex in the given text.
fn find_matches(re: &Regex, text: &str) -> Vec<Range<usize>> {
    re.find_iter(text).map(|m| m.start()..m.end()).collect()
}

/// Search task descriptions, in list order.
pub fn search_tasks<S: KvStore>(store: &Store<S>, re: &Regex, scope: SearchScope) -> Vec<SearchHit> {
    let candidates: Vec<&Task> = match scope {
        SearchScope::Everything => store.tasks().iter().collect(),
        SearchScope::Visible => store.visible_tasks(),
    };

    candidates
        .into_iter()
        .filter_map(|task| {
            let spans = find_matches(re, &task.description);
            (!spans.is_empty()).then_some(SearchHit {
                task_id: task.id,
                spans,
            })
        })
        .collect()
}
