use std::fmt;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use super::task::Task;

/// A filter token. The four reserved tokens carry meaning for visibility;
/// any other string is accepted and kept in the set but filters nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FilterToken {
    All,
    Todo,
    Done,
    Starred,
    Custom(String),
}

impl FilterToken {
    pub fn as_str(&self) -> &str {
        match self {
            FilterToken::All => "all",
            FilterToken::Todo => "todo",
            FilterToken::Done => "done",
            FilterToken::Starred => "starred",
            FilterToken::Custom(s) => s,
        }
    }

    pub fn parse(s: &str) -> FilterToken {
        match s {
            "all" => FilterToken::All,
            "todo" => FilterToken::Todo,
            "done" => FilterToken::Done,
            "starred" => FilterToken::Starred,
            other => FilterToken::Custom(other.to_string()),
        }
    }
}

impl From<String> for FilterToken {
    fn from(s: String) -> Self {
        match FilterToken::parse(&s) {
            FilterToken::Custom(_) => FilterToken::Custom(s),
            reserved => reserved,
        }
    }
}

impl From<FilterToken> for String {
    fn from(token: FilterToken) -> Self {
        match token {
            FilterToken::Custom(s) => s,
            reserved => reserved.as_str().to_string(),
        }
    }
}

impl fmt::Display for FilterToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The active filter tokens, in the order they were switched on.
///
/// Never empty: it is either `{all}` or a non-empty mix of other tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterSet(IndexSet<FilterToken>);

impl Default for FilterSet {
    fn default() -> Self {
        FilterSet::all()
    }
}

impl FilterSet {
    /// The `{all}` set
    pub fn all() -> Self {
        let mut set = IndexSet::new();
        set.insert(FilterToken::All);
        FilterSet(set)
    }

    /// Build a set from tokens. Empty input, or input mixing `all` with other
    /// tokens, collapses to `{all}`.
    pub fn from_tokens(tokens: impl IntoIterator<Item = FilterToken>) -> Self {
        let set: IndexSet<FilterToken> = tokens.into_iter().collect();
        if set.is_empty() || set.contains(&FilterToken::All) {
            FilterSet::all()
        } else {
            FilterSet(set)
        }
    }

    pub fn contains(&self, token: &FilterToken) -> bool {
        self.0.contains(token)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilterToken> {
        self.0.iter()
    }

    /// Toggle `token` following the composition rules:
    ///
    /// 1. already active with company → drop it
    /// 2. already active alone → back to `{all}`
    /// 3. `all` → `{all}`
    /// 4. `todo` → drop `done` and `all`, add `todo`
    /// 5. `done` → drop `todo` and `all`, add `done`
    /// 6. anything else → drop `all`, add the token
    pub fn toggle(&mut self, token: FilterToken) {
        if self.0.contains(&token) {
            if self.0.len() > 1 {
                self.0.shift_remove(&token);
            } else {
                *self = FilterSet::all();
            }
            return;
        }

        match token {
            FilterToken::All => *self = FilterSet::all(),
            FilterToken::Todo => {
                self.0.shift_remove(&FilterToken::Done);
                self.0.shift_remove(&FilterToken::All);
                self.0.insert(FilterToken::Todo);
            }
            FilterToken::Done => {
                self.0.shift_remove(&FilterToken::Todo);
                self.0.shift_remove(&FilterToken::All);
                self.0.insert(FilterToken::Done);
            }
            other => {
                self.0.shift_remove(&FilterToken::All);
                self.0.insert(other);
            }
        }
    }

    /// Whether `task` passes every active filter
    pub fn admits(&self, task: &Task) -> bool {
        if self.contains(&FilterToken::All) {
            return true;
        }
        if self.contains(&FilterToken::Todo) && task.is_done() {
            return false;
        }
        if self.contains(&FilterToken::Done) && !task.is_done() {
            return false;
        }
        if self.contains(&FilterToken::Starred) && !task.starred {
            return false;
        }
        true
    }
}

impl<'de> Deserialize<'de> for FilterSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tokens = Vec::<FilterToken>::deserialize(deserializer)?;
        Ok(FilterSet::from_tokens(tokens))
    }
}

impl fmt::Display for FilterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(FilterToken::as_str).collect();
        write!(f, "{{{}}}", names.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::TaskState;

    fn tokens(set: &FilterSet) -> Vec<&str> {
        set.iter().map(FilterToken::as_str).collect()
    }

    #[test]
    fn default_is_all() {
        assert_eq!(tokens(&FilterSet::default()), vec!["all"]);
    }

    #[test]
    fn toggle_sequence_from_all() {
        let mut set = FilterSet::all();

        set.toggle(FilterToken::Todo);
        assert_eq!(tokens(&set), vec!["todo"]);

        set.toggle(FilterToken::Done);
        assert_eq!(tokens(&set), vec!["done"]);

        set.toggle(FilterToken::Starred);
        assert_eq!(tokens(&set), vec!["done", "starred"]);

        set.toggle(FilterToken::Done);
        assert_eq!(tokens(&set), vec!["starred"]);

        set.toggle(FilterToken::Starred);
        assert_eq!(tokens(&set), vec!["all"]);
    }

    #[test]
    fn toggling_all_clears_everything() {
        let mut set = FilterSet::from_tokens([FilterToken::Todo, FilterToken::Starred]);
        set.toggle(FilterToken::All);
        assert_eq!(tokens(&set), vec!["all"]);
    }

    #[test]
    fn toggling_lone_all_stays_all() {
        let mut set = FilterSet::all();
        set.toggle(FilterToken::All);
        assert_eq!(tokens(&set), vec!["all"]);
    }

    #[test]
    fn todo_keeps_starred() {
        let mut set = FilterSet::from_tokens([FilterToken::Starred, FilterToken::Done]);
        set.toggle(FilterToken::Todo);
        assert_eq!(tokens(&set), vec!["starred", "todo"]);
    }

    #[test]
    fn custom_token_drops_all_and_appends() {
        let mut set = FilterSet::all();
        set.toggle(FilterToken::parse("urgent"));
        assert_eq!(tokens(&set), vec!["urgent"]);

        set.toggle(FilterToken::Todo);
        assert_eq!(tokens(&set), vec!["urgent", "todo"]);

        set.toggle(FilterToken::parse("urgent"));
        assert_eq!(tokens(&set), vec!["todo"]);
    }

    #[test]
    fn admits_follows_flags() {
        let pending = Task::new(1, "a", false);
        let done_starred = Task {
            state: TaskState::Done,
            ..Task::new(2, "b", true)
        };

        let all = FilterSet::all();
        assert!(all.admits(&pending));
        assert!(all.admits(&done_starred));

        let todo = FilterSet::from_tokens([FilterToken::Todo]);
        assert!(todo.admits(&pending));
        assert!(!todo.admits(&done_starred));

        let done = FilterSet::from_tokens([FilterToken::Done]);
        assert!(!done.admits(&pending));
        assert!(done.admits(&done_starred));

        let starred = FilterSet::from_tokens([FilterToken::Starred]);
        assert!(!starred.admits(&pending));
        assert!(starred.admits(&done_starred));

        let custom = FilterSet::from_tokens([FilterToken::parse("someday")]);
        assert!(custom.admits(&pending));
    }

    #[test]
    fn serde_as_string_list() {
        let set = FilterSet::from_tokens([FilterToken::Done, FilterToken::Starred]);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["done","starred"]"#);
        let back: FilterSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn empty_list_deserializes_to_all() {
        let set: FilterSet = serde_json::from_str("[]").unwrap();
        assert_eq!(set, FilterSet::all());
    }

    #[test]
    fn all_mixed_with_others_collapses() {
        let set: FilterSet = serde_json::from_str(r#"["todo","all"]"#).unwrap();
        assert_eq!(tokens(&set), vec!["all"]);
    }
}
