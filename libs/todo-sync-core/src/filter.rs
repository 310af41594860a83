//! View filtering and sorting of the todo collection

use crate::messages::Locale;
use crate::models::Todo;
use icu_collator::{Collator, CollatorOptions};
use icu_locid::langid;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Completion status filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl StatusFilter {
    /// Whether a todo passes this filter
    #[must_use]
    pub const fn matches(self, todo: &Todo) -> bool {
        match self {
            Self::All => true,
            Self::Active => !todo.is_completed(),
            Self::Completed => todo.is_completed(),
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
        })
    }
}

impl FromStr for StatusFilter {
    type Err = crate::TodoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            other => Err(crate::TodoError::validation(format!(
                "Unknown filter '{other}'. Must be one of: all, active, completed"
            ))),
        }
    }
}

/// Title sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// The opposite direction
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        })
    }
}

impl FromStr for SortDirection {
    type Err = crate::TodoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(crate::TodoError::validation(format!(
                "Unknown sort direction '{other}'. Must be one of: asc, desc"
            ))),
        }
    }
}

/// User-controlled view criteria
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    /// Free text matched against title and description
    pub search_term: String,
    /// Completion status filter
    pub filter: StatusFilter,
    /// Title sort direction
    pub sort_direction: SortDirection,
}

impl FilterCriteria {
    /// Start building criteria
    #[must_use]
    pub fn builder() -> FilterCriteriaBuilder {
        FilterCriteriaBuilder::new()
    }

    /// Lower-cased, trimmed search term; `None` if blank
    fn normalized_term(&self) -> Option<String> {
        todo_sync_common::non_blank(&self.search_term).map(str::to_lowercase)
    }
}

/// Builder for [`FilterCriteria`]
#[derive(Debug, Clone, Default)]
pub struct FilterCriteriaBuilder {
    criteria: FilterCriteria,
}

impl FilterCriteriaBuilder {
    /// Create a new builder with default criteria
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the search term
    #[must_use]
    pub fn search(mut self, term: &str) -> Self {
        self.criteria.search_term = term.to_string();
        self
    }

    /// Set the status filter
    #[must_use]
    pub const fn status(mut self, filter: StatusFilter) -> Self {
        self.criteria.filter = filter;
        self
    }

    /// Set the sort direction
    #[must_use]
    pub const fn sort(mut self, direction: SortDirection) -> Self {
        self.criteria.sort_direction = direction;
        self
    }

    /// Build the final criteria
    #[must_use]
    pub fn build(self) -> FilterCriteria {
        self.criteria
    }
}

fn matches_term(todo: &Todo, term: &str) -> bool {
    todo.title().to_lowercase().contains(term)
        || todo
            .description()
            .is_some_and(|d| d.to_lowercase().contains(term))
}

/// Title ordering under one locale's collation rules
struct TitleCollator {
    collator: Option<Collator>,
}

impl TitleCollator {
    fn new(locale: Locale) -> Self {
        let language = match locale {
            Locale::En => langid!("en"),
            Locale::Fr => langid!("fr"),
            Locale::Es => langid!("es"),
        };
        let collator = match Collator::try_new(&language.into(), CollatorOptions::new()) {
            Ok(collator) => Some(collator),
            Err(e) => {
                warn!(%locale, error = ?e, "No collation data, sorting titles by code point");
                None
            }
        };
        Self { collator }
    }

    fn compare(&self, a: &str, b: &str) -> Ordering {
        match &self.collator {
            Some(collator) => collator.compare(a, b),
            None => a.cmp(b),
        }
    }
}

/// Derive the on-screen projection of a todo collection
///
/// Applies the status filter, then the text filter, then a stable sort by
/// lower-cased title using English collation. Ties keep their relative
/// input order.
#[must_use]
pub fn project(todos: &[Todo], criteria: &FilterCriteria) -> Vec<Todo> {
    project_localized(todos, criteria, Locale::default())
}

/// [`project`] with titles collated for `locale`
#[must_use]
pub fn project_localized(todos: &[Todo], criteria: &FilterCriteria, locale: Locale) -> Vec<Todo> {
    if todos.is_empty() {
        return Vec::new();
    }

    let term = criteria.normalized_term();
    let mut keyed: Vec<(String, &Todo)> = todos
        .iter()
        .filter(|todo| criteria.filter.matches(todo))
        .filter(|todo| term.as_deref().is_none_or(|t| matches_term(todo, t)))
        .map(|todo| (todo.title().to_lowercase(), todo))
        .collect();

    let collator = TitleCollator::new(locale);
    match criteria.sort_direction {
        SortDirection::Asc => keyed.sort_by(|(a, _), (b, _)| collator.compare(a, b)),
        SortDirection::Desc => keyed.sort_by(|(a, _), (b, _)| collator.compare(b, a)),
    }

    keyed.into_iter().map(|(_, todo)| todo.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn todo(id: i64, title: &str, description: Option<&str>, done: bool) -> Todo {
        Todo::new(Some(id), title, description.map(str::to_string), done)
    }

    fn sample() -> Vec<Todo> {
        vec![
            todo(1, "Buy milk", Some("From the corner shop"), false),
            todo(2, "call Mom", None, true),
            todo(3, "Answer email", Some("Reply to the MILKMAN"), false),
            todo(4, "Book flights", None, true),
        ]
    }

    fn titles(todos: &[Todo]) -> Vec<&str> {
        todos.iter().map(Todo::title).collect()
    }

    #[test]
    fn test_empty_input() {
        let criteria = FilterCriteria::builder().search("x").build();
        assert!(project(&[], &criteria).is_empty());
    }

    #[test]
    fn test_all_sorted_ascending_case_insensitive() {
        let result = project(&sample(), &FilterCriteria::default());
        assert_eq!(
            titles(&result),
            vec!["Answer email", "Book flights", "Buy milk", "call Mom"]
        );
    }

    #[test]
    fn test_descending() {
        let criteria = FilterCriteria::builder().sort(SortDirection::Desc).build();
        let result = project(&sample(), &criteria);
        assert_eq!(
            titles(&result),
            vec!["call Mom", "Buy milk", "Book flights", "Answer email"]
        );
    }

    #[test]
    fn test_status_filters() {
        let active = FilterCriteria::builder().status(StatusFilter::Active).build();
        let completed = FilterCriteria::builder()
            .status(StatusFilter::Completed)
            .build();

        assert_eq!(
            titles(&project(&sample(), &active)),
            vec!["Answer email", "Buy milk"]
        );
        assert_eq!(
            titles(&project(&sample(), &completed)),
            vec!["Book flights", "call Mom"]
        );
    }

    #[test]
    fn test_search_matches_title_or_description() {
        let criteria = FilterCriteria::builder().search("  MILK ").build();
        let result = project(&sample(), &criteria);
        assert_eq!(titles(&result), vec!["Answer email", "Buy milk"]);
    }

    #[test]
    fn test_search_never_matches_missing_description() {
        let criteria = FilterCriteria::builder().search("corner").build();
        let result = project(&sample(), &criteria);
        assert_eq!(titles(&result), vec!["Buy milk"]);

        let criteria = FilterCriteria::builder().search("shop").build();
        let todos = vec![todo(9, "Groceries", None, false)];
        assert!(project(&todos, &criteria).is_empty());
    }

    #[test]
    fn test_blank_search_keeps_everything() {
        let criteria = FilterCriteria::builder().search("   ").build();
        assert_eq!(project(&sample(), &criteria).len(), 4);
    }

    #[test]
    fn test_search_combined_with_status() {
        let criteria = FilterCriteria::builder()
            .search("b")
            .status(StatusFilter::Completed)
            .build();
        assert_eq!(titles(&project(&sample(), &criteria)), vec!["Book flights"]);
    }

    #[test]
    fn test_ties_keep_input_order() {
        let todos = vec![
            todo(1, "Same", None, false),
            todo(2, "same", None, false),
            todo(3, "SAME", None, false),
        ];
        let asc = project(&todos, &FilterCriteria::default());
        let ids: Vec<_> = asc.iter().map(Todo::id).collect();
        assert_eq!(ids, vec![Some(1), Some(2), Some(3)]);

        let desc = project(
            &todos,
            &FilterCriteria::builder().sort(SortDirection::Desc).build(),
        );
        let ids: Vec<_> = desc.iter().map(Todo::id).collect();
        assert_eq!(ids, vec![Some(1), Some(2), Some(3)]);
    }

    #[test]
    fn test_accented_titles_sort_with_their_base_letter() {
        let todos = vec![
            todo(1, "zebra", None, false),
            todo(2, "Éclair", None, false),
            todo(3, "ecole", None, false),
            todo(4, "Fig", None, false),
        ];
        let asc = project(&todos, &FilterCriteria::default());
        assert_eq!(titles(&asc), vec!["Éclair", "ecole", "Fig", "zebra"]);

        let desc = project(
            &todos,
            &FilterCriteria::builder().sort(SortDirection::Desc).build(),
        );
        assert_eq!(titles(&desc), vec!["zebra", "Fig", "ecole", "Éclair"]);
    }

    #[test]
    fn test_collation_follows_locale() {
        let todos = vec![
            todo(1, "ñu", None, false),
            todo(2, "nube", None, false),
            todo(3, "oso", None, false),
        ];
        let criteria = FilterCriteria::default();

        // n with tilde is its own letter in Spanish
        assert_eq!(
            titles(&project_localized(&todos, &criteria, Locale::Es)),
            vec!["nube", "ñu", "oso"]
        );
        assert_eq!(
            titles(&project_localized(&todos, &criteria, Locale::En)),
            vec!["ñu", "nube", "oso"]
        );
    }

    #[test]
    fn test_parse_filter_and_direction() {
        assert_eq!("Active".parse::<StatusFilter>().unwrap(), StatusFilter::Active);
        assert_eq!("desc".parse::<SortDirection>().unwrap(), SortDirection::Desc);
        assert!("done".parse::<StatusFilter>().is_err());
        assert!("up".parse::<SortDirection>().is_err());
        assert_eq!(StatusFilter::Completed.to_string(), "completed");
        assert_eq!(SortDirection::Asc.reversed(), SortDirection::Desc);
    }

    fn arb_todos() -> impl Strategy<Value = Vec<Todo>> {
        prop::collection::vec(
            ("[a-zA-Z ]{0,8}", prop::option::of("[a-zA-Z ]{0,8}"), any::<bool>()),
            0..24,
        )
        .prop_map(|items| {
            items
                .into_iter()
                .enumerate()
                .map(|(i, (title, description, done))| {
                    Todo::new(Some(i as i64), title, description, done)
                })
                .collect()
        })
    }

    fn arb_criteria() -> impl Strategy<Value = FilterCriteria> {
        (
            "[a-zA-Z ]{0,3}",
            prop_oneof![
                Just(StatusFilter::All),
                Just(StatusFilter::Active),
                Just(StatusFilter::Completed)
            ],
            prop_oneof![Just(SortDirection::Asc), Just(SortDirection::Desc)],
        )
            .prop_map(|(search_term, filter, sort_direction)| FilterCriteria {
                search_term,
                filter,
                sort_direction,
            })
    }

    proptest! {
        #[test]
        fn prop_project_is_deterministic(todos in arb_todos(), criteria in arb_criteria()) {
            prop_assert_eq!(project(&todos, &criteria), project(&todos, &criteria));
        }

        #[test]
        fn prop_status_filter_partitions(todos in arb_todos(), term in "[a-z]{0,2}") {
            let base = FilterCriteria::builder().search(&term);
            let all = project(&todos, &base.clone().status(StatusFilter::All).build());
            let active = project(&todos, &base.clone().status(StatusFilter::Active).build());
            let completed = project(&todos, &base.status(StatusFilter::Completed).build());

            prop_assert_eq!(active.len() + completed.len(), all.len());
            for t in &active {
                prop_assert!(!completed.contains(t));
                prop_assert!(all.contains(t));
            }
            for t in &completed {
                prop_assert!(all.contains(t));
            }
        }

        #[test]
        fn prop_search_is_case_insensitive(todos in arb_todos(), term in "[a-z]{1,3}") {
            let lower = project(&todos, &FilterCriteria::builder().search(&term).build());
            let upper = project(
                &todos,
                &FilterCriteria::builder().search(&term.to_uppercase()).build(),
            );
            prop_assert_eq!(lower, upper);
        }

        #[test]
        fn prop_reversing_direction_reverses_distinct_titles(todos in arb_todos()) {
            let mut seen = std::collections::HashSet::new();
            let distinct: Vec<Todo> = todos
                .into_iter()
                .filter(|t| seen.insert(t.title().to_lowercase()))
                .collect();

            let asc = project(&distinct, &FilterCriteria::default());
            let mut desc = project(
                &distinct,
                &FilterCriteria::builder().sort(SortDirection::Desc).build(),
            );
            desc.reverse();
            prop_assert_eq!(asc, desc);
        }
    }
}
