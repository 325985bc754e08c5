use std::collections::BTreeSet;

use crate::filter::Selection;
use crate::models::Job;

pub const ALL_TAGS_LABEL: &str = "Tags ทั้งหมด";
pub const ALL_WORKING_LABEL: &str = "รูปแบบงานทั้งหมด";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOption {
    pub value: Selection,
    pub label: String,
}

/// Selectable filter values derived from the loaded list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOptions {
    pub tags: Vec<FilterOption>,
    pub working: Vec<FilterOption>,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self::from_jobs(&[], 0)
    }
}

impl FilterOptions {
    pub fn from_jobs(jobs: &[Job], label_max: usize) -> Self {
        Self {
            tags: tag_options(jobs, label_max),
            working: working_options(jobs),
        }
    }
}

/// Display label for a long value. The option's value keeps the full text.
pub fn display_label(value: &str, max: usize) -> String {
    if max == 0 || value.chars().count() <= max {
        value.to_string()
    } else {
        let head: String = value.chars().take(max).collect();
        format!("{}...", head)
    }
}

fn with_all(label: &str, values: BTreeSet<&str>, label_max: usize) -> Vec<FilterOption> {
    std::iter::once(FilterOption {
        value: Selection::All,
        label: label.to_string(),
    })
    .chain(values.into_iter().map(|v| FilterOption {
        value: Selection::Only(v.to_string()),
        label: display_label(v, label_max),
    }))
    .collect()
}

pub fn tag_options(jobs: &[Job], label_max: usize) -> Vec<FilterOption> {
    let names: BTreeSet<&str> = jobs
        .iter()
        .flat_map(|j| j.tag_names())
        .filter(|t| !t.is_empty())
        .collect();
    with_all(ALL_TAGS_LABEL, names, label_max)
}

pub fn working_options(jobs: &[Job]) -> Vec<FilterOption> {
    let kinds: BTreeSet<&str> = jobs
        .iter()
        .filter_map(|j| j.working_condition.as_deref())
        .filter(|w| !w.is_empty())
        .collect();
    with_all(ALL_WORKING_LABEL, kinds, 0)
}

/// The option after (or before) `current`, wrapping around. Unknown values restart at "all".
pub fn cycle(options: &[FilterOption], current: &Selection, forward: bool) -> Selection {
    if options.is_empty() {
        return Selection::All;
    }
    let len = options.len();
    let next = match options.iter().position(|o| &o.value == current) {
        Some(i) if forward => (i + 1) % len,
        Some(i) => (i + len - 1) % len,
        None => 0,
    };
    options[next].value.clone()
}

pub fn label_for<'a>(options: &'a [FilterOption], current: &'a Selection) -> &'a str {
    options
        .iter()
        .find(|o| &o.value == current)
        .map(|o| o.label.as_str())
        .unwrap_or(current.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Tag;

    fn job(tags: &[&str], working: Option<&str>) -> Job {
        Job {
            tags: Some(tags.iter().map(|t| Tag { tag_name: Some(t.to_string()) }).collect()),
            working_condition: working.map(str::to_string),
            ..Default::default()
        }
    }

    fn values(options: &[FilterOption]) -> Vec<&str> {
        options.iter().map(|o| o.value.as_str()).collect()
    }

    #[test]
    fn test_tag_options_distinct_sorted_with_all_first() {
        let jobs = vec![
            job(&["Frontend", "Backend"], None),
            job(&["Backend", ""], None),
            Job::default(),
        ];
        let options = tag_options(&jobs, 40);
        assert_eq!(values(&options), vec!["all", "Backend", "Frontend"]);
        assert_eq!(options[0].label, ALL_TAGS_LABEL);
    }

    #[test]
    fn test_working_options_skip_missing_and_empty() {
        let jobs = vec![
            job(&[], Some("Remote")),
            job(&[], Some("Hybrid")),
            job(&[], Some("")),
            job(&[], None),
            job(&[], Some("Remote")),
        ];
        assert_eq!(values(&working_options(&jobs)), vec!["all", "Hybrid", "Remote"]);
    }

    #[test]
    fn test_long_tag_label_truncated_but_value_kept() {
        let long = "Machine Learning and Artificial Intelligence Engineering";
        let options = tag_options(&[job(&[long], None)], 40);
        assert_eq!(options[1].value, Selection::Only(long.to_string()));
        assert_eq!(options[1].label.chars().count(), 43);
        assert!(options[1].label.ends_with("..."));
    }

    #[test]
    fn test_display_label_counts_characters_not_bytes() {
        let thai = "การพัฒนาซอฟต์แวร์";
        assert_eq!(display_label(thai, 40), thai);
        assert_eq!(display_label("abcdef", 3), "abc...");
        assert_eq!(display_label("abc", 3), "abc");
    }

    #[test]
    fn test_cycle_wraps_both_ways() {
        let options = tag_options(&[job(&["A", "B"], None)], 40);
        let all = Selection::All;
        let a = cycle(&options, &all, true);
        assert_eq!(a, Selection::parse("A"));
        assert_eq!(cycle(&options, &all, false), Selection::parse("B"));
        assert_eq!(cycle(&options, &Selection::parse("B"), true), Selection::All);
        assert_eq!(cycle(&options, &Selection::parse("gone"), true), Selection::All);
    }

    #[test]
    fn test_label_for_unknown_value_falls_back_to_value() {
        let options = working_options(&[]);
        assert_eq!(label_for(&options, &Selection::All), ALL_WORKING_LABEL);
        let other = Selection::parse("Remote");
        assert_eq!(label_for(&options, &other), "Remote");
    }
}
