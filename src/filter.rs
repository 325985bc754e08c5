//! Filter/sort pipeline over an in-memory record list.
//!
//! Both entry points borrow the full list and return a new vector of
//! references; the source list is never reordered.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::collate;
use crate::models::{Company, Job};

/// Reserved filter value meaning "no constraint".
pub const ALL: &str = "all";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    pub fn parse(value: &str) -> Self {
        if value == ALL {
            Selection::All
        } else {
            Selection::Only(value.to_string())
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Selection::All)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Selection::All => ALL,
            Selection::Only(v) => v,
        }
    }
}

impl FromStr for Selection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Selection::parse(s))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JobSort {
    #[default]
    None,
    SalaryDesc,
    SalaryAsc,
    QuotaDesc,
    QuotaAsc,
    NameAsc,
    NameDesc,
}

impl JobSort {
    pub const ALL: [JobSort; 7] = [
        JobSort::None,
        JobSort::SalaryDesc,
        JobSort::SalaryAsc,
        JobSort::QuotaDesc,
        JobSort::QuotaAsc,
        JobSort::NameAsc,
        JobSort::NameDesc,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            JobSort::None => "none",
            JobSort::SalaryDesc => "salary-desc",
            JobSort::SalaryAsc => "salary-asc",
            JobSort::QuotaDesc => "quota-desc",
            JobSort::QuotaAsc => "quota-asc",
            JobSort::NameAsc => "name-asc",
            JobSort::NameDesc => "name-desc",
        }
    }

    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    fn compare(self, a: &Job, b: &Job) -> Ordering {
        match self {
            JobSort::None => Ordering::Equal,
            JobSort::SalaryDesc => b.compensation().total_cmp(&a.compensation()),
            JobSort::SalaryAsc => a.compensation().total_cmp(&b.compensation()),
            JobSort::QuotaDesc => b.quota().cmp(&a.quota()),
            JobSort::QuotaAsc => a.quota().cmp(&b.quota()),
            JobSort::NameAsc => collate::compare(a.company_name(), b.company_name()),
            JobSort::NameDesc => collate::compare(b.company_name(), a.company_name()),
        }
    }
}

impl fmt::Display for JobSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|k| k.as_str()).collect();
                format!("unknown sort '{}', expected one of: {}", s, known.join(", "))
            })
    }
}

/// Selection state for one pass over a job list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobQuery {
    pub text: String,
    pub tag: Selection,
    pub working: Selection,
    pub sort: JobSort,
}

impl JobQuery {
    /// Clears the filters but keeps the active sort, as a data-source switch does.
    pub fn reset_filters(&mut self) {
        self.text.clear();
        self.tag = Selection::All;
        self.working = Selection::All;
    }

    fn admits(&self, job: &Job, needle: &str) -> bool {
        let tag_ok = self.tag.is_all() || job.has_tag(self.tag.as_str());
        let working_ok = self.working.is_all()
            || job.working_condition.as_deref() == Some(self.working.as_str());
        let text_ok = needle.is_empty()
            || job.title().to_lowercase().contains(needle)
            || job.company_name().to_lowercase().contains(needle);
        tag_ok && working_ok && text_ok
    }
}

fn needle(text: &str) -> String {
    text.trim().to_lowercase()
}

pub fn filter_jobs<'a>(jobs: &'a [Job], query: &JobQuery) -> Vec<&'a Job> {
    let needle = needle(&query.text);
    let mut out: Vec<&Job> = jobs.iter().filter(|j| query.admits(j, &needle)).collect();
    out.sort_by(|a, b| query.sort.compare(a, b));
    out
}

/// Sortable company fields, keyed by their names in the source document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompanyColumn {
    #[default]
    NameTh,
    NameEn,
    Kind,
    Province,
}

impl CompanyColumn {
    pub const ALL: [CompanyColumn; 4] = [
        CompanyColumn::NameTh,
        CompanyColumn::NameEn,
        CompanyColumn::Kind,
        CompanyColumn::Province,
    ];

    pub fn key(self) -> &'static str {
        match self {
            CompanyColumn::NameTh => "companyNameTh",
            CompanyColumn::NameEn => "companyNameEn",
            CompanyColumn::Kind => "type",
            CompanyColumn::Province => "province",
        }
    }

    pub fn value(self, company: &Company) -> &str {
        match self {
            CompanyColumn::NameTh => company.name_th(),
            CompanyColumn::NameEn => company.name_en(),
            CompanyColumn::Kind => &company.kind,
            CompanyColumn::Province => company.province(),
        }
    }
}

impl FromStr for CompanyColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "unknown column '{}', expected one of: companyNameTh, companyNameEn, type, province",
                    s
                )
            })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn reversed(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

/// Active column sort driven by header clicks.
///
/// Defaults to `companyNameTh` ascending, so the directory is sorted from
/// the first render rather than shown in load order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnSort {
    pub column: CompanyColumn,
    pub order: SortOrder,
}

impl ColumnSort {
    /// Same column flips the order; another column starts ascending.
    pub fn toggle(self, column: CompanyColumn) -> Self {
        if self.column == column {
            Self { column, order: self.order.reversed() }
        } else {
            Self { column, order: SortOrder::Asc }
        }
    }

    fn compare(self, a: &Company, b: &Company) -> Ordering {
        let va = self.column.value(a).to_lowercase();
        let vb = self.column.value(b).to_lowercase();
        match self.order {
            SortOrder::Asc => va.cmp(&vb),
            SortOrder::Desc => vb.cmp(&va),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyQuery {
    pub text: String,
    pub sort: ColumnSort,
}

impl CompanyQuery {
    fn admits(&self, company: &Company, needle: &str) -> bool {
        needle.is_empty()
            || CompanyColumn::ALL
                .iter()
                .any(|c| c.value(company).to_lowercase().contains(needle))
    }
}

pub fn filter_companies<'a>(companies: &'a [Company], query: &CompanyQuery) -> Vec<&'a Company> {
    let needle = needle(&query.text);
    let mut out: Vec<&Company> = companies
        .iter()
        .filter(|c| query.admits(c, &needle))
        .collect();
    out.sort_by(|a, b| query.sort.compare(a, b));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CompanyRef, Tag};

    fn job(title: &str, company: &str, pay: Option<f64>, quota: i64, tags: &[&str]) -> Job {
        Job {
            title: Some(title.to_string()),
            company: Some(CompanyRef {
                company_name_th: Some(company.to_string()),
                ..Default::default()
            }),
            compensation_amount: pay,
            quota: Some(quota),
            is_accepting_application: Some(true),
            tags: Some(
                tags.iter()
                    .map(|t| Tag { tag_name: Some(t.to_string()) })
                    .collect(),
            ),
            ..Default::default()
        }
    }

    fn titles(jobs: &[&Job]) -> Vec<String> {
        jobs.iter().map(|j| j.title().to_string()).collect()
    }

    fn company(th: &str, en: &str, kind: &str, province: &str) -> Company {
        Company {
            company_name_th: Some(th.to_string()),
            company_name_en: Some(en.to_string()),
            province: Some(province.to_string()),
            kind: kind.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_tag_filter_is_exact_match() {
        let jobs = vec![
            job("A", "Acme", None, 1, &["Backend"]),
            job("B", "Beta", None, 1, &["Backend Dev"]),
            job("C", "Gamma", None, 1, &[]),
        ];
        let query = JobQuery { tag: Selection::parse("Backend"), ..Default::default() };
        assert_eq!(titles(&filter_jobs(&jobs, &query)), vec!["A"]);

        let lower = JobQuery { tag: Selection::parse("backend"), ..Default::default() };
        assert!(filter_jobs(&jobs, &lower).is_empty());
    }

    #[test]
    fn test_all_sentinel_admits_records_without_tags() {
        let jobs = vec![Job { title: Some("bare".into()), ..Default::default() }];
        let result = filter_jobs(&jobs, &JobQuery::default());
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_working_condition_filter() {
        let mut remote = job("R", "Acme", None, 1, &[]);
        remote.working_condition = Some("Remote".into());
        let mut onsite = job("O", "Acme", None, 1, &[]);
        onsite.working_condition = Some("Onsite".into());
        let jobs = vec![remote, onsite, job("N", "Acme", None, 1, &[])];

        let query = JobQuery { working: Selection::parse("Remote"), ..Default::default() };
        assert_eq!(titles(&filter_jobs(&jobs, &query)), vec!["R"]);
    }

    #[test]
    fn test_text_matches_title_or_company_case_insensitive() {
        let jobs = vec![
            job("Backend Engineer", "Acme", None, 1, &[]),
            job("Designer", "BETA Labs", None, 1, &[]),
            job("Tester", "Gamma", None, 1, &[]),
        ];
        let query = JobQuery { text: "  beta ".into(), ..Default::default() };
        assert_eq!(titles(&filter_jobs(&jobs, &query)), vec!["Designer"]);

        let query = JobQuery { text: "ENGINEER".into(), ..Default::default() };
        assert_eq!(titles(&filter_jobs(&jobs, &query)), vec!["Backend Engineer"]);
    }

    #[test]
    fn test_criteria_combine_as_conjunction() {
        let mut a = job("Engineer A", "Acme", None, 1, &["Backend"]);
        a.working_condition = Some("Remote".into());
        let mut b = job("Engineer B", "Acme", None, 1, &["Backend"]);
        b.working_condition = Some("Onsite".into());
        let jobs = vec![a, b];

        let query = JobQuery {
            text: "engineer".into(),
            tag: Selection::parse("Backend"),
            working: Selection::parse("Remote"),
            sort: JobSort::None,
        };
        assert_eq!(titles(&filter_jobs(&jobs, &query)), vec!["Engineer A"]);
    }

    #[test]
    fn test_salary_sort_treats_missing_as_zero() {
        let jobs = vec![
            job("none", "A", None, 1, &[]),
            job("high", "B", Some(30000.0), 1, &[]),
            job("low", "C", Some(9000.0), 1, &[]),
        ];
        let desc = JobQuery { sort: JobSort::SalaryDesc, ..Default::default() };
        assert_eq!(titles(&filter_jobs(&jobs, &desc)), vec!["high", "low", "none"]);
        let asc = JobQuery { sort: JobSort::SalaryAsc, ..Default::default() };
        assert_eq!(titles(&filter_jobs(&jobs, &asc)), vec!["none", "low", "high"]);
    }

    #[test]
    fn test_equal_keys_keep_input_order() {
        let jobs = vec![
            job("first", "A", Some(20000.0), 1, &[]),
            job("top", "B", Some(25000.0), 1, &[]),
            job("second", "C", Some(20000.0), 1, &[]),
        ];
        let query = JobQuery { sort: JobSort::SalaryDesc, ..Default::default() };
        let once = titles(&filter_jobs(&jobs, &query));
        assert_eq!(once, vec!["top", "first", "second"]);
        assert_eq!(titles(&filter_jobs(&jobs, &query)), once);
    }

    #[test]
    fn test_quota_sort() {
        let jobs = vec![
            job("two", "A", None, 2, &[]),
            job("five", "B", None, 5, &[]),
            job("one", "C", None, 1, &[]),
        ];
        let query = JobQuery { sort: JobSort::QuotaDesc, ..Default::default() };
        assert_eq!(titles(&filter_jobs(&jobs, &query)), vec!["five", "two", "one"]);
        let query = JobQuery { sort: JobSort::QuotaAsc, ..Default::default() };
        assert_eq!(titles(&filter_jobs(&jobs, &query)), vec!["one", "two", "five"]);
    }

    #[test]
    fn test_name_sort_uses_thai_collation() {
        let jobs = vec![
            job("x", "ขนส่ง", None, 1, &[]),
            job("y", "เก่ง", None, 1, &[]),
            job("z", "กล้า", None, 1, &[]),
        ];
        let query = JobQuery { sort: JobSort::NameAsc, ..Default::default() };
        assert_eq!(titles(&filter_jobs(&jobs, &query)), vec!["z", "y", "x"]);
        let query = JobQuery { sort: JobSort::NameDesc, ..Default::default() };
        assert_eq!(titles(&filter_jobs(&jobs, &query)), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_filter_does_not_reorder_source() {
        let jobs = vec![
            job("b", "B", Some(1.0), 1, &[]),
            job("a", "A", Some(2.0), 1, &[]),
        ];
        let query = JobQuery { sort: JobSort::SalaryDesc, ..Default::default() };
        let _ = filter_jobs(&jobs, &query);
        assert_eq!(jobs[0].title(), "b");
        assert_eq!(jobs[1].title(), "a");
    }

    #[test]
    fn test_job_sort_parse_and_cycle() {
        assert_eq!("salary-desc".parse::<JobSort>(), Ok(JobSort::SalaryDesc));
        assert!("price".parse::<JobSort>().is_err());
        assert_eq!(JobSort::NameDesc.next(), JobSort::None);
        assert_eq!(JobSort::None.next(), JobSort::SalaryDesc);
    }

    #[test]
    fn test_reset_filters_keeps_sort() {
        let mut query = JobQuery {
            text: "x".into(),
            tag: Selection::parse("Backend"),
            working: Selection::parse("Remote"),
            sort: JobSort::QuotaAsc,
        };
        query.reset_filters();
        assert_eq!(query, JobQuery { sort: JobSort::QuotaAsc, ..Default::default() });
    }

    #[test]
    fn test_column_toggle_rule() {
        let sort = ColumnSort::default();
        assert_eq!(sort.column, CompanyColumn::NameTh);
        let flipped = sort.toggle(CompanyColumn::NameTh);
        assert_eq!(flipped.order, SortOrder::Desc);
        let switched = flipped.toggle(CompanyColumn::Province);
        assert_eq!(switched, ColumnSort { column: CompanyColumn::Province, order: SortOrder::Asc });
    }

    #[test]
    fn test_company_toggle_outputs_are_reverses() {
        let companies = vec![
            company("ค", "Charlie", "SME", "Bangkok"),
            company("ก", "alpha", "Startup", "Chiang Mai"),
            company("ข", "Bravo", "Corporate", "Phuket"),
        ];
        let asc = CompanyQuery {
            sort: ColumnSort { column: CompanyColumn::NameEn, order: SortOrder::Asc },
            ..Default::default()
        };
        let desc = CompanyQuery { sort: asc.sort.toggle(CompanyColumn::NameEn), ..asc.clone() };

        let up: Vec<&str> = filter_companies(&companies, &asc).into_iter().map(|c| c.name_en()).collect();
        let mut down: Vec<&str> = filter_companies(&companies, &desc).into_iter().map(|c| c.name_en()).collect();
        assert_eq!(up, vec!["alpha", "Bravo", "Charlie"]);
        down.reverse();
        assert_eq!(up, down);
    }

    #[test]
    fn test_company_text_matches_type_and_province() {
        let companies = vec![
            company("ก", "Alpha", "Startup", "Chiang Mai"),
            company("ข", "Bravo", "Corporate", "Bangkok"),
        ];
        let by_kind = CompanyQuery { text: "start".into(), ..Default::default() };
        assert_eq!(filter_companies(&companies, &by_kind).len(), 1);
        let by_province = CompanyQuery { text: "bangkok".into(), ..Default::default() };
        assert_eq!(filter_companies(&companies, &by_province)[0].name_en(), "Bravo");
    }

    #[test]
    fn test_company_missing_field_sorts_as_empty() {
        let mut unnamed = company("", "", "N/A", "Bangkok");
        unnamed.company_name_en = None;
        let companies = vec![company("ข", "Bravo", "SME", "Bangkok"), unnamed];
        let query = CompanyQuery {
            sort: ColumnSort { column: CompanyColumn::NameEn, order: SortOrder::Asc },
            ..Default::default()
        };
        let sorted = filter_companies(&companies, &query);
        assert_eq!(sorted[0].name_en(), "");
    }

    #[test]
    fn test_company_column_parse() {
        assert_eq!("type".parse::<CompanyColumn>(), Ok(CompanyColumn::Kind));
        assert_eq!("companynameth".parse::<CompanyColumn>(), Ok(CompanyColumn::NameTh));
        assert!("website".parse::<CompanyColumn>().is_err());
    }
}
