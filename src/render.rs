use anyhow::{Context, Result};
use askama::Template;
use std::path::Path;
use tracing::info;

use crate::filter::{CompanyQuery, JobQuery};
use crate::options::{self, FilterOptions};
use crate::state::Status;
use crate::view::{self, ColumnHeader, CompanyRow, JobCard};

#[derive(Template)]
#[template(path = "jobs.html")]
struct JobsPage<'a> {
    heading: &'a str,
    filters: String,
    status: String,
    status_error: bool,
    cards: &'a [JobCard],
    empty_text: &'a str,
    no_salary_text: &'a str,
    generated_at: String,
}

#[derive(Template)]
#[template(path = "companies.html")]
struct CompaniesPage<'a> {
    heading: &'a str,
    filters: String,
    status: String,
    status_error: bool,
    headers: Vec<ColumnHeader>,
    rows: &'a [CompanyRow],
    generated_at: String,
}

fn generated_at() -> String {
    format!("Generated {}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S"))
}

/// One-line summary of the active job selection.
pub fn job_filter_summary(query: &JobQuery, options: &FilterOptions) -> String {
    let mut parts = vec![
        options::label_for(&options.tags, &query.tag).to_string(),
        options::label_for(&options.working, &query.working).to_string(),
        format!("sort: {}", query.sort),
    ];
    let text = query.text.trim();
    if !text.is_empty() {
        parts.push(format!("search: \"{}\"", text));
    }
    parts.join(" · ")
}

pub fn company_filter_summary(query: &CompanyQuery) -> String {
    let text = query.text.trim();
    let sort = format!(
        "sort: {} {}",
        query.sort.column.key(),
        view::sort_indicator(query.sort, query.sort.column)
    );
    if text.is_empty() {
        sort
    } else {
        format!("{} · search: \"{}\"", sort, text)
    }
}

/// Renders the job view. An empty `cards` slice produces the "no results" placeholder.
pub fn render_jobs(
    heading: &str,
    status: &Status,
    query: &JobQuery,
    options: &FilterOptions,
    cards: &[JobCard],
) -> Result<String> {
    let page = JobsPage {
        heading,
        filters: job_filter_summary(query, options),
        status: view::job_status_text(status),
        status_error: view::is_error(status),
        cards,
        empty_text: view::NO_JOBS_FOUND,
        no_salary_text: view::NO_SALARY,
        generated_at: generated_at(),
    };
    page.render().context("Failed to render job page")
}

pub fn render_companies(
    heading: &str,
    status: &Status,
    query: &CompanyQuery,
    rows: &[CompanyRow],
) -> Result<String> {
    let searching = !query.text.trim().is_empty();
    let page = CompaniesPage {
        heading,
        filters: company_filter_summary(query),
        status: view::company_status_text(status, searching),
        status_error: view::is_error(status),
        headers: view::column_headers(query.sort),
        rows,
        generated_at: generated_at(),
    };
    page.render().context("Failed to render company page")
}

pub fn write_page(path: &Path, html: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(path, html).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {} bytes to {}", html.len(), path.display());
    Ok(())
}
