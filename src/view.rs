//! Records mapped to display-ready view models, shared by the HTML renderer
//! and the terminal browser.

use url::Url;

use crate::config::Settings;
use crate::filter::{ColumnSort, CompanyColumn, SortOrder};
use crate::models::{Company, Job};
use crate::state::Status;

pub const NO_COMPANY: &str = "ไม่ระบุบริษัท";
pub const NO_SALARY: &str = "ไม่ระบุเงินเดือน";
pub const COOPERATIVE: &str = "สหกิจ";
pub const NO_JOBS_FOUND: &str = "ไม่พบตำแหน่งงานที่ค้นหา";
pub const INIT_FAILED: &str = "ไม่สามารถโหลดระบบได้ กรุณาตรวจสอบไฟล์ data/config.json";

/// Builds outbound links from record fields.
#[derive(Debug, Clone)]
pub struct Links {
    portal: String,
    maps: String,
}

impl Links {
    pub fn new(settings: &Settings) -> Self {
        Self {
            portal: settings.portal_url.trim_end_matches('/').to_string(),
            maps: settings.maps_url.clone(),
        }
    }

    pub fn opening(&self, job: &Job) -> Option<String> {
        match (&job.opening_id, &job.session_id) {
            (Some(opening), Some(session)) => Some(format!(
                "{}/opening/{}/session/{}",
                self.portal, opening, session
            )),
            _ => None,
        }
    }

    pub fn company_profile(&self, job: &Job) -> Option<String> {
        let id = job.company.as_ref()?.company_id.as_ref()?;
        Some(format!("{}/company/profile/{}", self.portal, id))
    }

    pub fn map_search(&self, query: &str) -> Option<String> {
        Url::parse_with_params(&self.maps, &[("api", "1"), ("query", query)])
            .ok()
            .map(String::from)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub label: String,
    pub map_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pay {
    pub amount: String,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetaItem {
    pub text: String,
    pub emphasis: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobCard {
    pub title: String,
    pub opening_url: Option<String>,
    pub company_name: String,
    pub company_url: Option<String>,
    pub logo_url: Option<String>,
    pub location: Option<Location>,
    pub tags: Vec<String>,
    pub pay: Option<Pay>,
    pub meta: Vec<MetaItem>,
}

impl JobCard {
    pub fn from_job(job: &Job, links: &Links, tag_limit: usize) -> Self {
        let company = job.company.as_ref();
        let company_name = company
            .and_then(|c| c.company_name_th.as_deref())
            .filter(|n| !n.is_empty())
            .unwrap_or(NO_COMPANY)
            .to_string();

        let location = job
            .office_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .map(|name| {
                let query = job
                    .office_address_line1
                    .as_deref()
                    .filter(|a| !a.is_empty())
                    .unwrap_or(name);
                Location {
                    label: name.to_string(),
                    map_url: links.map_search(query),
                }
            });

        let pay = (job.compensation() > 0.0).then(|| Pay {
            amount: format_amount(job.compensation()),
            unit: job
                .compensation_type
                .as_ref()
                .and_then(|t| t.compensation_type.clone())
                .unwrap_or_default(),
        });

        let mut meta = Vec::new();
        if let Some(w) = job.working_condition.as_deref().filter(|w| !w.is_empty()) {
            meta.push(MetaItem { text: w.to_string(), emphasis: false });
        }
        if job.quota() > 0 {
            meta.push(MetaItem { text: format!("รับ {} อัตรา", job.quota()), emphasis: false });
        }
        if job.cooperative() {
            meta.push(MetaItem { text: COOPERATIVE.to_string(), emphasis: true });
        }

        Self {
            title: job.title().to_string(),
            opening_url: links.opening(job),
            company_name,
            company_url: links.company_profile(job),
            logo_url: company.and_then(|c| c.logo_url.clone()).filter(|u| !u.is_empty()),
            location,
            tags: job.tag_names().take(tag_limit).map(str::to_string).collect(),
            pay,
            meta,
        }
    }

    pub fn pay_text(&self) -> String {
        match &self.pay {
            Some(pay) if pay.unit.is_empty() => pay.amount.clone(),
            Some(pay) => format!("{} {}", pay.amount, pay.unit),
            None => NO_SALARY.to_string(),
        }
    }

    pub fn meta_text(&self) -> String {
        self.meta
            .iter()
            .map(|m| m.text.as_str())
            .collect::<Vec<_>>()
            .join(" • ")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompanyRow {
    pub name_th: String,
    pub name_en: String,
    pub kind: String,
    pub province: String,
    pub website: Option<String>,
    pub facebook: Option<String>,
    pub line: Option<String>,
}

fn present(value: &Option<String>) -> Option<String> {
    value.clone().filter(|v| !v.trim().is_empty())
}

impl CompanyRow {
    pub fn from_company(company: &Company) -> Self {
        let name_th = company.name_th();
        Self {
            name_th: if name_th.is_empty() { "-".to_string() } else { name_th.to_string() },
            name_en: company.name_en().to_string(),
            kind: company.kind.clone(),
            province: company.province().to_string(),
            website: present(&company.website),
            facebook: present(&company.facebook),
            line: present(&company.line),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnHeader {
    pub label: &'static str,
    pub key: &'static str,
    pub indicator: &'static str,
}

pub fn column_label(column: CompanyColumn) -> &'static str {
    match column {
        CompanyColumn::NameTh => "Company",
        CompanyColumn::NameEn => "English name",
        CompanyColumn::Kind => "Type",
        CompanyColumn::Province => "Province",
    }
}

/// Header cells with ⇅ on inactive columns and ↑/↓ on the active one.
pub fn column_headers(sort: ColumnSort) -> Vec<ColumnHeader> {
    [CompanyColumn::NameTh, CompanyColumn::Kind, CompanyColumn::Province]
        .into_iter()
        .map(|column| ColumnHeader {
            label: column_label(column),
            key: column.key(),
            indicator: sort_indicator(sort, column),
        })
        .collect()
}

pub fn sort_indicator(sort: ColumnSort, column: CompanyColumn) -> &'static str {
    match (sort.column == column, sort.order) {
        (false, _) => "⇅",
        (true, SortOrder::Asc) => "↑",
        (true, SortOrder::Desc) => "↓",
    }
}

/// Groups the integer part by thousands and keeps up to three decimals.
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() || value == 0.0 {
        return "0".to_string();
    }
    let negative = value < 0.0;
    let scaled = (value.abs() * 1000.0).round() as u64;
    let (whole, frac) = (scaled / 1000, scaled % 1000);

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if frac > 0 {
        let frac = format!("{:03}", frac);
        out.push('.');
        out.push_str(frac.trim_end_matches('0'));
    }
    out
}

pub fn job_status_text(status: &Status) -> String {
    match status {
        Status::Idle => "ยังไม่มีข้อมูล".to_string(),
        Status::Loading { .. } => "กำลังโหลดข้อมูล...".to_string(),
        Status::Empty => "ไม่มีตำแหน่งงานที่เปิดรับในไฟล์นี้".to_string(),
        Status::NoMatches => "ไม่พบข้อมูลที่ค้นหา".to_string(),
        Status::Showing { shown, .. } => format!("แสดงผล {} ตำแหน่งงาน", shown),
        Status::Failed { source, .. } => format!("โหลดข้อมูล {} ไม่สำเร็จ", source),
    }
}

pub fn company_status_text(status: &Status, searching: bool) -> String {
    match status {
        Status::Idle | Status::Loading { .. } => "Loading…".to_string(),
        Status::Empty => "0 Companies".to_string(),
        Status::NoMatches => "No results found.".to_string(),
        Status::Showing { shown, .. } if searching => format!("{} Results", shown),
        Status::Showing { shown, .. } => format!("{} Companies", shown),
        Status::Failed { reason, .. } => format!("Error loading data: {}", reason),
    }
}

pub fn is_error(status: &Status) -> bool {
    matches!(status, Status::Failed { .. })
}
