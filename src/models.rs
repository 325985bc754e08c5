use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-field decoders: a value of the wrong type becomes `None` instead of
/// failing the whole record.
mod lenient {
    use serde::de::{DeserializeOwned, Deserializer};
    use serde::Deserialize;
    use serde_json::Value;

    pub fn any<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        Ok(serde_json::from_value(Value::deserialize(d)?).ok())
    }

    /// Array elements that do not decode are dropped individually.
    pub fn list<'de, D, T>(d: D) -> Result<Option<Vec<T>>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        Ok(match Value::deserialize(d)? {
            Value::Array(items) => Some(
                items
                    .into_iter()
                    .filter_map(|item| serde_json::from_value(item).ok())
                    .collect(),
            ),
            _ => None,
        })
    }

    /// Strings as-is; numbers and booleans as their text.
    pub fn text<'de, D>(d: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(d)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        })
    }

    /// Numbers, or strings holding a number.
    pub fn number<'de, D>(d: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(d)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
    }

    /// Like `number`, truncated toward zero.
    pub fn integer<'de, D>(d: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(d)?;
        if let Some(n) = value.as_i64() {
            return Ok(Some(n));
        }
        let float = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        Ok(float.filter(|f| f.is_finite()).map(|f| f as i64))
    }
}

/// Identifier as it appears in the feeds: usually a number, sometimes a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Num(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Num(n) => write!(f, "{}", n),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Tag {
    #[serde(deserialize_with = "lenient::text")]
    pub tag_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyRef {
    #[serde(deserialize_with = "lenient::any")]
    pub company_id: Option<RecordId>,
    #[serde(deserialize_with = "lenient::text")]
    pub company_name_th: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub company_name_en: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompensationType {
    #[serde(deserialize_with = "lenient::text")]
    pub compensation_type: Option<String>, // "บาท/เดือน", "บาท/วัน", ...
}

/// One opening from a job feed. Every field is optional in the source data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Job {
    #[serde(deserialize_with = "lenient::any")]
    pub opening_id: Option<RecordId>,
    #[serde(deserialize_with = "lenient::any")]
    pub session_id: Option<RecordId>,
    #[serde(deserialize_with = "lenient::text")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub title_en: Option<String>,
    #[serde(deserialize_with = "lenient::any")]
    pub company: Option<CompanyRef>,
    #[serde(deserialize_with = "lenient::list")]
    pub tags: Option<Vec<Tag>>,
    #[serde(deserialize_with = "lenient::text")]
    pub working_condition: Option<String>, // "Onsite", "Hybrid", "Remote", ...
    #[serde(deserialize_with = "lenient::number")]
    pub compensation_amount: Option<f64>,
    #[serde(deserialize_with = "lenient::any")]
    pub compensation_type: Option<CompensationType>,
    #[serde(deserialize_with = "lenient::integer")]
    pub quota: Option<i64>,
    #[serde(deserialize_with = "lenient::any")]
    pub is_accepting_application: Option<bool>,
    #[serde(deserialize_with = "lenient::any")]
    pub open_for_cooperative_internship: Option<bool>,
    #[serde(deserialize_with = "lenient::text")]
    pub office_name: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub office_address_line1: Option<String>,
}

impl Job {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    pub fn company_name(&self) -> &str {
        self.company
            .as_ref()
            .and_then(|c| c.company_name_th.as_deref())
            .unwrap_or("")
    }

    /// Missing or non-finite compensation counts as 0.
    pub fn compensation(&self) -> f64 {
        match self.compensation_amount {
            Some(v) if v.is_finite() => v,
            _ => 0.0,
        }
    }

    pub fn quota(&self) -> i64 {
        self.quota.unwrap_or(0)
    }

    pub fn accepting(&self) -> bool {
        self.is_accepting_application.unwrap_or(false)
    }

    pub fn cooperative(&self) -> bool {
        self.open_for_cooperative_internship.unwrap_or(false)
    }

    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.tags
            .iter()
            .flatten()
            .filter_map(|t| t.tag_name.as_deref())
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tag_names().any(|t| t == name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyType {
    #[serde(rename = "type", deserialize_with = "lenient::text")]
    pub kind: Option<String>,
}

/// One entry of the company directory.
///
/// `kind` is not part of the source document; the loader fills it from
/// `companyType.type` and replaces a missing `province` with the configured
/// default city.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Company {
    #[serde(deserialize_with = "lenient::any")]
    pub company_id: Option<RecordId>,
    #[serde(deserialize_with = "lenient::text")]
    pub company_name_th: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub company_name_en: Option<String>,
    #[serde(deserialize_with = "lenient::any")]
    pub company_type: Option<CompanyType>,
    #[serde(deserialize_with = "lenient::text")]
    pub province: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub website: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub facebook: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub line: Option<String>,
    #[serde(skip)]
    pub kind: String,
}

impl Company {
    pub fn decorate(&mut self, missing_type: &str, default_province: &str) {
        self.kind = self
            .company_type
            .as_ref()
            .and_then(|t| t.kind.as_deref())
            .filter(|k| !k.is_empty())
            .unwrap_or(missing_type)
            .to_string();
        if self.province.as_deref().is_none_or(str::is_empty) {
            self.province = Some(default_province.to_string());
        }
    }

    pub fn name_th(&self) -> &str {
        self.company_name_th.as_deref().unwrap_or("")
    }

    pub fn name_en(&self) -> &str {
        self.company_name_en.as_deref().unwrap_or("")
    }

    pub fn province(&self) -> &str {
        self.province.as_deref().unwrap_or("")
    }
}

/// Entry of the data-source manifest (`config.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub filename: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

impl ManifestEntry {
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.filename)
    }
}

#[derive(Debug, Clone)]
pub struct Manifest {
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// The last entry marked default, else the first entry.
    pub fn default_index(&self) -> usize {
        self.entries
            .iter()
            .rposition(|e| e.is_default)
            .unwrap_or(0)
    }

    pub fn default_entry(&self) -> Option<&ManifestEntry> {
        self.entries.get(self.default_index())
    }

    pub fn find(&self, filename: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.filename == filename)
    }
}
