// One chronological breadcrumb list built from explicit crumbs, error
// records and navigation spans.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::spans::{Span, PAGE_LOAD_OP};
use super::types::{secs_to_ms, ErrorRecord, RawBreadcrumb, ReplayRecord};

/// Categories that carry no information for the timeline.
const UNWANTED_CRUMB_CATEGORIES: [&str; 2] = ["ui.focus", "ui.blur"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreadcrumbType {
    Init,
    Default,
    Navigation,
    Ui,
    Debug,
    Error,
}

impl BreadcrumbType {
    /// Type of an explicit crumb, from its declared type and category.
    fn of_raw(crumb: &RawBreadcrumb) -> Self {
        match crumb.kind.as_deref() {
            Some("error") | Some("exception") => return BreadcrumbType::Error,
            Some("navigation") => return BreadcrumbType::Navigation,
            _ => {}
        }
        match crumb.category.as_deref() {
            Some("navigation") => BreadcrumbType::Navigation,
            Some("console") => BreadcrumbType::Debug,
            Some(category) if category.starts_with("ui.") => BreadcrumbType::Ui,
            _ => BreadcrumbType::Default,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreadcrumbLevel {
    Fatal,
    Error,
    Warning,
    #[default]
    Info,
    Debug,
}

impl BreadcrumbLevel {
    fn parse(level: Option<&str>) -> Self {
        match level {
            Some("fatal") => BreadcrumbLevel::Fatal,
            Some("error") => BreadcrumbLevel::Error,
            Some("warning") | Some("warn") => BreadcrumbLevel::Warning,
            Some("debug") | Some("log") => BreadcrumbLevel::Debug,
            _ => BreadcrumbLevel::Info,
        }
    }
}

/// Where a synthesized breadcrumb came from. Declaration order is the
/// tie-break order for equal timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrumbSource {
    Init,
    Explicit,
    Error,
    Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breadcrumb {
    pub id: usize,
    #[serde(rename = "type")]
    pub kind: BreadcrumbType,
    pub level: BreadcrumbLevel,
    pub category: Option<String>,
    pub message: Option<String>,
    /// Epoch milliseconds. Crumbs that arrived without a clock read as zero.
    pub timestamp_ms: f64,
    #[serde(default)]
    pub data: Value,
    pub source: CrumbSource,
}

impl Breadcrumb {
    pub fn is_error(&self) -> bool {
        self.kind == BreadcrumbType::Error
    }
}

fn init_crumb(record: &ReplayRecord) -> Breadcrumb {
    let initial_url = record.tags.get("url").map(|urls| urls.join(", "));
    Breadcrumb {
        id: 0,
        kind: BreadcrumbType::Init,
        level: BreadcrumbLevel::Info,
        category: None,
        message: initial_url.clone(),
        timestamp_ms: record.started_at_ms().unwrap_or_default(),
        data: json!({
            "action": "replay-init",
            "label": "Start recording",
            "url": initial_url,
        }),
        source: CrumbSource::Init,
    }
}

fn explicit_crumb(crumb: RawBreadcrumb) -> Breadcrumb {
    let kind = BreadcrumbType::of_raw(&crumb);
    Breadcrumb {
        id: 0,
        kind,
        level: BreadcrumbLevel::parse(crumb.level.as_deref()),
        timestamp_ms: secs_to_ms(crumb.timestamp).unwrap_or_default(),
        category: crumb.category,
        message: crumb.message,
        data: crumb.data,
        source: CrumbSource::Explicit,
    }
}

fn error_crumb(error: &ErrorRecord) -> Breadcrumb {
    Breadcrumb {
        id: 0,
        kind: BreadcrumbType::Error,
        level: BreadcrumbLevel::Error,
        category: Some("issue".to_string()),
        message: Some(error.title.clone()),
        timestamp_ms: error.timestamp_ms().unwrap_or_default(),
        data: json!({
            "label": error.error_type.join(""),
            "eventId": error.id,
            "groupId": error.issue_id,
            "groupShortId": error.issue,
            "project": error.project_name,
        }),
        source: CrumbSource::Error,
    }
}

fn span_crumb(span: &Span) -> Breadcrumb {
    Breadcrumb {
        id: 0,
        kind: BreadcrumbType::Navigation,
        level: BreadcrumbLevel::Info,
        category: Some("default".to_string()),
        message: span.description.clone(),
        timestamp_ms: span.start_timestamp_ms.unwrap_or_default(),
        data: json!({
            "action": "navigate",
            "to": span.description,
            "label": navigation_label(span.op.as_deref()),
        }),
        source: CrumbSource::Span,
    }
}

fn navigation_label(op: Option<&str>) -> &'static str {
    match op {
        Some("navigation.reload") => "Reload",
        Some("navigation.back_forward") => "Navigate back/forward",
        _ => "Page load",
    }
}

/// Merge the three crumb sources into one list ordered by timestamp.
///
/// `record` must already carry reconciled timestamps. Ids follow the
/// concatenation order (init, explicit, error, span) and the sort is stable,
/// so equal timestamps keep that order.
pub fn breadcrumb_factory(
    record: &ReplayRecord,
    errors: &[ErrorRecord],
    raw_crumbs: Vec<RawBreadcrumb>,
    spans: &[Span],
) -> Vec<Breadcrumb> {
    let has_page_load = spans
        .iter()
        .any(|span| span.op.as_deref() == Some(PAGE_LOAD_OP));

    let mut crumbs = Vec::with_capacity(1 + raw_crumbs.len() + errors.len());
    if !has_page_load {
        crumbs.push(init_crumb(record));
    }
    crumbs.extend(
        raw_crumbs
            .into_iter()
            .filter(|crumb| {
                !crumb
                    .category
                    .as_deref()
                    .is_some_and(|category| UNWANTED_CRUMB_CATEGORIES.contains(&category))
            })
            .map(explicit_crumb),
    );
    crumbs.extend(errors.iter().map(error_crumb));
    crumbs.extend(spans.iter().filter(|span| span.is_navigation()).map(span_crumb));

    for (id, crumb) in crumbs.iter_mut().enumerate() {
        crumb.id = id;
    }
    crumbs.sort_by(|a, b| a.timestamp_ms.total_cmp(&b.timestamp_ms));
    crumbs
}
