//! XTM project metadata tap
//!
//! `projects` is paged by headers: a full page (`xtm-page-size` equal to
//! `xtm-page-items-count`) means another page follows. The other streams
//! are fetched once per project and carry its `project_id`.

use super::{partition_segment, Partition, StreamContext, Tap, TapKind, TapStream};
use crate::auth::AuthConfig;
use crate::config::TapConfig;
use crate::error::{Error, Result};
use crate::http::{ApiError, ApiRequest, ApiResponse, ErrorKind};
use crate::schema::{JsonSchema, SchemaProperty};
use serde_json::{Map, Value};

/// Current page number header
pub const PAGE_HEADER: &str = "xtm-page";

/// Page capacity header
pub const PAGE_SIZE_HEADER: &str = "xtm-page-size";

/// Items on this page header
pub const PAGE_ITEMS_HEADER: &str = "xtm-page-items-count";

const DEFAULT_PAGE_SIZE: u64 = 1000;

const PROJECT_ID: &str = "project_id";

pub(super) fn build(config: &TapConfig) -> Result<Tap> {
    let base_url = config
        .base_url()
        .ok_or_else(|| Error::missing_field("base_url"))?;
    let auth = AuthConfig::XtmBasic {
        token: config.require("api_token")?,
    };
    let client_config = config.client_builder(base_url)?.auth(auth).build();

    Ok(Tap::from_parts(
        TapKind::Xtm,
        client_config,
        ApiRequest::get("/projects").query("page", "1"),
        vec![
            Box::new(Projects),
            Box::new(ProjectDetails),
            Box::new(ProjectStats),
            Box::new(ProjectMetrics),
        ],
    ))
}

fn header_u64(response: &ApiResponse, name: &str, default: u64) -> u64 {
    response
        .header_str(name)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn with_project_id(record: Value, partition: Option<&Partition>) -> Value {
    match (record, partition.and_then(|p| p.get(PROJECT_ID))) {
        (Value::Object(mut map), Some(id)) => {
            map.insert(PROJECT_ID.to_string(), id.clone());
            Value::Object(map)
        }
        (record, _) => record,
    }
}

fn project_path(stream: &str, ctx: &StreamContext<'_>, suffix: &str) -> Result<String> {
    let id = partition_segment(stream, ctx.partition, PROJECT_ID)?;
    Ok(format!("/projects/{id}{suffix}"))
}

fn target_language_keys() -> &'static [&'static str] {
    &[PROJECT_ID, "targetLanguage"]
}

fn core_metrics() -> SchemaProperty {
    SchemaProperty::object([
        ("iceMatchCharacters", SchemaProperty::number()),
        ("iceMatchSegments", SchemaProperty::number()),
    ])
}

fn segment_totals() -> SchemaProperty {
    SchemaProperty::object([
        ("totalSegments", SchemaProperty::number()),
        ("totalWords", SchemaProperty::number()),
    ])
}

// ============================================================================
// projects
// ============================================================================

/// `projects` stream
#[derive(Debug, Clone, Copy, Default)]
pub struct Projects;

impl TapStream for Projects {
    fn name(&self) -> &'static str {
        "projects"
    }

    fn schema(&self) -> JsonSchema {
        JsonSchema::new()
            .property("id", SchemaProperty::number())
            .property("name", SchemaProperty::string())
            .property("status", SchemaProperty::string())
            .property("activity", SchemaProperty::string())
            .property("joinFilesType", SchemaProperty::string())
    }

    fn key_properties(&self) -> &'static [&'static str] {
        &["id"]
    }

    fn first_request(&self, _ctx: &StreamContext<'_>) -> Result<ApiRequest> {
        Ok(ApiRequest::get("/projects"))
    }

    fn next_request(&self, _previous: &ApiRequest, response: &ApiResponse) -> Option<ApiRequest> {
        let current = header_u64(response, PAGE_HEADER, 1);
        let size = header_u64(response, PAGE_SIZE_HEADER, DEFAULT_PAGE_SIZE);
        let items = header_u64(response, PAGE_ITEMS_HEADER, DEFAULT_PAGE_SIZE);

        (size == items).then(|| ApiRequest::get("/projects").query("page", (current + 1).to_string()))
    }

    fn child_partition(&self, record: &Value) -> Option<Partition> {
        let id = record.get("id").filter(|id| !id.is_null())?;
        let mut partition = Map::new();
        partition.insert(PROJECT_ID.to_string(), id.clone());
        Some(partition)
    }
}

// ============================================================================
// projectdetails
// ============================================================================

/// `projectdetails` stream; projects that vanished (404) are skipped
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectDetails;

impl TapStream for ProjectDetails {
    fn name(&self) -> &'static str {
        "projectdetails"
    }

    fn schema(&self) -> JsonSchema {
        JsonSchema::new()
            .property("id", SchemaProperty::number())
            .property(PROJECT_ID, SchemaProperty::number())
            .property("name", SchemaProperty::string())
            .property("activity", SchemaProperty::string())
            .property("creatorId", SchemaProperty::number())
            .property("customerId", SchemaProperty::number())
            .property("customerName", SchemaProperty::string())
            .property("projectManagerId", SchemaProperty::number())
            .property("sourceLanguage", SchemaProperty::string())
            .property("targetLanguages", SchemaProperty::array(SchemaProperty::string()))
            .property("templateId", SchemaProperty::number())
            .property("filterTemplateId", SchemaProperty::string())
            .property("createDate", SchemaProperty::number())
            .property("startDates", SchemaProperty::number())
            .property("finishDate", SchemaProperty::number())
            .property("dueDate", SchemaProperty::number())
            .property("proposalApprovalStatus", SchemaProperty::string())
            .property("subjectMatterId", SchemaProperty::number())
            .property("subjectMatterName", SchemaProperty::string())
            .property("tmPenaltyProfileId", SchemaProperty::number())
            .property("qaProfileId", SchemaProperty::number())
            .property("segmentLockingType", SchemaProperty::string())
    }

    fn key_properties(&self) -> &'static [&'static str] {
        &["id"]
    }

    fn parent(&self) -> Option<&'static str> {
        Some("projects")
    }

    fn first_request(&self, ctx: &StreamContext<'_>) -> Result<ApiRequest> {
        Ok(ApiRequest::get(project_path(self.name(), ctx, "")?))
    }

    fn post_process(&self, record: Value, partition: Option<&Partition>) -> Value {
        with_project_id(record, partition)
    }

    fn is_skippable(&self, error: &ApiError) -> bool {
        error.kind() == Some(ErrorKind::NotFound)
    }
}

// ============================================================================
// projectstats
// ============================================================================

/// `projectstats` stream
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectStats;

impl TapStream for ProjectStats {
    fn name(&self) -> &'static str {
        "projectstats"
    }

    fn schema(&self) -> JsonSchema {
        let job = SchemaProperty::object([
            ("jobId", SchemaProperty::number()),
            ("sourceStatistics", segment_totals()),
            ("targetStatistics", segment_totals()),
            ("creationDate", SchemaProperty::number()),
        ]);
        let step = SchemaProperty::object([
            ("workflowStepName", SchemaProperty::string()),
            ("jobsStatistics", SchemaProperty::array(job)),
        ]);
        let user = SchemaProperty::object([
            ("userId", SchemaProperty::number()),
            ("userType", SchemaProperty::string()),
            ("stepsStatistics", SchemaProperty::array(step)),
        ]);

        JsonSchema::new()
            .property(PROJECT_ID, SchemaProperty::number())
            .property("targetLanguage", SchemaProperty::string())
            .property("usersStatistics", SchemaProperty::array(user))
    }

    fn key_properties(&self) -> &'static [&'static str] {
        target_language_keys()
    }

    fn parent(&self) -> Option<&'static str> {
        Some("projects")
    }

    fn first_request(&self, ctx: &StreamContext<'_>) -> Result<ApiRequest> {
        Ok(ApiRequest::get(project_path(self.name(), ctx, "/statistics")?))
    }

    fn post_process(&self, record: Value, partition: Option<&Partition>) -> Value {
        with_project_id(record, partition)
    }
}

// ============================================================================
// projectmetrics
// ============================================================================

/// `projectmetrics` stream
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectMetrics;

impl TapStream for ProjectMetrics {
    fn name(&self) -> &'static str {
        "projectmetrics"
    }

    fn schema(&self) -> JsonSchema {
        let progress = SchemaProperty::object([
            ("wordsToBeDone", SchemaProperty::number()),
            ("wordsDone", SchemaProperty::number()),
        ]);
        let job = SchemaProperty::object([
            ("jobId", SchemaProperty::number()),
            ("coreMetrics", core_metrics()),
            (
                "metricsProgress",
                SchemaProperty::object([("MT Post editing1", SchemaProperty::number())]),
            ),
        ]);

        JsonSchema::new()
            .property(PROJECT_ID, SchemaProperty::number())
            .property("targetLanguage", SchemaProperty::string())
            .property("coreMetrics", core_metrics())
            .property("metricsProgress", progress)
            .property("jobsMetrics", SchemaProperty::array(job))
    }

    fn key_properties(&self) -> &'static [&'static str] {
        target_language_keys()
    }

    fn parent(&self) -> Option<&'static str> {
        Some("projects")
    }

    fn first_request(&self, ctx: &StreamContext<'_>) -> Result<ApiRequest> {
        Ok(ApiRequest::get(project_path(self.name(), ctx, "/metrics")?))
    }

    fn post_process(&self, record: Value, partition: Option<&Partition>) -> Value {
        with_project_id(record, partition)
    }
}
