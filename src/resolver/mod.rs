//! Resolver pipeline over the upstream timetable provider
//!
//! A fixed chain of dependent, individually cached lookups:
//! server URL -> school metadata -> programmes -> branches -> groups ->
//! lectures. Each step has its own composite cache key and a TTL tuned
//! to how often the resource changes upstream. Failures propagate
//! unmodified and never leave partial results in the cache.
//!
//! `Timetable` is constructed explicitly by the application's
//! composition root and passed down by reference; there is no module
//! level singleton, and the sweep task's lifetime is owned by whoever
//! calls `start_sweep`.

pub mod config;

use chrono::{Datelike, NaiveDate};
use parking_lot::RwLock;
use std::sync::Arc;

use crate::auth::{CredentialSource, TokenManager};
use crate::cache::{ApiCache, CacheOptions, SweepTask};
use crate::client::UpstreamClient;
use crate::error::ApiError;
use crate::model::{
    Branch, Group, GroupWithBranch, Lecture, Programme, SchoolContext, SchoolInfo,
    ServerUrlResponse,
};

pub use config::TimetableConfig;

/// Which branches of a programme/year to aggregate over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchSelection {
    All,
    Ids(Vec<String>),
}

impl BranchSelection {
    /// Parse the route-layer `branches` parameter: absent, empty or
    /// `"all"` selects every branch, otherwise a comma-separated id list.
    pub fn parse(param: Option<&str>) -> Self {
        match param {
            None => BranchSelection::All,
            Some(value) if value.is_empty() || value == "all" => BranchSelection::All,
            Some(list) => BranchSelection::Ids(
                list.split(',')
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
                    .collect(),
            ),
        }
    }
}

/// Everything the page/route layer needs for one timetable view.
#[derive(Debug, Clone)]
pub struct TimetableBundle {
    /// Union of the selected branches' groups
    pub groups: Vec<GroupWithBranch>,
    /// Lectures for those groups over the academic-year window
    pub lectures: Vec<Lecture>,
    /// The branch ids the view covers
    pub selected_branches: Vec<String>,
}

pub struct Timetable {
    /// Human-facing school code ("feri"); the provider's canonical code
    /// lives in the resolved context
    school_code: String,
    config: TimetableConfig,
    cache: Arc<ApiCache>,
    client: UpstreamClient,
    context: RwLock<Option<SchoolContext>>,
}

impl Timetable {
    pub fn new(
        school_code: impl Into<String>,
        credentials: CredentialSource,
        config: TimetableConfig,
    ) -> Result<Self, ApiError> {
        config.validate().map_err(ApiError::Configuration)?;

        let cache = Arc::new(ApiCache::new(config.cache.clone()));
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .build()
            .map_err(|e| ApiError::Configuration(format!("failed to build HTTP client: {e}")))?;
        let tokens = TokenManager::new(
            &config.api_url,
            credentials,
            Arc::clone(&cache),
            config.token_ttl(),
            http.clone(),
        );
        let client = UpstreamClient::new(http, tokens);

        Ok(Self {
            school_code: school_code.into(),
            config,
            cache,
            client,
            context: RwLock::new(None),
        })
    }

    pub fn school_code(&self) -> &str {
        &self.school_code
    }

    pub fn cache(&self) -> &Arc<ApiCache> {
        &self.cache
    }

    /// The resolved server URL, if school resolution has run.
    pub fn server_url(&self) -> Option<String> {
        self.context.read().as_ref().map(|c| c.server_url.clone())
    }

    /// Spawn the periodic cache sweep; the returned task stops it when
    /// dropped.
    pub fn start_sweep(&self) -> SweepTask {
        Arc::clone(&self.cache).start_sweep()
    }

    /// Drop all cached data and the resolved school context.
    pub fn clear_cache(&self) {
        self.cache.clear();
        *self.context.write() = None;
    }

    /// Resolve the provider's per-school server endpoint.
    async fn resolve_server_url(&self) -> Result<String, ApiError> {
        let key = format!("school_url_{}", self.school_code);
        self.cache
            .request(
                || self.fetch_server_url(),
                CacheOptions::new(&key, self.config.server_url_ttl()),
            )
            .await
    }

    async fn fetch_server_url(&self) -> Result<String, ApiError> {
        tracing::debug!(school = %self.school_code, "resolving provider server URL");
        let response: ServerUrlResponse = self
            .client
            .get_json(
                &format!("{}url", self.config.api_url),
                &[
                    ("schoolCode", self.school_code.as_str()),
                    ("language", self.config.language.as_str()),
                ],
            )
            .await?;

        let server_url = if self.config.force_https {
            force_https(&response.server)
        } else {
            response.server
        };
        tracing::debug!(server_url = %server_url, "server URL resolved");
        Ok(server_url)
    }

    /// Fetch the school metadata and establish the school context. The
    /// canonical school code in the response may differ from the human
    /// one; every downstream call uses the canonical code.
    pub async fn school_info(&self) -> Result<SchoolInfo, ApiError> {
        let key = format!("school_info_{}", self.school_code);
        let info: SchoolInfo = self
            .cache
            .request(
                || self.fetch_school_info(),
                CacheOptions::new(&key, self.config.school_info_ttl()),
            )
            .await?;

        // reestablish the context even when the info came from cache;
        // the server URL read is itself cached
        let server_url = self.resolve_server_url().await?;
        *self.context.write() = Some(SchoolContext {
            human_code: self.school_code.clone(),
            server_url,
            school_code: info.school_code.clone(),
        });

        Ok(info)
    }

    async fn fetch_school_info(&self) -> Result<SchoolInfo, ApiError> {
        let server_url = self.resolve_server_url().await?;
        tracing::debug!(school = %self.school_code, "fetching school metadata");
        self.client
            .get_json(
                &format!("{server_url}schoolCode"),
                &[
                    ("schoolCode", self.school_code.as_str()),
                    ("language", self.config.language.as_str()),
                ],
            )
            .await
    }

    /// The school context is the prerequisite for every dependent call.
    /// Re-entrant and idempotent: concurrent cold calls may each hit
    /// upstream (no dedup), which is safe because resolution is a pure
    /// read.
    async fn ensure_context(&self) -> Result<SchoolContext, ApiError> {
        if let Some(context) = self.context.read().clone() {
            return Ok(context);
        }
        self.school_info().await?;
        self.context.read().clone().ok_or_else(|| {
            ApiError::Resolution("school info did not yield a server URL and school code".into())
        })
    }

    /// All basic programmes of the school.
    pub async fn programmes(&self) -> Result<Vec<Programme>, ApiError> {
        let context = self.ensure_context().await?;
        let key = format!("programmes_{}", context.school_code);
        let ttl = self.config.programmes_ttl();
        self.cache
            .request(|| self.fetch_programmes(context), CacheOptions::new(&key, ttl))
            .await
    }

    async fn fetch_programmes(&self, context: SchoolContext) -> Result<Vec<Programme>, ApiError> {
        let result: Vec<Programme> = self
            .client
            .get_json(
                &format!("{}basicProgrammeAll", context.server_url),
                &[
                    ("schoolCode", context.school_code.as_str()),
                    ("language", self.config.language.as_str()),
                ],
            )
            .await?;
        tracing::debug!(count = result.len(), "fetched programmes");
        Ok(result)
    }

    /// Branches of one programme in a given study year.
    pub async fn branches_for_programme(
        &self,
        programme_id: &str,
        year: &str,
    ) -> Result<Vec<Branch>, ApiError> {
        let context = self.ensure_context().await?;
        let key = format!("branches_{}_{}_{}", context.school_code, programme_id, year);
        let ttl = self.config.branches_ttl();
        self.cache
            .request(
                || self.fetch_branches(context, programme_id, year),
                CacheOptions::new(&key, ttl),
            )
            .await
    }

    async fn fetch_branches(
        &self,
        context: SchoolContext,
        programme_id: &str,
        year: &str,
    ) -> Result<Vec<Branch>, ApiError> {
        let result: Vec<Branch> = self
            .client
            .get_json(
                &format!("{}branchAllForProgrmmeYear", context.server_url),
                &[
                    ("schoolCode", context.school_code.as_str()),
                    ("language", self.config.language.as_str()),
                    ("programmeId", programme_id),
                    ("year", year),
                ],
            )
            .await?;
        tracing::debug!(
            count = result.len(),
            programme = programme_id,
            year,
            "fetched branches"
        );
        Ok(result)
    }

    /// Groups belonging to one branch.
    pub async fn groups_for_branch(&self, branch_id: &str) -> Result<Vec<Group>, ApiError> {
        let context = self.ensure_context().await?;
        let key = format!("groups_{}_{}", context.school_code, branch_id);
        let ttl = self.config.groups_ttl();
        self.cache
            .request(
                || self.fetch_groups(context, branch_id),
                CacheOptions::new(&key, ttl),
            )
            .await
    }

    async fn fetch_groups(
        &self,
        context: SchoolContext,
        branch_id: &str,
    ) -> Result<Vec<Group>, ApiError> {
        let result: Vec<Group> = self
            .client
            .get_json(
                &format!("{}groupAllForBranch", context.server_url),
                &[
                    ("schoolCode", context.school_code.as_str()),
                    ("language", self.config.language.as_str()),
                    ("branchId", branch_id),
                ],
            )
            .await?;
        tracing::debug!(count = result.len(), branch = branch_id, "fetched groups");
        Ok(result)
    }

    /// Lectures for a set of groups over a date range. The window is
    /// calendar dates only; one upstream call covers the whole range.
    /// Group ids are sorted and deduplicated so logically identical
    /// requests share one cache entry.
    pub async fn lectures_for_groups(
        &self,
        group_ids: &[String],
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Lecture>, ApiError> {
        let context = self.ensure_context().await?;

        let mut ids: Vec<&str> = group_ids.iter().map(String::as_str).collect();
        ids.sort_unstable();
        ids.dedup();
        let joined = ids.join("_");
        let date_from = from.format("%Y-%m-%d").to_string();
        let date_to = to.format("%Y-%m-%d").to_string();

        let key = format!(
            "lectures_{}_{}_{}_{}",
            context.school_code, joined, date_from, date_to
        );
        let ttl = self.config.lectures_ttl();
        self.cache
            .request(
                || self.fetch_lectures(context, joined, date_from, date_to),
                CacheOptions::new(&key, ttl),
            )
            .await
    }

    async fn fetch_lectures(
        &self,
        context: SchoolContext,
        groups_id: String,
        date_from: String,
        date_to: String,
    ) -> Result<Vec<Lecture>, ApiError> {
        tracing::debug!(
            groups_id = %groups_id,
            from = %date_from,
            to = %date_to,
            "fetching lectures"
        );
        let result: Vec<Lecture> = self
            .client
            .get_json(
                &format!("{}scheduleByGroups", context.server_url),
                &[
                    ("schoolCode", context.school_code.as_str()),
                    ("dateFrom", date_from.as_str()),
                    ("dateTo", date_to.as_str()),
                    ("language", self.config.language.as_str()),
                    ("groupsId", groups_id.as_str()),
                ],
            )
            .await?;
        tracing::debug!(count = result.len(), "fetched lectures");
        Ok(result)
    }

    /// One timetable view: resolve the branch selection, union the
    /// groups of every selected branch, and fetch their lectures for
    /// the academic-year window containing today.
    pub async fn fetch_timetable(
        &self,
        programme_id: &str,
        year: &str,
        selection: &BranchSelection,
    ) -> Result<TimetableBundle, ApiError> {
        let selected_branches: Vec<String> = match selection {
            BranchSelection::All => self
                .branches_for_programme(programme_id, year)
                .await?
                .into_iter()
                .map(|branch| branch.id)
                .collect(),
            BranchSelection::Ids(ids) => ids.clone(),
        };

        let mut groups = Vec::new();
        for branch_id in &selected_branches {
            for group in self.groups_for_branch(branch_id).await? {
                groups.push(GroupWithBranch {
                    id: group.id,
                    name: group.name,
                    branch_id: branch_id.clone(),
                });
            }
        }

        let (start, end) = academic_year_window(chrono::Local::now().date_naive());
        let ids: Vec<String> = groups.iter().map(|group| group.id.clone()).collect();
        let lectures = self.lectures_for_groups(&ids, start, end).await?;

        Ok(TimetableBundle {
            groups,
            lectures,
            selected_branches,
        })
    }
}

/// The September 1 - August 31 window containing `today`. Months from
/// September on belong to the academic year starting that September.
pub fn academic_year_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start_year = if today.month() >= 9 {
        today.year()
    } else {
        today.year() - 1
    };
    let start = NaiveDate::from_ymd_opt(start_year, 9, 1).expect("september 1 is a valid date");
    let end = NaiveDate::from_ymd_opt(start_year + 1, 8, 31).expect("august 31 is a valid date");
    (start, end)
}

fn force_https(url: &str) -> String {
    match url.strip_prefix("http://") {
        Some(rest) => format!("https://{rest}"),
        None => url.to_string(),
    }
}
