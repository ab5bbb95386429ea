use chrono::{DateTime, Utc};

use crate::api::stream::TailStream;
use crate::tail::{TailBuffer, TailEvent};

// UI constants
pub const NOTIFICATION_TTL_SECS: u64 = 5;
pub const NARROW_WIDTH_THRESHOLD: u16 = 60;
pub const ERROR_TTL_SECS: u64 = 10;

/// Lifecycle states reported by the Starfish backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStatus {
    Queued,
    Building,
    Uploading,
    Succeeded,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl BuildStatus {
    /// Anything not terminal counts as running; unknown statuses are assumed
    /// live so the tail stays attached.
    pub fn is_running(self) -> bool {
        !matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Building => "building",
            Self::Uploading => "uploading",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Build {
    pub id: i32,
    pub origin: String,
    pub rev: String,
    pub created_at: DateTime<Utc>,
    pub status: BuildStatus,
    pub finished_at: Option<DateTime<Utc>>,
    pub error_msg: Option<String>,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Output {
    pub id: i32,
    pub input_id: i32,
    pub system: String,
    pub store_path: String,
}

/// One nix file of the build together with the store paths it produced.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct InputOutputs {
    pub id: i32,
    pub build_id: i32,
    pub path: String,
    pub outputs: Vec<Output>,
}

/// Body of `PUT /api/build`.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct BuildRequest {
    pub origin: String,
    pub rev: String,
    pub paths: String,
}

/// Error envelope the backend returns on non-2xx responses.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ApiError {
    pub code: u16,
    pub reason: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Builds,
    Detail,
    NewBuild,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Origin,
    Rev,
    Paths,
}

impl FormField {
    pub fn next(self) -> Self {
        match self {
            Self::Origin => Self::Rev,
            Self::Rev => Self::Paths,
            Self::Paths => Self::Origin,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Self::Origin => Self::Paths,
            Self::Rev => Self::Origin,
            Self::Paths => Self::Rev,
        }
    }
}

/// State of the new-build form.
#[derive(Debug, Clone)]
pub struct BuildForm {
    pub origin: String,
    pub rev: String,
    pub paths: String,
    pub focus: FormField,
    pub submitting: bool,
}

impl Default for BuildForm {
    fn default() -> Self {
        Self {
            origin: String::new(),
            // Matches the backend's default revision.
            rev: "main".to_string(),
            paths: String::new(),
            focus: FormField::Origin,
            submitting: false,
        }
    }
}

impl BuildForm {
    pub fn field_mut(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::Origin => &mut self.origin,
            FormField::Rev => &mut self.rev,
            FormField::Paths => &mut self.paths,
        }
    }

    pub fn insert(&mut self, c: char) {
        self.field_mut(self.focus).push(c);
    }

    pub fn backspace(&mut self) {
        self.field_mut(self.focus).pop();
    }

    pub fn payload(&self) -> BuildRequest {
        BuildRequest {
            origin: self.origin.trim().to_string(),
            rev: self.rev.trim().to_string(),
            paths: self.paths.trim().to_string(),
        }
    }
}

/// The open build view: metadata plus exactly one live tail subscription.
pub struct BuildDetail {
    pub build: Build,
    pub inputs: Vec<InputOutputs>,
    pub tail: TailBuffer,
    pub stream: TailStream,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub timestamp: std::time::Instant,
}

/// Immutable configuration set at startup.
pub struct AppConfig {
    pub server: String,
    pub tail_len: usize,
    pub limit: usize,
}

pub struct AppState {
    pub config: AppConfig,

    // Build list
    pub builds: Vec<Build>,
    pub cursor: usize,

    // Active view
    pub view: View,
    pub detail: Option<BuildDetail>,
    pub form: BuildForm,

    // Subscription identity; stale tail events are discarded against this.
    next_subscription: u64,
    // Build id of an in-flight detail fetch; results for any other id are
    // stale and get discarded.
    pending_detail: Option<i32>,

    // Polling
    pub last_poll: Option<std::time::Instant>,
    pub next_poll_in: u64,
    pub poll_interval: u64,

    // Transient UI
    pub notifications: Vec<Notification>,
    pub error: Option<(String, std::time::Instant)>,
    pub spinner_frame: usize,
    pub is_loading: bool,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(server: String, tail_len: usize, limit: usize) -> Self {
        Self {
            config: AppConfig {
                server,
                tail_len,
                limit,
            },
            builds: Vec::new(),
            cursor: 0,
            view: View::Builds,
            detail: None,
            form: BuildForm::default(),
            next_subscription: 0,
            pending_detail: None,
            last_poll: None,
            next_poll_in: 0,
            poll_interval: 10,
            notifications: Vec::new(),
            error: None,
            spinner_frame: 0,
            is_loading: false,
            should_quit: false,
        }
    }

    pub fn move_cursor_up(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
        }
    }

    pub fn move_cursor_down(&mut self) {
        if !self.builds.is_empty() && self.cursor < self.builds.len() - 1 {
            self.cursor += 1;
        }
    }

    /// A refreshed build list arrived. Any error banner is left alone;
    /// `prune_error` ages it out on its own TTL.
    pub fn apply_builds_result(&mut self, builds: Vec<Build>) {
        self.is_loading = false;
        self.set_builds(builds);
        self.last_poll = Some(std::time::Instant::now());
    }

    pub fn set_builds(&mut self, builds: Vec<Build>) {
        self.builds = builds;
        if self.cursor >= self.builds.len() && !self.builds.is_empty() {
            self.cursor = self.builds.len() - 1;
        } else if self.builds.is_empty() {
            self.cursor = 0;
        }
    }

    pub fn current_build(&self) -> Option<&Build> {
        self.builds.get(self.cursor)
    }

    pub fn detail_build_id(&self) -> Option<i32> {
        self.detail.as_ref().map(|d| d.build.id)
    }

    /// Allocate the identity for the next tail subscription.
    pub fn next_subscription(&mut self) -> u64 {
        self.next_subscription += 1;
        self.next_subscription
    }

    /// Switch to the detail view and remember which build was asked for.
    pub fn request_detail(&mut self, id: i32) {
        self.pending_detail = Some(id);
        self.view = View::Detail;
    }

    /// Whether a detail fetch result for `id` is still of interest: either
    /// it is the build the user last asked for, or it refreshes the build
    /// already open.
    pub fn detail_result_wanted(&self, id: i32) -> bool {
        self.pending_detail == Some(id) || self.detail_build_id() == Some(id)
    }

    /// Restarting is only offered once the build has finished, matching the
    /// backend's restart endpoint.
    pub fn can_restart(&self) -> bool {
        self.detail
            .as_ref()
            .is_some_and(|d| !d.build.status.is_running())
    }

    /// Replace the open detail view. Dropping a previous detail aborts its
    /// stream task.
    pub fn open_detail(&mut self, build: Build, inputs: Vec<InputOutputs>, stream: TailStream) {
        let tail = TailBuffer::new(self.config.tail_len);
        self.detail = Some(BuildDetail {
            build,
            inputs,
            tail,
            stream,
        });
        self.pending_detail = None;
        self.view = View::Detail;
    }

    /// Refresh metadata of the open detail without touching the tail.
    pub fn update_detail(&mut self, build: Build, inputs: Vec<InputOutputs>) {
        if let Some(detail) = &mut self.detail {
            if detail.build.id == build.id {
                detail.build = build;
                detail.inputs = inputs;
            }
        }
    }

    /// Close the detail view and its subscription (idempotent).
    pub fn close_detail(&mut self) {
        self.detail = None;
        self.pending_detail = None;
        if self.view == View::Detail {
            self.view = View::Builds;
        }
    }

    /// Route a tail event to the buffer, unless it belongs to a subscription
    /// that is no longer live.
    pub fn apply_tail(&mut self, subscription: u64, event: TailEvent) -> bool {
        match &mut self.detail {
            Some(detail) if detail.stream.id() == subscription => {
                detail.tail.apply(event);
                true
            }
            _ => false,
        }
    }

    /// Transport failure on a subscription; stale ids are ignored.
    pub fn tail_disconnected(&mut self, subscription: u64) -> bool {
        match &mut self.detail {
            Some(detail) if detail.stream.id() == subscription => {
                detail.tail.disconnect();
                true
            }
            _ => false,
        }
    }

    pub fn notify(&mut self, message: String) {
        self.notifications.push(Notification {
            message,
            timestamp: std::time::Instant::now(),
        });
    }

    pub fn prune_notifications(&mut self) {
        let now = std::time::Instant::now();
        self.notifications
            .retain(|n| now.duration_since(n.timestamp).as_secs() < NOTIFICATION_TTL_SECS);
    }

    pub fn advance_spinner(&mut self) {
        self.spinner_frame = (self.spinner_frame + 1) % crate::tui::spinner::FRAME_COUNT;
    }

    pub fn set_error(&mut self, msg: String) {
        self.error = Some((msg, std::time::Instant::now()));
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn prune_error(&mut self) {
        if let Some((_, ts)) = &self.error {
            if ts.elapsed().as_secs() >= ERROR_TTL_SECS {
                self.error = None;
            }
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|(msg, _)| msg.as_str())
    }

    /// Where the complete untruncated log lives; linked, never fetched.
    pub fn raw_log_url(&self, build_id: i32) -> String {
        format!("{}/build/{}/raw", self.config.server, build_id)
    }
}
