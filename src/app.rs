use std::collections::HashMap;

use chrono::{DateTime, Local};

use crate::input::Action;
use crate::mail::SmtpSettings;
use crate::model::{
    DashboardData, HostLogKind, HostSnapshot, MetricsIndex, NamespaceFilter, ResourceCategory,
    ResourceKind, RowData, Screen, TableData,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    TextInput,
    Editor,
}

/// Effect requested by the state machine. The event loop owns execution;
/// the state machine never performs I/O itself.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    None,
    Quit,
    FetchList {
        kind: ResourceKind,
        namespace: NamespaceFilter,
        generation: u64,
    },
    FetchDashboard {
        generation: u64,
    },
    FetchHost,
    FetchNamespaces,
    FetchPodLogs {
        namespace: String,
        name: String,
    },
    RunHostLog {
        kind: HostLogKind,
    },
    DeletePod {
        namespace: String,
        name: String,
    },
    ScaleDeployment {
        namespace: String,
        name: String,
        replicas: i32,
    },
    PatchResource {
        kind: ResourceKind,
        namespace: Option<String>,
        name: String,
        body: String,
    },
    SendAlertEmail {
        settings: SmtpSettings,
        subject: String,
        body: String,
    },
}

/// Result message from a spawned unit of work. Errors arrive pre-flattened
/// as strings; the only reaction to one is recording the banner.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    List {
        kind: ResourceKind,
        generation: u64,
        result: Result<ListPayload, String>,
    },
    Dashboard {
        generation: u64,
        result: Result<DashboardData, String>,
    },
    Host {
        result: Result<HostSnapshot, String>,
    },
    Namespaces {
        result: Result<Vec<String>, String>,
    },
    PodLogs {
        title: String,
        result: Result<String, String>,
    },
    HostLog {
        title: String,
        result: Result<String, String>,
    },
    Mutation {
        label: String,
        refresh: Option<ResourceKind>,
        result: Result<(), String>,
    },
}

#[derive(Debug, Clone)]
pub struct ListPayload {
    pub headers: Vec<String>,
    pub rows: Vec<RowData>,
    pub metrics: MetricsIndex,
    pub refreshed_at: DateTime<Local>,
}

#[derive(Debug, Clone)]
pub struct DetailView {
    pub kind: ResourceKind,
    pub name: String,
    pub namespace: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct TextView {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, Default)]
pub struct SmtpForm {
    pub fields: [String; 5],
    pub active: usize,
}

impl SmtpForm {
    pub const LABELS: [&'static str; 5] = ["Server", "Port", "Username", "Password", "Recipient"];

    fn settings(&self) -> SmtpSettings {
        SmtpSettings {
            server: self.fields[0].clone(),
            port: self.fields[1].trim().parse().unwrap_or(587),
            username: self.fields[2].clone(),
            password: self.fields[3].clone(),
            recipient: self.fields[4].clone(),
        }
    }
}

pub struct App {
    running: bool,
    screen: Screen,
    previous_screen: Screen,
    cursor: usize,
    namespace: NamespaceFilter,
    /// Bumped on every namespace-filter change; list fetches carry the value
    /// current at spawn time so late responses can be recognized as stale.
    generation: u64,
    refresh_inflight: bool,
    tables: HashMap<ResourceKind, TableData>,
    metrics: HashMap<ResourceKind, MetricsIndex>,
    namespaces: Vec<String>,
    detail: Option<DetailView>,
    text_view: Option<TextView>,
    dashboard: Option<DashboardData>,
    host: Option<HostSnapshot>,
    scale_draft: String,
    patch_draft: String,
    smtp_form: SmtpForm,
    pending_email: Option<(String, String)>,
    pending_delete: Option<(String, String)>,
    last_error: Option<String>,
    status: Option<String>,
}

impl App {
    pub fn new(namespace: NamespaceFilter) -> Self {
        Self {
            running: true,
            screen: Screen::CategoryMenu,
            previous_screen: Screen::CategoryMenu,
            cursor: 0,
            namespace,
            generation: 0,
            refresh_inflight: false,
            tables: HashMap::new(),
            metrics: HashMap::new(),
            namespaces: Vec::new(),
            detail: None,
            text_view: None,
            dashboard: None,
            host: None,
            scale_draft: String::new(),
            patch_draft: String::new(),
            smtp_form: SmtpForm::default(),
            pending_email: None,
            pending_delete: None,
            last_error: None,
            status: None,
        }
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn previous_screen(&self) -> &Screen {
        &self.previous_screen
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn namespace(&self) -> &NamespaceFilter {
        &self.namespace
    }

    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    pub fn table(&self, kind: ResourceKind) -> Option<&TableData> {
        self.tables.get(&kind)
    }

    pub fn metrics(&self, kind: ResourceKind) -> Option<&MetricsIndex> {
        self.metrics.get(&kind)
    }

    pub fn detail(&self) -> Option<&DetailView> {
        self.detail.as_ref()
    }

    pub fn text_view(&self) -> Option<&TextView> {
        self.text_view.as_ref()
    }

    pub fn dashboard(&self) -> Option<&DashboardData> {
        self.dashboard.as_ref()
    }

    pub fn host(&self) -> Option<&HostSnapshot> {
        self.host.as_ref()
    }

    pub fn scale_draft(&self) -> &str {
        &self.scale_draft
    }

    pub fn patch_draft(&self) -> &str {
        &self.patch_draft
    }

    pub fn smtp_form(&self) -> &SmtpForm {
        &self.smtp_form
    }

    pub fn pending_delete(&self) -> Option<&(String, String)> {
        self.pending_delete.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }

    /// Title of a list screen, reflecting the active namespace filter.
    pub fn list_title(&self, kind: ResourceKind) -> String {
        if kind.namespaced() {
            format!("{} ({})", kind.title(), self.namespace.label())
        } else {
            kind.title().to_string()
        }
    }

    pub fn mode(&self) -> InputMode {
        match self.screen {
            Screen::ScaleInput | Screen::SmtpForm => InputMode::TextInput,
            Screen::PatchEditor => InputMode::Editor,
            _ => InputMode::Normal,
        }
    }

    pub fn refresh_inflight(&self) -> bool {
        self.refresh_inflight
    }

    pub fn mark_refresh_inflight(&mut self) {
        self.refresh_inflight = true;
    }

    /// The one fetch owned by the current screen, issued on each timer tick.
    /// Menus and modal screens own none and just let the tick pass.
    pub fn screen_refresh_command(&self) -> Command {
        match &self.screen {
            Screen::List(kind) => Command::FetchList {
                kind: *kind,
                namespace: self.namespace.clone(),
                generation: self.generation,
            },
            Screen::Dashboard => Command::FetchDashboard {
                generation: self.generation,
            },
            Screen::Host => Command::FetchHost,
            _ => Command::None,
        }
    }

    pub fn apply_action(&mut self, action: Action) -> Command {
        let command = self.handle_action(action);
        self.track_inflight(command)
    }

    fn handle_action(&mut self, action: Action) -> Command {
        match action {
            Action::Quit => {
                // modal screens never reach quit; their cancel path returns
                // to the previous screen instead
                if self.screen.is_modal() {
                    return Command::None;
                }
                self.running = false;
                Command::Quit
            }
            Action::Up => {
                self.move_cursor(-1);
                Command::None
            }
            Action::Down => {
                self.move_cursor(1);
                Command::None
            }
            Action::Enter => self.activate_selection(),
            Action::Back => {
                self.go_back();
                Command::None
            }
            Action::Help => {
                if !self.screen.is_modal() {
                    self.go_to(Screen::Help);
                }
                Command::None
            }
            Action::Key(c) => self.apply_letter(c),
            Action::InputChar(c) => {
                self.push_input(c);
                Command::None
            }
            Action::InputNewline => {
                if self.screen == Screen::PatchEditor {
                    self.patch_draft.push('\n');
                }
                Command::None
            }
            Action::Backspace => {
                self.pop_input();
                Command::None
            }
            Action::SubmitInput => self.submit_input(),
            Action::CancelInput => {
                self.discard_input();
                self.go_back();
                Command::None
            }
        }
    }

    /// Merges a completed unit of work. Stale list/dashboard responses are
    /// discarded here instead of being cancelled in flight.
    pub fn absorb(&mut self, outcome: FetchOutcome) -> Command {
        let command = self.merge_outcome(outcome);
        self.track_inflight(command)
    }

    /// Navigation can issue the same fetch a tick would; it occupies the
    /// single in-flight slot so the next tick does not start a second one.
    fn track_inflight(&mut self, command: Command) -> Command {
        if matches!(
            command,
            Command::FetchList { .. } | Command::FetchDashboard { .. } | Command::FetchHost
        ) {
            self.refresh_inflight = true;
        }
        command
    }

    fn merge_outcome(&mut self, outcome: FetchOutcome) -> Command {
        match outcome {
            FetchOutcome::List {
                kind,
                generation,
                result,
            } => {
                self.refresh_inflight = false;
                if generation != self.generation || self.screen.list_kind() != Some(kind) {
                    return Command::None;
                }
                match result {
                    Ok(payload) => {
                        self.metrics.insert(kind, payload.metrics);
                        self.tables.entry(kind).or_default().replace(
                            payload.headers,
                            payload.rows,
                            payload.refreshed_at,
                        );
                        self.clamp_cursor();
                        self.last_error = None;
                    }
                    Err(error) => self.last_error = Some(error),
                }
                Command::None
            }
            FetchOutcome::Dashboard { generation, result } => {
                self.refresh_inflight = false;
                if generation != self.generation || self.screen != Screen::Dashboard {
                    return Command::None;
                }
                match result {
                    Ok(dashboard) => {
                        self.dashboard = Some(dashboard);
                        self.last_error = None;
                    }
                    Err(error) => self.last_error = Some(error),
                }
                Command::None
            }
            FetchOutcome::Host { result } => {
                self.refresh_inflight = false;
                if self.screen != Screen::Host {
                    return Command::None;
                }
                match result {
                    Ok(snapshot) => {
                        self.host = Some(snapshot);
                        self.last_error = None;
                    }
                    Err(error) => self.last_error = Some(error),
                }
                Command::None
            }
            FetchOutcome::Namespaces { result } => {
                match result {
                    Ok(namespaces) => {
                        self.namespaces = namespaces;
                        self.clamp_cursor();
                    }
                    Err(error) => self.last_error = Some(error),
                }
                Command::None
            }
            FetchOutcome::PodLogs { title, result } => {
                // the title doubles as the request identity; a response for a
                // pod the user has since navigated away from is dropped
                if self.screen != Screen::Logs || !self.text_view_matches(&title) {
                    return Command::None;
                }
                match result {
                    Ok(body) => self.text_view = Some(TextView { title, body }),
                    Err(error) => self.last_error = Some(error),
                }
                Command::None
            }
            FetchOutcome::HostLog { title, result } => {
                if self.screen != Screen::HostLogOutput || !self.text_view_matches(&title) {
                    return Command::None;
                }
                match result {
                    Ok(body) => self.text_view = Some(TextView { title, body }),
                    Err(error) => self.last_error = Some(error),
                }
                Command::None
            }
            FetchOutcome::Mutation {
                label,
                refresh,
                result,
            } => match result {
                Ok(()) => {
                    self.status = Some(label);
                    match refresh {
                        Some(kind) if self.screen.list_kind() == Some(kind) => Command::FetchList {
                            kind,
                            namespace: self.namespace.clone(),
                            generation: self.generation,
                        },
                        _ => Command::None,
                    }
                }
                Err(error) => {
                    self.last_error = Some(error);
                    Command::None
                }
            },
        }
    }

    fn go_to(&mut self, screen: Screen) {
        if screen == self.screen {
            return;
        }
        self.previous_screen = self.screen.clone();
        self.screen = screen;
        self.cursor = 0;
    }

    /// The requesting screen seeds `text_view` with a titled placeholder, so
    /// a matching title means the response belongs to what is on screen.
    fn text_view_matches(&self, title: &str) -> bool {
        self.text_view
            .as_ref()
            .is_some_and(|view| view.title == title)
    }

    fn go_back(&mut self) {
        let Some(target) = self.back_target() else {
            return;
        };
        if self.screen == Screen::ConfirmDelete {
            self.pending_delete = None;
        }
        self.previous_screen = self.screen.clone();
        self.screen = target;
        self.cursor = 0;
    }

    /// The back key is hierarchical on menus and lists and follows the
    /// single-slot previous pointer everywhere else. The top-level menu has
    /// no back target; quit is only ever explicit.
    fn back_target(&self) -> Option<Screen> {
        match &self.screen {
            Screen::CategoryMenu => None,
            Screen::SubMenu(_) => Some(Screen::CategoryMenu),
            Screen::List(kind) => Some(Screen::SubMenu(category_of(*kind))),
            Screen::HostLogMenu => Some(Screen::Host),
            Screen::HostLogOutput => Some(Screen::HostLogMenu),
            _ => Some(self.previous_screen.clone()),
        }
    }

    fn activate_selection(&mut self) -> Command {
        match self.screen.clone() {
            Screen::CategoryMenu => {
                let category = ResourceCategory::ALL[self.cursor.min(3)];
                self.go_to(Screen::SubMenu(category));
                Command::None
            }
            Screen::SubMenu(category) => {
                let Some(kind) = category.kinds().get(self.cursor).copied() else {
                    return Command::None;
                };
                self.go_to(Screen::List(kind));
                self.screen_refresh_command()
            }
            Screen::List(kind) => {
                let Some(row) = self.selected_row(kind).cloned() else {
                    return Command::None;
                };
                self.detail = Some(DetailView {
                    kind,
                    name: row.name,
                    namespace: row.namespace,
                    body: row.detail,
                });
                self.go_to(Screen::Details);
                Command::None
            }
            Screen::NamespacePicker => {
                let filter = if self.cursor == 0 {
                    NamespaceFilter::All
                } else {
                    match self.namespaces.get(self.cursor - 1) {
                        Some(name) => NamespaceFilter::Named(name.clone()),
                        None => return Command::None,
                    }
                };
                if filter != self.namespace {
                    self.namespace = filter;
                    self.generation += 1;
                }
                self.go_back();
                self.screen_refresh_command()
            }
            Screen::HostLogMenu => {
                let Some(kind) = HostLogKind::ALL.get(self.cursor).copied() else {
                    return Command::None;
                };
                self.text_view = Some(TextView {
                    title: kind.title().to_string(),
                    body: "Loading…".to_string(),
                });
                self.go_to(Screen::HostLogOutput);
                Command::RunHostLog { kind }
            }
            _ => Command::None,
        }
    }

    fn apply_letter(&mut self, c: char) -> Command {
        if self.screen == Screen::ConfirmDelete {
            return self.answer_confirmation(c);
        }

        match c {
            'm' if !self.screen.is_modal() => {
                self.go_to(Screen::CategoryMenu);
                Command::None
            }
            'N' if !self.screen.is_modal() => {
                self.go_to(Screen::NamespacePicker);
                Command::FetchNamespaces
            }
            'D' if !self.screen.is_modal() => {
                self.go_to(Screen::Dashboard);
                self.screen_refresh_command()
            }
            'H' if !self.screen.is_modal() => {
                self.go_to(Screen::Host);
                self.screen_refresh_command()
            }
            'A' if !self.screen.is_modal() => {
                self.go_to(Screen::List(ResourceKind::Alerts));
                self.screen_refresh_command()
            }
            'Q' if !self.screen.is_modal() => {
                self.go_to(Screen::List(ResourceKind::ResourceQuotas));
                self.screen_refresh_command()
            }
            'L' if self.screen == Screen::Host => {
                self.go_to(Screen::HostLogMenu);
                Command::None
            }
            'r' => self.start_scale_or_menu(),
            'd' => self.start_delete(),
            'l' => self.start_pod_logs(),
            'y' => self.open_yaml(),
            'e' => self.start_patch_editor(),
            's' => self.start_alert_email(),
            _ => Command::None,
        }
    }

    fn answer_confirmation(&mut self, c: char) -> Command {
        match c {
            'y' | 'Y' => {
                let Some((namespace, name)) = self.pending_delete.take() else {
                    self.go_back();
                    return Command::None;
                };
                self.status = Some(format!("Deleting pod {namespace}/{name}…"));
                self.go_to(Screen::List(ResourceKind::Pods));
                Command::DeletePod { namespace, name }
            }
            'n' | 'N' => {
                self.pending_delete = None;
                self.go_back();
                Command::None
            }
            _ => Command::None,
        }
    }

    /// `r` scales when a deployment is in context, otherwise opens the
    /// resource menu. Mirrors the key's double duty in the original UI.
    fn start_scale_or_menu(&mut self) -> Command {
        if let Some(target) = self.action_target(ResourceKind::Deployments) {
            if target.namespace.is_some() {
                self.detail = Some(DetailView {
                    kind: target.kind,
                    name: target.name,
                    namespace: target.namespace,
                    body: target.body,
                });
                self.scale_draft.clear();
                self.go_to(Screen::ScaleInput);
            }
            return Command::None;
        }
        if !self.screen.is_modal() {
            self.go_to(Screen::CategoryMenu);
        }
        Command::None
    }

    fn start_delete(&mut self) -> Command {
        let Some(target) = self.action_target(ResourceKind::Pods) else {
            return Command::None;
        };
        let Some(namespace) = target.namespace.clone() else {
            return Command::None;
        };
        self.pending_delete = Some((namespace, target.name.clone()));
        self.go_to(Screen::ConfirmDelete);
        Command::None
    }

    fn start_pod_logs(&mut self) -> Command {
        let Some(target) = self.action_target(ResourceKind::Pods) else {
            return Command::None;
        };
        let Some(namespace) = target.namespace.clone() else {
            return Command::None;
        };
        let name = target.name.clone();
        self.text_view = Some(TextView {
            title: format!("Pod Logs {namespace}/{name}"),
            body: "Loading…".to_string(),
        });
        self.go_to(Screen::Logs);
        Command::FetchPodLogs { namespace, name }
    }

    fn open_yaml(&mut self) -> Command {
        let Some(target) = self.any_action_target() else {
            return Command::None;
        };
        self.text_view = Some(TextView {
            title: format!("{} {}", target.kind.title(), target.name),
            body: target.body,
        });
        self.go_to(Screen::Yaml);
        Command::None
    }

    fn start_patch_editor(&mut self) -> Command {
        let target = self
            .action_target(ResourceKind::Deployments)
            .or_else(|| self.action_target(ResourceKind::ResourceQuotas));
        let Some(target) = target else {
            return Command::None;
        };
        self.patch_draft = target.body.clone();
        self.detail = Some(DetailView {
            kind: target.kind,
            name: target.name,
            namespace: target.namespace,
            body: target.body,
        });
        self.go_to(Screen::PatchEditor);
        Command::None
    }

    fn start_alert_email(&mut self) -> Command {
        let Some(target) = self.action_target(ResourceKind::Alerts) else {
            return Command::None;
        };
        self.pending_email = Some((format!("Cluster alert: {}", target.name), target.body));
        self.smtp_form.active = 0;
        self.go_to(Screen::SmtpForm);
        Command::None
    }

    /// Resolves the object a kind-specific action key refers to: the selected
    /// row when the key is pressed on the matching list screen, or the open
    /// detail view when it holds an object of that kind.
    fn action_target(&self, kind: ResourceKind) -> Option<ActionTarget> {
        if self.screen == Screen::List(kind) {
            let row = self.selected_row(kind)?;
            return Some(ActionTarget {
                kind,
                name: row.name.clone(),
                namespace: row.namespace.clone(),
                body: row.detail.clone(),
            });
        }
        if self.screen == Screen::Details {
            let detail = self.detail.as_ref().filter(|detail| detail.kind == kind)?;
            return Some(ActionTarget {
                kind,
                name: detail.name.clone(),
                namespace: detail.namespace.clone(),
                body: detail.body.clone(),
            });
        }
        None
    }

    fn any_action_target(&self) -> Option<ActionTarget> {
        let kind = match &self.screen {
            Screen::List(kind) => *kind,
            Screen::Details => self.detail.as_ref()?.kind,
            _ => return None,
        };
        self.action_target(kind)
    }

    fn submit_input(&mut self) -> Command {
        match self.screen.clone() {
            Screen::ScaleInput => {
                let Some(target) = self.detail.clone() else {
                    self.go_back();
                    return Command::None;
                };
                let Ok(replicas) = self.scale_draft.trim().parse::<i32>() else {
                    self.status = Some(format!("Invalid replica count '{}'", self.scale_draft));
                    return Command::None;
                };
                let Some(namespace) = target.namespace else {
                    self.go_back();
                    return Command::None;
                };
                self.scale_draft.clear();
                self.go_back();
                Command::ScaleDeployment {
                    namespace,
                    name: target.name,
                    replicas,
                }
            }
            Screen::PatchEditor => {
                let Some(target) = self.detail.clone() else {
                    self.go_back();
                    return Command::None;
                };
                let body = std::mem::take(&mut self.patch_draft);
                self.go_back();
                Command::PatchResource {
                    kind: target.kind,
                    namespace: target.namespace,
                    name: target.name,
                    body,
                }
            }
            Screen::SmtpForm => {
                if self.smtp_form.active + 1 < self.smtp_form.fields.len() {
                    self.smtp_form.active += 1;
                    return Command::None;
                }
                let Some((subject, body)) = self.pending_email.take() else {
                    self.go_back();
                    return Command::None;
                };
                let settings = self.smtp_form.settings();
                self.go_back();
                Command::SendAlertEmail {
                    settings,
                    subject,
                    body,
                }
            }
            _ => Command::None,
        }
    }

    fn push_input(&mut self, c: char) {
        match self.screen {
            Screen::ScaleInput => self.scale_draft.push(c),
            Screen::PatchEditor => self.patch_draft.push(c),
            Screen::SmtpForm => self.smtp_form.fields[self.smtp_form.active].push(c),
            _ => {}
        }
    }

    fn pop_input(&mut self) {
        match self.screen {
            Screen::ScaleInput => {
                self.scale_draft.pop();
            }
            Screen::PatchEditor => {
                self.patch_draft.pop();
            }
            Screen::SmtpForm => {
                self.smtp_form.fields[self.smtp_form.active].pop();
            }
            _ => {}
        }
    }

    fn discard_input(&mut self) {
        match self.screen {
            Screen::ScaleInput => self.scale_draft.clear(),
            Screen::PatchEditor => self.patch_draft.clear(),
            Screen::SmtpForm => self.smtp_form = SmtpForm::default(),
            _ => {}
        }
    }

    fn selected_row(&self, kind: ResourceKind) -> Option<&RowData> {
        self.tables.get(&kind)?.rows.get(self.cursor)
    }

    fn current_list_len(&self) -> usize {
        match &self.screen {
            Screen::CategoryMenu => ResourceCategory::ALL.len(),
            Screen::SubMenu(category) => category.kinds().len(),
            Screen::List(kind) => self
                .tables
                .get(kind)
                .map(|table| table.rows.len())
                .unwrap_or(0),
            Screen::NamespacePicker => self.namespaces.len() + 1,
            Screen::HostLogMenu => HostLogKind::ALL.len(),
            _ => 0,
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.current_list_len();
        if len == 0 {
            self.cursor = 0;
            return;
        }
        let next = self.cursor as isize + delta;
        self.cursor = next.clamp(0, (len - 1) as isize) as usize;
    }

    fn clamp_cursor(&mut self) {
        let len = self.current_list_len();
        self.cursor = self.cursor.min(len.saturating_sub(1));
    }
}

#[derive(Debug, Clone)]
struct ActionTarget {
    kind: ResourceKind,
    name: String,
    namespace: Option<String>,
    body: String,
}

fn category_of(kind: ResourceKind) -> ResourceCategory {
    ResourceCategory::ALL
        .into_iter()
        .find(|category| category.kinds().contains(&kind))
        .unwrap_or(ResourceCategory::Cluster)
}

#[cfg(test)]
mod tests {
    use super::{App, Command, FetchOutcome, ListPayload};
    use crate::input::Action;
    use crate::model::{HostSnapshot, MetricsIndex, NamespaceFilter, ResourceKind, RowData, Screen};
    use chrono::Local;

    fn row(name: &str) -> RowData {
        RowData {
            name: name.to_string(),
            namespace: Some("default".to_string()),
            columns: vec![name.to_string()],
            detail: format!("name: {name}"),
        }
    }

    fn payload(names: &[&str]) -> ListPayload {
        ListPayload {
            headers: vec!["Name".to_string()],
            rows: names.iter().map(|name| row(name)).collect(),
            metrics: MetricsIndex::default(),
            refreshed_at: Local::now(),
        }
    }

    fn app_on_list(kind: ResourceKind, names: &[&str]) -> App {
        let mut app = App::new(NamespaceFilter::All);
        app.go_to(Screen::List(kind));
        let generation = app.generation;
        app.absorb(FetchOutcome::List {
            kind,
            generation,
            result: Ok(payload(names)),
        });
        app
    }

    #[test]
    fn cursor_is_clamped_under_arbitrary_key_sequences() {
        let mut app = app_on_list(ResourceKind::Pods, &["a", "b", "c"]);
        for action in [
            Action::Up,
            Action::Up,
            Action::Down,
            Action::Down,
            Action::Down,
            Action::Down,
            Action::Down,
            Action::Up,
        ] {
            app.apply_action(action);
            assert!(app.cursor() <= 2);
        }
        assert_eq!(app.cursor(), 1);
    }

    #[test]
    fn cursor_stays_at_zero_on_empty_list() {
        let mut app = app_on_list(ResourceKind::Pods, &[]);
        app.apply_action(Action::Down);
        app.apply_action(Action::Down);
        app.apply_action(Action::Up);
        assert_eq!(app.cursor(), 0);
    }

    #[test]
    fn entering_a_list_screen_resets_the_cursor() {
        let mut app = app_on_list(ResourceKind::Pods, &["a", "b", "c"]);
        app.apply_action(Action::Down);
        app.apply_action(Action::Down);
        assert_eq!(app.cursor(), 2);

        app.apply_action(Action::Key('A'));
        assert_eq!(app.screen(), &Screen::List(ResourceKind::Alerts));
        assert_eq!(app.cursor(), 0);
    }

    #[test]
    fn failed_fetch_keeps_the_previous_snapshot() {
        let mut app = app_on_list(ResourceKind::Pods, &["a", "b"]);
        let generation = app.generation;
        app.absorb(FetchOutcome::List {
            kind: ResourceKind::Pods,
            generation,
            result: Err("connection refused".to_string()),
        });

        let table = app.table(ResourceKind::Pods).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(app.last_error(), Some("connection refused"));
    }

    #[test]
    fn successful_fetch_replaces_snapshot_and_clears_banner() {
        let mut app = app_on_list(ResourceKind::Pods, &["a", "b"]);
        let generation = app.generation;
        app.absorb(FetchOutcome::List {
            kind: ResourceKind::Pods,
            generation,
            result: Err("boom".to_string()),
        });
        app.absorb(FetchOutcome::List {
            kind: ResourceKind::Pods,
            generation,
            result: Ok(payload(&["c"])),
        });

        let table = app.table(ResourceKind::Pods).unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].name, "c");
        assert_eq!(app.last_error(), None);
    }

    #[test]
    fn namespace_selection_propagates_to_fetches_and_title() {
        let mut app = app_on_list(ResourceKind::Pods, &["a"]);
        app.absorb(FetchOutcome::Namespaces {
            result: Ok(vec!["default".to_string(), "kube-system".to_string()]),
        });
        app.apply_action(Action::Key('N'));
        assert_eq!(app.screen(), &Screen::NamespacePicker);

        // entry 0 is "[ All Namespaces ]", entry 2 is kube-system
        app.apply_action(Action::Down);
        app.apply_action(Action::Down);
        let command = app.apply_action(Action::Enter);

        assert_eq!(
            app.namespace(),
            &NamespaceFilter::Named("kube-system".to_string())
        );
        match command {
            Command::FetchList {
                kind, namespace, ..
            } => {
                assert_eq!(kind, ResourceKind::Pods);
                assert_eq!(namespace, NamespaceFilter::Named("kube-system".to_string()));
            }
            other => panic!("expected a list fetch, got {other:?}"),
        }
        assert_eq!(app.list_title(ResourceKind::Pods), "Pods (kube-system)");
    }

    #[test]
    fn declined_delete_issues_no_call_and_returns_to_details() {
        let mut app = app_on_list(ResourceKind::Pods, &["doomed"]);
        app.apply_action(Action::Enter);
        assert_eq!(app.screen(), &Screen::Details);

        let command = app.apply_action(Action::Key('d'));
        assert_eq!(command, Command::None);
        assert_eq!(app.screen(), &Screen::ConfirmDelete);

        let command = app.apply_action(Action::Key('n'));
        assert_eq!(command, Command::None);
        assert_eq!(app.screen(), &Screen::Details);
        assert!(app.pending_delete().is_none());
        assert_eq!(app.table(ResourceKind::Pods).unwrap().rows.len(), 1);
    }

    #[test]
    fn confirmed_delete_issues_the_call() {
        let mut app = app_on_list(ResourceKind::Pods, &["doomed"]);
        app.apply_action(Action::Enter);
        app.apply_action(Action::Key('d'));
        let command = app.apply_action(Action::Key('y'));
        assert_eq!(
            command,
            Command::DeletePod {
                namespace: "default".to_string(),
                name: "doomed".to_string(),
            }
        );
        assert_eq!(app.screen(), &Screen::List(ResourceKind::Pods));
    }

    #[test]
    fn stale_list_response_after_namespace_change_is_discarded() {
        let mut app = app_on_list(ResourceKind::Pods, &["old-pod"]);
        let stale_generation = app.generation;

        app.absorb(FetchOutcome::Namespaces {
            result: Ok(vec!["kube-system".to_string()]),
        });
        app.apply_action(Action::Key('N'));
        app.apply_action(Action::Down);
        app.apply_action(Action::Enter);
        assert!(app.generation > stale_generation);

        app.absorb(FetchOutcome::List {
            kind: ResourceKind::Pods,
            generation: stale_generation,
            result: Ok(payload(&["late-arrival"])),
        });
        assert_eq!(
            app.table(ResourceKind::Pods).unwrap().rows[0].name,
            "old-pod"
        );
    }

    #[test]
    fn list_response_for_an_abandoned_screen_is_discarded() {
        let mut app = app_on_list(ResourceKind::Pods, &["pod-a"]);
        let generation = app.generation;
        app.apply_action(Action::Key('D'));
        assert_eq!(app.screen(), &Screen::Dashboard);

        app.absorb(FetchOutcome::List {
            kind: ResourceKind::Pods,
            generation,
            result: Ok(payload(&["late"])),
        });
        assert_eq!(app.table(ResourceKind::Pods).unwrap().rows[0].name, "pod-a");
    }

    #[test]
    fn quit_is_unreachable_from_modal_screens() {
        let mut app = app_on_list(ResourceKind::Pods, &["p"]);
        app.apply_action(Action::Enter);
        app.apply_action(Action::Key('d'));
        assert_eq!(app.screen(), &Screen::ConfirmDelete);

        let command = app.apply_action(Action::Quit);
        assert_eq!(command, Command::None);
        assert!(app.running());
    }

    #[test]
    fn scale_input_cancel_discards_draft_and_returns() {
        let mut app = app_on_list(ResourceKind::Deployments, &["web"]);
        app.apply_action(Action::Enter);
        app.apply_action(Action::Key('r'));
        assert_eq!(app.screen(), &Screen::ScaleInput);

        app.apply_action(Action::InputChar('4'));
        app.apply_action(Action::CancelInput);
        assert_eq!(app.screen(), &Screen::Details);
        assert_eq!(app.scale_draft(), "");
    }

    #[test]
    fn scale_submit_issues_merge_patch_command() {
        let mut app = app_on_list(ResourceKind::Deployments, &["web"]);
        app.apply_action(Action::Enter);
        app.apply_action(Action::Key('r'));
        app.apply_action(Action::InputChar('4'));
        let command = app.apply_action(Action::SubmitInput);
        assert_eq!(
            command,
            Command::ScaleDeployment {
                namespace: "default".to_string(),
                name: "web".to_string(),
                replicas: 4,
            }
        );
    }

    #[test]
    fn action_keys_are_noops_on_mismatched_kinds() {
        let mut app = app_on_list(ResourceKind::Services, &["svc"]);
        app.apply_action(Action::Enter);

        let command = app.apply_action(Action::Key('d'));
        assert_eq!(command, Command::None);
        assert_eq!(app.screen(), &Screen::Details);
        let command = app.apply_action(Action::Key('l'));
        assert_eq!(command, Command::None);
        assert_eq!(app.screen(), &Screen::Details);
    }

    #[test]
    fn back_from_top_level_menu_does_not_quit() {
        let mut app = App::new(NamespaceFilter::All);
        app.apply_action(Action::Back);
        assert!(app.running());
        assert_eq!(app.screen(), &Screen::CategoryMenu);
    }

    #[test]
    fn menus_own_no_tick_fetch() {
        let app = App::new(NamespaceFilter::All);
        assert_eq!(app.screen_refresh_command(), Command::None);
    }

    #[test]
    fn stale_pod_log_response_for_another_pod_is_discarded() {
        let mut app = app_on_list(ResourceKind::Pods, &["pod-a", "pod-b"]);
        app.apply_action(Action::Key('l'));
        assert_eq!(app.screen(), &Screen::Logs);
        app.apply_action(Action::Back);
        app.apply_action(Action::Down);
        app.apply_action(Action::Key('l'));

        app.absorb(FetchOutcome::PodLogs {
            title: "Pod Logs default/pod-a".to_string(),
            result: Ok("old pod-a logs".to_string()),
        });
        let view = app.text_view().unwrap();
        assert_eq!(view.title, "Pod Logs default/pod-b");
        assert_eq!(view.body, "Loading…");

        app.absorb(FetchOutcome::PodLogs {
            title: "Pod Logs default/pod-b".to_string(),
            result: Ok("fresh pod-b logs".to_string()),
        });
        assert_eq!(app.text_view().unwrap().body, "fresh pod-b logs");
    }

    #[test]
    fn host_sample_after_leaving_host_screen_is_discarded() {
        let mut app = App::new(NamespaceFilter::All);
        app.apply_action(Action::Key('H'));
        app.apply_action(Action::Key('m'));

        app.absorb(FetchOutcome::Host {
            result: Ok(HostSnapshot::default()),
        });
        assert!(app.host().is_none());
    }

    #[test]
    fn escaping_delete_confirmation_clears_the_pending_target() {
        let mut app = app_on_list(ResourceKind::Pods, &["doomed"]);
        app.apply_action(Action::Enter);
        app.apply_action(Action::Key('d'));
        assert!(app.pending_delete().is_some());

        app.apply_action(Action::Back);
        assert_eq!(app.screen(), &Screen::Details);
        assert!(app.pending_delete().is_none());
    }

    #[test]
    fn navigation_fetches_occupy_the_inflight_slot() {
        let mut app = app_on_list(ResourceKind::Pods, &["a"]);
        assert!(!app.refresh_inflight());

        let command = app.apply_action(Action::Key('A'));
        assert!(matches!(command, Command::FetchList { .. }));
        assert!(app.refresh_inflight());

        let generation = app.generation;
        app.absorb(FetchOutcome::List {
            kind: ResourceKind::Alerts,
            generation,
            result: Ok(payload(&[])),
        });
        assert!(!app.refresh_inflight());
    }

    #[test]
    fn list_screens_own_their_fetch() {
        let app = app_on_list(ResourceKind::Pods, &["a"]);
        match app.screen_refresh_command() {
            Command::FetchList { kind, .. } => assert_eq!(kind, ResourceKind::Pods),
            other => panic!("expected list fetch, got {other:?}"),
        }
    }
}
