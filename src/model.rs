use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ResourceKind {
    Nodes,
    Pods,
    Deployments,
    StatefulSets,
    DaemonSets,
    Services,
    NetworkPolicies,
    PersistentVolumeClaims,
    PersistentVolumes,
    Events,
    Alerts,
    ResourceQuotas,
}

impl ResourceKind {
    pub fn title(self) -> &'static str {
        match self {
            Self::Nodes => "Nodes",
            Self::Pods => "Pods",
            Self::Deployments => "Deployments",
            Self::StatefulSets => "StatefulSets",
            Self::DaemonSets => "DaemonSets",
            Self::Services => "Services",
            Self::NetworkPolicies => "NetworkPolicies",
            Self::PersistentVolumeClaims => "PersistentVolumeClaims",
            Self::PersistentVolumes => "PersistentVolumes",
            Self::Events => "Events",
            Self::Alerts => "Alerts",
            Self::ResourceQuotas => "ResourceQuotas",
        }
    }

    /// Message shown instead of an empty table.
    pub fn empty_label(self) -> String {
        format!("No {} found.", self.title())
    }

    pub fn namespaced(self) -> bool {
        !matches!(self, Self::Nodes | Self::PersistentVolumes)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ResourceCategory {
    Workloads,
    Storage,
    Network,
    Cluster,
}

impl ResourceCategory {
    pub const ALL: [Self; 4] = [Self::Workloads, Self::Storage, Self::Network, Self::Cluster];

    pub fn title(self) -> &'static str {
        match self {
            Self::Workloads => "Workloads",
            Self::Storage => "Storage",
            Self::Network => "Network",
            Self::Cluster => "Cluster",
        }
    }

    pub fn kinds(self) -> &'static [ResourceKind] {
        match self {
            Self::Workloads => &[
                ResourceKind::Pods,
                ResourceKind::Deployments,
                ResourceKind::StatefulSets,
                ResourceKind::DaemonSets,
            ],
            Self::Storage => &[
                ResourceKind::PersistentVolumeClaims,
                ResourceKind::PersistentVolumes,
            ],
            Self::Network => &[ResourceKind::Services, ResourceKind::NetworkPolicies],
            Self::Cluster => &[
                ResourceKind::Nodes,
                ResourceKind::Events,
                ResourceKind::Alerts,
                ResourceKind::ResourceQuotas,
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum HostLogKind {
    System,
    Kubelet,
    Docker,
}

impl HostLogKind {
    pub const ALL: [Self; 3] = [Self::System, Self::Kubelet, Self::Docker];

    pub fn title(self) -> &'static str {
        match self {
            Self::System => "System Logs",
            Self::Kubelet => "Kubelet Logs",
            Self::Docker => "Docker Logs",
        }
    }

    pub fn unit(self) -> Option<&'static str> {
        match self {
            Self::System => None,
            Self::Kubelet => Some("kubelet.service"),
            Self::Docker => Some("docker.service"),
        }
    }
}

/// One named UI state. `previous_screen` in the state machine holds exactly
/// one of these, so back-navigation is a single-slot pointer, not a stack.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Screen {
    CategoryMenu,
    SubMenu(ResourceCategory),
    List(ResourceKind),
    Details,
    Yaml,
    Logs,
    ScaleInput,
    ConfirmDelete,
    PatchEditor,
    NamespacePicker,
    Dashboard,
    Host,
    HostLogMenu,
    HostLogOutput,
    SmtpForm,
    Help,
}

impl Screen {
    pub fn list_kind(&self) -> Option<ResourceKind> {
        match self {
            Self::List(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Modal screens swallow global keys; their cancel returns to the
    /// previous screen and never to quit.
    pub fn is_modal(&self) -> bool {
        matches!(
            self,
            Self::ScaleInput | Self::ConfirmDelete | Self::PatchEditor | Self::SmtpForm
        )
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum NamespaceFilter {
    All,
    Named(String),
}

impl NamespaceFilter {
    pub fn label(&self) -> String {
        match self {
            Self::All => "all".to_string(),
            Self::Named(namespace) => namespace.clone(),
        }
    }
}

impl Display for NamespaceFilter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Named(namespace) => write!(f, "{namespace}"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RowData {
    pub name: String,
    pub namespace: Option<String>,
    pub columns: Vec<String>,
    pub detail: String,
}

/// Snapshot of the most recent successful list fetch for one kind. Replaced
/// wholesale on every success; a failed fetch leaves it untouched.
#[derive(Debug, Clone, Default)]
pub struct TableData {
    pub headers: Vec<String>,
    pub rows: Vec<RowData>,
    pub last_refreshed: Option<DateTime<Local>>,
}

impl TableData {
    pub fn replace(&mut self, headers: Vec<String>, rows: Vec<RowData>, at: DateTime<Local>) {
        self.headers = headers;
        self.rows = rows;
        self.last_refreshed = Some(at);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageSample {
    pub cpu_millicores: u64,
    pub memory_bytes: u64,
}

/// Point-in-time usage samples keyed by object name. A missing key means
/// "no sample", which is distinct from a measured zero.
#[derive(Debug, Clone, Default)]
pub struct MetricsIndex {
    samples: HashMap<String, UsageSample>,
}

impl MetricsIndex {
    pub fn insert(&mut self, name: impl Into<String>, sample: UsageSample) {
        self.samples.insert(name.into(), sample);
    }

    pub fn sample(&self, name: &str) -> Option<UsageSample> {
        self.samples.get(name).copied()
    }
}

/// Capacity side of the dashboard aggregation, taken from node allocatable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeCapacity {
    pub name: String,
    pub cpu_millicores: u64,
    pub memory_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedUsage {
    pub name: String,
    pub value: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardData {
    pub cpu_usage_millicores: u64,
    pub cpu_capacity_millicores: u64,
    pub memory_usage_bytes: u64,
    pub memory_capacity_bytes: u64,
    pub node_count: usize,
    pub pod_count: usize,
    pub top_pods_cpu: Vec<RankedUsage>,
    pub top_pods_memory: Vec<RankedUsage>,
    pub top_nodes_cpu: Vec<RankedUsage>,
    pub top_nodes_memory: Vec<RankedUsage>,
}

#[derive(Debug, Clone, Default)]
pub struct HostSnapshot {
    pub cpu_percent: f32,
    pub memory_percent: f32,
    pub disks: Vec<DiskUsage>,
}

#[derive(Debug, Clone)]
pub struct DiskUsage {
    pub mount: String,
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::{NamespaceFilter, ResourceCategory, ResourceKind, Screen};

    #[test]
    fn empty_label_names_the_kind() {
        assert_eq!(ResourceKind::Pods.empty_label(), "No Pods found.");
        assert_eq!(
            ResourceKind::NetworkPolicies.empty_label(),
            "No NetworkPolicies found."
        );
    }

    #[test]
    fn every_kind_belongs_to_exactly_one_category() {
        let all_kinds = [
            ResourceKind::Nodes,
            ResourceKind::Pods,
            ResourceKind::Deployments,
            ResourceKind::StatefulSets,
            ResourceKind::DaemonSets,
            ResourceKind::Services,
            ResourceKind::NetworkPolicies,
            ResourceKind::PersistentVolumeClaims,
            ResourceKind::PersistentVolumes,
            ResourceKind::Events,
            ResourceKind::Alerts,
            ResourceKind::ResourceQuotas,
        ];
        for kind in all_kinds {
            let memberships = ResourceCategory::ALL
                .iter()
                .filter(|category| category.kinds().contains(&kind))
                .count();
            assert_eq!(memberships, 1, "{} categories for {kind:?}", memberships);
        }
    }

    #[test]
    fn cluster_scoped_kinds_are_not_namespaced() {
        assert!(!ResourceKind::Nodes.namespaced());
        assert!(!ResourceKind::PersistentVolumes.namespaced());
        assert!(ResourceKind::Pods.namespaced());
        assert!(ResourceKind::Events.namespaced());
    }

    #[test]
    fn modal_screens_are_flagged() {
        assert!(Screen::ConfirmDelete.is_modal());
        assert!(Screen::ScaleInput.is_modal());
        assert!(Screen::PatchEditor.is_modal());
        assert!(!Screen::List(ResourceKind::Pods).is_modal());
        assert!(!Screen::Dashboard.is_modal());
    }

    #[test]
    fn namespace_filter_labels() {
        assert_eq!(NamespaceFilter::All.label(), "all");
        assert_eq!(
            NamespaceFilter::Named("kube-system".to_string()).label(),
            "kube-system"
        );
    }
}
