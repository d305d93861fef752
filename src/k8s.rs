use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, StatefulSet};
use k8s_openapi::api::core::v1::{
    Event, Namespace, Node, PersistentVolume, PersistentVolumeClaim, Pod, ResourceQuota, Service,
};
use k8s_openapi::api::networking::v1::NetworkPolicy;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::api::{Api, DeleteParams, ListParams, LogParams, Patch, PatchParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::core::{ApiResource, DynamicObject, GroupVersionKind};
use kube::{Client, Config, ResourceExt};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::aggregate;
use crate::app::ListPayload;
use crate::model::{
    DashboardData, MetricsIndex, NamespaceFilter, NodeCapacity, ResourceKind, RowData, UsageSample,
};

/// Thin facade over the Kubernetes API. Every method maps one logical
/// operation to typed `kube` calls and normalizes the result into the
/// row/snapshot shapes the rest of the program consumes.
#[derive(Clone)]
pub struct ClusterGateway {
    client: Client,
    default_namespace: String,
}

impl ClusterGateway {
    pub async fn new(kubeconfig_path: Option<&Path>) -> Result<Self> {
        let kubeconfig = match kubeconfig_path {
            Some(path) => Some(Kubeconfig::read_from(path).with_context(|| {
                format!("failed to read kubeconfig from {}", path.display())
            })?),
            None => Kubeconfig::read().ok(),
        };

        let config = if let Some(kubeconfig) = kubeconfig {
            Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                .await
                .context("failed to build Kubernetes configuration")?
        } else {
            Config::infer()
                .await
                .context("failed to infer Kubernetes configuration")?
        };

        let default_namespace = config.default_namespace.clone();
        let client = Client::try_from(config).context("failed to initialize Kubernetes client")?;

        Ok(Self {
            client,
            default_namespace,
        })
    }

    pub fn default_namespace(&self) -> &str {
        &self.default_namespace
    }

    pub async fn fetch_list(
        &self,
        kind: ResourceKind,
        scope: &NamespaceFilter,
    ) -> Result<ListPayload> {
        let (headers, mut rows) = match kind {
            ResourceKind::Nodes => self.fetch_nodes().await?,
            ResourceKind::Pods => self.fetch_pods(scope).await?,
            ResourceKind::Deployments => self.fetch_deployments(scope).await?,
            ResourceKind::StatefulSets => self.fetch_statefulsets(scope).await?,
            ResourceKind::DaemonSets => self.fetch_daemonsets(scope).await?,
            ResourceKind::Services => self.fetch_services(scope).await?,
            ResourceKind::NetworkPolicies => self.fetch_network_policies(scope).await?,
            ResourceKind::PersistentVolumeClaims => self.fetch_pvcs(scope).await?,
            ResourceKind::PersistentVolumes => self.fetch_pvs().await?,
            ResourceKind::Events => self.fetch_events(scope, false).await?,
            ResourceKind::Alerts => self.fetch_events(scope, true).await?,
            ResourceKind::ResourceQuotas => self.fetch_quotas(scope).await?,
        };

        // events arrive pre-sorted newest first; everything else sorts by
        // namespace then name for a stable cursor across refreshes
        if !matches!(kind, ResourceKind::Events | ResourceKind::Alerts) {
            rows.sort_by(|left, right| {
                (left.namespace.as_deref(), left.name.as_str())
                    .cmp(&(right.namespace.as_deref(), right.name.as_str()))
            });
        }

        // usage samples are best effort; a cluster without metrics-server
        // still lists pods and nodes, just without the usage columns
        let metrics = match kind {
            ResourceKind::Pods => self.fetch_pod_metrics(scope).await.unwrap_or_else(|error| {
                debug!(%error, "pod metrics unavailable");
                MetricsIndex::default()
            }),
            ResourceKind::Nodes => self.fetch_node_metrics().await.unwrap_or_else(|error| {
                debug!(%error, "node metrics unavailable");
                MetricsIndex::default()
            }),
            _ => MetricsIndex::default(),
        };

        Ok(ListPayload {
            headers,
            rows,
            metrics,
            refreshed_at: Local::now(),
        })
    }

    pub async fn fetch_dashboard(&self) -> Result<DashboardData> {
        let nodes_api: Api<Node> = Api::all(self.client.clone());
        let node_list = nodes_api.list(&list_params()).await?;
        let nodes = node_list
            .into_iter()
            .map(|node| {
                let name = node.name_any();
                let allocatable = node
                    .status
                    .as_ref()
                    .and_then(|status| status.allocatable.as_ref());
                let cpu_millicores = allocatable
                    .and_then(|map| map.get("cpu"))
                    .and_then(|quantity| parse_cpu_millicores(&quantity.0))
                    .unwrap_or(0);
                let memory_bytes = allocatable
                    .and_then(|map| map.get("memory"))
                    .and_then(|quantity| parse_memory_bytes(&quantity.0))
                    .unwrap_or(0);
                NodeCapacity {
                    name,
                    cpu_millicores,
                    memory_bytes,
                }
            })
            .collect::<Vec<_>>();

        let pods_api: Api<Pod> = Api::all(self.client.clone());
        let pod_list = pods_api.list(&list_params()).await?;
        let pod_names = pod_list
            .into_iter()
            .map(|pod| pod.name_any())
            .collect::<Vec<_>>();

        let node_metrics = self.fetch_node_metrics().await.unwrap_or_default();
        let pod_metrics = self
            .fetch_pod_metrics(&NamespaceFilter::All)
            .await
            .unwrap_or_default();

        Ok(aggregate::build_dashboard(
            &nodes,
            &node_metrics,
            &pod_names,
            &pod_metrics,
        ))
    }

    pub async fn fetch_namespaces(&self) -> Result<Vec<String>> {
        let namespaces: Api<Namespace> = Api::all(self.client.clone());
        let list = namespaces.list(&list_params()).await?;
        let mut names = list
            .into_iter()
            .map(|namespace| namespace.name_any())
            .collect::<Vec<_>>();
        names.sort();
        Ok(names)
    }

    pub async fn fetch_pod_logs(&self, namespace: &str, pod_name: &str) -> Result<String> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let params = LogParams {
            tail_lines: Some(500),
            timestamps: true,
            ..LogParams::default()
        };

        let logs = pods
            .logs(pod_name, &params)
            .await
            .with_context(|| format!("failed to load logs for {namespace}/{pod_name}"))?;

        Ok(logs)
    }

    pub async fn delete_pod(&self, namespace: &str, name: &str) -> Result<()> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let _ = api
            .delete(name, &DeleteParams::default())
            .await
            .with_context(|| format!("failed to delete pod {namespace}/{name}"))?;
        Ok(())
    }

    pub async fn scale_deployment(
        &self,
        namespace: &str,
        name: &str,
        replicas: i32,
    ) -> Result<()> {
        let patch = serde_json::json!({ "spec": { "replicas": replicas } });
        let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        let _ = api
            .patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .with_context(|| format!("failed to scale deployment {namespace}/{name}"))?;
        Ok(())
    }

    /// Applies an edited manifest as a merge patch. Only the editable kinds
    /// are accepted; everything else is a hard error.
    pub async fn patch_resource(
        &self,
        kind: ResourceKind,
        namespace: Option<&str>,
        name: &str,
        body: &str,
    ) -> Result<()> {
        let value: Value =
            serde_yaml::from_str(body).context("edited manifest is not valid YAML")?;
        let params = PatchParams::default();

        match kind {
            ResourceKind::Deployments => {
                let namespace = namespace.context("namespace is required for deployment edit")?;
                let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
                let _ = api
                    .patch(name, &params, &Patch::Merge(&value))
                    .await
                    .with_context(|| format!("failed to patch deployment {namespace}/{name}"))?;
            }
            ResourceKind::ResourceQuotas => {
                let namespace = namespace.context("namespace is required for quota edit")?;
                let api: Api<ResourceQuota> = Api::namespaced(self.client.clone(), namespace);
                let _ = api
                    .patch(name, &params, &Patch::Merge(&value))
                    .await
                    .with_context(|| format!("failed to patch quota {namespace}/{name}"))?;
            }
            other => anyhow::bail!("edit is not supported for {}", other.title()),
        }

        Ok(())
    }

    async fn fetch_pod_metrics(&self, scope: &NamespaceFilter) -> Result<MetricsIndex> {
        let gvk = GroupVersionKind::gvk("metrics.k8s.io", "v1beta1", "PodMetrics");
        let resource = ApiResource::from_gvk_with_plural(&gvk, "pods");
        let api: Api<DynamicObject> = match scope {
            NamespaceFilter::All => Api::all_with(self.client.clone(), &resource),
            NamespaceFilter::Named(namespace) => {
                Api::namespaced_with(self.client.clone(), namespace, &resource)
            }
        };

        let list = api.list(&list_params()).await?;
        let mut index = MetricsIndex::default();
        for pod_metric in list {
            let (cpu_millicores, memory_bytes) = parse_pod_metrics_usage(&pod_metric.data);
            index.insert(
                pod_metric.name_any(),
                UsageSample {
                    cpu_millicores,
                    memory_bytes,
                },
            );
        }
        Ok(index)
    }

    async fn fetch_node_metrics(&self) -> Result<MetricsIndex> {
        let gvk = GroupVersionKind::gvk("metrics.k8s.io", "v1beta1", "NodeMetrics");
        let resource = ApiResource::from_gvk_with_plural(&gvk, "nodes");
        let api: Api<DynamicObject> = Api::all_with(self.client.clone(), &resource);

        let list = api.list(&list_params()).await?;
        let mut index = MetricsIndex::default();
        for node_metric in list {
            let (cpu_millicores, memory_bytes) = parse_usage_from_value(&node_metric.data["usage"]);
            index.insert(
                node_metric.name_any(),
                UsageSample {
                    cpu_millicores,
                    memory_bytes,
                },
            );
        }
        Ok(index)
    }

    async fn fetch_nodes(&self) -> Result<(Vec<String>, Vec<RowData>)> {
        let nodes: Api<Node> = Api::all(self.client.clone());
        let list = nodes.list(&list_params()).await?;
        let rows = list
            .into_iter()
            .map(|node| {
                let name = node.name_any();
                let ready = node
                    .status
                    .as_ref()
                    .and_then(|status| status.conditions.as_ref())
                    .and_then(|conditions| {
                        conditions
                            .iter()
                            .find(|condition| condition.type_ == "Ready")
                    })
                    .map(|condition| match condition.status.as_str() {
                        "True" => "Ready".to_string(),
                        "False" => "NotReady".to_string(),
                        _ => "Unknown".to_string(),
                    })
                    .unwrap_or_else(|| "Unknown".to_string());
                let version = node
                    .status
                    .as_ref()
                    .and_then(|status| status.node_info.as_ref())
                    .map(|info| info.kubelet_version.clone())
                    .unwrap_or_else(|| "-".to_string());
                let roles = node_roles(&node);
                let age = human_age(node.metadata.creation_timestamp.as_ref());

                RowData {
                    name: name.clone(),
                    namespace: None,
                    columns: vec![name, ready, roles, version, age],
                    detail: yaml_detail(&node),
                }
            })
            .collect::<Vec<_>>();

        Ok((
            vec![
                "Name".to_string(),
                "Ready".to_string(),
                "Roles".to_string(),
                "Version".to_string(),
                "Age".to_string(),
            ],
            rows,
        ))
    }

    async fn fetch_pods(&self, scope: &NamespaceFilter) -> Result<(Vec<String>, Vec<RowData>)> {
        let pods: Api<Pod> = match scope {
            NamespaceFilter::All => Api::all(self.client.clone()),
            NamespaceFilter::Named(namespace) => Api::namespaced(self.client.clone(), namespace),
        };

        let list = pods.list(&list_params()).await?;
        let rows = list
            .into_iter()
            .map(|pod| {
                let name = pod.name_any();
                let namespace = pod.namespace();
                let status = pod
                    .status
                    .as_ref()
                    .and_then(|value| value.phase.clone())
                    .unwrap_or_else(|| "Unknown".to_string());
                let node = pod
                    .spec
                    .as_ref()
                    .and_then(|spec| spec.node_name.clone())
                    .unwrap_or_else(|| "-".to_string());
                let (ready, total, restarts) =
                    pod.status.as_ref().map(pod_readiness).unwrap_or((0, 0, 0));
                let age = human_age(pod.metadata.creation_timestamp.as_ref());

                RowData {
                    name: name.clone(),
                    namespace: namespace.clone(),
                    columns: vec![
                        name,
                        namespace.unwrap_or_else(|| "-".to_string()),
                        node,
                        format!("{ready}/{total}"),
                        status,
                        restarts.to_string(),
                        age,
                    ],
                    detail: yaml_detail(&pod),
                }
            })
            .collect::<Vec<_>>();

        Ok((
            vec![
                "Name".to_string(),
                "Namespace".to_string(),
                "Node".to_string(),
                "Ready".to_string(),
                "Status".to_string(),
                "Restarts".to_string(),
                "Age".to_string(),
            ],
            rows,
        ))
    }

    async fn fetch_deployments(
        &self,
        scope: &NamespaceFilter,
    ) -> Result<(Vec<String>, Vec<RowData>)> {
        let deployments: Api<Deployment> = match scope {
            NamespaceFilter::All => Api::all(self.client.clone()),
            NamespaceFilter::Named(namespace) => Api::namespaced(self.client.clone(), namespace),
        };

        let list = deployments.list(&list_params()).await?;
        let rows = list
            .into_iter()
            .map(|deployment| {
                let name = deployment.name_any();
                let namespace = deployment.namespace();
                let desired = deployment
                    .spec
                    .as_ref()
                    .and_then(|spec| spec.replicas)
                    .unwrap_or(0);
                let ready = deployment
                    .status
                    .as_ref()
                    .and_then(|status| status.ready_replicas)
                    .unwrap_or(0);
                let updated = deployment
                    .status
                    .as_ref()
                    .and_then(|status| status.updated_replicas)
                    .unwrap_or(0);
                let available = deployment
                    .status
                    .as_ref()
                    .and_then(|status| status.available_replicas)
                    .unwrap_or(0);
                let age = human_age(deployment.metadata.creation_timestamp.as_ref());

                RowData {
                    name: name.clone(),
                    namespace: namespace.clone(),
                    columns: vec![
                        name,
                        namespace.unwrap_or_else(|| "-".to_string()),
                        format!("{ready}/{desired}"),
                        updated.to_string(),
                        available.to_string(),
                        age,
                    ],
                    detail: yaml_detail(&deployment),
                }
            })
            .collect::<Vec<_>>();

        Ok((
            vec![
                "Name".to_string(),
                "Namespace".to_string(),
                "Ready".to_string(),
                "Up-to-date".to_string(),
                "Available".to_string(),
                "Age".to_string(),
            ],
            rows,
        ))
    }

    async fn fetch_statefulsets(
        &self,
        scope: &NamespaceFilter,
    ) -> Result<(Vec<String>, Vec<RowData>)> {
        let statefulsets: Api<StatefulSet> = match scope {
            NamespaceFilter::All => Api::all(self.client.clone()),
            NamespaceFilter::Named(namespace) => Api::namespaced(self.client.clone(), namespace),
        };

        let list = statefulsets.list(&list_params()).await?;
        let rows = list
            .into_iter()
            .map(|statefulset| {
                let name = statefulset.name_any();
                let namespace = statefulset.namespace();
                let desired = statefulset
                    .spec
                    .as_ref()
                    .and_then(|spec| spec.replicas)
                    .unwrap_or(0);
                let ready = statefulset
                    .status
                    .as_ref()
                    .and_then(|status| status.ready_replicas)
                    .unwrap_or(0);
                let age = human_age(statefulset.metadata.creation_timestamp.as_ref());

                RowData {
                    name: name.clone(),
                    namespace: namespace.clone(),
                    columns: vec![
                        name,
                        namespace.unwrap_or_else(|| "-".to_string()),
                        format!("{ready}/{desired}"),
                        age,
                    ],
                    detail: yaml_detail(&statefulset),
                }
            })
            .collect::<Vec<_>>();

        Ok((
            vec![
                "Name".to_string(),
                "Namespace".to_string(),
                "Ready".to_string(),
                "Age".to_string(),
            ],
            rows,
        ))
    }

    async fn fetch_daemonsets(
        &self,
        scope: &NamespaceFilter,
    ) -> Result<(Vec<String>, Vec<RowData>)> {
        let daemonsets: Api<DaemonSet> = match scope {
            NamespaceFilter::All => Api::all(self.client.clone()),
            NamespaceFilter::Named(namespace) => Api::namespaced(self.client.clone(), namespace),
        };

        let list = daemonsets.list(&list_params()).await?;
        let rows = list
            .into_iter()
            .map(|daemonset| {
                let name = daemonset.name_any();
                let namespace = daemonset.namespace();
                let desired = daemonset
                    .status
                    .as_ref()
                    .map(|status| status.desired_number_scheduled)
                    .unwrap_or(0);
                let ready = daemonset
                    .status
                    .as_ref()
                    .map(|status| status.number_ready)
                    .unwrap_or(0);
                let available = daemonset
                    .status
                    .as_ref()
                    .and_then(|status| status.number_available)
                    .unwrap_or(0);
                let age = human_age(daemonset.metadata.creation_timestamp.as_ref());

                RowData {
                    name: name.clone(),
                    namespace: namespace.clone(),
                    columns: vec![
                        name,
                        namespace.unwrap_or_else(|| "-".to_string()),
                        desired.to_string(),
                        ready.to_string(),
                        available.to_string(),
                        age,
                    ],
                    detail: yaml_detail(&daemonset),
                }
            })
            .collect::<Vec<_>>();

        Ok((
            vec![
                "Name".to_string(),
                "Namespace".to_string(),
                "Desired".to_string(),
                "Ready".to_string(),
                "Available".to_string(),
                "Age".to_string(),
            ],
            rows,
        ))
    }

    async fn fetch_services(&self, scope: &NamespaceFilter) -> Result<(Vec<String>, Vec<RowData>)> {
        let services: Api<Service> = match scope {
            NamespaceFilter::All => Api::all(self.client.clone()),
            NamespaceFilter::Named(namespace) => Api::namespaced(self.client.clone(), namespace),
        };

        let list = services.list(&list_params()).await?;
        let rows = list
            .into_iter()
            .map(|service| {
                let name = service.name_any();
                let namespace = service.namespace();
                let service_type = service
                    .spec
                    .as_ref()
                    .and_then(|spec| spec.type_.clone())
                    .unwrap_or_else(|| "ClusterIP".to_string());
                let cluster_ip = service
                    .spec
                    .as_ref()
                    .and_then(|spec| spec.cluster_ip.clone())
                    .unwrap_or_else(|| "-".to_string());
                let ports = service_ports_summary(&service);
                let age = human_age(service.metadata.creation_timestamp.as_ref());

                RowData {
                    name: name.clone(),
                    namespace: namespace.clone(),
                    columns: vec![
                        name,
                        namespace.unwrap_or_else(|| "-".to_string()),
                        service_type,
                        cluster_ip,
                        truncate(&ports, 28),
                        age,
                    ],
                    detail: yaml_detail(&service),
                }
            })
            .collect::<Vec<_>>();

        Ok((
            vec![
                "Name".to_string(),
                "Namespace".to_string(),
                "Type".to_string(),
                "ClusterIP".to_string(),
                "Ports".to_string(),
                "Age".to_string(),
            ],
            rows,
        ))
    }

    async fn fetch_network_policies(
        &self,
        scope: &NamespaceFilter,
    ) -> Result<(Vec<String>, Vec<RowData>)> {
        let policies: Api<NetworkPolicy> = match scope {
            NamespaceFilter::All => Api::all(self.client.clone()),
            NamespaceFilter::Named(namespace) => Api::namespaced(self.client.clone(), namespace),
        };

        let list = policies.list(&list_params()).await?;
        let rows = list
            .into_iter()
            .map(|policy| {
                let name = policy.name_any();
                let namespace = policy.namespace();
                let selector = pod_selector_summary(&policy);
                let age = human_age(policy.metadata.creation_timestamp.as_ref());

                RowData {
                    name: name.clone(),
                    namespace: namespace.clone(),
                    columns: vec![
                        name,
                        namespace.unwrap_or_else(|| "-".to_string()),
                        truncate(&selector, 40),
                        age,
                    ],
                    detail: yaml_detail(&policy),
                }
            })
            .collect::<Vec<_>>();

        Ok((
            vec![
                "Name".to_string(),
                "Namespace".to_string(),
                "PodSelector".to_string(),
                "Age".to_string(),
            ],
            rows,
        ))
    }

    async fn fetch_pvcs(&self, scope: &NamespaceFilter) -> Result<(Vec<String>, Vec<RowData>)> {
        let claims: Api<PersistentVolumeClaim> = match scope {
            NamespaceFilter::All => Api::all(self.client.clone()),
            NamespaceFilter::Named(namespace) => Api::namespaced(self.client.clone(), namespace),
        };

        let list = claims.list(&list_params()).await?;
        let rows = list
            .into_iter()
            .map(|claim| {
                let name = claim.name_any();
                let namespace = claim.namespace();
                let phase = claim
                    .status
                    .as_ref()
                    .and_then(|status| status.phase.clone())
                    .unwrap_or_else(|| "Unknown".to_string());
                let volume = claim
                    .spec
                    .as_ref()
                    .and_then(|spec| spec.volume_name.clone())
                    .unwrap_or_else(|| "-".to_string());
                let capacity = claim
                    .status
                    .as_ref()
                    .and_then(|status| status.capacity.as_ref())
                    .and_then(|capacity| capacity.get("storage"))
                    .map(|quantity| quantity.0.clone())
                    .unwrap_or_else(|| "-".to_string());
                let access = claim
                    .spec
                    .as_ref()
                    .and_then(|spec| spec.access_modes.clone())
                    .map(|modes| modes.join(","))
                    .unwrap_or_else(|| "-".to_string());
                let age = human_age(claim.metadata.creation_timestamp.as_ref());

                RowData {
                    name: name.clone(),
                    namespace: namespace.clone(),
                    columns: vec![
                        name,
                        namespace.unwrap_or_else(|| "-".to_string()),
                        phase,
                        volume,
                        capacity,
                        access,
                        age,
                    ],
                    detail: yaml_detail(&claim),
                }
            })
            .collect::<Vec<_>>();

        Ok((
            vec![
                "Name".to_string(),
                "Namespace".to_string(),
                "Status".to_string(),
                "Volume".to_string(),
                "Capacity".to_string(),
                "Access".to_string(),
                "Age".to_string(),
            ],
            rows,
        ))
    }

    async fn fetch_pvs(&self) -> Result<(Vec<String>, Vec<RowData>)> {
        let volumes: Api<PersistentVolume> = Api::all(self.client.clone());
        let list = volumes.list(&list_params()).await?;
        let rows = list
            .into_iter()
            .map(|volume| {
                let name = volume.name_any();
                let capacity = volume
                    .spec
                    .as_ref()
                    .and_then(|spec| spec.capacity.as_ref())
                    .and_then(|capacity| capacity.get("storage"))
                    .map(|quantity| quantity.0.clone())
                    .unwrap_or_else(|| "-".to_string());
                let access = volume
                    .spec
                    .as_ref()
                    .and_then(|spec| spec.access_modes.clone())
                    .map(|modes| modes.join(","))
                    .unwrap_or_else(|| "-".to_string());
                let reclaim = volume
                    .spec
                    .as_ref()
                    .and_then(|spec| spec.persistent_volume_reclaim_policy.clone())
                    .unwrap_or_else(|| "-".to_string());
                let phase = volume
                    .status
                    .as_ref()
                    .and_then(|status| status.phase.clone())
                    .unwrap_or_else(|| "Unknown".to_string());
                let claim = volume
                    .spec
                    .as_ref()
                    .and_then(|spec| spec.claim_ref.as_ref())
                    .map(|claim_ref| {
                        format!(
                            "{}/{}",
                            claim_ref.namespace.clone().unwrap_or_else(|| "-".to_string()),
                            claim_ref.name.clone().unwrap_or_else(|| "-".to_string()),
                        )
                    })
                    .unwrap_or_else(|| "-".to_string());
                let age = human_age(volume.metadata.creation_timestamp.as_ref());

                RowData {
                    name: name.clone(),
                    namespace: None,
                    columns: vec![name, capacity, access, reclaim, phase, claim, age],
                    detail: yaml_detail(&volume),
                }
            })
            .collect::<Vec<_>>();

        Ok((
            vec![
                "Name".to_string(),
                "Capacity".to_string(),
                "Access".to_string(),
                "Reclaim".to_string(),
                "Status".to_string(),
                "Claim".to_string(),
                "Age".to_string(),
            ],
            rows,
        ))
    }

    async fn fetch_events(
        &self,
        scope: &NamespaceFilter,
        warnings_only: bool,
    ) -> Result<(Vec<String>, Vec<RowData>)> {
        let events: Api<Event> = match scope {
            NamespaceFilter::All => Api::all(self.client.clone()),
            NamespaceFilter::Named(namespace) => Api::namespaced(self.client.clone(), namespace),
        };

        let params = if warnings_only {
            list_params().fields("type=Warning")
        } else {
            list_params()
        };

        let list = events.list(&params).await?;
        let mut items = list.items;
        items.sort_by_key(|event| std::cmp::Reverse(event_timestamp_seconds(event)));

        let rows = items
            .into_iter()
            .map(|event| {
                let event_name = event.name_any();
                let namespace = event.namespace();
                let kind = event
                    .involved_object
                    .kind
                    .clone()
                    .unwrap_or_else(|| "-".to_string());
                let object_name = event
                    .involved_object
                    .name
                    .clone()
                    .unwrap_or_else(|| "-".to_string());
                let reason = event.reason.clone().unwrap_or_else(|| "-".to_string());
                let event_type = event.type_.clone().unwrap_or_else(|| "-".to_string());
                let message = event.message.clone().unwrap_or_else(|| "-".to_string());
                let age = event_age(&event);

                RowData {
                    name: event_name,
                    namespace: namespace.clone(),
                    columns: vec![
                        namespace.unwrap_or_else(|| "-".to_string()),
                        kind,
                        object_name,
                        reason,
                        event_type,
                        truncate(&message, 72),
                        age,
                    ],
                    detail: yaml_detail(&event),
                }
            })
            .collect::<Vec<_>>();

        Ok((
            vec![
                "Namespace".to_string(),
                "Kind".to_string(),
                "Object".to_string(),
                "Reason".to_string(),
                "Type".to_string(),
                "Message".to_string(),
                "Age".to_string(),
            ],
            rows,
        ))
    }

    /// One row per (quota, resource name) pair so the hard/used columns line
    /// up without nesting.
    async fn fetch_quotas(&self, scope: &NamespaceFilter) -> Result<(Vec<String>, Vec<RowData>)> {
        let quotas: Api<ResourceQuota> = match scope {
            NamespaceFilter::All => Api::all(self.client.clone()),
            NamespaceFilter::Named(namespace) => Api::namespaced(self.client.clone(), namespace),
        };

        let list = quotas.list(&list_params()).await?;
        let mut rows = Vec::new();
        for quota in list {
            let name = quota.name_any();
            let namespace = quota.namespace();
            let age = human_age(quota.metadata.creation_timestamp.as_ref());
            let detail = yaml_detail(&quota);

            let hard = quota
                .status
                .as_ref()
                .and_then(|status| status.hard.clone())
                .or_else(|| quota.spec.as_ref().and_then(|spec| spec.hard.clone()))
                .unwrap_or_default();
            let used = quota
                .status
                .as_ref()
                .and_then(|status| status.used.clone())
                .unwrap_or_default();

            if hard.is_empty() {
                rows.push(RowData {
                    name: name.clone(),
                    namespace: namespace.clone(),
                    columns: vec![
                        name.clone(),
                        namespace.clone().unwrap_or_else(|| "-".to_string()),
                        "-".to_string(),
                        "-".to_string(),
                        "-".to_string(),
                        age.clone(),
                    ],
                    detail: detail.clone(),
                });
                continue;
            }

            for (resource, limit) in &hard {
                let used_value = used
                    .get(resource)
                    .map(|quantity| quantity.0.clone())
                    .unwrap_or_else(|| "0".to_string());
                rows.push(RowData {
                    name: name.clone(),
                    namespace: namespace.clone(),
                    columns: vec![
                        name.clone(),
                        namespace.clone().unwrap_or_else(|| "-".to_string()),
                        resource.clone(),
                        used_value,
                        limit.0.clone(),
                        age.clone(),
                    ],
                    detail: detail.clone(),
                });
            }
        }

        Ok((
            vec![
                "Name".to_string(),
                "Namespace".to_string(),
                "Resource".to_string(),
                "Used".to_string(),
                "Hard".to_string(),
                "Age".to_string(),
            ],
            rows,
        ))
    }
}

fn parse_pod_metrics_usage(data: &Value) -> (u64, u64) {
    let Some(containers) = data.get("containers").and_then(Value::as_array) else {
        return (0, 0);
    };

    containers
        .iter()
        .fold((0u64, 0u64), |(cpu, memory), container| {
            let (container_cpu, container_memory) = container
                .get("usage")
                .map(parse_usage_from_value)
                .unwrap_or((0, 0));
            (
                cpu.saturating_add(container_cpu),
                memory.saturating_add(container_memory),
            )
        })
}

fn parse_usage_from_value(value: &Value) -> (u64, u64) {
    let cpu = value
        .get("cpu")
        .and_then(Value::as_str)
        .and_then(parse_cpu_millicores)
        .unwrap_or(0);
    let memory = value
        .get("memory")
        .and_then(Value::as_str)
        .and_then(parse_memory_bytes)
        .unwrap_or(0);
    (cpu, memory)
}

fn parse_cpu_millicores(value: &str) -> Option<u64> {
    let raw = value.trim();
    if raw.is_empty() {
        return None;
    }

    let (number, multiplier) = if let Some(number) = raw.strip_suffix('m') {
        (number, 1.0)
    } else if let Some(number) = raw.strip_suffix('u') {
        (number, 0.001)
    } else if let Some(number) = raw.strip_suffix('n') {
        (number, 0.000001)
    } else {
        (raw, 1000.0)
    };

    let numeric = number.parse::<f64>().ok()?;
    let millicores = (numeric * multiplier).round();
    if !millicores.is_finite() || millicores < 0.0 {
        return None;
    }
    Some(millicores as u64)
}

fn parse_memory_bytes(value: &str) -> Option<u64> {
    const BINARY_UNITS: [(&str, f64); 6] = [
        ("Ei", 1_152_921_504_606_846_976.0),
        ("Pi", 1_125_899_906_842_624.0),
        ("Ti", 1_099_511_627_776.0),
        ("Gi", 1_073_741_824.0),
        ("Mi", 1_048_576.0),
        ("Ki", 1_024.0),
    ];
    const DECIMAL_UNITS: [(&str, f64); 6] = [
        ("E", 1_000_000_000_000_000_000.0),
        ("P", 1_000_000_000_000_000.0),
        ("T", 1_000_000_000_000.0),
        ("G", 1_000_000_000.0),
        ("M", 1_000_000.0),
        ("K", 1_000.0),
    ];

    let raw = value.trim();
    if raw.is_empty() {
        return None;
    }

    for (suffix, multiplier) in BINARY_UNITS {
        if let Some(number) = raw.strip_suffix(suffix) {
            let numeric = number.parse::<f64>().ok()?;
            let bytes = (numeric * multiplier).round();
            if !bytes.is_finite() || bytes < 0.0 {
                return None;
            }
            return Some(bytes as u64);
        }
    }

    for (suffix, multiplier) in DECIMAL_UNITS {
        if let Some(number) = raw.strip_suffix(suffix) {
            let numeric = number.parse::<f64>().ok()?;
            let bytes = (numeric * multiplier).round();
            if !bytes.is_finite() || bytes < 0.0 {
                return None;
            }
            return Some(bytes as u64);
        }
    }

    if let Some(number) = raw.strip_suffix('m') {
        let numeric = number.parse::<f64>().ok()?;
        let bytes = (numeric * 0.001).round();
        if !bytes.is_finite() || bytes < 0.0 {
            return None;
        }
        return Some(bytes as u64);
    }

    let bytes = raw.parse::<f64>().ok()?;
    if !bytes.is_finite() || bytes < 0.0 {
        return None;
    }
    Some(bytes.round() as u64)
}

pub fn format_cpu_millicores(value: u64) -> String {
    if value >= 1_000 {
        let cores = value as f64 / 1_000.0;
        format!("{cores:.2}c")
    } else {
        format!("{value}m")
    }
}

pub fn format_bytes(value: u64) -> String {
    const UNITS: [(&str, f64); 6] = [
        ("Ei", 1_152_921_504_606_846_976.0),
        ("Pi", 1_125_899_906_842_624.0),
        ("Ti", 1_099_511_627_776.0),
        ("Gi", 1_073_741_824.0),
        ("Mi", 1_048_576.0),
        ("Ki", 1_024.0),
    ];
    if value == 0 {
        return "0B".to_string();
    }

    let value_f64 = value as f64;
    for (suffix, unit_size) in UNITS {
        if value_f64 >= unit_size {
            return format!("{:.1}{suffix}", value_f64 / unit_size);
        }
    }
    format!("{value}B")
}

fn pod_readiness(status: &k8s_openapi::api::core::v1::PodStatus) -> (usize, usize, i32) {
    let container_statuses = status.container_statuses.as_deref().unwrap_or(&[]);
    let total = container_statuses.len();
    let ready = container_statuses
        .iter()
        .filter(|container| container.ready)
        .count();
    let restarts = container_statuses
        .iter()
        .map(|container| container.restart_count)
        .sum();

    (ready, total, restarts)
}

fn node_roles(node: &Node) -> String {
    let Some(labels) = node.metadata.labels.as_ref() else {
        return "-".to_string();
    };

    let mut roles = labels
        .keys()
        .filter_map(|key| key.strip_prefix("node-role.kubernetes.io/"))
        .map(|role| {
            if role.is_empty() {
                "worker".to_string()
            } else {
                role.to_string()
            }
        })
        .collect::<Vec<_>>();

    if roles.is_empty()
        && let Some(role) = labels.get("kubernetes.io/role")
    {
        roles.push(role.clone());
    }

    if roles.is_empty() {
        "-".to_string()
    } else {
        roles.sort();
        roles.dedup();
        roles.join(",")
    }
}

fn pod_selector_summary(policy: &NetworkPolicy) -> String {
    policy
        .spec
        .as_ref()
        .and_then(|spec| spec.pod_selector.as_ref())
        .and_then(|selector| selector.match_labels.as_ref())
        .map(|labels| {
            labels
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect::<Vec<_>>()
                .join(",")
        })
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| "<all pods>".to_string())
}

fn service_ports_summary(service: &Service) -> String {
    let ports = service
        .spec
        .as_ref()
        .and_then(|spec| spec.ports.clone())
        .unwrap_or_default();
    if ports.is_empty() {
        return "-".to_string();
    }

    ports
        .iter()
        .map(|port| {
            let protocol = port.protocol.clone().unwrap_or_else(|| "TCP".to_string());
            format!("{}/{protocol}", port.port)
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn event_age(event: &Event) -> String {
    if let Some(event_time) = event.event_time.as_ref() {
        return human_age_timestamp(event_time.0);
    }

    if let Some(last_timestamp) = event.last_timestamp.as_ref() {
        return human_age(Some(last_timestamp));
    }

    if let Some(first_timestamp) = event.first_timestamp.as_ref() {
        return human_age(Some(first_timestamp));
    }

    human_age(event.metadata.creation_timestamp.as_ref())
}

fn event_timestamp_seconds(event: &Event) -> i64 {
    event
        .event_time
        .as_ref()
        .map(|time| time.0.as_second())
        .or_else(|| event.last_timestamp.as_ref().map(|time| time.0.as_second()))
        .or_else(|| {
            event
                .first_timestamp
                .as_ref()
                .map(|time| time.0.as_second())
        })
        .or_else(|| {
            event
                .metadata
                .creation_timestamp
                .as_ref()
                .map(|time| time.0.as_second())
        })
        .unwrap_or(0)
}

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }

    let mut out = value
        .chars()
        .take(max.saturating_sub(1))
        .collect::<String>();
    out.push('…');
    out
}

fn human_age(timestamp: Option<&Time>) -> String {
    let Some(timestamp) = timestamp else {
        return "-".to_string();
    };

    human_age_timestamp(timestamp.0)
}

fn human_age_timestamp(ts: k8s_openapi::jiff::Timestamp) -> String {
    let elapsed_seconds = (k8s_openapi::jiff::Timestamp::now().as_second() - ts.as_second()).max(0);
    format_elapsed_seconds(elapsed_seconds)
}

fn format_elapsed_seconds(seconds: i64) -> String {
    if seconds >= 86_400 {
        return format!("{}d", seconds / 86_400);
    }

    if seconds >= 3_600 {
        return format!("{}h", seconds / 3_600);
    }

    if seconds >= 60 {
        return format!("{}m", seconds / 60);
    }

    format!("{seconds}s")
}

fn yaml_detail<T>(value: &T) -> String
where
    T: Serialize,
{
    serde_yaml::to_string(value).unwrap_or_else(|error| format!("failed to format detail: {error}"))
}

fn list_params() -> ListParams {
    ListParams::default().limit(500)
}

#[cfg(test)]
mod tests {
    use super::{
        format_bytes, format_cpu_millicores, format_elapsed_seconds, parse_cpu_millicores,
        parse_memory_bytes, parse_pod_metrics_usage, pod_selector_summary, truncate,
    };
    use k8s_openapi::api::networking::v1::{NetworkPolicy, NetworkPolicySpec};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;

    #[test]
    fn cpu_quantities_convert_to_millicores() {
        assert_eq!(parse_cpu_millicores("250m"), Some(250));
        assert_eq!(parse_cpu_millicores("2"), Some(2_000));
        assert_eq!(parse_cpu_millicores("1500u"), Some(2));
        assert_eq!(parse_cpu_millicores("1500000n"), Some(2));
        assert_eq!(parse_cpu_millicores(""), None);
        assert_eq!(parse_cpu_millicores("bogus"), None);
    }

    #[test]
    fn memory_quantities_convert_to_bytes() {
        assert_eq!(parse_memory_bytes("1Ki"), Some(1_024));
        assert_eq!(parse_memory_bytes("1Mi"), Some(1_048_576));
        assert_eq!(parse_memory_bytes("1K"), Some(1_000));
        assert_eq!(parse_memory_bytes("512"), Some(512));
        assert_eq!(parse_memory_bytes("1000m"), Some(1));
        assert_eq!(parse_memory_bytes("-1Gi"), None);
    }

    #[test]
    fn pod_metrics_usage_sums_containers() {
        let data = serde_json::json!({
            "containers": [
                { "name": "app", "usage": { "cpu": "100m", "memory": "64Mi" } },
                { "name": "sidecar", "usage": { "cpu": "50m", "memory": "16Mi" } },
            ]
        });
        assert_eq!(parse_pod_metrics_usage(&data), (150, 80 * 1_048_576));
    }

    #[test]
    fn pod_metrics_usage_without_containers_is_zero() {
        assert_eq!(parse_pod_metrics_usage(&serde_json::json!({})), (0, 0));
    }

    #[test]
    fn cpu_formatting_switches_to_cores() {
        assert_eq!(format_cpu_millicores(250), "250m");
        assert_eq!(format_cpu_millicores(1_500), "1.50c");
    }

    #[test]
    fn byte_formatting_picks_the_largest_unit() {
        assert_eq!(format_bytes(0), "0B");
        assert_eq!(format_bytes(512), "512B");
        assert_eq!(format_bytes(2_048), "2.0Ki");
        assert_eq!(format_bytes(3 * 1_073_741_824), "3.0Gi");
    }

    #[test]
    fn elapsed_seconds_pick_the_largest_unit() {
        assert_eq!(format_elapsed_seconds(42), "42s");
        assert_eq!(format_elapsed_seconds(120), "2m");
        assert_eq!(format_elapsed_seconds(7_200), "2h");
        assert_eq!(format_elapsed_seconds(172_800), "2d");
    }

    #[test]
    fn network_policy_selector_summarizes_match_labels() {
        let mut policy = NetworkPolicy::default();
        assert_eq!(pod_selector_summary(&policy), "<all pods>");

        policy.spec = Some(NetworkPolicySpec {
            pod_selector: Some(LabelSelector {
                match_labels: Some(
                    [("app".to_string(), "web".to_string())].into_iter().collect(),
                ),
                ..LabelSelector::default()
            }),
            ..NetworkPolicySpec::default()
        });
        assert_eq!(pod_selector_summary(&policy), "app=web");

        policy.spec = Some(NetworkPolicySpec::default());
        assert_eq!(pod_selector_summary(&policy), "<all pods>");
    }

    #[test]
    fn truncation_appends_an_ellipsis() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer message", 8), "a longe…");
    }
}
