use crate::model::{DashboardData, MetricsIndex, NodeCapacity, RankedUsage};

const TOP_N: usize = 5;

/// Integer percentage of `usage` over `capacity`, as rendered text. A zero
/// capacity yields "0" so the dashboard never divides by zero.
pub fn format_percentage(usage: u64, capacity: u64) -> String {
    if capacity == 0 {
        return "0".to_string();
    }
    let percent = (usage as f64 / capacity as f64 * 100.0).round() as u64;
    percent.to_string()
}

/// Recomputes the dashboard from scratch. Nodes missing from the metrics
/// index still contribute capacity; pods without a sample are left out of the
/// rankings entirely. Ties keep original list order (stable sort).
pub fn build_dashboard(
    nodes: &[NodeCapacity],
    node_metrics: &MetricsIndex,
    pod_names: &[String],
    pod_metrics: &MetricsIndex,
) -> DashboardData {
    let mut dashboard = DashboardData {
        node_count: nodes.len(),
        pod_count: pod_names.len(),
        ..DashboardData::default()
    };

    let mut node_cpu = Vec::new();
    let mut node_memory = Vec::new();
    for node in nodes {
        dashboard.cpu_capacity_millicores = dashboard
            .cpu_capacity_millicores
            .saturating_add(node.cpu_millicores);
        dashboard.memory_capacity_bytes = dashboard
            .memory_capacity_bytes
            .saturating_add(node.memory_bytes);

        if let Some(sample) = node_metrics.sample(&node.name) {
            dashboard.cpu_usage_millicores = dashboard
                .cpu_usage_millicores
                .saturating_add(sample.cpu_millicores);
            dashboard.memory_usage_bytes = dashboard
                .memory_usage_bytes
                .saturating_add(sample.memory_bytes);
            node_cpu.push((node.name.clone(), sample.cpu_millicores));
            node_memory.push((node.name.clone(), sample.memory_bytes));
        }
    }

    let mut pod_cpu = Vec::new();
    let mut pod_memory = Vec::new();
    for name in pod_names {
        if let Some(sample) = pod_metrics.sample(name) {
            pod_cpu.push((name.clone(), sample.cpu_millicores));
            pod_memory.push((name.clone(), sample.memory_bytes));
        }
    }

    dashboard.top_nodes_cpu = top_n(node_cpu);
    dashboard.top_nodes_memory = top_n(node_memory);
    dashboard.top_pods_cpu = top_n(pod_cpu);
    dashboard.top_pods_memory = top_n(pod_memory);
    dashboard
}

fn top_n(mut entries: Vec<(String, u64)>) -> Vec<RankedUsage> {
    entries.sort_by(|left, right| right.1.cmp(&left.1));
    entries
        .into_iter()
        .take(TOP_N)
        .map(|(name, value)| RankedUsage { name, value })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{build_dashboard, format_percentage};
    use crate::model::{MetricsIndex, NodeCapacity, UsageSample};

    fn node(name: &str, cpu: u64, memory: u64) -> NodeCapacity {
        NodeCapacity {
            name: name.to_string(),
            cpu_millicores: cpu,
            memory_bytes: memory,
        }
    }

    fn sample(cpu: u64, memory: u64) -> UsageSample {
        UsageSample {
            cpu_millicores: cpu,
            memory_bytes: memory,
        }
    }

    #[test]
    fn percentage_rounds_to_integer_text() {
        assert_eq!(format_percentage(50, 200), "25");
        assert_eq!(format_percentage(1, 3), "33");
        assert_eq!(format_percentage(2, 3), "67");
    }

    #[test]
    fn percentage_of_zero_capacity_is_zero_text() {
        assert_eq!(format_percentage(0, 0), "0");
        assert_eq!(format_percentage(750, 0), "0");
    }

    #[test]
    fn nodes_without_samples_still_count_toward_capacity() {
        let nodes = vec![node("a", 4_000, 8 << 30), node("b", 4_000, 8 << 30)];
        let mut node_metrics = MetricsIndex::default();
        node_metrics.insert("a", sample(1_000, 1 << 30));

        let dashboard = build_dashboard(&nodes, &node_metrics, &[], &MetricsIndex::default());
        assert_eq!(dashboard.cpu_capacity_millicores, 8_000);
        assert_eq!(dashboard.cpu_usage_millicores, 1_000);
        assert_eq!(dashboard.node_count, 2);
        // only the sampled node is ranked
        assert_eq!(dashboard.top_nodes_cpu.len(), 1);
        assert_eq!(dashboard.top_nodes_cpu[0].name, "a");
    }

    #[test]
    fn pods_without_samples_are_omitted_from_rankings() {
        let pods = vec!["with-data".to_string(), "without-data".to_string()];
        let mut pod_metrics = MetricsIndex::default();
        pod_metrics.insert("with-data", sample(250, 64 << 20));

        let dashboard = build_dashboard(&[], &MetricsIndex::default(), &pods, &pod_metrics);
        assert_eq!(dashboard.pod_count, 2);
        assert_eq!(dashboard.top_pods_cpu.len(), 1);
        assert_eq!(dashboard.top_pods_cpu[0].name, "with-data");
    }

    #[test]
    fn rankings_are_descending_capped_at_five_with_stable_ties() {
        let pods: Vec<String> = (0..7).map(|i| format!("pod-{i}")).collect();
        let mut pod_metrics = MetricsIndex::default();
        for (i, name) in pods.iter().enumerate() {
            // pod-2 and pod-4 tie; pod-2 comes first in list order
            let cpu = match i {
                2 | 4 => 500,
                other => 100 + other as u64,
            };
            pod_metrics.insert(name.clone(), sample(cpu, 0));
        }

        let dashboard = build_dashboard(&[], &MetricsIndex::default(), &pods, &pod_metrics);
        let ranked: Vec<&str> = dashboard
            .top_pods_cpu
            .iter()
            .map(|entry| entry.name.as_str())
            .collect();
        assert_eq!(ranked.len(), 5);
        assert_eq!(ranked[0], "pod-2");
        assert_eq!(ranked[1], "pod-4");
    }

    #[test]
    fn aggregation_is_idempotent_over_identical_input() {
        let nodes = vec![node("a", 2_000, 4 << 30), node("b", 2_000, 4 << 30)];
        let mut node_metrics = MetricsIndex::default();
        node_metrics.insert("a", sample(900, 2 << 30));
        node_metrics.insert("b", sample(900, 1 << 30));
        let pods = vec!["x".to_string(), "y".to_string(), "z".to_string()];
        let mut pod_metrics = MetricsIndex::default();
        pod_metrics.insert("x", sample(300, 10));
        pod_metrics.insert("y", sample(300, 20));
        pod_metrics.insert("z", sample(100, 30));

        let first = build_dashboard(&nodes, &node_metrics, &pods, &pod_metrics);
        let second = build_dashboard(&nodes, &node_metrics, &pods, &pod_metrics);
        assert_eq!(first, second);
    }
}
