//! Keyed extraction over decoded query results.
//!
//! Helpers for the common pattern of keying each result of a query by a few
//! label fields plus its cluster, and collecting labels, a single field, or
//! the samples under that key. Keys are the field values joined by `,` with
//! the cluster id last, e.g. `"kube-system,coredns-0,cluster-one"`.

use crate::models::Vector;
use crate::prom::{DecodeError, FieldError, QueryResult, QueryResults};
use std::collections::HashMap;

/// Label holding the cluster a series was scraped from.
pub const CLUSTER_ID_FIELD: &str = "cluster_id";

/// Returns the result's cluster id, or `default_cluster` if the label is
/// absent, not a string, or empty.
#[must_use]
pub fn cluster_id_or_default(result: &QueryResult, default_cluster: &str) -> String {
    match result.get_string(CLUSTER_ID_FIELD) {
        Ok(cluster_id) if !cluster_id.is_empty() => cluster_id,
        _ => default_cluster.to_string(),
    }
}

/// Builds the `field1,field2,...,cluster` key for a result.
///
/// # Errors
///
/// Returns a [`FieldError`] if any key field is missing or not a string.
pub fn result_key(
    result: &QueryResult,
    key_fields: &[&str],
    default_cluster: &str,
) -> Result<String, FieldError> {
    let mut parts = key_fields
        .iter()
        .map(|field| result.get_string(field))
        .collect::<Result<Vec<_>, _>>()?;
    parts.push(cluster_id_or_default(result, default_cluster));
    Ok(parts.join(","))
}

/// Collects the labels carrying `prefix` (see
/// [`QueryResult::get_labels_with_prefix`]) of each result under its key.
///
/// Results sharing a key are merged; later results override earlier values
/// for the same label, so label changes within the query window resolve to
/// the most recent assignment.
///
/// # Errors
///
/// Returns a [`FieldError`] for the first result missing a key field.
///
/// # Example
///
/// ```
/// use shared::extract::labels_by_key;
/// use shared::prom::{decode, LABEL_PREFIX};
/// use serde_json::json;
///
/// let raw = json!({"data": {"result": [
///     {"metric": {"namespace": "web", "label_team": "frontend"}, "value": [0, "1"]}
/// ]}});
/// let results = decode("kube_namespace_labels", &raw).unwrap();
///
/// let labels = labels_by_key(&results, &["namespace"], LABEL_PREFIX, "cluster-one").unwrap();
/// assert_eq!(labels["web,cluster-one"]["team"], "frontend");
/// ```
pub fn labels_by_key(
    results: &QueryResults,
    key_fields: &[&str],
    prefix: &str,
    default_cluster: &str,
) -> Result<HashMap<String, HashMap<String, String>>, FieldError> {
    let mut keyed: HashMap<String, HashMap<String, String>> = HashMap::new();

    for result in results {
        let key = result_key(result, key_fields, default_cluster)?;
        keyed
            .entry(key)
            .or_default()
            .extend(result.get_labels_with_prefix(prefix));
    }

    Ok(keyed)
}

/// Collects one string field of each result under its key, e.g. the owning
/// daemonset of every pod.
///
/// # Errors
///
/// Returns a [`FieldError`] if a key field or `value_field` is missing or not
/// a string.
pub fn field_by_key(
    results: &QueryResults,
    value_field: &str,
    key_fields: &[&str],
    default_cluster: &str,
) -> Result<HashMap<String, String>, FieldError> {
    let mut keyed = HashMap::new();

    for result in results {
        let value = result.get_string(value_field)?;
        let key = result_key(result, key_fields, default_cluster)?;
        keyed.insert(key, value);
    }

    Ok(keyed)
}

/// Collects records built from each result, grouped under the result's key.
///
/// `build` returns `Ok(None)` to skip a result, e.g. an unfulfilled volume
/// claim without a bound volume; records sharing a key are appended in
/// response order.
///
/// # Errors
///
/// Returns a [`FieldError`] if a key field is missing or `build` fails.
pub fn grouped_by_key<T, F>(
    results: &QueryResults,
    key_fields: &[&str],
    default_cluster: &str,
    mut build: F,
) -> Result<HashMap<String, Vec<T>>, FieldError>
where
    F: FnMut(&QueryResult) -> Result<Option<T>, FieldError>,
{
    let mut grouped: HashMap<String, Vec<T>> = HashMap::new();

    for result in results {
        let key = result_key(result, key_fields, default_cluster)?;
        if let Some(record) = build(result)? {
            grouped.entry(key).or_default().push(record);
        }
    }

    Ok(grouped)
}

/// Returns an optional string field, or an empty string when it is missing
/// or not a string.
#[must_use]
pub fn string_or_default(result: &QueryResult, field: &str) -> String {
    result.get_string(field).unwrap_or_else(|err| {
        tracing::debug!("{}, using empty value", err);
        String::new()
    })
}

/// Collects the samples of each result keyed by a single field, e.g. the
/// hourly cost series of every `instance`.
///
/// # Errors
///
/// Returns a [`FieldError`] if `field` is missing or not a string.
pub fn values_by_field(
    results: &QueryResults,
    field: &str,
) -> Result<HashMap<String, Vec<Vector>>, FieldError> {
    results
        .iter()
        .map(|result| -> Result<_, FieldError> {
            Ok((result.get_string(field)?, result.values.clone()))
        })
        .collect()
}

/// Returns the scalar produced by a normalization query.
///
/// # Errors
///
/// Returns [`DecodeError::NoData`] or [`DecodeError::ResultFormatError`] when
/// the query produced no usable sample; this usually means the time window is
/// invalid or the exporters feeding the query are not running.
pub fn normalization(results: &QueryResults) -> Result<f64, DecodeError> {
    results.get_first_value()
}

/// Returns the series produced by a normalization range query.
///
/// # Errors
///
/// Returns [`DecodeError::NoData`] if the query produced no results.
pub fn normalizations(results: &QueryResults) -> Result<Vec<Vector>, DecodeError> {
    results
        .results
        .first()
        .map(|result| result.values.clone())
        .ok_or(DecodeError::NoData)
}

/// Divides `values` by `normalizers`, joining the two series on timestamp.
///
/// The output covers the union of both series' timestamps in ascending order:
/// - both present and the normalizer non-zero: `value / normalizer`
/// - value present otherwise: `value`
/// - only the normalizer present: `0.0`
///
/// An empty normalizer series returns `values` unchanged. `-0.0` and `0.0`
/// are the same timestamp. A timestamp repeated within one series yields a
/// single output sample using the last sample at that timestamp.
#[must_use]
pub fn normalize_vector_by_vector(values: &[Vector], normalizers: &[Vector]) -> Vec<Vector> {
    if values.is_empty() {
        return Vec::new();
    }
    if normalizers.is_empty() {
        return values.to_vec();
    }

    let by_time: HashMap<u64, f64> = normalizers
        .iter()
        .map(|n| (time_key(n.timestamp), n.value))
        .collect();

    let mut timestamps: Vec<f64> = values
        .iter()
        .chain(normalizers)
        .map(|v| v.timestamp + 0.0)
        .collect();
    timestamps.sort_by(f64::total_cmp);
    timestamps.dedup_by(|a, b| time_key(*a) == time_key(*b));

    let value_at: HashMap<u64, f64> = values
        .iter()
        .map(|v| (time_key(v.timestamp), v.value))
        .collect();

    timestamps
        .into_iter()
        .map(|timestamp| {
            let key = time_key(timestamp);
            let value = match (value_at.get(&key), by_time.get(&key)) {
                (Some(x), Some(y)) if *y != 0.0 => x / y,
                (Some(x), _) => *x,
                (None, _) => 0.0,
            };
            Vector::new(timestamp, value)
        })
        .collect()
}

fn time_key(timestamp: f64) -> u64 {
    // Adding positive zero folds -0.0 into 0.0.
    (timestamp + 0.0).to_bits()
}

/// Identity of a container series.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerKey {
    /// Namespace of the pod.
    pub namespace: String,
    /// Pod name.
    pub pod: String,
    /// Container name.
    pub container: String,
    /// Node the pod runs on; empty when the series does not carry one.
    pub node: String,
    /// Cluster the series was scraped from.
    pub cluster_id: String,
}

impl ContainerKey {
    /// Reads the container identity from a result's label set.
    ///
    /// # Errors
    ///
    /// Returns a [`FieldError`] if `container_name`, `pod_name` or
    /// `namespace` is missing or not a string, or if `node` is present but
    /// not a string.
    pub fn from_result(result: &QueryResult, default_cluster: &str) -> Result<Self, FieldError> {
        let container = result.get_string("container_name")?;
        let pod = result.get_string("pod_name")?;
        let namespace = result.get_string("namespace")?;

        let node = match result.get_string("node") {
            Ok(node) => node,
            Err(FieldError::FieldMissing(_)) => {
                tracing::debug!("Series for container {} has no node name", container);
                String::new()
            }
            Err(err) => return Err(err),
        };

        Ok(Self {
            namespace,
            pod,
            container,
            node,
            cluster_id: cluster_id_or_default(result, default_cluster),
        })
    }
}

impl std::fmt::Display for ContainerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{},{},{},{},{}",
            self.namespace, self.pod, self.container, self.node, self.cluster_id
        )
    }
}

/// Collects the samples of each result under its container key.
///
/// # Errors
///
/// Returns a [`FieldError`] if a result does not identify a container.
pub fn container_vectors(
    results: &QueryResults,
    default_cluster: &str,
) -> Result<HashMap<String, Vec<Vector>>, FieldError> {
    results
        .iter()
        .map(|result| -> Result<_, FieldError> {
            let key = ContainerKey::from_result(result, default_cluster)?;
            Ok((key.to_string(), result.values.clone()))
        })
        .collect()
}

/// Same as [`container_vectors`] with every sample divided by a scalar
/// `normalization` value. A zero value leaves the samples unchanged.
///
/// # Errors
///
/// Returns a [`FieldError`] if a result does not identify a container.
pub fn scaled_container_vectors(
    results: &QueryResults,
    normalization: f64,
    default_cluster: &str,
) -> Result<HashMap<String, Vec<Vector>>, FieldError> {
    results
        .iter()
        .map(|result| -> Result<_, FieldError> {
            let key = ContainerKey::from_result(result, default_cluster)?;
            let values = if normalization == 0.0 {
                result.values.clone()
            } else {
                result
                    .values
                    .iter()
                    .map(|v| Vector::new(v.timestamp, v.value / normalization))
                    .collect()
            };
            Ok((key.to_string(), values))
        })
        .collect()
}

/// Same as [`container_vectors`] with every series normalized by
/// `normalizers` (see [`normalize_vector_by_vector`]).
///
/// # Errors
///
/// Returns a [`FieldError`] if a result does not identify a container.
pub fn normalized_container_vectors(
    results: &QueryResults,
    normalizers: &[Vector],
    default_cluster: &str,
) -> Result<HashMap<String, Vec<Vector>>, FieldError> {
    results
        .iter()
        .map(|result| -> Result<_, FieldError> {
            let key = ContainerKey::from_result(result, default_cluster)?;
            Ok((
                key.to_string(),
                normalize_vector_by_vector(&result.values, normalizers),
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prom::{decode, LABEL_PREFIX};
    use serde_json::{json, Value};

    fn decoded(result: Value) -> QueryResults {
        decode("test", &json!({"data": {"result": result}})).unwrap()
    }

    #[test]
    fn test_cluster_id_or_default() {
        let results = decoded(json!([
            {"metric": {"cluster_id": "east"}, "value": [0, "1"]},
            {"metric": {"cluster_id": ""}, "value": [0, "1"]},
            {"metric": {}, "value": [0, "1"]}
        ]));

        let ids: Vec<String> = results
            .iter()
            .map(|r| cluster_id_or_default(r, "cluster-one"))
            .collect();
        assert_eq!(ids, vec!["east", "cluster-one", "cluster-one"]);
    }

    #[test]
    fn test_labels_by_key_merges_same_key() {
        let results = decoded(json!([
            {"metric": {"namespace": "web", "pod": "a", "label_app": "v1", "label_tier": "fe"}, "value": [0, "1"]},
            {"metric": {"namespace": "web", "pod": "a", "label_app": "v2"}, "value": [0, "1"]},
            {"metric": {"namespace": "web", "pod": "b", "cluster_id": "east", "label_app": "b"}, "value": [0, "1"]}
        ]));

        let labels = labels_by_key(&results, &["namespace", "pod"], LABEL_PREFIX, "cluster-one").unwrap();

        assert_eq!(labels.len(), 2);
        let first = &labels["web,a,cluster-one"];
        assert_eq!(first["app"], "v2");
        assert_eq!(first["tier"], "fe");
        assert_eq!(labels["web,b,east"]["app"], "b");
    }

    #[test]
    fn test_labels_by_key_missing_field() {
        let results = decoded(json!([{"metric": {"pod": "a"}, "value": [0, "1"]}]));

        assert_eq!(
            labels_by_key(&results, &["namespace", "pod"], LABEL_PREFIX, "cluster-one"),
            Err(FieldError::FieldMissing("namespace".to_string()))
        );
    }

    #[test]
    fn test_field_by_key() {
        let results = decoded(json!([
            {"metric": {"namespace": "kube-system", "pod": "fluentd-x", "owner_name": "fluentd"}, "value": [0, "1"]}
        ]));

        let owners =
            field_by_key(&results, "owner_name", &["namespace", "pod"], "cluster-one").unwrap();
        assert_eq!(owners["kube-system,fluentd-x,cluster-one"], "fluentd");
    }

    #[test]
    fn test_values_by_field() {
        let results = decoded(json!([
            {"metric": {"instance": "node-a"}, "values": [[0, "0.1"], [10, "0.2"]]},
            {"metric": {"instance": "node-b"}, "values": [[0, "0.3"]]}
        ]));

        let costs = values_by_field(&results, "instance").unwrap();
        assert_eq!(costs["node-a"].len(), 2);
        assert_eq!(costs["node-b"], vec![Vector::new(0.0, 0.3)]);
    }

    #[test]
    fn test_normalizations() {
        let empty = decoded(json!([]));
        assert_eq!(normalizations(&empty), Err(DecodeError::NoData));
        assert_eq!(normalization(&empty), Err(DecodeError::NoData));

        let results = decoded(json!([{"metric": {}, "values": [[0, "2"], [10, "4"]]}]));
        assert_eq!(normalization(&results), Ok(2.0));
        assert_eq!(normalizations(&results).unwrap().len(), 2);
    }

    #[test]
    fn test_normalize_vector_by_vector() {
        let values = vec![
            Vector::new(0.0, 10.0),
            Vector::new(10.0, 20.0),
            Vector::new(20.0, 30.0),
        ];
        let normalizers = vec![
            Vector::new(0.0, 2.0),
            Vector::new(10.0, 0.0),
            Vector::new(30.0, 5.0),
        ];

        let normalized = normalize_vector_by_vector(&values, &normalizers);

        assert_eq!(
            normalized,
            vec![
                Vector::new(0.0, 5.0),
                Vector::new(10.0, 20.0),
                Vector::new(20.0, 30.0),
                Vector::new(30.0, 0.0),
            ]
        );
    }

    #[test]
    fn test_normalize_vector_by_vector_empty_inputs() {
        let values = vec![Vector::new(0.0, 1.0)];

        assert_eq!(normalize_vector_by_vector(&values, &[]), values);
        assert!(normalize_vector_by_vector(&[], &values).is_empty());
    }

    #[test]
    fn test_container_key() {
        let results = decoded(json!([
            {"metric": {"container_name": "app", "pod_name": "web-0", "namespace": "web", "node": "n1"}, "value": [0, "1"]},
            {"metric": {"container_name": "app", "pod_name": "web-1", "namespace": "web", "cluster_id": "east"}, "value": [0, "1"]}
        ]));

        let keys: Vec<String> = results
            .iter()
            .map(|r| ContainerKey::from_result(r, "cluster-one").unwrap().to_string())
            .collect();

        assert_eq!(keys[0], "web,web-0,app,n1,cluster-one");
        assert_eq!(keys[1], "web,web-1,app,,east");
    }

    #[test]
    fn test_container_key_bad_node() {
        let results = decoded(json!([
            {"metric": {"container_name": "app", "pod_name": "web-0", "namespace": "web", "node": 7}, "value": [0, "1"]}
        ]));

        assert_eq!(
            ContainerKey::from_result(&results.results[0], "cluster-one"),
            Err(FieldError::FieldWrongType("node".to_string()))
        );
    }

    #[test]
    fn test_normalized_container_vectors() {
        let results = decoded(json!([
            {"metric": {"container_name": "app", "pod_name": "web-0", "namespace": "web"}, "values": [[0, "8"], [10, "6"]]}
        ]));
        let normalizers = vec![Vector::new(0.0, 2.0), Vector::new(10.0, 3.0)];

        let plain = container_vectors(&results, "cluster-one").unwrap();
        let normalized = normalized_container_vectors(&results, &normalizers, "cluster-one").unwrap();

        let key = "web,web-0,app,,cluster-one";
        assert_eq!(plain[key][0].value, 8.0);
        assert_eq!(
            normalized[key],
            vec![Vector::new(0.0, 4.0), Vector::new(10.0, 2.0)]
        );
    }

    #[test]
    fn test_labels_by_key_custom_prefix() {
        let results = decoded(json!([
            {"metric": {"namespace": "web", "annotation_owner": "a", "label_app": "x"}, "value": [0, "1"]}
        ]));

        let labels = labels_by_key(&results, &["namespace"], "annotation_", "cluster-one").unwrap();

        assert_eq!(labels["web,cluster-one"].len(), 1);
        assert_eq!(labels["web,cluster-one"]["owner"], "a");
    }

    #[test]
    fn test_grouped_by_key_appends_and_skips() {
        let results = decoded(json!([
            {"metric": {"namespace": "db", "pod": "pg-0", "persistentvolumeclaim": "data", "persistentvolume": "pv-1"}, "value": [0, "1"]},
            {"metric": {"namespace": "db", "pod": "pg-0", "persistentvolumeclaim": "wal", "persistentvolume": "pv-2"}, "value": [0, "1"]},
            {"metric": {"namespace": "db", "pod": "pg-1", "persistentvolumeclaim": "pending"}, "value": [0, "1"]}
        ]));

        let volumes = grouped_by_key(&results, &["namespace", "pod"], "cluster-one", |result| {
            let claim = result.get_string("persistentvolumeclaim")?;
            match result.get_string("persistentvolume") {
                Ok(volume) => Ok(Some((claim, volume))),
                Err(_) => Ok(None),
            }
        })
        .unwrap();

        assert_eq!(volumes.len(), 1);
        assert_eq!(
            volumes["db,pg-0,cluster-one"],
            vec![
                ("data".to_string(), "pv-1".to_string()),
                ("wal".to_string(), "pv-2".to_string()),
            ]
        );
    }

    #[test]
    fn test_grouped_by_key_propagates_build_error() {
        let results = decoded(json!([
            {"metric": {"namespace": "db", "pod": "pg-0"}, "value": [0, "1"]}
        ]));

        let grouped = grouped_by_key(&results, &["namespace", "pod"], "cluster-one", |result| {
            result.get_string("persistentvolumeclaim").map(Some)
        });

        assert_eq!(
            grouped,
            Err(FieldError::FieldMissing("persistentvolumeclaim".to_string()))
        );
    }

    #[test]
    fn test_string_or_default() {
        let results = decoded(json!([
            {"metric": {"volumename": "pv-1", "storageclass": 3}, "value": [0, "1"]}
        ]));
        let result = &results.results[0];

        assert_eq!(string_or_default(result, "volumename"), "pv-1");
        assert_eq!(string_or_default(result, "storageclass"), "");
        assert_eq!(string_or_default(result, "missing"), "");
    }

    #[test]
    fn test_scaled_container_vectors() {
        let results = decoded(json!([
            {"metric": {"container_name": "app", "pod_name": "web-0", "namespace": "web"}, "values": [[0, "8"], [10, "6"]]}
        ]));
        let key = "web,web-0,app,,cluster-one";

        let scaled = scaled_container_vectors(&results, 2.0, "cluster-one").unwrap();
        assert_eq!(
            scaled[key],
            vec![Vector::new(0.0, 4.0), Vector::new(10.0, 3.0)]
        );

        let unscaled = scaled_container_vectors(&results, 0.0, "cluster-one").unwrap();
        assert_eq!(
            unscaled[key],
            vec![Vector::new(0.0, 8.0), Vector::new(10.0, 6.0)]
        );
    }

    #[test]
    fn test_normalize_vector_by_vector_signed_zero() {
        let values = vec![Vector::new(-0.0, 4.0), Vector::new(10.0, 6.0)];
        let normalizers = vec![Vector::new(0.0, 2.0), Vector::new(10.0, 3.0)];

        let normalized = normalize_vector_by_vector(&values, &normalizers);

        assert_eq!(normalized.len(), 2);
        assert!(normalized[0].timestamp.is_sign_positive());
        assert_eq!(normalized[0].value, 2.0);
        assert_eq!(normalized[1].value, 2.0);
    }

    #[test]
    fn test_normalize_vector_by_vector_repeated_timestamp() {
        let values = vec![Vector::new(0.0, 4.0), Vector::new(0.0, 8.0)];
        let normalizers = vec![Vector::new(0.0, 2.0)];

        assert_eq!(
            normalize_vector_by_vector(&values, &normalizers),
            vec![Vector::new(0.0, 4.0)]
        );
    }
}
