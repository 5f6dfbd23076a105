//! Shared Kubernetes helpers built on kube-rs
//!
//! The engine builds cluster resources as typed serde documents and only
//! crosses into untyped `DynamicObject` territory here, at the submission
//! boundary. Server-side apply keeps every write idempotent.

use kube::api::{Api, DeleteParams, DynamicObject, Patch, PatchParams};
use kube::discovery::ApiResource;
use kube::Client;
use tracing::debug;

use crate::{Error, FIELD_MANAGER};

/// Build an `ApiResource` from a known apiVersion, kind, and plural.
///
/// For the fixed set of resources this engine touches (TrainJob,
/// PropagationPolicy, Cluster) the coordinates are compile-time constants,
/// so no API discovery round-trip is needed.
pub fn build_api_resource(api_version: &str, kind: &str, plural: &str) -> ApiResource {
    let (group, version) = parse_api_version(api_version);
    ApiResource {
        group,
        version,
        kind: kind.to_string(),
        api_version: api_version.to_string(),
        plural: plural.to_string(),
    }
}

/// Split an apiVersion string into (group, version); core "v1" has no group
pub fn parse_api_version(api_version: &str) -> (String, String) {
    match api_version.split_once('/') {
        Some((group, version)) => (group.to_string(), version.to_string()),
        None => (String::new(), api_version.to_string()),
    }
}

/// `ApiResource` for the TrainJob custom resource
pub fn trainjob_api_resource() -> ApiResource {
    build_api_resource(
        crate::TRAINJOB_API_VERSION,
        crate::TRAINJOB_KIND,
        crate::TRAINJOB_PLURAL,
    )
}

/// `ApiResource` for the Karmada PropagationPolicy resource
pub fn propagation_api_resource() -> ApiResource {
    build_api_resource(
        crate::PROPAGATION_API_VERSION,
        crate::PROPAGATION_KIND,
        crate::PROPAGATION_PLURAL,
    )
}

/// `ApiResource` for the Karmada member Cluster resource (cluster-scoped)
pub fn cluster_api_resource() -> ApiResource {
    build_api_resource(
        crate::CLUSTER_API_VERSION,
        crate::CLUSTER_KIND,
        crate::CLUSTER_PLURAL,
    )
}

/// Serialize a typed resource and apply it with server-side apply.
///
/// Overrides `apiVersion` and `kind` from the `ApiResource` so the document
/// always matches what the server serves. Apply is idempotent: re-submitting
/// an existing resource is a no-op rather than an AlreadyExists error.
pub async fn apply_dynamic(
    client: &Client,
    namespace: &str,
    ar: &ApiResource,
    name: &str,
    resource: &impl serde::Serialize,
) -> Result<(), Error> {
    let mut json = serde_json::to_value(resource)
        .map_err(|e| Error::serialization_for_kind(&ar.kind, e.to_string()))?;
    if let Some(obj) = json.as_object_mut() {
        obj.insert(
            "apiVersion".to_string(),
            serde_json::Value::String(ar.api_version.clone()),
        );
        obj.insert(
            "kind".to_string(),
            serde_json::Value::String(ar.kind.clone()),
        );
    }

    let api: Api<DynamicObject> = Api::namespaced_with(client.clone(), namespace, ar);
    let params = PatchParams::apply(FIELD_MANAGER).force();
    debug!(name = %name, kind = %ar.kind, "applying resource");
    api.patch(name, &params, &Patch::Apply(&json)).await?;
    Ok(())
}

/// Delete a resource, treating "not found" as success.
///
/// Returns true if the resource existed, false if it was already gone.
pub async fn delete_dynamic(
    client: &Client,
    namespace: &str,
    ar: &ApiResource,
    name: &str,
) -> Result<bool, Error> {
    let api: Api<DynamicObject> = Api::namespaced_with(client.clone(), namespace, ar);
    match api.delete(name, &DeleteParams::default()).await {
        Ok(_) => Ok(true),
        Err(e) if is_not_found(&e) => {
            debug!(name = %name, kind = %ar.kind, "already deleted");
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

/// Check whether a kube error is a 404
pub fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(ae) if ae.code == 404)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_api_version_with_group() {
        let (group, version) = parse_api_version("training.fedtrain.dev/v1alpha1");
        assert_eq!(group, "training.fedtrain.dev");
        assert_eq!(version, "v1alpha1");
    }

    #[test]
    fn parse_api_version_core() {
        let (group, version) = parse_api_version("v1");
        assert_eq!(group, "");
        assert_eq!(version, "v1");
    }

    #[test]
    fn trainjob_api_resource_coordinates() {
        let ar = trainjob_api_resource();
        assert_eq!(ar.group, "training.fedtrain.dev");
        assert_eq!(ar.version, "v1alpha1");
        assert_eq!(ar.kind, "TrainJob");
        assert_eq!(ar.plural, "trainjobs");
    }

    #[test]
    fn propagation_api_resource_coordinates() {
        let ar = propagation_api_resource();
        assert_eq!(ar.api_version, "policy.karmada.io/v1alpha1");
        assert_eq!(ar.plural, "propagationpolicies");
    }

    #[test]
    fn is_not_found_matches_404_only() {
        let not_found = kube::Error::Api(kube::core::ErrorResponse {
            status: "Failure".to_string(),
            message: "not found".to_string(),
            reason: "NotFound".to_string(),
            code: 404,
        });
        assert!(is_not_found(&not_found));

        let conflict = kube::Error::Api(kube::core::ErrorResponse {
            status: "Failure".to_string(),
            message: "conflict".to_string(),
            reason: "Conflict".to_string(),
            code: 409,
        });
        assert!(!is_not_found(&conflict));
    }
}
