// src/store/kube.rs
//
// Kubernetes core/v1 Secrets as a ResourceStore, through kube's typed Api.

use std::collections::BTreeMap;

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::api::{ListParams, PostParams};
use kube::{Api, Client};
use tracing::{debug, info};

use super::{LabelSelector, ResourceObject, ResourceStore, StoreError};

/// Secrets in one namespace of one cluster
pub struct KubeSecretStore {
    api: Api<Secret>,
    namespace: String,
}

impl KubeSecretStore {
    pub fn new(client: Client, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        info!("Using Secrets in namespace {}", namespace);
        Self {
            api: Api::namespaced(client, &namespace),
            namespace,
        }
    }
}

#[async_trait]
impl ResourceStore for KubeSecretStore {
    async fn create(&self, object: ResourceObject) -> Result<ResourceObject, StoreError> {
        let secret = to_secret(&object, &self.namespace)?;
        let created = self
            .api
            .create(&PostParams::default(), &secret)
            .await
            .map_err(|e| api_error(Op::Create, &object.name, e))?;
        from_secret(created)
    }

    async fn list(&self, selector: &LabelSelector) -> Result<Vec<ResourceObject>, StoreError> {
        let params = ListParams::default().labels(&selector.to_string());
        let list = self
            .api
            .list(&params)
            .await
            .map_err(|e| api_error(Op::List, "", e))?;

        debug!("Listed {} secrets matching {}", list.items.len(), selector);
        list.items.into_iter().map(from_secret).collect()
    }

    async fn update(&self, object: ResourceObject) -> Result<ResourceObject, StoreError> {
        let secret = to_secret(&object, &self.namespace)?;
        let replaced = self
            .api
            .replace(&object.name, &PostParams::default(), &secret)
            .await
            .map_err(|e| api_error(Op::Update, &object.name, e))?;
        from_secret(replaced)
    }
}

#[derive(Debug, Clone, Copy)]
enum Op {
    Create,
    List,
    Update,
}

impl Op {
    fn verb(self) -> &'static str {
        match self {
            Op::Create => "create",
            Op::List => "list",
            Op::Update => "update",
        }
    }
}

/// Map a client error onto the store taxonomy
fn api_error(op: Op, name: &str, err: kube::Error) -> StoreError {
    let name = name.to_string();
    match (op, &err) {
        (Op::Create, kube::Error::Api(resp)) if resp.code == 409 => StoreError::AlreadyExists { name },
        (Op::Update, kube::Error::Api(resp)) if resp.code == 409 => StoreError::Conflict { name },
        (Op::Update, kube::Error::Api(resp)) if resp.code == 404 => StoreError::NotFound { name },
        (_, kube::Error::Api(resp)) => StoreError::Backend(format!(
            "{} {} returned {} {}: {}",
            op.verb(),
            name,
            resp.code,
            resp.reason,
            resp.message
        )),
        _ => StoreError::Backend(format!("{} {}: {}", op.verb(), name, err)),
    }
}

/// Build the Secret sent for `object`
///
/// Starts from the Secret the snapshot was decoded from, so fields the load
/// generator never touches (type, annotations, finalizers, owner references)
/// survive a full replace. Name, namespace, labels, version, and data come
/// from the snapshot.
fn to_secret(object: &ResourceObject, namespace: &str) -> Result<Secret, StoreError> {
    let mut secret: Secret = match &object.raw {
        Some(raw) => serde_json::from_value(raw.clone())
            .map_err(|e| StoreError::Backend(format!("secret {}: undecodable snapshot: {}", object.name, e)))?,
        None => Secret::default(),
    };

    let meta = &mut secret.metadata;
    meta.name = Some(object.name.clone());
    meta.namespace = Some(namespace.to_string());
    meta.labels = (!object.labels.is_empty()).then(|| object.labels.clone());
    meta.resource_version = object.version.clone();

    secret.data = Some(
        object
            .payload
            .iter()
            .map(|(k, v)| (k.clone(), ByteString(v.clone())))
            .collect(),
    );
    // stringData is write-only and would be merged over data
    secret.string_data = None;

    Ok(secret)
}

fn from_secret(secret: Secret) -> Result<ResourceObject, StoreError> {
    let raw = serde_json::to_value(&secret)
        .map_err(|e| StoreError::Backend(format!("encode secret: {}", e)))?;

    let meta = secret.metadata;
    let payload: BTreeMap<String, Vec<u8>> = secret
        .data
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| (k, v.0))
        .collect();

    Ok(ResourceObject {
        name: meta.name.unwrap_or_default(),
        namespace: meta.namespace,
        labels: meta.labels.unwrap_or_default(),
        payload,
        version: meta.resource_version,
        raw: Some(raw),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use kube::core::ErrorResponse;

    fn sample() -> ResourceObject {
        let mut payload = BTreeMap::new();
        payload.insert("k1a2b".to_string(), b"aGVsbG8=".to_vec());
        ResourceObject::new("x9y8z")
            .with_label("generated", "true")
            .with_payload(payload)
    }

    fn api(code: u16, reason: &str, message: &str) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: "Failure".to_string(),
            message: message.to_string(),
            reason: reason.to_string(),
            code,
        })
    }

    #[test]
    fn test_new_object_becomes_plain_secret() {
        let mut object = sample();
        object.version = Some("42".to_string());
        let secret = to_secret(&object, "secrets").unwrap();
        let json = serde_json::to_value(&secret).unwrap();

        assert_eq!(json["metadata"]["name"], "x9y8z");
        assert_eq!(json["metadata"]["namespace"], "secrets");
        assert_eq!(json["metadata"]["resourceVersion"], "42");
        assert_eq!(json["metadata"]["labels"]["generated"], "true");
        // Payload bytes are base64-encoded again for the wire
        assert_eq!(json["data"]["k1a2b"], "YUdWc2JHOD0=");
        assert!(json.get("type").is_none());
    }

    #[test]
    fn test_replace_keeps_fields_outside_the_snapshot() {
        let stored = Secret {
            metadata: ObjectMeta {
                name: Some("tls01".to_string()),
                namespace: Some("secrets".to_string()),
                labels: Some(BTreeMap::from([("generated".to_string(), "true".to_string())])),
                annotations: Some(BTreeMap::from([("owner".to_string(), "team-a".to_string())])),
                finalizers: Some(vec!["example.com/keep".to_string()]),
                resource_version: Some("7".to_string()),
                ..Default::default()
            },
            type_: Some("kubernetes.io/tls".to_string()),
            data: Some(BTreeMap::from([("old".to_string(), ByteString(b"stale".to_vec()))])),
            ..Default::default()
        };

        let mut object = from_secret(stored).unwrap();
        assert_eq!(object.version.as_deref(), Some("7"));
        assert_eq!(object.payload["old"], b"stale".to_vec());

        object.payload = BTreeMap::from([("fresh".to_string(), b"bmV3".to_vec())]);
        let sent = to_secret(&object, "secrets").unwrap();

        assert_eq!(sent.type_.as_deref(), Some("kubernetes.io/tls"));
        assert_eq!(
            sent.metadata.annotations,
            Some(BTreeMap::from([("owner".to_string(), "team-a".to_string())]))
        );
        assert_eq!(sent.metadata.finalizers, Some(vec!["example.com/keep".to_string()]));
        assert_eq!(sent.metadata.resource_version.as_deref(), Some("7"));
        // Data is replaced wholesale, not merged
        assert_eq!(
            sent.data,
            Some(BTreeMap::from([("fresh".to_string(), ByteString(b"bmV3".to_vec()))]))
        );
    }

    #[test]
    fn test_secret_without_data_decodes_empty() {
        let secret = Secret {
            metadata: ObjectMeta {
                name: Some("abcde".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let object = from_secret(secret).unwrap();
        assert_eq!(object.name, "abcde");
        assert!(object.payload.is_empty());
        assert!(object.labels.is_empty());
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            api_error(Op::Create, "a", api(409, "AlreadyExists", "exists")),
            StoreError::AlreadyExists { name: "a".to_string() }
        );
        assert_eq!(
            api_error(Op::Update, "a", api(409, "Conflict", "modified")),
            StoreError::Conflict { name: "a".to_string() }
        );
        assert_eq!(
            api_error(Op::Update, "a", api(404, "NotFound", "gone")),
            StoreError::NotFound { name: "a".to_string() }
        );

        match api_error(Op::List, "", api(403, "Forbidden", "secrets is forbidden")) {
            StoreError::Backend(msg) => assert!(msg.contains("secrets is forbidden"), "{}", msg),
            other => panic!("expected backend error, got {:?}", other),
        }
        // 404 on create is not a NotFound for the object itself
        assert!(matches!(
            api_error(Op::Create, "a", api(404, "NotFound", "namespaces \"secrets\" not found")),
            StoreError::Backend(_)
        ));
    }
}
