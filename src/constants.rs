// src/constants.rs
//
// Central location for the tunables and fixed strings used by kube-churn.

// =============================================================================
// Load Shape
// =============================================================================

/// Worker-pool width: max in-flight creates, and the partition width for updates
pub const WORKERS: usize = 200;

/// Number of objects created before the update phase starts
pub const OBJECTS_TOTAL: usize = 100;

/// Namespace all objects are created in
pub const DEFAULT_NAMESPACE: &str = "secrets";

// =============================================================================
// Object Synthesis
// =============================================================================

/// Length of generated object names
pub const IDENTIFIER_LEN: usize = 5;

/// Length of the single payload key
pub const PAYLOAD_KEY_LEN: usize = 5;

/// Length of the random text that gets base64-encoded into the payload value
pub const PAYLOAD_VALUE_LEN: usize = 10;

/// Alphabet for identifiers and payload text
pub const IDENTIFIER_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Marker label attached to every generated object
pub const MARKER_LABEL_KEY: &str = "generated";
pub const MARKER_LABEL_VALUE: &str = "true";

// =============================================================================
// Update Loop
// =============================================================================

/// Mutator tasks yield to the scheduler every this many updates
pub const UPDATE_YIELD_INTERVAL: u64 = 64;

// =============================================================================
// Kubernetes Client
// =============================================================================

/// Default kubeconfig location relative to the home directory
pub const KUBECONFIG_HOME_RELATIVE: &str = ".kube/config";

/// Environment variable that overrides the kubeconfig path
pub const KUBECONFIG_ENV: &str = "KUBECONFIG";

/// Per-request timeout for store calls (seconds)
pub const STORE_REQUEST_TIMEOUT_SECS: u64 = 30;
