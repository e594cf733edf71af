/// Stage and resource name constants shared by the pipeline and the load plan.

// Resource names on the data source
pub const USERS_RESOURCE: &str = "users";
pub const TODOS_RESOURCE: &str = "todos";

// Stage names in the registry
pub const USERS_STAGE: &str = "users_result";
pub const TODOS_STAGE: &str = "todos_result";

// Output file base names
pub const USERS_ACCEPTED_OUTPUT: &str = "users_accepted";
pub const USERS_REJECTED_OUTPUT: &str = "users_rejected";
pub const TODOS_ACCEPTED_OUTPUT: &str = "todos_accepted";
pub const TODOS_REJECTED_OUTPUT: &str = "todos_rejected";

pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";
pub const DEFAULT_CONFIG_PATH: &str = "etl.toml";
pub const DEFAULT_OUTPUT_DIR: &str = "data";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_LOG_FILE: &str = "etl.log";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// ISO-8601 UTC with millisecond precision, e.g. `2024-03-01T12:00:00.123Z`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";
