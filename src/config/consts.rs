/// Concurrency used when neither the run config nor the host reports one
pub const FALLBACK_MAX_CONCURRENCY: usize = 4;
/// Environment variable consulted for the log filter
pub const LOG_ENV_VAR: &str = "RECIPE_DAG_LOG";
/// Log filter used when nothing else is configured
pub const DEFAULT_LOG_FILTER: &str = "info";
/// Separator between segments of a qualified task path
pub const TASK_PATH_SEPARATOR: &str = "/";
