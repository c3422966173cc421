//! Config serialization to TOML
//!
//! Single source of truth for config file format.

use super::Config;

/// TOML basic string with quotes and backslashes escaped
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

impl Config {
    /// Render the config file. Demo mode is a runtime flag and never persisted.
    pub fn to_toml(&self) -> String {
        format!(
            r#"# hoa-lookup configuration

# Registry AJAX endpoint (HOA_LOOKUP_ENDPOINT overrides)
endpoint = {endpoint}

# User-Agent sent with registry requests
user_agent = {user_agent}

# Per-request timeout in seconds
timeout_secs = {timeout}

# Where the "Return to HOA Website" control leads
return_url = {return_url}

# Search box (HOA_LOOKUP_DEBOUNCE_MS overrides)
[search]
debounce_ms = {debounce}

# Bulk CSV export (limit and save_dir are remembered after each run)
[scrape]
limit = {limit}  # 0 = everything
save_dir = {save_dir}
workers = {workers}
retries = {retries}  # attempts per request

# Logging configuration (RUST_LOG env var overrides)
[logging]
level = {log_level}
# File logging (in addition to TUI buffer or stderr)
file_enabled = {log_file_enabled}
file_dir = {log_file_dir}
file_rotation = "{log_file_rotation}"  # hourly, daily, never
file_prefix = {log_file_prefix}
"#,
            endpoint = quoted(&self.endpoint),
            user_agent = quoted(&self.user_agent),
            timeout = self.timeout_secs,
            return_url = quoted(&self.return_url),
            debounce = self.search.debounce_ms,
            limit = self.scrape.limit,
            save_dir = quoted(&self.scrape.save_dir.display().to_string()),
            workers = self.scrape.workers,
            retries = self.scrape.retries,
            log_level = quoted(&self.logging.level),
            log_file_enabled = self.logging.file_enabled,
            log_file_dir = quoted(&self.logging.file_dir.display().to_string()),
            log_file_rotation = self.logging.file_rotation.as_str(),
            log_file_prefix = quoted(&self.logging.file_prefix),
        )
    }
}
