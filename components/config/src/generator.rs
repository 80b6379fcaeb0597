pub fn generate_toml_config(endpoint_url: &str) -> String {
    let conf = format!(
        r#"[rpc]
endpoint_url = "{endpoint_url}"
api_token = "<your api token>"
timeout_secs = 15

[scan]
blocks = 100
concurrency = 40
max_attempts = 5
backoff_ms = 1000
deadline_secs = 60
"#,
        endpoint_url = endpoint_url.trim_end_matches('/'),
    );
    conf
}
