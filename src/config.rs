use std::{env, str::FromStr, time::Duration};

use log::warn;

const BASE_URL: &str = "https://myflixer.phisherdesicinema.workers.dev/?url=https://myflixerz.to";
const VIDEOSTR_DOMAIN: &str = "videostr.net";
const VIDEOSTR_API_URL: &str = "https://videostr.net/embed-1/v2/e-1/getSources";
const VIDEOSTR_REFERER: &str = "https://videostr.net";
const KEYS_URL: &str =
    "https://raw.githubusercontent.com/yogesh-hacker/MegacloudKeys/refs/heads/main/keys.json";
const KEYS_NAME: &str = "vidstr";

/// Runtime settings of the addon. Defaults target the public MyFlixer mirror,
/// every field can be overridden from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Source site root, reached through a URL-rewriting proxy.
    pub base_url: String,
    pub request_timeout: Duration,
    /// Upper bound for a whole stream resolution chain.
    pub stream_deadline: Duration,
    pub page_size: u32,
    pub video_host: VideoHostConfig,
}

#[derive(Debug, Clone)]
pub struct VideoHostConfig {
    /// Links containing this domain go through the host API + decryption branch.
    pub domain: String,
    pub api_url: String,
    pub referer: String,
    pub keys_url: String,
    /// Entry of the key ring holding this host's password.
    pub key_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 7000,
            base_url: BASE_URL.into(),
            request_timeout: Duration::from_secs(15),
            stream_deadline: Duration::from_secs(60),
            page_size: 20,
            video_host: VideoHostConfig::default(),
        }
    }
}

impl Default for VideoHostConfig {
    fn default() -> Self {
        Self {
            domain: VIDEOSTR_DOMAIN.into(),
            api_url: VIDEOSTR_API_URL.into(),
            referer: VIDEOSTR_REFERER.into(),
            keys_url: KEYS_URL.into(),
            key_name: KEYS_NAME.into(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply(|name| env::var(name).ok());
        config
    }

    fn apply<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.host = host;
        }
        if let Some(port) = parse_var(&lookup, "PORT") {
            self.port = port;
        }
        if let Some(base_url) = lookup("MYFLIXER_BASE_URL") {
            self.base_url = base_url.trim_end_matches('/').to_owned();
        }
        if let Some(secs) = parse_var(&lookup, "MYFLIXER_REQUEST_TIMEOUT_SECS") {
            self.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var(&lookup, "MYFLIXER_STREAM_DEADLINE_SECS") {
            self.stream_deadline = Duration::from_secs(secs);
        }

        let host = &mut self.video_host;
        if let Some(domain) = lookup("VIDEOSTR_DOMAIN") {
            host.domain = domain;
        }
        if let Some(api_url) = lookup("VIDEOSTR_API_URL") {
            host.api_url = api_url;
        }
        if let Some(referer) = lookup("VIDEOSTR_REFERER") {
            host.referer = referer;
        }
        if let Some(keys_url) = lookup("KEYS_URL") {
            host.keys_url = keys_url;
        }
        if let Some(key_name) = lookup("KEYS_NAME") {
            host.key_name = key_name;
        }
    }
}

fn parse_var<F, T>(lookup: &F, name: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("[config] ignoring invalid {name}={raw:?}, keeping default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn apply_vars(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let mut config = Config::default();
        config.apply(|name| vars.get(name).cloned());
        config
    }

    #[test]
    fn should_keep_defaults_without_env() {
        let config = apply_vars(&[]);

        assert_eq!(config.port, 7000);
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.video_host.key_name, "vidstr");
        assert!(config.base_url.ends_with("myflixerz.to"));
    }

    #[test]
    fn should_override_from_env() {
        let config = apply_vars(&[
            ("PORT", "8080"),
            ("MYFLIXER_BASE_URL", "http://localhost:9000/"),
            ("MYFLIXER_STREAM_DEADLINE_SECS", "5"),
            ("KEYS_NAME", "rabbit"),
        ]);

        assert_eq!(config.port, 8080);
        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.stream_deadline, Duration::from_secs(5));
        assert_eq!(config.video_host.key_name, "rabbit");
    }

    #[test]
    fn should_ignore_invalid_numbers() {
        let config = apply_vars(&[("PORT", "not-a-port"), ("MYFLIXER_REQUEST_TIMEOUT_SECS", "")]);

        assert_eq!(config.port, 7000);
        assert_eq!(config.request_timeout, Duration::from_secs(15));
    }
}
