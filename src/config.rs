use log::warn;
use std::net::SocketAddr;
use std::time::Duration;

const ADDR_VAR: &str = "WHEELDASH_ADDR";
const MAX_UPLOAD_VAR: &str = "WHEELDASH_MAX_UPLOAD_MB";
const SESSION_TTL_VAR: &str = "WHEELDASH_SESSION_TTL_SECS";
const MAX_SESSIONS_VAR: &str = "WHEELDASH_MAX_SESSIONS";

const DEFAULT_ADDR: ([u8; 4], u16) = ([127, 0, 0, 1], 3000);
const DEFAULT_MAX_UPLOAD_MB: usize = 16;
const DEFAULT_SESSION_TTL: u64 = 24 * 60 * 60; // 24 hours in seconds
const DEFAULT_MAX_SESSIONS: usize = 64;

/// Runtime settings for the dashboard server.
#[derive(Clone, Debug, PartialEq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub max_upload_bytes: usize,
    pub session_ttl: Duration,
    pub max_sessions: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(DEFAULT_ADDR),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL),
            max_sessions: DEFAULT_MAX_SESSIONS,
        }
    }
}

impl ServerConfig {
    /// Reads the settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the settings through `lookup`. Unset variables keep their default;
    /// malformed ones are reported and also keep their default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = parse_var(&lookup, ADDR_VAR) {
            config.addr = addr;
        }
        if let Some(mb) = parse_var::<usize, _>(&lookup, MAX_UPLOAD_VAR) {
            match mb.checked_mul(1024 * 1024) {
                Some(bytes) => config.max_upload_bytes = bytes,
                None => warn!("ignoring oversized {}={}", MAX_UPLOAD_VAR, mb),
            }
        }
        if let Some(secs) = parse_var(&lookup, SESSION_TTL_VAR) {
            config.session_ttl = Duration::from_secs(secs);
        }
        match parse_var::<usize, _>(&lookup, MAX_SESSIONS_VAR) {
            Some(0) => warn!("ignoring {}=0", MAX_SESSIONS_VAR),
            Some(max) => config.max_sessions = max,
            None => {}
        }

        config
    }

    /// A leading `<addr>` argument overrides the listen address.
    pub fn with_args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        if let Some(arg) = args.into_iter().next() {
            match arg.parse() {
                Ok(addr) => self.addr = addr,
                Err(_) => warn!("ignoring invalid listen address argument {:?}", arg),
            }
        }
        self
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("ignoring malformed {}={:?}", key, raw);
            None
        }
    }
}
