use std::{env, str::FromStr, time::Duration};

use arena_engine::drivers::{
    matchmaker::{DEFAULT_MAX_INTERVAL, DEFAULT_MIN_INTERVAL},
    reconciler::DEFAULT_MATCH_TIMEOUT_SECS,
};
use log::*;

const DEFAULT_ARENA_HOST: &str = "127.0.0.1";
const DEFAULT_ARENA_PORT: u16 = 6526;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/arena.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 25;
const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(3);
const DEFAULT_RECONCILE_INTERVAL: Duration = Duration::from_secs(600);
/// Longest accepted `ARENA_MATCH_TIMEOUT`. One week.
pub const MAX_MATCH_TIMEOUT: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    /// Upper bound on any single wait for the store (pool acquire or a locked database).
    pub store_timeout: Duration,
    /// Run schema migrations before serving requests.
    pub auto_migrate: bool,
    pub workers: WorkerConfig,
}

/// Scheduling of the two background drivers.
#[derive(Clone, Debug)]
pub struct WorkerConfig {
    pub matchmaker_enabled: bool,
    pub matchmaker_min_interval: Duration,
    pub matchmaker_max_interval: Duration,
    pub reconciler_enabled: bool,
    pub reconcile_interval: Duration,
    /// How old an active match must be before the reconciler settles or times it out.
    pub match_timeout: Duration,
    /// Each driver cycle is abandoned if it runs longer than this.
    pub cycle_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_ARENA_HOST.to_string(),
            port: DEFAULT_ARENA_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            auto_migrate: true,
            workers: WorkerConfig::default(),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            matchmaker_enabled: true,
            matchmaker_min_interval: DEFAULT_MIN_INTERVAL,
            matchmaker_max_interval: DEFAULT_MAX_INTERVAL,
            reconciler_enabled: true,
            reconcile_interval: DEFAULT_RECONCILE_INTERVAL,
            match_timeout: Duration::from_secs(DEFAULT_MATCH_TIMEOUT_SECS as u64),
            cycle_timeout: 10 * DEFAULT_STORE_TIMEOUT,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("ARENA_HOST").ok().unwrap_or_else(|| DEFAULT_ARENA_HOST.into());
        let port = parse_env("ARENA_PORT", DEFAULT_ARENA_PORT);
        let database_url = env::var("ARENA_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ ARENA_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.into()
        });
        let max_connections = parse_env("ARENA_DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS);
        let store_timeout = seconds_from_env("ARENA_STORE_TIMEOUT", DEFAULT_STORE_TIMEOUT);
        let auto_migrate = flag_from_env("ARENA_AUTO_MIGRATE", true);
        let workers = WorkerConfig::from_env_or_default(store_timeout);
        Self { host, port, database_url, max_connections, store_timeout, auto_migrate, workers }
    }
}

impl WorkerConfig {
    pub fn from_env_or_default(store_timeout: Duration) -> Self {
        let mut min = seconds_from_env("ARENA_MATCHMAKER_MIN_INTERVAL", DEFAULT_MIN_INTERVAL);
        let mut max = seconds_from_env("ARENA_MATCHMAKER_MAX_INTERVAL", DEFAULT_MAX_INTERVAL);
        if min.is_zero() {
            warn!("🪛️ ARENA_MATCHMAKER_MIN_INTERVAL cannot be zero. Using the default, {DEFAULT_MIN_INTERVAL:?}.");
            min = DEFAULT_MIN_INTERVAL;
        }
        if max < min {
            warn!(
                "🪛️ ARENA_MATCHMAKER_MAX_INTERVAL ({max:?}) is shorter than the minimum interval ({min:?}). Using the \
                 minimum for both."
            );
            max = min;
        }
        let reconcile_interval = seconds_from_env("ARENA_RECONCILE_INTERVAL", DEFAULT_RECONCILE_INTERVAL);
        let reconcile_interval = if reconcile_interval.is_zero() {
            warn!("🪛️ ARENA_RECONCILE_INTERVAL cannot be zero. Using the default.");
            DEFAULT_RECONCILE_INTERVAL
        } else {
            reconcile_interval
        };
        let default_timeout = Duration::from_secs(DEFAULT_MATCH_TIMEOUT_SECS as u64);
        let match_timeout = clamp_match_timeout(seconds_from_env("ARENA_MATCH_TIMEOUT", default_timeout));
        let matchmaker_enabled = !flag_from_env("ARENA_DISABLE_MATCHMAKER", false);
        let reconciler_enabled = !flag_from_env("ARENA_DISABLE_RECONCILER", false);
        if !matchmaker_enabled {
            info!("🪛️ The matchmaker is disabled. No new matches will be created by this instance.");
        }
        if !reconciler_enabled {
            info!("🪛️ The reconciler is disabled. Matches will not be settled by this instance.");
        }
        Self {
            matchmaker_enabled,
            matchmaker_min_interval: min,
            matchmaker_max_interval: max,
            reconciler_enabled,
            reconcile_interval,
            match_timeout,
            cycle_timeout: 10 * store_timeout,
        }
    }
}

fn parse_env<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display + Copy,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => {
            debug!("🪛️ {name} is not set. Using the default, {default}.");
            default
        },
    }
}

fn clamp_match_timeout(timeout: Duration) -> Duration {
    if timeout > MAX_MATCH_TIMEOUT {
        warn!("🪛️ ARENA_MATCH_TIMEOUT ({timeout:?}) is too long. Using the maximum, {MAX_MATCH_TIMEOUT:?}.");
        MAX_MATCH_TIMEOUT
    } else {
        timeout
    }
}

fn seconds_from_env(name: &str, default: Duration) -> Duration {
    Duration::from_secs(parse_env(name, default.as_secs()))
}

fn flag_from_env(name: &str, default: bool) -> bool {
    env::var(name)
        .map(|s| {
            let s = s.trim().to_lowercase();
            if default {
                s != "0" && s != "false"
            } else {
                s == "1" || s == "true"
            }
        })
        .unwrap_or(default)
}
