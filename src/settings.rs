use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DB_PATH: &str = "data/regtree.sqlite";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub configs_path: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("REGTREE_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| format!("Invalid REGTREE_PORT {raw:?}: {e}"))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            host: lookup("REGTREE_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            db_path: lookup("REGTREE_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            configs_path: lookup("CONFIGS_PATH").map(PathBuf::from),
        })
    }

    pub fn dialects_file(&self) -> PathBuf {
        self.configs_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("configs"))
            .join("dialects.json")
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| format!("Invalid bind address {}:{}: {e}", self.host, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.host, "0.0.0.0");
        assert_eq!(settings.db_path, PathBuf::from("data/regtree.sqlite"));
        assert_eq!(settings.configs_path, None);
        assert_eq!(settings.bind_addr().unwrap().port(), 8080);
    }

    #[test]
    fn reads_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            ("REGTREE_HOST", "127.0.0.1"),
            ("REGTREE_PORT", "9090"),
            ("REGTREE_DB_PATH", "/tmp/x.sqlite"),
            ("CONFIGS_PATH", "/etc/regtree"),
        ]))
        .unwrap();
        assert_eq!(settings.bind_addr().unwrap().to_string(), "127.0.0.1:9090");
        assert_eq!(settings.db_path, PathBuf::from("/tmp/x.sqlite"));
        assert_eq!(
            settings.dialects_file(),
            PathBuf::from("/etc/regtree/dialects.json")
        );
    }

    #[test]
    fn rejects_bad_port() {
        assert!(Settings::from_lookup(lookup(&[("REGTREE_PORT", "eighty")])).is_err());
    }
}
