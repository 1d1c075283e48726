use std::path::PathBuf;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

const DEFAULT_ALLOWED_ORIGINS: &str =
    "http://localhost:8080,http://127.0.0.1:8080,http://localhost:5173,http://127.0.0.1:5173";

/// Server settings, read once at startup.
///
/// | Env | Default | Description |
/// |-----|---------|-------------|
/// | BIND_ADDR | 0.0.0.0:3000 | Listen address |
/// | ALLOWED_ORIGINS | localhost dev ports | Comma separated CORS origins |
/// | QUIZ_CATALOG_PATH | built-in | JSON question table replacing the built-in quiz |
/// | SD_API_URL / SD_API_TOKEN | unset | Image model server; transforms are disabled without it |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub allowed_origins: Vec<String>,
    pub quiz_catalog_path: Option<PathBuf>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let allowed_origins = non_empty("ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            bind_addr: non_empty("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            allowed_origins,
            quiz_catalog_path: non_empty("QUIZ_CATALOG_PATH").map(PathBuf::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(|_| None);

        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.allowed_origins.len(), 4);
        assert!(config.quiz_catalog_path.is_none());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("BIND_ADDR", "127.0.0.1:8000"),
            ("ALLOWED_ORIGINS", " https://studio.example , ,http://localhost:3001"),
            ("QUIZ_CATALOG_PATH", "/etc/studio/quiz.json"),
        ]
        .into_iter()
        .collect();

        let config = ServerConfig::from_lookup(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.bind_addr, "127.0.0.1:8000");
        assert_eq!(
            config.allowed_origins,
            vec!["https://studio.example", "http://localhost:3001"]
        );
        assert_eq!(config.quiz_catalog_path, Some(PathBuf::from("/etc/studio/quiz.json")));
    }

    #[test]
    fn test_blank_values_fall_back() {
        let config = ServerConfig::from_lookup(|_| Some("  ".to_string()));
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert!(config.quiz_catalog_path.is_none());
    }
}
