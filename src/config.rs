use std::env;

pub const DEFAULT_NOTES_KEY: &str = "default-secret-key-change-me";

#[derive(Debug, Clone)]
pub struct Config {
    /// Without a database the service keeps logs in memory.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,
    pub cors_extra_origins: Vec<String>,

    pub jwt_secret: String,
    pub jwt_audience: String,

    pub notes_encryption_key: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .expect("PORT must be a number"),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            cors_extra_origins: env::var("CORS_EXTRA_ORIGINS")
                .map(|raw| split_origins(&raw))
                .unwrap_or_default(),

            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            jwt_audience: env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "authenticated".into()),

            notes_encryption_key: env::var("NOTES_ENCRYPTION_KEY")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_NOTES_KEY.into()),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn notes_key_is_default(&self) -> bool {
        self.notes_encryption_key == DEFAULT_NOTES_KEY
    }

    pub fn allowed_origins(&self) -> Vec<&str> {
        std::iter::once(self.frontend_url.as_str())
            .chain(self.cors_extra_origins.iter().map(String::as_str))
            .collect()
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        database_url: None,
        host: "127.0.0.1".into(),
        port: 0,
        frontend_url: "http://localhost:3000".into(),
        cors_extra_origins: vec![],
        jwt_secret: "test-jwt-secret".into(),
        jwt_audience: "authenticated".into(),
        notes_encryption_key: DEFAULT_NOTES_KEY.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_origins_trims_and_skips_blanks() {
        assert_eq!(
            split_origins(" http://192.168.1.5:3000 ,,http://10.0.0.2:3000"),
            vec!["http://192.168.1.5:3000", "http://10.0.0.2:3000"]
        );
    }

    #[test]
    fn test_allowed_origins_starts_with_frontend() {
        let mut config = test_config();
        config.cors_extra_origins = vec!["http://10.0.0.2:3000".into()];
        assert_eq!(
            config.allowed_origins(),
            vec!["http://localhost:3000", "http://10.0.0.2:3000"]
        );
        assert!(config.notes_key_is_default());
        assert_eq!(config.listen_addr(), "127.0.0.1:0");
    }
}
