use dotenvy::dotenv;
use std::env;

pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub config_base_url: String,
    pub config_app: String,
    pub config_env: String,
    pub config_profile: String,
}

impl Config {
    pub fn from_env() -> Self {
        let _ = dotenv().is_ok();

        let port = env::var("PORT")
            .expect("PORT missing, it is required")
            .parse()
            .expect("PORT must be a valid u16 number");

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL missing, it is required");

        // The configuration sidecar listens on localhost unless told otherwise
        let config_base_url =
            env::var("CONFIG_BASE_URL").unwrap_or_else(|_| "http://localhost:2772".to_string());
        let config_app = env::var("CONFIG_APP_NAME").expect("CONFIG_APP_NAME missing");
        let config_env = env::var("CONFIG_ENV_NAME").expect("CONFIG_ENV_NAME missing");
        let config_profile = env::var("CONFIG_PROFILE_NAME").expect("CONFIG_PROFILE_NAME missing");

        Self {
            port,
            database_url,
            config_base_url,
            config_app,
            config_env,
            config_profile,
        }
    }

    pub fn addr(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }
}
