use super::parsing::{
    env_optional, env_or_default, parse_bool, parse_cors_origins, parse_environment, parse_f64,
    parse_number,
};
use super::secret::load_or_create_secret_key;
use super::types::{
    AiSettings, ApiSettings, ConfigError, CorsSettings, DatabaseSettings, RetentionSettings,
    RuntimeSettings, SecuritySettings, ServerHost, ServerPort, ServerSettings, Settings,
    StreamingSettings, SubmissionSettings, TelemetrySettings,
};

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("PROOFREAD_HOST", "0.0.0.0");
        let port = env_or_default("PROOFREAD_PORT", "8080");

        let environment = parse_environment(
            env_optional("PROOFREAD_ENV").or_else(|| env_optional("ENVIRONMENT")),
        );
        let strict_config = env_optional("PROOFREAD_STRICT_CONFIG")
            .map(|value| parse_bool(&value))
            .unwrap_or(false)
            || environment.is_production();

        let project_name = env_or_default("PROJECT_NAME", "Proofread API");
        let version = env_or_default("VERSION", env!("CARGO_PKG_VERSION"));
        let api_v1_str = env_or_default("API_V1_STR", "/api/v1");

        let secret_key = match env_optional("SECRET_KEY") {
            Some(value) => value,
            None => load_or_create_secret_key(),
        };
        let algorithm = env_or_default("ALGORITHM", "HS256");

        let cors_origins = parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))?;

        let postgres_server = env_or_default("POSTGRES_SERVER", "localhost");
        let postgres_port = parse_number("POSTGRES_PORT", env_or_default("POSTGRES_PORT", "5432"))?;
        let postgres_user = env_or_default("POSTGRES_USER", "proofread");
        let postgres_password = env_or_default("POSTGRES_PASSWORD", "");
        let postgres_db = env_or_default("POSTGRES_DB", "proofread_db");
        let database_url = env_optional("DATABASE_URL");

        let openai_api_key = env_or_default("OPENAI_API_KEY", "");
        let openai_base_url = env_or_default("OPENAI_BASE_URL", "https://api.openai.com/v1");
        let light_model = env_or_default("AI_LIGHT_MODEL", "gpt-4o-mini");
        let heavy_model = env_or_default("AI_HEAVY_MODEL", "gpt-4o");
        let ai_max_tokens = parse_number("AI_MAX_TOKENS", env_or_default("AI_MAX_TOKENS", "4000"))?;
        let ai_request_timeout =
            parse_number("AI_REQUEST_TIMEOUT", env_or_default("AI_REQUEST_TIMEOUT", "120"))?;
        let ai_temperature =
            parse_f64("AI_TEMPERATURE", env_or_default("AI_TEMPERATURE", "0.2"))?;

        let max_text_bytes =
            parse_number("MAX_TEXT_BYTES", env_or_default("MAX_TEXT_BYTES", "100000"))?;
        let model_threshold_words = parse_number(
            "MODEL_THRESHOLD_WORDS",
            env_or_default("MODEL_THRESHOLD_WORDS", "500"),
        )?;
        let max_concurrent_corrections = parse_number(
            "MAX_CONCURRENT_CORRECTIONS",
            env_or_default("MAX_CONCURRENT_CORRECTIONS", "16"),
        )?;

        let keepalive_seconds = parse_number(
            "STREAM_KEEPALIVE_SECONDS",
            env_or_default("STREAM_KEEPALIVE_SECONDS", "25"),
        )?;
        let listener_capacity = parse_number(
            "STREAM_LISTENER_CAPACITY",
            env_or_default("STREAM_LISTENER_CAPACITY", "8"),
        )?;

        let retention_days =
            parse_number("ARCHIVE_RETENTION_DAYS", env_or_default("ARCHIVE_RETENTION_DAYS", "45"))?;
        let sweep_interval_seconds = parse_number(
            "ARCHIVE_SWEEP_INTERVAL_SECONDS",
            env_or_default("ARCHIVE_SWEEP_INTERVAL_SECONDS", "86400"),
        )?;

        let log_level = env_or_default("PROOFREAD_LOG_LEVEL", "info");
        let json = env_optional("PROOFREAD_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);
        let prometheus_enabled =
            env_optional("PROMETHEUS_ENABLED").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            server: ServerSettings {
                host: ServerHost::parse(host)?,
                port: ServerPort::parse(port)?,
            },
            runtime: RuntimeSettings { environment, strict_config },
            api: ApiSettings { project_name, version, api_v1_str },
            security: SecuritySettings { secret_key, algorithm },
            cors: CorsSettings { origins: cors_origins },
            database: DatabaseSettings {
                postgres_server,
                postgres_port,
                postgres_user,
                postgres_password,
                postgres_db,
                database_url,
            },
            ai: AiSettings {
                openai_api_key,
                openai_base_url,
                light_model,
                heavy_model,
                ai_max_tokens,
                ai_request_timeout,
                ai_temperature,
            },
            submissions: SubmissionSettings {
                max_text_bytes,
                model_threshold_words,
                max_concurrent_corrections,
            },
            streaming: StreamingSettings { keepalive_seconds, listener_capacity },
            retention: RetentionSettings { retention_days, sweep_interval_seconds },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host.0, self.server.port.0)
    }

    pub(crate) fn server_host(&self) -> &str {
        &self.server.host.0
    }

    pub(crate) fn server_port(&self) -> u16 {
        self.server.port.0
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn security(&self) -> &SecuritySettings {
        &self.security
    }

    pub(crate) fn cors(&self) -> &CorsSettings {
        &self.cors
    }

    pub(crate) fn database(&self) -> &DatabaseSettings {
        &self.database
    }

    pub(crate) fn ai(&self) -> &AiSettings {
        &self.ai
    }

    pub(crate) fn submissions(&self) -> &SubmissionSettings {
        &self.submissions
    }

    pub(crate) fn streaming(&self) -> &StreamingSettings {
        &self.streaming
    }

    pub(crate) fn retention(&self) -> &RetentionSettings {
        &self.retention
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.submissions.max_text_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "MAX_TEXT_BYTES",
                value: "0".to_string(),
            });
        }

        if self.submissions.max_concurrent_corrections == 0 {
            return Err(ConfigError::InvalidValue {
                field: "MAX_CONCURRENT_CORRECTIONS",
                value: "0".to_string(),
            });
        }

        if self.streaming.keepalive_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "STREAM_KEEPALIVE_SECONDS",
                value: "0".to_string(),
            });
        }

        if self.streaming.listener_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "STREAM_LISTENER_CAPACITY",
                value: "0".to_string(),
            });
        }

        if self.retention.retention_days <= 0 {
            return Err(ConfigError::InvalidValue {
                field: "ARCHIVE_RETENTION_DAYS",
                value: self.retention.retention_days.to_string(),
            });
        }

        if self.retention.sweep_interval_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "ARCHIVE_SWEEP_INTERVAL_SECONDS",
                value: "0".to_string(),
            });
        }

        if !(self.runtime.strict_config || self.runtime.environment.is_production()) {
            return Ok(());
        }

        if self.database.database_url.is_none() && self.database.postgres_password.is_empty() {
            return Err(ConfigError::MissingSecret("POSTGRES_PASSWORD"));
        }
        if self.ai.openai_api_key.is_empty() {
            return Err(ConfigError::MissingSecret("OPENAI_API_KEY"));
        }
        if self.ai.openai_base_url.is_empty() {
            return Err(ConfigError::MissingSecret("OPENAI_BASE_URL"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[tokio::test]
    async fn defaults_match_documented_values() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();

        let settings = Settings::load().expect("settings");
        assert_eq!(settings.submissions().max_text_bytes, 100_000);
        assert_eq!(settings.submissions().model_threshold_words, 500);
        assert_eq!(settings.streaming().listener_capacity, 8);
        assert_eq!(settings.retention().retention_days, 45);
        assert_eq!(settings.retention().sweep_interval_seconds, 86_400);
    }

    #[tokio::test]
    async fn strict_mode_requires_provider_key() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        std::env::set_var("PROOFREAD_STRICT_CONFIG", "1");
        std::env::remove_var("OPENAI_API_KEY");

        let result = Settings::load();
        std::env::set_var("PROOFREAD_STRICT_CONFIG", "0");

        assert!(matches!(result, Err(ConfigError::MissingSecret("OPENAI_API_KEY"))));
    }

    #[tokio::test]
    async fn zero_retention_is_rejected() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        std::env::set_var("ARCHIVE_RETENTION_DAYS", "0");

        let result = Settings::load();
        std::env::remove_var("ARCHIVE_RETENTION_DAYS");

        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { field: "ARCHIVE_RETENTION_DAYS", .. })
        ));
    }
}
