use std::env;

use log::{debug, error, info};

use crate::completion::Provider;
use crate::error::{BotError, Result};

const DEFAULT_CONTEXT_WINDOW: usize = 5;
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_SLACK_API_URL: &str = "https://slack.com/api";

#[derive(Debug, Clone)]
pub struct Config {
    pub slack: SlackConfig,
    pub completion: CompletionConfig,
    /// Number of most recent turns sent upstream.
    pub context_window: usize,
    pub port: u16,
    /// Present only when both OAuth client credentials are configured.
    pub oauth: Option<OAuthConfig>,
}

#[derive(Debug, Clone)]
pub struct SlackConfig {
    pub bot_token: String,
    pub signing_secret: String,
    pub api_url: String,
}

#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub provider: Provider,
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
}

#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
}

impl Config {
    /// Load configuration from the process environment, reading `.env` first.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value fails to parse.
    pub fn from_env() -> Result<Self> {
        debug!("Loading configuration from environment");
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value fails to parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let required = |name: &str| {
            optional(name).ok_or_else(|| {
                error!("Failed to load {name} from environment");
                BotError::Config(format!("{name} is not set"))
            })
        };

        let bot_token = required("SLACK_BOT_TOKEN")?;
        let signing_secret = required("SLACK_SIGNING_SECRET")?;
        let api_key = required("COMPLETION_API_KEY")?;

        let provider = match optional("COMPLETION_PROVIDER") {
            Some(name) => name.parse::<Provider>().map_err(|_| {
                BotError::Config(format!("Unknown COMPLETION_PROVIDER: {name}"))
            })?,
            None => Provider::default(),
        };
        let model =
            optional("COMPLETION_MODEL").unwrap_or_else(|| provider.default_model().to_string());
        let endpoint =
            optional("COMPLETION_API_URL").unwrap_or_else(|| provider.default_endpoint(&model));

        let context_window = match optional("CONTEXT_WINDOW") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(size) if size > 0 => size,
                _ => {
                    return Err(BotError::Config(format!(
                        "CONTEXT_WINDOW must be a positive integer, got {raw}"
                    )));
                }
            },
            None => DEFAULT_CONTEXT_WINDOW,
        };

        let port = match optional("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| BotError::Config(format!("Invalid PORT {raw}: {e}")))?,
            None => DEFAULT_PORT,
        };

        let api_url = optional("SLACK_API_URL").unwrap_or_else(|| DEFAULT_SLACK_API_URL.to_string());

        let oauth = match (optional("SLACK_CLIENT_ID"), optional("SLACK_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(OAuthConfig {
                client_id,
                client_secret,
            }),
            _ => None,
        };

        info!("Configuration loaded successfully");
        debug!("Slack bot token length: {} characters", bot_token.len());
        debug!(
            "Slack signing secret length: {} characters",
            signing_secret.len()
        );
        debug!("Completion API key length: {} characters", api_key.len());
        debug!("Completion provider: {provider}, model: {model}, endpoint: {endpoint}");
        debug!("Context window: {context_window} turns");
        debug!("OAuth installation enabled: {}", oauth.is_some());

        Ok(Self {
            slack: SlackConfig {
                bot_token,
                signing_secret,
                api_url,
            },
            completion: CompletionConfig {
                provider,
                api_key,
                model,
                endpoint,
            },
            context_window,
            port,
            oauth,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("SLACK_BOT_TOKEN", "xoxb-1"),
        ("SLACK_SIGNING_SECRET", "secret"),
        ("COMPLETION_API_KEY", "sk-1"),
    ];

    #[test]
    fn defaults_apply_when_only_required_vars_are_set() {
        let config = load(&REQUIRED).expect("config");
        assert_eq!(config.context_window, 5);
        assert_eq!(config.port, 3000);
        assert_eq!(config.completion.provider, Provider::Chat);
        assert_eq!(config.completion.model, "gpt-3.5-turbo");
        assert_eq!(
            config.completion.endpoint,
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(config.slack.api_url, "https://slack.com/api");
        assert!(config.oauth.is_none());
    }

    #[test]
    fn missing_required_var_is_a_config_error() {
        let err = load(&REQUIRED[..2]).expect_err("missing key");
        assert!(matches!(err, BotError::Config(ref msg) if msg.contains("COMPLETION_API_KEY")));
    }

    #[test]
    fn prompt_provider_derives_endpoint_from_model() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("COMPLETION_PROVIDER", "huggingface"));
        vars.push(("COMPLETION_MODEL", "bigscience/bloom"));
        let config = load(&vars).expect("config");
        assert_eq!(config.completion.provider, Provider::Prompt);
        assert_eq!(
            config.completion.endpoint,
            "https://api-inference.huggingface.co/models/bigscience/bloom"
        );
    }

    #[test]
    fn overrides_and_oauth_are_read() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("CONTEXT_WINDOW", "8"),
            ("PORT", "8080"),
            ("COMPLETION_API_URL", "http://localhost:9000/v1/chat/completions"),
            ("SLACK_CLIENT_ID", "123.456"),
            ("SLACK_CLIENT_SECRET", "shh"),
        ]);
        let config = load(&vars).expect("config");
        assert_eq!(config.context_window, 8);
        assert_eq!(config.port, 8080);
        assert_eq!(
            config.completion.endpoint,
            "http://localhost:9000/v1/chat/completions"
        );
        assert_eq!(config.oauth.map(|o| o.client_id).as_deref(), Some("123.456"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        for (name, value) in [
            ("CONTEXT_WINDOW", "0"),
            ("CONTEXT_WINDOW", "many"),
            ("PORT", "70000"),
            ("COMPLETION_PROVIDER", "carrier-pigeon"),
        ] {
            let mut vars = REQUIRED.to_vec();
            vars.push((name, value));
            assert!(
                matches!(load(&vars), Err(BotError::Config(_))),
                "{name}={value} should fail"
            );
        }
    }
}
