use serde::Deserialize;
use url::Url;

/// Name of the cookie that carries an established yukicoder login.
pub const SESSION_COOKIE: &str = "REVEL_SESSION";

fn default_base_url() -> Url {
    // statically valid
    Url::parse("https://yukicoder.me/").unwrap()
}

fn default_filename() -> String {
    "code".to_owned()
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_base_url")]
    pub base_url: Url,
    #[serde(default)]
    pub session: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default = "default_filename")]
    pub default_filename: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            session: None,
            user_agent: None,
            default_filename: default_filename(),
        }
    }
}

impl Config {
    pub fn with_base_url(base_url: Url) -> Self {
        Self {
            base_url,
            ..Default::default()
        }
    }

    pub fn host(&self) -> Option<&str> {
        self.base_url.host_str()
    }

    /// Join `path` onto the configured base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(path.trim_start_matches('/'))
    }
}
