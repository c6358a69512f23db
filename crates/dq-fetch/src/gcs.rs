//! Google Cloud Storage over the JSON API.
//!
//! Objects are downloaded with `GET {endpoint}/storage/v1/b/{bucket}/o/{object}?alt=media`
//! using a blocking client; the object name travels as a single
//! percent-encoded path segment.

use std::path::Path;
use std::time::Duration;

use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{FetchError, Result};
use crate::location::ObjectLocation;
use crate::store::{FetchReport, ObjectStore, write_atomically};

/// Public JSON API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://storage.googleapis.com";

/// Points the client at an emulator (e.g. `localhost:4443`).
pub const EMULATOR_ENV_VAR: &str = "STORAGE_EMULATOR_HOST";

/// An OAuth2 access token supplied by the caller's environment.
pub const ACCESS_TOKEN_ENV_VAR: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const METADATA_TIMEOUT: Duration = Duration::from_secs(2);

/// Where the bearer token comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Credentials {
    /// `GOOGLE_OAUTH_ACCESS_TOKEN`, then the GCE metadata server, then anonymous.
    #[default]
    Ambient,
    /// A fixed access token.
    Token(String),
    /// No `Authorization` header (public objects, emulators).
    Anonymous,
}

#[derive(Debug, Clone, Default)]
pub struct GcsConfig {
    /// Overrides both the public endpoint and `STORAGE_EMULATOR_HOST`.
    pub endpoint: Option<String>,
    /// Project billed for requester-pays buckets.
    pub user_project: Option<String>,
    pub credentials: Credentials,
}

#[derive(Deserialize)]
struct MetadataToken {
    access_token: String,
}

pub struct GcsStore {
    client: Client,
    endpoint: Url,
    user_project: Option<String>,
    credentials: Credentials,
}

impl GcsStore {
    pub fn new(config: GcsConfig) -> Result<Self> {
        let emulator = std::env::var(EMULATOR_ENV_VAR)
            .ok()
            .filter(|value| !value.trim().is_empty());
        let (raw_endpoint, credentials) = match (config.endpoint, emulator) {
            (Some(endpoint), _) => (endpoint, config.credentials),
            (None, Some(host)) => (with_scheme(&host), Credentials::Anonymous),
            (None, None) => (DEFAULT_ENDPOINT.to_string(), config.credentials),
        };
        let endpoint = Url::parse(&raw_endpoint).map_err(|err| {
            FetchError::InvalidLocation(format!("storage endpoint {raw_endpoint}: {err}"))
        })?;
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|source| FetchError::Network {
                location: endpoint.to_string(),
                source,
            })?;
        Ok(Self {
            client,
            endpoint,
            user_project: config.user_project,
            credentials,
        })
    }

    /// Media download URL for an object.
    pub fn object_url(&self, location: &ObjectLocation) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| {
                FetchError::InvalidLocation(format!("endpoint {} cannot be a base", self.endpoint))
            })?
            .pop_if_empty()
            .extend([
                "storage",
                "v1",
                "b",
                location.bucket.as_str(),
                "o",
                location.path.as_str(),
            ]);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("alt", "media");
            if let Some(project) = &self.user_project {
                query.append_pair("userProject", project);
            }
        }
        Ok(url)
    }

    fn bearer_token(&self) -> Result<Option<String>> {
        match &self.credentials {
            Credentials::Anonymous => Ok(None),
            Credentials::Token(token) => Ok(Some(token.clone())),
            Credentials::Ambient => {
                if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV_VAR)
                    && !token.trim().is_empty()
                {
                    debug!("using access token from {ACCESS_TOKEN_ENV_VAR}");
                    return Ok(Some(token.trim().to_string()));
                }
                match self.metadata_token() {
                    Ok(token) => {
                        debug!("using metadata server access token");
                        Ok(Some(token))
                    }
                    Err(err) => {
                        debug!(error = %err, "no ambient credentials, fetching anonymously");
                        Ok(None)
                    }
                }
            }
        }
    }

    fn metadata_token(&self) -> Result<String> {
        let response = self
            .client
            .get(METADATA_TOKEN_URL)
            .header("Metadata-Flavor", "Google")
            .timeout(METADATA_TIMEOUT)
            .send()
            .map_err(|err| FetchError::Credentials(err.to_string()))?;
        if !response.status().is_success() {
            return Err(FetchError::Credentials(format!(
                "metadata server returned HTTP {}",
                response.status().as_u16()
            )));
        }
        let token: MetadataToken = response
            .json()
            .map_err(|err| FetchError::Credentials(err.to_string()))?;
        Ok(token.access_token)
    }
}

fn with_scheme(host: &str) -> String {
    let host = host.trim();
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{host}")
    }
}

impl ObjectStore for GcsStore {
    fn fetch(&self, location: &ObjectLocation, destination: &Path) -> Result<FetchReport> {
        let url = self.object_url(location)?;
        let mut request = self.client.get(url).header(
            USER_AGENT,
            format!("dq/{}", env!("CARGO_PKG_VERSION")),
        );
        if let Some(token) = self.bearer_token()? {
            request = request.bearer_auth(token);
        }

        info!(%location, "downloading object");
        let mut response = request.send().map_err(|source| FetchError::Network {
            location: location.to_string(),
            source,
        })?;

        let status = response.status();
        match status.as_u16() {
            404 => {
                return Err(FetchError::NotFound {
                    location: location.to_string(),
                });
            }
            401 | 403 => {
                return Err(FetchError::Unauthorized {
                    location: location.to_string(),
                    status: status.as_u16(),
                });
            }
            _ if !status.is_success() => {
                let message = response.text().unwrap_or_default();
                return Err(FetchError::Http {
                    location: location.to_string(),
                    status: status.as_u16(),
                    message,
                });
            }
            _ => {}
        }

        write_atomically(&mut response, location, destination)
    }

    fn name(&self) -> &'static str {
        "gcs"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(user_project: Option<&str>) -> GcsStore {
        GcsStore::new(GcsConfig {
            endpoint: Some(DEFAULT_ENDPOINT.to_string()),
            user_project: user_project.map(str::to_string),
            credentials: Credentials::Anonymous,
        })
        .unwrap()
    }

    #[test]
    fn object_name_is_one_encoded_segment() {
        let location =
            ObjectLocation::new("uploads", "surveys/developer salaries/2024.csv").unwrap();
        let url = store(None).object_url(&location).unwrap();
        insta::assert_snapshot!(
            url.as_str(),
            @"https://storage.googleapis.com/storage/v1/b/uploads/o/surveys%2Fdeveloper%20salaries%2F2024.csv?alt=media"
        );
    }

    #[test]
    fn user_project_is_forwarded() {
        let location = ObjectLocation::new("uploads", "a.csv").unwrap();
        let url = store(Some("billing-project")).object_url(&location).unwrap();
        assert_eq!(url.query(), Some("alt=media&userProject=billing-project"));
    }

    #[test]
    fn emulator_hosts_gain_a_scheme() {
        assert_eq!(with_scheme("localhost:4443"), "http://localhost:4443");
        assert_eq!(with_scheme("https://gcs.local"), "https://gcs.local");
    }
}
