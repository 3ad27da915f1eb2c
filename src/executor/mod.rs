use std::fmt;
use std::future::Future;

use serde::Serialize;

// the http methods crudder can enumerate, one per CRUD letter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Post,
    Get,
    Put,
    Delete,
}

impl Method {
    pub const ALL: [Method; 4] = [Method::Post, Method::Get, Method::Put, Method::Delete];

    /// Maps a CRUD letter to its method: c=POST, r=GET, u=PUT, d=DELETE.
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'c' => Some(Self::Post),
            'r' => Some(Self::Get),
            'u' => Some(Self::Put),
            'd' => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Self::Post => 'c',
            Self::Get => 'r',
            Self::Put => 'u',
            Self::Delete => 'd',
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Post => "POST",
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }

    pub fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Post => reqwest::Method::POST,
            Self::Get => reqwest::Method::GET,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The result of a single request. Any completed exchange is a `Success`,
/// whatever the status code; `Failure` carries the cause of a request that
/// never got a response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Success { status: u16 },
    Failure { message: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Success { status } => Some(*status),
            Self::Failure { .. } => None,
        }
    }
}

/// Issues one request and classifies it. Implementations never retry and
/// never return early with an error: every failure becomes an `Outcome`.
pub trait Executor: Send + Sync + 'static {
    fn execute(&self, method: Method, url: &str) -> impl Future<Output = Outcome> + Send;
}

// the production executor, one shared client for every worker
#[derive(Clone, Debug)]
pub struct HttpExecutor {
    client: reqwest::Client,
}

impl HttpExecutor {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for HttpExecutor {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl Executor for HttpExecutor {
    async fn execute(&self, method: Method, url: &str) -> Outcome {
        let request = match self.client.request(method.to_reqwest(), url).build() {
            Ok(request) => request,
            Err(e) => {
                return Outcome::Failure {
                    message: format!("failed to create request to {url}: {e}"),
                }
            }
        };
        match self.client.execute(request).await {
            Ok(response) => {
                let status = response.status().as_u16();
                // the body is never read, dropping the response releases the connection
                drop(response);
                Outcome::Success { status }
            }
            Err(e) => Outcome::Failure {
                message: format!("failed to make {method} request to {url}: {e}"),
            },
        }
    }
}
