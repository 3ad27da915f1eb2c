use std::time::Duration;

use indicatif::ProgressBar;
use thiserror::Error;
use tokio::time::Instant;

use crate::aggregate::{self, Report};
use crate::dispatch::{self, DispatchError, Dispatcher};
use crate::executor::{Executor, HttpExecutor, Method};
use crate::utils;

pub const DEFAULT_CONCURRENCY: usize = 50;

#[derive(Clone, Debug)]
pub enum ListSource {
    FilePath(String),
    Inline(Vec<String>),
}

impl ListSource {
    fn is_empty_inline(&self) -> bool {
        match self {
            Self::Inline(values) => values.iter().all(|v| v.trim().is_empty()),
            Self::FilePath(_) => false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Options {
    pub subdomains: ListSource,
    pub endpoints: ListSource,
    pub methods: Vec<Method>,
    pub concurrency: usize,
    pub timeout_seconds: Option<u64>,
    pub proxy: Option<String>,
    pub follow_redirects: bool,
    pub header: Option<String>,
    pub user_agent: Option<String>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            subdomains: ListSource::Inline(Vec::new()),
            endpoints: ListSource::Inline(Vec::new()),
            methods: Vec::new(),
            concurrency: DEFAULT_CONCURRENCY,
            timeout_seconds: None,
            proxy: None,
            follow_redirects: true,
            header: None,
            user_agent: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("no valid methods selected, use 'c', 'r', 'u' or 'd'")]
    NoMethods,

    #[error("no valid subdomains provided")]
    NoSubdomains,

    #[error("no valid endpoints provided")]
    NoEndpoints,

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error("failed to read {kind} from {path}: {source}")]
    FileRead {
        kind: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write output file {path}: {source}")]
    OutputWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid header '{header}': {message}")]
    InvalidHeader { header: String, message: String },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },
}

/// The resolved subdomain and endpoint lists a scan runs against.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Targets {
    pub subdomains: Vec<String>,
    pub endpoints: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct ScanResult {
    pub started_at: Instant,
    pub elapsed: Duration,
    pub requests: usize,
    pub report: Report,
}

#[derive(Clone, Debug)]
pub struct Runner {
    options: Options,
    progress: ProgressBar,
}

impl Runner {
    pub fn new(options: Options) -> Result<Self, RunnerError> {
        if options.methods.is_empty() {
            return Err(RunnerError::NoMethods);
        }
        if options.concurrency == 0 {
            return Err(DispatchError::ZeroConcurrency.into());
        }
        if options.subdomains.is_empty_inline() {
            return Err(RunnerError::NoSubdomains);
        }
        if options.endpoints.is_empty_inline() {
            return Err(RunnerError::NoEndpoints);
        }
        Ok(Self {
            options,
            progress: ProgressBar::hidden(),
        })
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub async fn run(&self) -> Result<ScanResult, RunnerError> {
        let targets = self.load_targets().await?;
        self.scan(&targets).await
    }

    pub async fn load_targets(&self) -> Result<Targets, RunnerError> {
        let subdomains = load_list("subdomains", &self.options.subdomains).await?;
        if subdomains.is_empty() {
            return Err(RunnerError::NoSubdomains);
        }
        let endpoints = load_list("endpoints", &self.options.endpoints).await?;
        if endpoints.is_empty() {
            return Err(RunnerError::NoEndpoints);
        }
        Ok(Targets {
            subdomains,
            endpoints,
        })
    }

    pub async fn scan(&self, targets: &Targets) -> Result<ScanResult, RunnerError> {
        let client = build_client(&self.options)?;
        self.scan_with(targets, HttpExecutor::new(client)).await
    }

    /// Runs the scan through any executor; `scan` uses the http one.
    pub async fn scan_with<E: Executor>(
        &self,
        targets: &Targets,
        executor: E,
    ) -> Result<ScanResult, RunnerError> {
        let started_at = Instant::now();
        let methods = &self.options.methods;
        let requests = dispatch::work_item_count(
            targets.subdomains.len(),
            targets.endpoints.len(),
            methods.len(),
        );
        self.progress.set_length(requests as u64);

        let dispatcher = Dispatcher::new(executor, self.options.concurrency)?
            .with_progress(self.progress.clone());
        let probes = dispatcher
            .dispatch(&targets.subdomains, &targets.endpoints, methods)
            .await;
        if probes.len() != requests {
            tracing::error!(
                expected = requests,
                collected = probes.len(),
                "probe count mismatch"
            );
        }

        let report =
            aggregate::aggregate_ordered(probes, &targets.subdomains, &targets.endpoints, methods);
        let elapsed = started_at.elapsed();
        tracing::info!(
            requests,
            ok = report.success_count(),
            failed = report.failure_count(),
            elapsed_ms = elapsed.as_millis() as u64,
            "scan finished"
        );
        Ok(ScanResult {
            started_at,
            elapsed,
            requests,
            report,
        })
    }
}

async fn load_list(kind: &'static str, source: &ListSource) -> Result<Vec<String>, RunnerError> {
    match source {
        ListSource::Inline(values) => Ok(utils::clean_lines(values)),
        ListSource::FilePath(path) => {
            let path = crate::config::expand_tilde(path);
            let lines = utils::read_lines(&path)
                .await
                .map_err(|e| RunnerError::FileRead {
                    kind,
                    path: path.display().to_string(),
                    source: e,
                })?;
            tracing::debug!(kind, path = %path.display(), count = lines.len(), "loaded list");
            Ok(lines)
        }
    }
}

pub fn build_client(options: &Options) -> Result<reqwest::Client, RunnerError> {
    let mut headers = reqwest::header::HeaderMap::new();
    if let Some(raw) = options.header.as_deref().filter(|h| !h.trim().is_empty()) {
        let invalid = |message: String| RunnerError::InvalidHeader {
            header: raw.to_string(),
            message,
        };
        let (name, value) = utils::parse_header(raw).map_err(invalid)?;
        let name = reqwest::header::HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| invalid(e.to_string()))?;
        let value =
            reqwest::header::HeaderValue::from_str(&value).map_err(|e| invalid(e.to_string()))?;
        headers.insert(name, value);
    }

    let redirect_policy = if options.follow_redirects {
        reqwest::redirect::Policy::default()
    } else {
        reqwest::redirect::Policy::none()
    };

    let mut builder = reqwest::Client::builder()
        .default_headers(headers)
        .redirect(redirect_policy);

    if let Some(user_agent) = options.user_agent.as_deref().filter(|u| !u.trim().is_empty()) {
        builder = builder.user_agent(user_agent);
    }

    // without an explicit timeout the client default applies
    if let Some(seconds) = options.timeout_seconds {
        builder = builder.timeout(Duration::from_secs(seconds));
    }

    if let Some(proxy) = options.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
        let proxy = reqwest::Proxy::all(proxy).map_err(|e| RunnerError::ProxySetup {
            proxy: proxy.to_string(),
            source: e,
        })?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| RunnerError::HttpClientBuild { source: e })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::Outcome;

    struct Teapot;

    impl Executor for Teapot {
        async fn execute(&self, _method: Method, _url: &str) -> Outcome {
            Outcome::Success { status: 418 }
        }
    }

    fn options() -> Options {
        Options {
            subdomains: ListSource::Inline(vec!["a.test".to_string(), " ".to_string()]),
            endpoints: ListSource::Inline(vec!["/x".to_string()]),
            methods: vec![Method::Get],
            ..Options::default()
        }
    }

    #[test]
    fn new_validates_inputs() {
        assert!(matches!(
            Runner::new(Options {
                methods: Vec::new(),
                ..options()
            }),
            Err(RunnerError::NoMethods)
        ));
        assert!(matches!(
            Runner::new(Options {
                concurrency: 0,
                ..options()
            }),
            Err(RunnerError::Dispatch(DispatchError::ZeroConcurrency))
        ));
        assert!(matches!(
            Runner::new(Options {
                subdomains: ListSource::Inline(vec!["  ".to_string()]),
                ..options()
            }),
            Err(RunnerError::NoSubdomains)
        ));
        assert!(matches!(
            Runner::new(Options {
                endpoints: ListSource::Inline(Vec::new()),
                ..options()
            }),
            Err(RunnerError::NoEndpoints)
        ));
        assert!(Runner::new(options()).is_ok());
    }

    #[tokio::test]
    async fn missing_list_file_is_reported_with_path() {
        let runner = Runner::new(Options {
            endpoints: ListSource::FilePath("/nonexistent/crudder/endpoints.txt".to_string()),
            ..options()
        })
        .unwrap();
        match runner.load_targets().await {
            Err(RunnerError::FileRead { kind, path, .. }) => {
                assert_eq!(kind, "endpoints");
                assert_eq!(path, "/nonexistent/crudder/endpoints.txt");
            }
            other => panic!("expected file read error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn scan_with_mock_executor_fills_report() {
        let runner = Runner::new(options()).unwrap();
        let targets = runner.load_targets().await.unwrap();
        assert_eq!(targets.subdomains, vec!["a.test".to_string()]);
        let result = runner.scan_with(&targets, Teapot).await.unwrap();
        assert_eq!(result.requests, 1);
        assert_eq!(result.report.len(), 1);
        let group = result.report.endpoint("/x").unwrap().subdomain("a.test").unwrap();
        assert_eq!(group.url, "https://a.test/x");
        assert_eq!(group.results[0].outcome, Outcome::Success { status: 418 });
    }

    #[test]
    fn client_options_are_validated() {
        assert!(build_client(&options()).is_ok());
        assert!(build_client(&Options {
            header: Some("X-Token: abc".to_string()),
            user_agent: Some("crudder-test".to_string()),
            timeout_seconds: Some(3),
            follow_redirects: false,
            ..options()
        })
        .is_ok());
        assert!(matches!(
            build_client(&Options {
                header: Some("broken".to_string()),
                ..options()
            }),
            Err(RunnerError::InvalidHeader { .. })
        ));
        assert!(matches!(
            build_client(&Options {
                proxy: Some("::not a proxy::".to_string()),
                ..options()
            }),
            Err(RunnerError::ProxySetup { .. })
        ));
    }
}
