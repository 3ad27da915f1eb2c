use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::dispatch::Probe;
use crate::executor::{Method, Outcome};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MethodResult {
    pub method: Method,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SubdomainGroup {
    pub subdomain: String,
    pub url: String,
    pub results: Vec<MethodResult>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EndpointGroup {
    pub endpoint: String,
    pub subdomains: Vec<SubdomainGroup>,
}

impl EndpointGroup {
    pub fn subdomain(&self, subdomain: &str) -> Option<&SubdomainGroup> {
        self.subdomains.iter().find(|g| g.subdomain == subdomain)
    }
}

/// Outcomes grouped by endpoint, then by subdomain, each group holding its
/// results in method selection order. Group keys are the strings the caller
/// supplied, not the normalized urls.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub endpoints: Vec<EndpointGroup>,
}

impl Report {
    pub fn endpoint(&self, endpoint: &str) -> Option<&EndpointGroup> {
        self.endpoints.iter().find(|g| g.endpoint == endpoint)
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Total number of outcomes held in the report.
    pub fn len(&self) -> usize {
        self.endpoints
            .iter()
            .flat_map(|e| e.subdomains.iter())
            .map(|s| s.results.len())
            .sum()
    }

    pub fn success_count(&self) -> usize {
        self.results().filter(|r| r.outcome.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.len() - self.success_count()
    }

    fn results(&self) -> impl Iterator<Item = &MethodResult> {
        self.endpoints
            .iter()
            .flat_map(|e| e.subdomains.iter())
            .flat_map(|s| s.results.iter())
    }
}

/// Groups probes with endpoints and subdomains in lexical order.
pub fn aggregate(probes: Vec<Probe>, methods: &[Method]) -> Report {
    group(probes, &HashMap::new(), &HashMap::new(), methods)
}

/// Groups probes keeping endpoints and subdomains in the order the caller
/// listed them.
pub fn aggregate_ordered(
    probes: Vec<Probe>,
    subdomains: &[String],
    endpoints: &[String],
    methods: &[Method],
) -> Report {
    group(probes, &rank(subdomains), &rank(endpoints), methods)
}

fn rank(values: &[String]) -> HashMap<&str, usize> {
    let mut out = HashMap::with_capacity(values.len());
    for (i, v) in values.iter().enumerate() {
        out.entry(v.as_str()).or_insert(i);
    }
    out
}

type Groups = BTreeMap<(usize, String), BTreeMap<(usize, String), (String, Vec<MethodResult>)>>;

fn group(
    probes: Vec<Probe>,
    subdomain_rank: &HashMap<&str, usize>,
    endpoint_rank: &HashMap<&str, usize>,
    methods: &[Method],
) -> Report {
    let mut groups: Groups = BTreeMap::new();
    for Probe { item, url, outcome } in probes {
        let endpoint_key = (
            endpoint_rank.get(item.endpoint.as_str()).copied().unwrap_or(usize::MAX),
            item.endpoint,
        );
        let subdomain_key = (
            subdomain_rank.get(item.subdomain.as_str()).copied().unwrap_or(usize::MAX),
            item.subdomain,
        );
        groups
            .entry(endpoint_key)
            .or_default()
            .entry(subdomain_key)
            .or_insert_with(|| (url, Vec::new()))
            .1
            .push(MethodResult {
                method: item.method,
                outcome,
            });
    }

    let method_rank = |m: Method| methods.iter().position(|x| *x == m).unwrap_or(usize::MAX);

    let endpoints = groups
        .into_iter()
        .map(|((_, endpoint), subdomains)| EndpointGroup {
            endpoint,
            subdomains: subdomains
                .into_iter()
                .map(|((_, subdomain), (url, mut results))| {
                    // arrival order is not deterministic, selection order is
                    results.sort_by_key(|r| method_rank(r.method));
                    SubdomainGroup {
                        subdomain,
                        url,
                        results,
                    }
                })
                .collect(),
        })
        .collect();

    Report { endpoints }
}
