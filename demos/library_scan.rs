use crudder::executor::Method;
use crudder::runner::{ListSource, Options, Runner};
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(Options {
        subdomains: ListSource::Inline(vec![
            "api.example.com".to_string(),
            "dev.example.com".to_string(),
        ]),
        endpoints: ListSource::Inline(vec!["/users".to_string(), "/health".to_string()]),
        methods: vec![Method::Get, Method::Delete],
        concurrency: 10,
        timeout_seconds: Some(5),
        ..Options::default()
    })?;
    let result = runner.run().await?;

    println!("Requests: {}", result.requests);
    println!(
        "Answered: {} Failed: {}",
        result.report.success_count(),
        result.report.failure_count()
    );
    for endpoint in result.report.endpoints.iter() {
        for group in endpoint.subdomains.iter() {
            for r in group.results.iter() {
                match r.outcome.status() {
                    Some(status) => println!("{} {} {}", group.url, r.method, status),
                    None => println!("{} {} failed", group.url, r.method),
                }
            }
        }
    }

    Ok(())
}
