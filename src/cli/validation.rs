use crate::cli::args::CliArgs;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(raw) = args.methods.as_deref() {
        if crate::utils::parse_method_letters(raw).is_empty() {
            return Err(format!(
                "invalid --methods '{raw}', expected any of 'c', 'r', 'u', 'd'"
            ));
        }
    }
    if args.concurrency == Some(0) {
        return Err("invalid concurrency 0, expected positive integer".to_string());
    }
    if args.workers == Some(0) {
        return Err("invalid workers 0, expected positive integer".to_string());
    }
    if args.timeout == Some(0) {
        return Err("invalid timeout 0, expected positive number of seconds".to_string());
    }
    if let Some(raw) = args.output_format.as_deref() {
        if crate::output::OutputFormat::parse(raw).is_none() {
            return Err(format!("invalid --output-format '{raw}', expected text or json"));
        }
    }
    if let Some(raw) = args.header.as_deref() {
        crate::utils::parse_header(raw).map_err(|e| format!("invalid --header '{raw}': {e}"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["crudder"];
        argv.extend_from_slice(extra);
        CliArgs::parse_from(argv)
    }

    #[test]
    fn accepts_plain_invocation() {
        assert!(validate(&parse(&["-m", "crud", "-s", "a.test", "-e", "eps.txt"])).is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(validate(&parse(&["-m", "xyz"])).unwrap_err().contains("--methods"));
        assert!(validate(&parse(&["-r", "0"])).unwrap_err().contains("concurrency"));
        assert!(validate(&parse(&["--workers", "0"])).unwrap_err().contains("workers"));
        assert!(validate(&parse(&["--timeout", "0"])).unwrap_err().contains("timeout"));
        assert!(validate(&parse(&["-A", "xml"])).unwrap_err().contains("--output-format"));
        assert!(validate(&parse(&["-H", "no-colon"])).unwrap_err().contains("--header"));
    }
}
