use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "crudder",
    version,
    about = "concurrent CRUD method enumeration tool",
    long_about = "Crudder sends every selected CRUD method to every endpoint on every subdomain and reports the status each combination answered with.\n\nExamples:\n  crudder -m crud -s api.target.tld,dev.target.tld -e endpoints.txt\n  crudder -m rd --sf subdomains.txt -e endpoints.txt -r 100 -o report.json\n  crudder --config ~/.crudder/config.yml\n\nTip: Use --config to persist scan settings and keep CLI invocations short."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'c',
        long = "clr",
        visible_alias = "color",
        help_heading = "Output",
        help = "Enable colored output (overrides --no-color)."
    )]
    pub color: bool,

    #[arg(
        short = 'q',
        long = "silent",
        visible_alias = "quiet",
        help_heading = "Output",
        help = "Do not print the banner and scan summary."
    )]
    pub silent: bool,

    #[arg(
        short = 'm',
        long = "mth",
        visible_alias = "methods",
        value_name = "LETTERS",
        help_heading = "Input",
        help = "CRUD letters to send: c=POST, r=GET, u=PUT, d=DELETE (e.g. crud)."
    )]
    pub methods: Option<String>,

    #[arg(
        short = 's',
        long = "sub",
        visible_alias = "subdomains",
        value_name = "LIST",
        help_heading = "Input",
        help = "Comma-separated subdomains (e.g. api.target.tld,dev.target.tld)."
    )]
    pub subdomains: Option<String>,

    #[arg(
        short = 'S',
        long = "sf",
        visible_alias = "subdomains-file",
        value_name = "FILE",
        help_heading = "Input",
        help = "Load subdomains from a file (one per line, takes priority over --subdomains)."
    )]
    pub subdomains_file: Option<String>,

    #[arg(
        short = 'e',
        long = "ep",
        visible_alias = "endpoints",
        value_name = "FILE",
        help_heading = "Input",
        help = "Load endpoints from a file (one per line)."
    )]
    pub endpoints: Option<String>,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        help_heading = "Input",
        help = "Path to a YAML config file."
    )]
    pub config: Option<String>,

    #[arg(
        short = 'r',
        long = "cnc",
        visible_alias = "concurrency",
        value_name = "N",
        help_heading = "Performance",
        help = "Max in-flight requests during scanning (default 50)."
    )]
    pub concurrency: Option<usize>,

    #[arg(
        short = 'w',
        long = "wrk",
        visible_alias = "workers",
        value_name = "N",
        help_heading = "Performance",
        help = "Number of runtime worker threads (default 10)."
    )]
    pub workers: Option<usize>,

    #[arg(
        short = 'T',
        long = "to",
        visible_alias = "timeout",
        value_name = "SECONDS",
        help_heading = "HTTP",
        help = "Per-request timeout in seconds (no timeout unless set)."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'H',
        long = "hdr",
        visible_alias = "header",
        value_name = "HEADER",
        help_heading = "HTTP",
        help = "Add a header to all requests (format: 'Key: Value')."
    )]
    pub header: Option<String>,

    #[arg(
        short = 'p',
        long = "px",
        visible_alias = "proxy",
        value_name = "URL",
        help_heading = "HTTP",
        help = "HTTP proxy URL (e.g. http://127.0.0.1:8080)."
    )]
    pub proxy: Option<String>,

    #[arg(
        short = 'U',
        long = "ua",
        visible_alias = "user-agent",
        value_name = "AGENT",
        help_heading = "HTTP",
        help = "User-Agent header sent with every request."
    )]
    pub user_agent: Option<String>,

    #[arg(
        short = 'N',
        long = "nfr",
        visible_alias = "no-follow-redirects",
        help_heading = "HTTP",
        help = "Report redirect responses instead of following them."
    )]
    pub no_follow_redirects: bool,

    #[arg(
        short = 'o',
        long = "out",
        visible_alias = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write the report to a file."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'A',
        long = "of",
        visible_alias = "output-format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format (text or json, inferred from the file extension when omitted)."
    )]
    pub output_format: Option<String>,

    #[arg(
        short = 'n',
        long = "nc",
        visible_alias = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,
}
