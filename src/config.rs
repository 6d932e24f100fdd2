use clap::Parser;

pub const DEFAULT_ROUTE_PREFIX: &str = "/v1";

/// Process configuration. Built once at startup, then shared read-only.
#[derive(Parser, Debug, Clone)]
#[command(name = "graphrag-serve", about = "HTTP front-end for GraphRAG local/global search")]
pub struct ServerConfig {
    /// Address to bind the HTTP listeners on
    #[arg(long, env = "GRAPHRAG_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "GRAPHRAG_PORT", default_value_t = 33600)]
    pub port: u16,

    /// Auxiliary port serving the same routes, 0 disables it
    #[arg(long, env = "GRAPHRAG_GRPC_PORT", default_value_t = 53600)]
    pub grpc_port: u16,

    #[arg(long, env = "GRAPHRAG_ROUTE_PREFIX", default_value = DEFAULT_ROUTE_PREFIX)]
    pub route_prefix: String,

    /// Upper bound on searches running at the same time
    #[arg(long, env = "GRAPHRAG_NUM_CPUS", default_value_t = 4, value_parser = clap::value_parser!(u32).range(1..))]
    pub num_cpus: u32,

    /// Number of concurrent startup requests sent to /search, 0 skips the self-test
    #[arg(long, env = "GRAPHRAG_NUM_TESTS", default_value_t = 1)]
    pub num_tests: usize,

    /// Python interpreter with the graphrag package installed
    #[arg(long, env = "GRAPHRAG_PYTHON", default_value = "python")]
    pub python: String,

    #[arg(long, env = "GRAPHRAG_SELF_TEST_ROOT_DIR", default_value = "inputs/Demo/")]
    pub self_test_root_dir: String,

    #[arg(long, env = "GRAPHRAG_SELF_TEST_QUERY", default_value = "What are the top themes?")]
    pub self_test_query: String,
}

impl ServerConfig {
    /// Parse from the command line, with `.env` values available as env fallbacks.
    pub fn load() -> Self {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::parse().normalized()
    }

    fn normalized(mut self) -> Self {
        self.route_prefix = normalize_prefix(&self.route_prefix);
        self
    }

    pub fn http_addr(&self) -> String {
        host_port(&self.host, self.port)
    }

    pub fn grpc_addr(&self) -> Option<String> {
        (self.grpc_port != 0).then(|| host_port(&self.host, self.grpc_port))
    }

    pub fn base_url(&self) -> String {
        format!("http://{}{}", host_port(&self.host, self.port), self.route_prefix)
    }

    pub fn max_concurrent_searches(&self) -> usize {
        self.num_cpus as usize
    }
}

/// `host:port`, with IPv6 literals bracketed (`[::1]:80`).
pub fn host_port(host: &str, port: u16) -> String {
    if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]:{port}")
    } else {
        format!("{host}:{port}")
    }
}

/// `"v1/"` -> `"/v1"`, `"/"` and `""` -> `""`.
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

#[test]
fn test_normalize_prefix() {
    assert_eq!(normalize_prefix("/v1"), "/v1");
    assert_eq!(normalize_prefix("v1/"), "/v1");
    assert_eq!(normalize_prefix("/api/v2/"), "/api/v2");
    assert_eq!(normalize_prefix("/"), "");
    assert_eq!(normalize_prefix(""), "");
}

#[test]
fn test_parse_flags() {
    let config = ServerConfig::parse_from([
        "graphrag-serve",
        "--host",
        "127.0.0.1",
        "--port",
        "8080",
        "--grpc-port",
        "0",
        "--route-prefix",
        "api/",
        "--num-cpus",
        "8",
    ])
    .normalized();

    assert_eq!(config.http_addr(), "127.0.0.1:8080");
    assert_eq!(config.grpc_addr(), None);
    assert_eq!(config.base_url(), "http://127.0.0.1:8080/api");
    assert_eq!(config.max_concurrent_searches(), 8);

    assert!(ServerConfig::try_parse_from(["graphrag-serve", "--num-cpus", "0"]).is_err());
}

#[test]
fn test_ipv6_host_is_bracketed() {
    let config = ServerConfig::parse_from(["graphrag-serve", "--host", "::", "--port", "8080"]).normalized();

    assert_eq!(config.http_addr(), "[::]:8080");
    assert_eq!(config.grpc_addr().as_deref(), Some("[::]:53600"));
    assert_eq!(config.base_url(), "http://[::]:8080/v1");
    assert!(config.http_addr().parse::<std::net::SocketAddr>().is_ok());

    assert_eq!(host_port("[::1]", 80), "[::1]:80");
    assert_eq!(host_port("localhost", 80), "localhost:80");
}
