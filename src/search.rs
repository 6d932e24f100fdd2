use anyhow::{Context, Result, bail};
use std::fmt;
use std::process::Command;
use std::str::FromStr;

use crate::errors::ServiceError;

pub const DEFAULT_COMMUNITY_LEVEL: u32 = 2;
pub const DEFAULT_RESPONSE_TYPE: &str = "Multiple Paragraphs";

/// Marker GraphRAG's query CLI prints right before the generated answer.
const RESPONSE_MARKER: &str = "Search Response:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchMethod {
    Local,
    Global,
}

impl SearchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMethod::Local => "local",
            SearchMethod::Global => "global",
        }
    }
}

impl fmt::Display for SearchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMethod {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(SearchMethod::Local),
            "global" => Ok(SearchMethod::Global),
            other => Err(ServiceError::UnsupportedMethod(other.to_string())),
        }
    }
}

/// Arguments handed to the search engine for a single query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub root_dir: Option<String>,
    pub community_level: u32,
    pub response_type: String,
    pub query: String,
}

impl SearchParams {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            root_dir: None,
            community_level: DEFAULT_COMMUNITY_LEVEL,
            response_type: DEFAULT_RESPONSE_TYPE.to_string(),
            query: query.into(),
        }
    }

    pub fn with_root_dir(mut self, root_dir: impl Into<String>) -> Self {
        self.root_dir = Some(root_dir.into());
        self
    }

    pub fn with_community_level(mut self, level: u32) -> Self {
        self.community_level = level;
        self
    }

    /// An empty response type falls back to the default.
    pub fn with_response_type(mut self, response_type: impl Into<String>) -> Self {
        let response_type = response_type.into();
        self.response_type = if response_type.is_empty() {
            DEFAULT_RESPONSE_TYPE.to_string()
        } else {
            response_type
        };
        self
    }
}

/// The external GraphRAG engine. Both calls block until the answer is generated.
pub trait SearchBackend: Send + Sync {
    fn global_search(&self, params: &SearchParams) -> Result<String>;

    fn local_search(&self, params: &SearchParams) -> Result<String>;

    fn search(&self, method: SearchMethod, params: &SearchParams) -> Result<String> {
        match method {
            SearchMethod::Global => self.global_search(params),
            SearchMethod::Local => self.local_search(params),
        }
    }
}

/// Runs `python -m graphrag.query` as a child process per search.
#[derive(Debug, Clone)]
pub struct GraphRagCli {
    python: String,
}

impl GraphRagCli {
    pub fn new(python: impl Into<String>) -> Self {
        Self {
            python: python.into(),
        }
    }

    pub fn command(&self, method: SearchMethod, params: &SearchParams) -> Command {
        let mut cmd = Command::new(&self.python);
        cmd.args(["-m", "graphrag.query"]);
        if let Some(root_dir) = &params.root_dir {
            cmd.arg("--root").arg(root_dir);
        }
        cmd.arg("--method")
            .arg(method.as_str())
            .arg("--community_level")
            .arg(params.community_level.to_string())
            .arg("--response_type")
            .arg(&params.response_type)
            .arg(&params.query);
        cmd
    }

    fn run(&self, method: SearchMethod, params: &SearchParams) -> Result<String> {
        let output = self
            .command(method, params)
            .output()
            .with_context(|| format!("Failed to launch {} -m graphrag.query", self.python))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "graphrag {} search exited with {}: {}",
                method,
                output.status,
                stderr.trim()
            );
        }

        Ok(extract_answer(&String::from_utf8_lossy(&output.stdout)))
    }
}

impl SearchBackend for GraphRagCli {
    fn global_search(&self, params: &SearchParams) -> Result<String> {
        self.run(SearchMethod::Global, params)
    }

    fn local_search(&self, params: &SearchParams) -> Result<String> {
        self.run(SearchMethod::Local, params)
    }
}

/// Pull the generated answer out of the CLI's stdout, which is mixed with
/// progress output.
pub fn extract_answer(stdout: &str) -> String {
    match stdout.rfind(RESPONSE_MARKER) {
        Some(idx) => stdout[idx + RESPONSE_MARKER.len()..].trim().to_string(),
        None => stdout.trim().to_string(),
    }
}

#[test]
fn test_search_method_from_str() {
    assert_eq!("local".parse::<SearchMethod>().unwrap(), SearchMethod::Local);
    assert_eq!("global".parse::<SearchMethod>().unwrap(), SearchMethod::Global);

    for bad in ["Local", "GLOBAL", "drift", "", " local"] {
        match bad.parse::<SearchMethod>() {
            Err(ServiceError::UnsupportedMethod(m)) => assert_eq!(m, bad),
            other => panic!("expected UnsupportedMethod for {bad:?}, got {other:?}"),
        }
    }
}

#[test]
fn test_search_params_defaults() {
    let params = SearchParams::new("q");
    assert_eq!(params.root_dir, None);
    assert_eq!(params.community_level, 2);
    assert_eq!(params.response_type, "Multiple Paragraphs");

    let params = params.with_response_type("");
    assert_eq!(params.response_type, "Multiple Paragraphs");

    let params = params.with_response_type("Single Sentence");
    assert_eq!(params.response_type, "Single Sentence");
}

#[test]
fn test_extract_answer() {
    let stdout = "INFO: Reading settings from inputs/Demo/settings.yaml\n\
                  creating llm client\n\
                  SUCCESS: Local Search Response: The top themes are\n\nfriendship and loss.\n";
    assert_eq!(
        extract_answer(stdout),
        "The top themes are\n\nfriendship and loss."
    );

    assert_eq!(extract_answer("  plain answer \n"), "plain answer");
}

#[test]
fn test_cli_command_arguments() {
    let cli = GraphRagCli::new("python3");
    let params = SearchParams::new("What are the top themes?")
        .with_root_dir("inputs/Demo/")
        .with_community_level(3);
    let cmd = cli.command(SearchMethod::Global, &params);

    assert_eq!(cmd.get_program(), "python3");
    let args: Vec<_> = cmd
        .get_args()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        args,
        vec![
            "-m",
            "graphrag.query",
            "--root",
            "inputs/Demo/",
            "--method",
            "global",
            "--community_level",
            "3",
            "--response_type",
            "Multiple Paragraphs",
            "What are the top themes?",
        ]
    );

    let no_root = cli.command(SearchMethod::Local, &SearchParams::new("q"));
    assert!(!no_root.get_args().any(|a| a == "--root"));
}

#[cfg(unix)]
#[test]
fn test_cli_runs_child_process() {
    // `echo` stands in for the interpreter and prints the arguments back.
    let cli = GraphRagCli::new("echo");
    let answer = cli.local_search(&SearchParams::new("themes?")).unwrap();
    assert_eq!(
        answer,
        "-m graphrag.query --method local --community_level 2 --response_type Multiple Paragraphs themes?"
    );

    let err = GraphRagCli::new("false")
        .global_search(&SearchParams::new("q"))
        .unwrap_err();
    assert!(err.to_string().contains("graphrag global search exited"));

    assert!(GraphRagCli::new("/nonexistent/python").local_search(&SearchParams::new("q")).is_err());
}
