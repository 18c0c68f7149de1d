use std::{num::NonZeroU32, path::PathBuf};

use anyhow::{Context, anyhow, bail};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{error, info};
use yukicoder_client::{
    Client, Config, Contest, NamedSample, Problem, ProblemListOptions, ProblemSort,
    SubmissionOutcome, SubmissionStatus, entity,
    transport::HttpTransport,
};

#[derive(Parser)]
struct Opts {
    #[clap(short, long, env = "YUKICODER_CLIENT_CONFIG")]
    config: Option<PathBuf>,
    /// Value of the session cookie; overrides the config file.
    #[clap(short, long, env = "YUKICODER_SESSION", hide_env_values = true)]
    session: Option<String>,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check whether the session is logged in
    LoginStatus,
    /// Download the sample cases shown on a problem page
    Samples {
        url: String,
        #[clap(short, long)]
        directory: Option<PathBuf>,
    },
    /// Download the full system test cases (login required)
    System {
        url: String,
        #[clap(short, long)]
        directory: Option<PathBuf>,
    },
    Submit {
        url: String,
        #[clap(short, long)]
        language: String,
        #[clap(short, long)]
        file: PathBuf,
        /// File name sent with the upload
        #[clap(long)]
        filename: Option<String>,
    },
    /// One page of the public submission list
    Submissions {
        #[clap(short, long, default_value = "1")]
        page: NonZeroU32,
        #[clap(long)]
        status: Option<SubmissionStatus>,
    },
    /// One page of the problem list
    Problems {
        #[clap(short, long, default_value = "1")]
        page: NonZeroU32,
        #[clap(long)]
        other: bool,
        /// Include unfinished problems
        #[clap(long)]
        all: bool,
        #[clap(long)]
        sort: Option<ProblemSort>,
    },
    Languages {
        url: String,
    },
    /// Problems of a contest
    Contest {
        url: String,
    },
    /// Classify a judge URL
    Resolve {
        url: String,
    },
}

async fn load_config(opts: &Opts) -> anyhow::Result<Config> {
    let mut config = match &opts.config {
        Some(path) => {
            let src = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("read config from {}", path.display()))?;
            serde_yaml::from_str(&src)
                .with_context(|| format!("parse config from {}", path.display()))?
        }
        None => Config::default(),
    };
    if let Some(session) = &opts.session {
        config.session = Some(session.clone());
    }
    Ok(config)
}

fn problem(url: &str, config: &Config) -> anyhow::Result<Problem> {
    Problem::from_url(url, config).ok_or_else(|| anyhow!("not a problem url: {url}"))
}

fn print(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Write `<name>.in` / `<name>.out` pairs, or print the cases when no
/// directory is given.
async fn emit_cases(cases: &[NamedSample], directory: Option<&PathBuf>) -> anyhow::Result<()> {
    let Some(directory) = directory else {
        let cases = cases
            .iter()
            .map(|case| {
                json!({
                    "name": case.name,
                    "input_name": case.input_name,
                    "input": String::from_utf8_lossy(&case.input),
                    "output_name": case.output_name,
                    "output": String::from_utf8_lossy(&case.output),
                })
            })
            .collect::<Vec<_>>();
        return print(&cases);
    };
    tokio::fs::create_dir_all(directory)
        .await
        .with_context(|| format!("create {}", directory.display()))?;
    let mut written = Vec::new();
    for case in cases {
        let stem = case.name.replace(['/', '\\'], "_");
        for (extension, content) in [("in", &case.input), ("out", &case.output)] {
            let path = directory.join(format!("{stem}.{extension}"));
            tokio::fs::write(&path, content)
                .await
                .with_context(|| format!("write {}", path.display()))?;
            written.push(path);
        }
    }
    info!(count = cases.len(), directory = %directory.display(), "cases written");
    print(&written)
}

async fn run(opts: Opts) -> anyhow::Result<()> {
    let config = load_config(&opts).await?;
    let transport = HttpTransport::new(&config).with_context(|| "build http transport")?;
    let client = Client::new(transport, config);
    let config = client.config();

    match opts.command {
        Command::LoginStatus => print(&json!({ "logged_in": client.is_logged_in().await? })),
        Command::Samples { url, directory } => {
            let cases = client.download_sample_cases(&problem(&url, config)?).await?;
            emit_cases(&cases, directory.as_ref()).await
        }
        Command::System { url, directory } => {
            let cases = client.download_system_cases(&problem(&url, config)?).await?;
            emit_cases(&cases, directory.as_ref()).await
        }
        Command::Submit {
            url,
            language,
            file,
            filename,
        } => {
            let problem = problem(&url, config)?;
            let code = tokio::fs::read(&file)
                .await
                .with_context(|| format!("read {}", file.display()))?;
            let outcome = client
                .submit_code(&problem, &code, &language, filename.as_deref())
                .await?;
            print(&outcome)?;
            match outcome {
                SubmissionOutcome::Accepted(_) => Ok(()),
                SubmissionOutcome::NotLoggedIn => bail!("not logged in"),
                SubmissionOutcome::Rejected(_) => bail!("submission rejected"),
            }
        }
        Command::Submissions { page, status } => {
            print(&client.list_submissions(page, status).await?)
        }
        Command::Problems {
            page,
            other,
            all,
            sort,
        } => {
            let options = ProblemListOptions {
                other,
                comp_problem: !all,
                sort,
            };
            print(&client.list_problems(page, &options).await?)
        }
        Command::Languages { url } => print(
            &client
                .list_available_languages(&problem(&url, config)?)
                .await?,
        ),
        Command::Contest { url } => {
            let contest = Contest::from_url(&url, config)
                .ok_or_else(|| anyhow!("not a contest url: {url}"))?;
            let urls = client
                .list_contest_problems(&contest)
                .await?
                .iter()
                .map(|problem| problem.url(config))
                .collect::<Result<Vec<_>, _>>()?;
            print(&urls)
        }
        Command::Resolve { url } => {
            let entity =
                entity::resolve(&url, config).ok_or_else(|| anyhow!("not a judge url: {url}"))?;
            print(&entity)
        }
    }
}

fn main() {
    let opts = Opts::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(?e, "failed to start runtime");
            std::process::exit(1);
        }
    };
    if let Err(e) = runtime.block_on(run(opts)) {
        error!(?e, "critical error");
        std::process::exit(1);
    }
}
