use anyhow::Context;
use clap::{error::ErrorKind, CommandFactory, Parser};
use dotenv::dotenv;
use std::process::ExitCode;
use std::sync::Arc;

use tenant_boot::{
    config::ConfigSnapshot,
    diagnostics::{build_suite, ProbeContext, Suite},
    infrastructure::{database::MongoConnector, password::Argon2PasswordHasher},
    logging::init_cli_logging,
};

/// Exit codes: 0 all checks passed, 1 a check failed or was not attempted,
/// 2 usage or fatal error.
#[derive(Parser, Debug)]
#[command(name = "diagnose")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run startup and deploy diagnostics", long_about = None)]
struct Args {
    /// Frontend URL (default http://localhost:3000). Give both URLs or neither.
    frontend_url: Option<String>,

    /// Backend URL (default http://localhost:8080)
    backend_url: Option<String>,

    /// Which checks to run
    #[arg(long, value_enum, default_value_t = Suite::All)]
    suite: Suite,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

async fn run(args: Args) -> anyhow::Result<u8> {
    let config = Arc::new(ConfigSnapshot::from_env().context("Failed to read configuration")?);
    init_cli_logging(&config.log_format)?;

    let hasher = Arc::new(Argon2PasswordHasher::new(&config.password_hash)?);
    let connector = Arc::new(MongoConnector::new(
        config.database.clone(),
        config.probe_timeout,
    ));
    let ctx = ProbeContext::new(
        Arc::clone(&config),
        connector,
        hasher,
        args.frontend_url,
        args.backend_url,
    )?;

    let registry = build_suite(args.suite)?;
    if !args.json {
        println!("🔍 Frontend: {}", ctx.frontend_url);
        println!("🔍 Backend:  {}", ctx.backend_url);
    }

    let report = registry.run(&ctx).await;
    if args.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.render_text());
    }
    Ok(report.exit_code())
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    let args = Args::parse();

    if args.frontend_url.is_some() != args.backend_url.is_some() {
        Args::command()
            .error(
                ErrorKind::WrongNumberOfValues,
                "expected zero or two URLs: diagnose [FRONTEND_URL BACKEND_URL]",
            )
            .exit();
    }

    match run(args).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("❌ Diagnostics aborted: {:#}", e);
            ExitCode::from(2)
        }
    }
}
