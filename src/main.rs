mod collect;
mod find;
mod kubemodel;
mod report;
#[cfg(test)]
mod testing;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use collect::collect;
use find::{ClusterLister, KubeLister};
use kube::{config::KubeConfigOptions, Client, Config};
use kubemodel::ResourceKind;
use report::{find_unused, Report};
use std::time::Duration;

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
	Text,
	Json,
}

/// Find secrets, configmaps, service accounts and persistent volume claims
/// which aren't used by any pod
#[derive(Parser)]
#[command(version)]
struct Opts {
	/// Namespaces to scan
	#[arg(
		short,
		long,
		required = true,
		num_args = 1..,
		value_delimiter = ',',
		env = "RESOURCE_FINDER_NAMESPACES"
	)]
	namespaces: Vec<String>,
	/// Kubeconfig context, current one is used by default
	#[arg(long)]
	context: Option<String>,
	/// Deadline for the whole run, in seconds
	#[arg(long, default_value_t = 200)]
	timeout: u64,
	#[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
	output: OutputFormat,
	/// Continue with other kinds if listing of one kind fails
	#[arg(long)]
	keep_going: bool,
}

async fn connect(context: Option<String>) -> Result<Client> {
	let config = match context {
		Some(context) => {
			Config::from_kubeconfig(&KubeConfigOptions {
				context: Some(context),
				..Default::default()
			})
			.await?
		}
		None => Config::infer().await?,
	};
	Ok(Client::try_from(config)?)
}

/// Returns report for every kind which was listed, and number of failed kinds
async fn run(opts: &Opts, lister: &impl ClusterLister) -> Result<(Report, usize)> {
	log::info!("Searching for used resources in {:?}", opts.namespaces);
	let inventory = collect(lister, &opts.namespaces)
		.await
		.context("failed to collect used resources")?;
	log::info!("Found {} references", inventory.len());

	let mut report = Report::default();
	let mut failed = 0;
	for kind in ResourceKind::ALL {
		match find_unused(lister, kind, &opts.namespaces, &inventory).await {
			Ok(unused) => report.push(kind, unused),
			Err(e) => {
				let e = anyhow::Error::new(e)
					.context(format!("failed to report unused {}", kind.plural()));
				if !opts.keep_going {
					return Err(e);
				}
				log::error!("{:#}", e);
				failed += 1;
			}
		}
	}
	Ok((report, failed))
}

/// [`run`], failing once `deadline` passes; in-flight listing is dropped
async fn run_with_deadline(
	opts: &Opts,
	lister: &impl ClusterLister,
	deadline: Duration,
) -> Result<(Report, usize)> {
	tokio::time::timeout(deadline, run(opts, lister))
		.await
		.map_err(|_| find::Error::DeadlineExceeded(deadline))?
}

#[tokio::main]
async fn main() -> Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let opts = Opts::parse();
	let deadline = Duration::from_secs(opts.timeout);

	let lister = KubeLister::new(connect(opts.context.clone()).await?);
	let (report, failed) = run_with_deadline(&opts, &lister, deadline).await?;

	match opts.output {
		OutputFormat::Text => print!("{}", report),
		OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
	}
	log::info!("Found {} unused objects", report.total());

	if failed > 0 {
		bail!(
			"{} of {} kinds could not be reported",
			failed,
			ResourceKind::ALL.len()
		);
	}
	Ok(())
}
