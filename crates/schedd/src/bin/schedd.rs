use clap::Parser;

use negotiation::negotiation::NegotiationConfigurationBuilder;
use schedd::common::cli::{CheckOpts, RootOptions, ServeOpts, SubCommand, default_schedd_name};
use schedd::common::setup::setup_logging;
use schedd::common::time::format_duration;
use schedd::queue::file::QueueDef;
use schedd::queue::{JobQueue, JobQueueRef, submitter_owner};
use schedd::server::ServerConfig;
use schedd::server::bootstrap::{run_server, start_listener};

fn load_queue(path: &std::path::Path, name: String) -> anyhow::Result<JobQueue> {
    let qdef = QueueDef::load(path)
        .map_err(|e| anyhow::anyhow!("Cannot load queue file {}: {e}", path.display()))?;
    Ok(JobQueue::from_def(name, qdef)?)
}

async fn command_serve(opts: ServeOpts) -> anyhow::Result<()> {
    let name = opts.name.unwrap_or_else(default_schedd_name);
    let mut queue = load_queue(&opts.queue, name)?;
    queue.set_max_resources_to_offer(opts.max_resources_to_offer);
    log::info!(
        "Schedd {} (version {}) loaded {} job(s) in {} auto cluster(s)",
        queue.schedd_name(),
        schedd::SCHEDD_VERSION,
        queue.len(),
        queue.auto_clusters().len()
    );

    let negotiation = NegotiationConfigurationBuilder::default()
        .read_timeout(opts.read_timeout.unpack())
        .write_timeout(opts.write_timeout.unpack())
        .legacy_reject_context(!opts.no_legacy_reject_context)
        .build()?;
    let config = ServerConfig {
        host: opts.host,
        port: opts.port,
        idle_timeout: opts.idle_timeout.unpack(),
        negotiation,
    };
    log::debug!(
        "Read timeout {}, write timeout {}, idle timeout {}",
        format_duration(config.negotiation.read_timeout),
        format_duration(config.negotiation.write_timeout),
        format_duration(config.idle_timeout)
    );

    let listener = start_listener(&config).await?;
    run_server(listener, JobQueueRef::new(queue), config).await
}

fn command_check(opts: CheckOpts) -> anyhow::Result<()> {
    let queue = load_queue(&opts.queue, default_schedd_name())?;
    let mut owners: Vec<&str> = queue.jobs().map(|job| job.owner()).collect();
    owners.sort_unstable();
    owners.dedup();

    println!(
        "{} job(s), significant attributes: {}",
        queue.len(),
        queue.auto_clusters().significant_attributes_list()
    );
    for owner in owners {
        let requests = queue.build_request_list(owner);
        println!(
            "{}: {} idle job(s) in {} auto cluster(s)",
            submitter_owner(owner),
            requests.total_jobs(),
            requests.len()
        );
        for cluster in requests.iter() {
            let jobs: Vec<String> = cluster.requests().map(|r| r.job_id.to_string()).collect();
            println!("  auto cluster {}: {}", cluster.auto_cluster_id(), jobs.join(" "));
        }
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let opts = RootOptions::parse();
    setup_logging(opts.common.debug);

    let result = match opts.subcmd {
        SubCommand::Serve(opts) => command_serve(opts).await,
        SubCommand::Check(opts) => command_check(opts),
    };

    if let Err(e) = result {
        log::error!("{e:?}");
        std::process::exit(1);
    }
    Ok(())
}
