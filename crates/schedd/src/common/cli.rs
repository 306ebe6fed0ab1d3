use std::path::PathBuf;

use clap::Parser;

use crate::common::time::ArgDuration;

#[derive(Parser)]
pub struct CommonOpts {
    /// Enables more detailed log output
    #[arg(long, global = true, env = "SCHEDD_DEBUG")]
    pub debug: bool,
}

#[derive(Parser)]
#[command(author, version, about)]
pub struct RootOptions {
    #[clap(flatten)]
    pub common: CommonOpts,

    #[clap(subcommand)]
    pub subcmd: SubCommand,
}

#[derive(Parser)]
pub enum SubCommand {
    /// Starts the daemon and negotiates for the jobs of a queue file
    Serve(ServeOpts),
    /// Loads a queue file and prints the resource requests of its submitters
    Check(CheckOpts),
}

#[derive(Parser)]
pub struct ServeOpts {
    /// Path to the job queue file
    #[arg(long, env = "SCHEDD_QUEUE", value_hint = clap::ValueHint::FilePath)]
    pub queue: PathBuf,

    /// Address on which negotiators are accepted
    #[arg(long, env = "SCHEDD_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port on which negotiators are accepted
    #[arg(long, env = "SCHEDD_PORT", default_value_t = crate::server::DEFAULT_PORT)]
    pub port: u16,

    /// Name of this schedd, used in global job ids [default: host name]
    #[arg(long, env = "SCHEDD_NAME")]
    pub name: Option<String>,

    /// How long to wait for a message of the negotiator within a round
    #[arg(long, env = "SCHEDD_READ_TIMEOUT", default_value = "60s")]
    pub read_timeout: ArgDuration,

    /// How long writing a reply to the negotiator may take
    #[arg(long, env = "SCHEDD_WRITE_TIMEOUT", default_value = "60s")]
    pub write_timeout: ArgDuration,

    /// How long an idle connection is kept open between rounds
    #[arg(long, env = "SCHEDD_IDLE_TIMEOUT", default_value = "10m")]
    pub idle_timeout: ArgDuration,

    /// Maximal number of matches accepted in one round, -1 means unlimited
    #[arg(long, env = "SCHEDD_MAX_RESOURCES_TO_OFFER", default_value_t = -1, allow_negative_numbers = true)]
    pub max_resources_to_offer: i32,

    /// Do not decode rejection context appended to rejection reasons
    #[arg(long)]
    pub no_legacy_reject_context: bool,
}

#[derive(Parser)]
pub struct CheckOpts {
    /// Path to the job queue file
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub queue: PathBuf,
}

pub fn default_schedd_name() -> String {
    gethostname::gethostname().to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::{RootOptions, SubCommand};
    use clap::Parser;
    use std::time::Duration;

    #[test]
    fn test_parse_serve() {
        let opts = RootOptions::try_parse_from([
            "schedd",
            "serve",
            "--queue",
            "jobs.toml",
            "--port",
            "1234",
            "--read-timeout",
            "5s",
            "--max-resources-to-offer",
            "10",
        ])
        .unwrap();
        let SubCommand::Serve(opts) = opts.subcmd else {
            panic!("Expected serve command");
        };
        assert_eq!(opts.port, 1234);
        assert_eq!(*opts.read_timeout.get(), Duration::from_secs(5));
        assert_eq!(*opts.idle_timeout.get(), Duration::from_secs(600));
        assert_eq!(opts.max_resources_to_offer, 10);
        assert!(!opts.no_legacy_reject_context);
    }
}
