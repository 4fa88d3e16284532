use anyhow::Context;
use log::debug;
use portsweep::input::{Config, Opts};
#[cfg(unix)]
use portsweep::limits::{adjust_ulimit_size, infer_worker_count};
use portsweep::output::{describe_ports, to_greppable, to_json};
use portsweep::scanner::{ScanRequest, Scanner};
use portsweep::{detail, output, warning};

#[cfg(not(tarpaulin_include))]
/// Faster TCP connect scanning with a fixed pool of workers.
fn main() -> anyhow::Result<()> {
    #[cfg(not(unix))]
    let _ = ansi_term::enable_ansi_support();

    env_logger::init();

    let mut opts = Opts::read();
    let config = match Config::read(opts.config_path.clone()) {
        Ok(config) => config,
        Err(e) => {
            warning!(format!("Found {e} in configuration file.\nAborting scan.\n"));
            std::process::exit(1);
        }
    };
    opts.merge(&config);

    debug!("Main() `opts` arguments are {opts:?}");

    #[cfg(unix)]
    {
        opts.workers = infer_worker_count(&opts, adjust_ulimit_size(&opts));
    }

    let request: ScanRequest = opts
        .to_request()
        .context("invalid scan configuration")?;

    detail!(
        format!(
            "Starting scan on {} ports {}-{} with {} workers (verbose={})",
            request.host(),
            request.start_port(),
            request.end_port(),
            request.workers(),
            request.is_verbose()
        ),
        opts.greppable,
        opts.accessible
    );

    let scanner = Scanner::new(request)
        .resolver(opts.resolver.clone())
        .greppable(opts.greppable)
        .accessible(opts.accessible);

    let runtime = tokio::runtime::Runtime::new().context("could not start the async runtime")?;
    let summary = runtime.block_on(scanner.run());

    let found = if summary.open_ports.is_empty() {
        "no open ports".to_owned()
    } else {
        describe_ports(&summary.open_ports)
    };
    output!(
        format!(
            "Scan complete. Found {found} in {}ms",
            summary.scan_duration_ms
        ),
        opts.greppable,
        opts.accessible
    );

    if opts.greppable {
        println!("{}", to_greppable(&summary));
    } else {
        println!("{}", to_json(&summary).context("could not encode the summary")?);
    }

    Ok(())
}

