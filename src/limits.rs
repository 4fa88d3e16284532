//! Sizes the worker pool against the open file limit of the process.
//!
//! Every worker holds at most one socket at a time, so the worker count is
//! bounded by how many descriptors the process may open.
use crate::input::Opts;
use crate::{detail, warning};
use log::info;

const DEFAULT_FILE_DESCRIPTORS_LIMIT: u64 = 8000;
const AVERAGE_WORKER_COUNT: u64 = 3000;

/// Raises the soft NOFILE limit when `--ulimit` was given and returns the
/// soft limit now in effect.
#[cfg(unix)]
#[cfg(not(tarpaulin_include))]
pub fn adjust_ulimit_size(opts: &Opts) -> u64 {
    use rlimit::Resource;

    if let Some(limit) = opts.ulimit {
        if Resource::NOFILE.set(limit, limit).is_ok() {
            detail!(
                format!("Automatically increasing ulimit value to {limit}."),
                opts.greppable,
                opts.accessible
            );
        } else {
            warning!(
                "ERROR. Failed to set ulimit value.",
                opts.greppable,
                opts.accessible
            );
        }
    }

    Resource::NOFILE
        .get()
        .map_or(DEFAULT_FILE_DESCRIPTORS_LIMIT, |(soft, _)| soft)
}

/// Lowers the requested worker count when it would exceed `ulimit`.
///
/// The user's value is kept whenever it fits. Otherwise it drops to half of
/// a very small limit, to an average count under a generous limit, or to
/// just under the limit.
pub fn infer_worker_count(opts: &Opts, ulimit: u64) -> usize {
    let mut workers = u64::try_from(opts.workers).unwrap_or(u64::MAX);

    if ulimit < workers {
        warning!(
            "File limit is lower than the worker count. Consider upping with --ulimit.",
            opts.greppable,
            opts.accessible
        );

        if ulimit < AVERAGE_WORKER_COUNT {
            warning!(
                "Your file limit is very small, which slows the scan down. Up it with '--ulimit 5000'.",
                opts.greppable,
                opts.accessible
            );
            info!("Halving worker count because ulimit is smaller than average worker count");
            workers = (ulimit / 2).max(1);
        } else if ulimit > DEFAULT_FILE_DESCRIPTORS_LIMIT {
            info!("Worker count is now average worker count");
            workers = AVERAGE_WORKER_COUNT;
        } else {
            workers = ulimit.saturating_sub(100).max(1);
        }
    }

    usize::try_from(workers).unwrap_or(usize::MAX)
}
