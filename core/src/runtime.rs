//! Global worker pool for the row-parallel raster kernels.

use crate::{Error, Result};
use rayon::ThreadPoolBuilder;
use std::sync::OnceLock;

pub const CPU_THREADS_ENV: &str = "CVFRAME_CPU_THREADS";

static POOL: OnceLock<Result<usize>> = OnceLock::new();

/// Build the global rayon pool once and report its size.
///
/// The size comes from `num_threads`, else from `CVFRAME_CPU_THREADS`, else
/// rayon picks. The first call decides; later calls get the same outcome
/// whatever they ask for.
pub fn init_global_thread_pool(num_threads: Option<usize>) -> Result<usize> {
    POOL.get_or_init(|| {
        let requested = resolve_cpu_threads(num_threads, |key| std::env::var(key).ok())?;
        let builder = match requested {
            Some(n) => ThreadPoolBuilder::new().num_threads(n),
            None => ThreadPoolBuilder::new(),
        };
        builder
            .build_global()
            .map_err(|e| Error::Config(format!("global thread pool: {e}")))?;
        Ok(rayon::current_num_threads())
    })
    .clone()
}

pub fn current_cpu_threads() -> usize {
    rayon::current_num_threads()
}

/// Thread count requested by the caller or through `lookup(CPU_THREADS_ENV)`.
/// `None` leaves the choice to rayon.
fn resolve_cpu_threads(
    explicit: Option<usize>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Option<usize>> {
    let requested = match explicit {
        Some(n) => n,
        None => match lookup(CPU_THREADS_ENV) {
            Some(raw) => parse_cpu_threads(&raw)?,
            None => return Ok(None),
        },
    };
    if requested == 0 {
        return Err(Error::Config(format!("{CPU_THREADS_ENV} must be >= 1")));
    }
    Ok(Some(requested))
}

fn parse_cpu_threads(raw: &str) -> Result<usize> {
    raw.trim().parse().map_err(|_| {
        Error::Config(format!("{CPU_THREADS_ENV} must be a positive integer, got '{raw}'"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(value: Option<&str>) -> impl Fn(&str) -> Option<String> {
        let value = value.map(str::to_string);
        move |key: &str| if key == CPU_THREADS_ENV { value.clone() } else { None }
    }

    #[test]
    fn explicit_count_wins_over_env() {
        assert_eq!(resolve_cpu_threads(Some(3), env(Some("8"))).unwrap(), Some(3));
        assert_eq!(resolve_cpu_threads(None, env(Some(" 2 "))).unwrap(), Some(2));
        assert_eq!(resolve_cpu_threads(None, env(None)).unwrap(), None);
    }

    #[test]
    fn rejects_zero_and_garbage() {
        assert!(matches!(resolve_cpu_threads(Some(0), env(None)), Err(Error::Config(_))));
        assert!(resolve_cpu_threads(None, env(Some("0"))).is_err());
        assert!(resolve_cpu_threads(None, env(Some("many"))).is_err());
    }

    #[test]
    fn init_is_idempotent() {
        let first = init_global_thread_pool(Some(2)).is_ok();
        let second = init_global_thread_pool(Some(8)).is_ok();
        assert_eq!(first, second);
        assert!(current_cpu_threads() >= 1);
    }
}
