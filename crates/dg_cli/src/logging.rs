use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

fn default_directives(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    format!("{},hyper=warn,reqwest=warn", level)
}

/// Install the fmt subscriber once. `RUST_LOG` wins over `-v`.
pub fn init_logging(verbose: bool) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives() {
        assert_eq!(default_directives(false), "info,hyper=warn,reqwest=warn");
        assert_eq!(default_directives(true), "debug,hyper=warn,reqwest=warn");
    }
}
