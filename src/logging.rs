use tracing_subscriber::EnvFilter;

/// Filter applied when `RUST_LOG` is not set. The GPU stack logs too much at
/// `info`, so it is capped at `warn`.
const DEFAULT_FILTER: &str = "info,wgpu=warn,wgpu_core=warn,wgpu_hal=warn,naga=warn,cubecl=warn";

/// If a global tracing subscriber is not already configured, set up logging to
/// stderr and add a panic hook that logs the panic.
///
/// `log` records are forwarded to the subscriber, so the `log` macros used
/// across the crate and by burn end up in the same output.
pub fn install_logger() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok();

    if installed {
        update_panic_hook();
    }
}

fn update_panic_hook() {
    let hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |info| {
        log::error!("PANIC => {info}");
        hook(info);
    }));
}
