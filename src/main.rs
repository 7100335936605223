use anyhow::{Context, Result};

fn main() -> Result<()> {
    // SAFETY: no other threads exist yet; the runtime is built afterwards.
    unsafe { locallama::startup::prepare_environment() };

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build async runtime")?
        .block_on(locallama::run())
}
