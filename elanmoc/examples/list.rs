//! List the prints stored on the first connected sensor

use anyhow::Context;
use elanmoc::Device;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let mut device = Device::discover().context("no sensor found")?;
    device.open().await?;
    println!("Device: {}", device.device_info());

    let prints = device.list().await?;
    if prints.is_empty() {
        println!("No prints enrolled");
    }
    for print in &prints {
        println!("  {} (user {})", print, print.username.as_deref().unwrap_or("-"));
    }

    device.close().await?;
    Ok(())
}
