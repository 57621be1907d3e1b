//! Enroll a finger, then verify it
//!
//! Usage: `cargo run --example enroll -- [username]`
//!
//! Set `CLEAR_STORAGE=1` to wipe the sensor first.

use anyhow::Context;
use elanmoc::{Device, Event, Finger, FingerStatus, MatchOutcome, Print};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let username = std::env::args().nth(1);

    let mut device = Device::discover().context("no sensor found")?;
    let mut events = device.subscribe();
    device.open().await?;

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                Event::FingerStatus(FingerStatus::Needed) => println!("Touch the sensor"),
                Event::EnrollProgress {
                    stage,
                    total,
                    retry: None,
                } => println!("Stage {}/{}", stage, total),
                Event::EnrollProgress {
                    retry: Some(reason),
                    ..
                }
                | Event::Retry(reason) => println!("{}", reason),
                Event::NoMatch => println!("Finger not recognized"),
                Event::FingerStatus(_) => {}
            }
        }
    });

    // Ctrl-C aborts the capture instead of leaving the sensor waiting
    let session = device.session();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            session.cancel();
        }
    });

    if std::env::var("CLEAR_STORAGE").is_ok_and(|value| value == "1") {
        device.clear_storage().await?;
        println!("Storage cleared");
    }

    let mut template = Print::new(Finger::RightIndex);
    if let Some(username) = username {
        template = template.with_username(username);
    }

    let print = device.enroll(template).await?;
    println!("Enrolled {}", print);
    println!("{}", serde_json::to_string_pretty(&print)?);

    println!("Verifying...");
    match device.verify(print).await? {
        MatchOutcome::Matched { print, .. } => println!("Matched {}", print),
        MatchOutcome::NoMatch => println!("No prints on the sensor"),
    }

    device.close().await?;
    Ok(())
}
