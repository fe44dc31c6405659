// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `stash follow`: replicate continuously until interrupted

use super::{open_log, open_replica, save_snapshot};
use crate::config::Config;
use anyhow::Context;
use stash_engine::Supervisor;
use std::sync::Arc;
use tokio::sync::watch;

pub async fn handle(config: &Config) -> anyhow::Result<()> {
    let log = open_log(config, config.consumer.long_poll)?;
    let consumer = Arc::new(open_replica(config, log)?);

    consumer.start().await;
    let (stop, stopped) = watch::channel(false);
    let supervisor = Supervisor::new(Arc::clone(&consumer), config.consumer.supervise_interval);
    let supervise = tokio::spawn(async move { supervisor.run(stopped).await });

    println!("Following {} (Ctrl-C to stop)", config.log_path.display());
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    tracing::info!("interrupted, shutting down");

    let _ = stop.send(true);
    if let Err(e) = supervise.await {
        tracing::error!(error = %e, "supervisor task failed");
    }
    consumer.destroy().await;

    let snapshot = save_snapshot(config, &consumer)?;
    println!("Stopped; {} records replicated", snapshot.private_data.len());
    Ok(())
}
