// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `stash scan`: list raw operations of one stream

use super::{open_log, OperationView};
use crate::config::Config;
use crate::output::{self, OutputFormat};
use clap::Args;
use stash_adapters::LogService;
use stash_core::{Seq, Stream};
use stash_storage::DEFAULT_SCAN_LIMIT;
use std::time::Duration;

#[derive(Args)]
pub struct ScanArgs {
    /// mute, notif or operation
    #[arg(long, default_value = "operation")]
    pub stream: Stream,
    /// Only operations after this sequence number
    #[arg(long)]
    pub cursor: Option<Seq>,
    /// Page size
    #[arg(long, default_value_t = DEFAULT_SCAN_LIMIT)]
    pub limit: usize,
}

pub async fn handle(args: ScanArgs, config: &Config, format: OutputFormat) -> anyhow::Result<()> {
    let log = open_log(config, Duration::ZERO)?;
    let page = log.scan(args.stream, args.cursor, args.limit).await?;

    let views: Vec<OperationView> = page.operations.iter().map(OperationView::from).collect();
    if views.is_empty() && matches!(format, OutputFormat::Text) {
        println!("No operations");
        return Ok(());
    }
    output::print_list(&views, format)
}
