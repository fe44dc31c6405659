// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `stash put`: submit one operation through the write client

use super::{open_log, OperationView};
use crate::config::Config;
use crate::output::{self, OutputFormat};
use anyhow::{bail, Context};
use clap::Args;
use serde_json::Value;
use stash_core::{KeyGen, Method, SchemaRegistry, TidGen};
use stash_engine::WriteClient;
use std::time::Duration;

#[derive(Args)]
pub struct PutArgs {
    /// create, update or delete
    pub method: Method,
    /// Owner DID
    #[arg(long)]
    pub actor: String,
    /// Record namespace (NSID with optional #fragment)
    #[arg(long)]
    pub namespace: String,
    /// Record key; a time-sortable key is generated for create when omitted
    #[arg(long)]
    pub key: Option<String>,
    /// JSON object payload for create and update
    #[arg(long)]
    pub payload: Option<String>,
}

pub async fn handle(args: PutArgs, config: &Config, format: OutputFormat) -> anyhow::Result<()> {
    let key = match (args.key, args.method) {
        (Some(key), _) => key,
        (None, Method::Create) => TidGen::default().next(),
        (None, method) => bail!("--key is required for {}", method),
    };

    let payload: Option<Value> = args
        .payload
        .as_deref()
        .map(serde_json::from_str)
        .transpose()
        .context("--payload is not valid JSON")?;

    let writer = WriteClient::new(open_log(config, Duration::ZERO)?, SchemaRegistry::builtin());
    let stored = match (args.method, payload) {
        (Method::Delete, None) => writer.delete(&args.actor, &args.namespace, &key).await?,
        (Method::Delete, Some(_)) => bail!("delete does not take a payload"),
        (method, None) => bail!("--payload is required for {}", method),
        (Method::Create, Some(payload)) => {
            writer
                .create(&args.actor, &args.namespace, &key, &payload)
                .await?
        }
        (Method::Update, Some(payload)) => {
            writer
                .update(&args.actor, &args.namespace, &key, &payload)
                .await?
        }
    };

    output::print(&OperationView::from(&stored), format)
}
