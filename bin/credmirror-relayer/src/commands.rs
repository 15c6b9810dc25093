//! Operator commands working directly on the relayer database.

use anyhow::{bail, Context};
use credmirror_db::relay::RelayerDb;

use crate::{bootstrap::open_db, config::Config};

/// Prints the scan cursor and queue counts, or one entry.
pub(crate) async fn status(config: &Config, sequence: Option<u64>) -> anyhow::Result<()> {
    let db = open_db(config).await?;
    let emitter = config.source.emitter_key();

    if let Some(sequence) = sequence {
        let id = emitter.message(sequence);
        match db.relay_entry(id).await.context("read relay entry")? {
            Some(entry) => println!(
                "{id}: {} (block {}, {} attestation lookups)",
                entry.status, entry.block_height, entry.attempts
            ),
            None => println!("{id}: not discovered"),
        }

        return Ok(());
    }

    let cursor = db.get_scan_cursor(emitter).await.context("read cursor")?;
    let counts = db.relay_counts(emitter).await.context("count relay queue")?;

    match cursor {
        Some(cursor) => println!("emitter {emitter}: scanned up to block {cursor}"),
        None => println!("emitter {emitter}: not scanned yet"),
    }
    println!("  pending:           {}", counts.pending);
    println!("  delivered:         {}", counts.delivered);
    println!("  already delivered: {}", counts.already_delivered);
    println!("  rejected:          {}", counts.rejected);
    println!("  abandoned:         {}", counts.abandoned);

    Ok(())
}

/// Moves an abandoned or rejected entry back to pending.
pub(crate) async fn requeue(config: &Config, sequence: u64) -> anyhow::Result<()> {
    let db = open_db(config).await?;
    let id = config.source.emitter_key().message(sequence);

    let Some(entry) = db.relay_entry(id).await.context("read relay entry")? else {
        bail!("{id} was never discovered");
    };

    if !db.requeue(id).await.context("requeue entry")? {
        bail!("{id} is {}, only rejected or abandoned messages can be requeued", entry.status);
    }

    println!("{id}: pending, a running relayer picks it up on its next poll");
    Ok(())
}
