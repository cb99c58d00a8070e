//! Backup restore
//!
//! One-shot import of a ZIP bundle into the registry, guarded by a lock file
//! next to the archive. A present lock means the archive was already applied
//! and the whole operation is a silent no-op. The lock is never rolled back:
//! if a push fails mid-restore the archive stays quarantined and needs
//! operator attention.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use sqlx::SqlitePool;
use tracing::{info, warn};
use zip::ZipArchive;

use crate::db::{self, Actor, Label, Transaction};
use crate::error::Result;

/// Registry entities decoded from a backup archive
#[derive(Debug, Default)]
pub struct Bundle {
    pub actors: Vec<Actor>,
    pub labels: Vec<Label>,
    pub transactions: Vec<Transaction>,
}

/// Lock file co-located with the archive: `<dir>/.<basename>`
pub fn lock_path(archive: &Path) -> PathBuf {
    let dir = archive.parent().unwrap_or_else(|| Path::new("."));
    let base = archive
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    dir.join(format!(".{base}"))
}

/// Create the lock, reporting whether it already existed
fn acquire_lock(archive: &Path) -> Result<bool> {
    let lock = lock_path(archive);

    if lock.exists() {
        return Ok(true);
    }

    std::fs::write(&lock, [])?;
    Ok(false)
}

fn read_bundle(archive: &mut ZipArchive<File>) -> Result<Bundle> {
    let mut bundle = Bundle::default();

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let name = entry.name().to_string();

        let mut data = Vec::new();
        match name.as_str() {
            "reg_transactions.json" => {
                entry.read_to_end(&mut data)?;
                bundle.transactions = serde_json::from_slice(&data)?;
            }
            "reg_actors.json" => {
                entry.read_to_end(&mut data)?;
                bundle.actors = serde_json::from_slice(&data)?;
            }
            "reg_labels.json" => {
                entry.read_to_end(&mut data)?;
                bundle.labels = serde_json::from_slice(&data)?;
            }
            _ => warn!("unsupported file to unpack: {name}"),
        }
    }

    Ok(bundle)
}

/// Restore a backup archive into the registry
///
/// Entities push in dependency order (actors, labels, transactions) so
/// references exist before their dependents. Returns false when a lock
/// short-circuited the restore.
pub async fn restore(pool: &SqlitePool, batch: usize, archive_path: &Path) -> Result<bool> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file)?;

    if acquire_lock(archive_path)? {
        info!(
            "archive {} already applied, skipping restore",
            archive_path.display()
        );
        return Ok(false);
    }

    let mut bundle = read_bundle(&mut archive)?;
    info!(
        "restoring {} actors, {} labels, {} transactions from {}",
        bundle.actors.len(),
        bundle.labels.len(),
        bundle.transactions.len(),
        archive_path.display()
    );

    db::actors::push(pool, &bundle.actors, batch).await?;
    db::labels::push(pool, &bundle.labels, batch).await?;
    db::transactions::push(pool, &mut bundle.transactions, batch).await?;

    Ok(true)
}
