//! A fixed-size pool of [`tokio_rusqlite`] connections.
//!
//! A semaphore holds one permit per idle connection. A [`Lease`] owns a
//! permit and a connection and hands both back on drop, so a cancelled
//! caller never leaks a slot.

use std::{
  path::{Path, PathBuf},
  sync::{Arc, Mutex, PoisonError},
  time::Duration,
};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_rusqlite::Connection;

use crate::{Error, Result};

struct Shared {
  idle:    Mutex<Vec<Connection>>,
  permits: Arc<Semaphore>,
  size:    u32,
}

impl Shared {
  fn put_back(&self, conn: Connection) {
    self.idle.lock().unwrap_or_else(PoisonError::into_inner).push(conn);
  }

  fn take(&self) -> Option<Connection> {
    self.idle.lock().unwrap_or_else(PoisonError::into_inner).pop()
  }
}

#[derive(Clone)]
pub struct Pool {
  shared:  Arc<Shared>,
  timeout: Duration,
}

/// Where the pool's connections point.
pub enum Target {
  File(PathBuf),
  /// A private in-memory database. Only meaningful with a single connection.
  Memory,
}

impl Pool {
  /// Open `size` connections to `target`, configuring each one.
  pub async fn open(
    target: Target,
    size: u32,
    timeout: Duration,
    busy_timeout: Duration,
  ) -> Result<Self> {
    if size == 0 {
      return Err(Error::EmptyPool);
    }

    let mut conns = Vec::with_capacity(size as usize);
    for _ in 0..size {
      let conn = match &target {
        Target::File(path) => Connection::open(path).await?,
        Target::Memory => Connection::open_in_memory().await?,
      };
      configure(&conn, busy_timeout).await?;
      conns.push(conn);
    }

    Ok(Self {
      shared: Arc::new(Shared {
        idle:    Mutex::new(conns),
        permits: Arc::new(Semaphore::new(size as usize)),
        size,
      }),
      timeout,
    })
  }

  pub fn timeout(&self) -> Duration { self.timeout }

  /// Wait for a free connection. Suspends without polling.
  pub async fn acquire(&self) -> Result<Lease> {
    let permit = self
      .shared
      .permits
      .clone()
      .acquire_owned()
      .await
      .map_err(|_| Error::PoolClosed)?;
    let conn = self.shared.take().ok_or(Error::PoolClosed)?;
    Ok(Lease { conn: Some(conn), shared: self.shared.clone(), _permit: permit })
  }

  /// Run `f` on a pooled connection. The deadline covers both waiting for a
  /// connection and executing `f`.
  pub async fn call<F, R>(&self, f: F) -> Result<R>
  where
    F: FnOnce(&mut rusqlite::Connection) -> tokio_rusqlite::Result<R>
      + Send
      + 'static,
    R: Send + 'static,
  {
    let work = async {
      let lease = self.acquire().await?;
      Ok::<_, Error>(lease.connection()?.call(f).await?)
    };
    match tokio::time::timeout(self.timeout, work).await {
      Ok(result) => result,
      Err(_) => {
        tracing::warn!(timeout = ?self.timeout, "storage call timed out");
        Err(Error::Timeout(self.timeout))
      }
    }
  }

  /// Wait until every lease is returned, then close all connections.
  /// Subsequent acquisitions fail with [`Error::PoolClosed`].
  pub async fn close(&self) -> Result<()> {
    let all = self
      .shared
      .permits
      .acquire_many(self.shared.size)
      .await
      .map_err(|_| Error::PoolClosed)?;
    self.shared.permits.close();
    drop(all);

    let conns: Vec<Connection> = std::mem::take(
      &mut *self.shared.idle.lock().unwrap_or_else(PoisonError::into_inner),
    );
    for conn in conns {
      conn.close().await?;
    }
    tracing::debug!("connection pool closed");
    Ok(())
  }
}

impl Target {
  pub fn file(path: impl AsRef<Path>) -> Self { Self::File(path.as_ref().to_owned()) }
}

async fn configure(conn: &Connection, busy_timeout: Duration) -> Result<()> {
  conn
    .call(move |conn| {
      conn.busy_timeout(busy_timeout)?;
      conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         PRAGMA journal_mode = WAL;",
      )?;
      Ok(())
    })
    .await?;
  Ok(())
}

// ─── Lease ───────────────────────────────────────────────────────────────────

/// Exclusive use of one pooled connection.
pub struct Lease {
  conn:    Option<Connection>,
  shared:  Arc<Shared>,
  _permit: OwnedSemaphorePermit,
}

impl Lease {
  pub fn connection(&self) -> Result<&Connection> {
    self.conn.as_ref().ok_or(Error::PoolClosed)
  }
}

impl Drop for Lease {
  fn drop(&mut self) {
    // The connection goes back before the permit is released.
    if let Some(conn) = self.conn.take() {
      self.shared.put_back(conn);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  async fn pool(size: u32, timeout: Duration) -> Pool {
    Pool::open(Target::Memory, size, timeout, Duration::from_millis(100))
      .await
      .unwrap()
  }

  #[tokio::test]
  async fn zero_size_is_rejected() {
    let err = Pool::open(Target::Memory, 0, Duration::from_secs(1), Duration::ZERO)
      .await
      .err();
    assert!(matches!(err, Some(Error::EmptyPool)));
  }

  #[tokio::test]
  async fn lease_returns_connection_on_drop() {
    let pool = pool(1, Duration::from_secs(1)).await;
    let lease = pool.acquire().await.unwrap();
    drop(lease);
    let again = pool.acquire().await.unwrap();
    assert!(again.connection().is_ok());
  }

  #[tokio::test]
  async fn waiting_past_the_deadline_times_out() {
    let pool = pool(1, Duration::from_millis(50)).await;
    let _held = pool.acquire().await.unwrap();

    let err = pool.call(|_| Ok(())).await.unwrap_err();
    assert!(matches!(err, Error::Timeout(_)));
    assert!(matches!(subtrack_core::Error::from(err), subtrack_core::Error::Timeout));
  }

  #[tokio::test]
  async fn cancelled_waiter_does_not_leak_a_slot() {
    let pool = pool(1, Duration::from_secs(1)).await;
    let held = pool.acquire().await.unwrap();

    let waiter = tokio::time::timeout(Duration::from_millis(20), pool.acquire()).await;
    assert!(waiter.is_err());

    drop(held);
    let value = pool
      .call(|conn| Ok(conn.query_row("SELECT 7", [], |r| r.get::<_, i64>(0))?))
      .await;
    assert_eq!(value.unwrap(), 7);
  }

  #[tokio::test]
  async fn close_waits_for_leases_then_refuses_new_ones() {
    let pool = pool(2, Duration::from_secs(1)).await;
    let held = pool.acquire().await.unwrap();

    let closer = {
      let pool = pool.clone();
      tokio::spawn(async move { pool.close().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!closer.is_finished());

    drop(held);
    closer.await.unwrap().unwrap();
    assert!(matches!(pool.acquire().await.err(), Some(Error::PoolClosed)));
  }
}
