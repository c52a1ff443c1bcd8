//  Copyright (c) 2026 Metaform Systems, Inc
//
//  This program and the accompanying materials are made available under the
//  terms of the Apache License, Version 2.0 which is available at
//  https://www.apache.org/licenses/LICENSE-2.0
//
//  SPDX-License-Identifier: Apache-2.0
//
//  Contributors:
//       Metaform Systems, Inc. - initial API and implementation
//

//! Deferred, memoized execution and sequential combinators over it.

#[cfg(test)]
mod tests;

use crate::error::HarnessError;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::future::{Future, IntoFuture};
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

type Producer<T> = Box<dyn FnOnce() -> BoxFuture<'static, Result<T, HarnessError>> + Send>;

struct DeferredInner<T> {
    producer: Mutex<Option<Producer<T>>>,
    outcome: OnceCell<Result<T, HarnessError>>,
}

/// A computation that runs on first consumption and remembers its outcome.
///
/// The producer is invoked at most once no matter how often, or from how many clones, the outcome is
/// awaited. Clones share the same outcome.
pub struct Deferred<T> {
    inner: Arc<DeferredInner<T>>,
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Deferred<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new<F, Fut>(producer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, HarnessError>> + Send + 'static,
    {
        let producer: Producer<T> = Box::new(move || producer().boxed());
        Self {
            inner: Arc::new(DeferredInner {
                producer: Mutex::new(Some(producer)),
                outcome: OnceCell::new(),
            }),
        }
    }

    /// Runs the producer if nobody has yet and returns the memoized outcome.
    pub async fn outcome(&self) -> &Result<T, HarnessError> {
        self.inner
            .outcome
            .get_or_init(|| async {
                let producer = self.inner.producer.lock().unwrap_or_else(|e| e.into_inner()).take();
                match producer {
                    Some(producer) => producer().await,
                    // A previous consumer was dropped while the producer was running
                    None => Err(HarnessError::Interrupted(
                        "Deferred execution was abandoned before completing".to_string(),
                    )),
                }
            })
            .await
    }

    pub async fn wait(&self) -> Result<T, HarnessError> {
        self.outcome().await.clone()
    }

    /// True once the outcome is known.
    pub fn is_settled(&self) -> bool {
        self.inner.outcome.initialized()
    }

    /// Callback entry point: consumes the outcome in the background and reports the failure, if any, to `done`.
    ///
    /// Requires a Tokio runtime; without one `done` is invoked immediately with a configuration error.
    pub fn notify<F>(&self, done: F)
    where
        F: FnOnce(Option<HarnessError>) + Send + 'static,
    {
        if tokio::runtime::Handle::try_current().is_err() {
            done(Some(HarnessError::configuration(
                "Callback consumption requires a running Tokio runtime",
            )));
            return;
        }

        let deferred = self.clone();
        tokio::spawn(async move {
            done(deferred.wait().await.err());
        });
    }
}

impl<T> IntoFuture for Deferred<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Output = Result<T, HarnessError>;
    type IntoFuture = BoxFuture<'static, Result<T, HarnessError>>;

    fn into_future(self) -> Self::IntoFuture {
        async move { self.wait().await }.boxed()
    }
}

/// Evaluates `deferreds` one after the other and stops at the first failure, which is returned.
pub async fn run<T, I>(deferreds: I) -> Result<(), HarnessError>
where
    T: Clone + Send + Sync + 'static,
    I: IntoIterator<Item = Deferred<T>>,
{
    for deferred in deferreds {
        deferred.wait().await?;
    }
    Ok(())
}

/// Evaluates every deferred one after the other, collecting failures.
///
/// # Errors
/// Returns [`HarnessError::Composite`] holding every failure in evaluation order if at least one failed.
pub async fn all<T, I>(deferreds: I) -> Result<(), HarnessError>
where
    T: Clone + Send + Sync + 'static,
    I: IntoIterator<Item = Deferred<T>>,
{
    let mut failures = Vec::new();
    for deferred in deferreds {
        if let Err(error) = deferred.wait().await {
            failures.push(error);
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(HarnessError::Composite(failures))
    }
}
