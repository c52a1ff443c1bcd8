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

use crate::lock::{LockManager, MemoryLockManager};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[tokio::test]
async fn test_lock_and_release() {
    let manager = MemoryLockManager::new();

    let guard = manager.lock("project-a", "owner1").await.unwrap();
    assert_eq!(guard.identifier(), "project-a");
    assert_eq!(guard.owner(), "owner1");
    assert_eq!(manager.lock_count("project-a").await.unwrap(), 1);

    drop(guard);
    assert_eq!(manager.lock_count("project-a").await.unwrap(), 0);
}

#[tokio::test]
async fn test_lock_count_unknown_identifier() {
    let manager = MemoryLockManager::new();

    assert_eq!(manager.lock_count("nothing").await.unwrap(), 0);
}

#[tokio::test]
async fn test_different_identifiers_do_not_block() {
    let manager = MemoryLockManager::new();

    let _first = manager.lock("project-a", "owner1").await.unwrap();
    let second = tokio::time::timeout(Duration::from_millis(100), manager.lock("project-b", "owner2")).await;

    assert!(second.is_ok(), "Lock on another identifier should be granted immediately");
}

#[tokio::test]
async fn test_same_identifier_waits_for_release() {
    let manager = MemoryLockManager::new();

    let first = manager.lock("project-a", "owner1").await.unwrap();
    let blocked = tokio::time::timeout(Duration::from_millis(50), manager.lock("project-a", "owner2")).await;
    assert!(blocked.is_err(), "Second owner must wait while the lock is held");

    drop(first);
    let granted = tokio::time::timeout(Duration::from_millis(100), manager.lock("project-a", "owner2")).await;
    assert!(granted.is_ok());
}

#[tokio::test]
async fn test_waiters_granted_in_submission_order() {
    let manager = MemoryLockManager::new();
    let order = Arc::new(Mutex::new(Vec::new()));

    let first = manager.lock("project-a", "owner0").await.unwrap();

    let mut handles = Vec::new();
    for i in 1..=4 {
        let manager = manager.clone();
        let order = order.clone();
        handles.push(tokio::spawn(async move {
            let _guard = manager.lock("project-a", &format!("owner{}", i)).await.unwrap();
            order.lock().unwrap().push(i);
            tokio::time::sleep(Duration::from_millis(5)).await;
        }));
        // Let the task enqueue before spawning the next one
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(manager.lock_count("project-a").await.unwrap(), 5);
    drop(first);

    for handle in handles {
        handle.await.expect("Task failed");
    }

    assert_eq!(*order.lock().unwrap(), vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn test_release_locks_forgets_targets() {
    let manager = MemoryLockManager::new();

    let _held = manager.lock("project-a", "owner1").await.unwrap();
    manager.release_locks().await.unwrap();

    assert_eq!(manager.lock_count("project-a").await.unwrap(), 0);
    let granted = tokio::time::timeout(Duration::from_millis(100), manager.lock("project-a", "owner2")).await;
    assert!(granted.is_ok(), "A fresh lock should be granted after reset");
}
