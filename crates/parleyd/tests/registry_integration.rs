//! Integration tests for the registry actor and coordinator register.
//!
//! These tests exercise `spawn_registry()` and `CoordinatorRegister` through
//! their public interfaces, including under concurrent use.
//!
//! Tests CAN use `.unwrap()` and `.expect()`; the panic-free policy covers
//! production code only.

use std::sync::Arc;

use parley_core::{IdAllocator, MemberId};
use parleyd::registry::{
    spawn_registry, CoordinatorRegister, MemberHandle, RegistryError, RemovalReason,
};
use tokio::sync::{mpsc, Barrier};
use tokio_util::sync::CancellationToken;

// ============================================================================
// Test Helpers
// ============================================================================

fn create_member(id: &MemberId) -> (MemberHandle, mpsc::Receiver<String>) {
    let (tx, rx) = mpsc::channel(8);
    (MemberHandle::new(id.clone(), tx, CancellationToken::new()), rx)
}

// ============================================================================
// Registry Lifecycle
// ============================================================================

#[tokio::test]
async fn test_basic_lifecycle() {
    let registry = spawn_registry(8);
    let id = MemberId::new("00001");
    let (member, _rx) = create_member(&id);

    registry.register(member).await.expect("register");
    assert!(registry.lookup(&id).await.is_some());
    assert_eq!(registry.member_ids().await, vec![id.clone()]);

    assert!(registry.remove(&id, RemovalReason::Departed).await);
    assert!(registry.lookup(&id).await.is_none());

    // Second removal reports nothing was removed
    assert!(!registry.remove(&id, RemovalReason::Kicked).await);
    assert!(registry.is_connected());
}

#[tokio::test]
async fn test_duplicate_registration_rejected() {
    let registry = spawn_registry(8);
    let id = MemberId::new("00001");
    let (first, _rx1) = create_member(&id);
    let (second, _rx2) = create_member(&id);

    registry.register(first).await.unwrap();
    let err = registry.register(second).await.unwrap_err();

    assert_eq!(err, RegistryError::DuplicateIdentity(id));
}

#[tokio::test]
async fn test_capacity_enforced() {
    let registry = spawn_registry(2);
    let ids = IdAllocator::new();

    let mut receivers = Vec::new();
    for _ in 0..2 {
        let (member, rx) = create_member(&ids.next_id());
        registry.register(member).await.unwrap();
        receivers.push(rx);
    }

    let (extra, _rx) = create_member(&ids.next_id());
    let err = registry.register(extra).await.unwrap_err();
    assert_eq!(err, RegistryError::RegistryFull { max: 2 });
}

#[tokio::test]
async fn test_snapshot_is_sorted_by_id() {
    let registry = spawn_registry(8);
    let mut receivers = Vec::new();
    for raw in ["00003", "00001", "00002"] {
        let (member, rx) = create_member(&MemberId::new(raw));
        registry.register(member).await.unwrap();
        receivers.push(rx);
    }

    let ids: Vec<String> = registry
        .snapshot()
        .await
        .iter()
        .map(|member| member.id().to_string())
        .collect();
    assert_eq!(ids, vec!["00001", "00002", "00003"]);
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_registrations() {
    let registry = spawn_registry(64);
    let ids = Arc::new(IdAllocator::new());

    let mut tasks = Vec::new();
    for _ in 0..32 {
        let registry = registry.clone();
        let ids = Arc::clone(&ids);
        tasks.push(tokio::spawn(async move {
            let (member, rx) = create_member(&ids.next_id());
            registry.register(member).await.map(|_| rx)
        }));
    }

    let mut receivers = Vec::new();
    for task in tasks {
        receivers.push(task.await.unwrap().expect("every registration succeeds"));
    }

    let registered = registry.member_ids().await;
    assert_eq!(registered.len(), 32);
    assert_eq!(registered.first(), Some(&MemberId::new("00001")));
    assert_eq!(registered.last(), Some(&MemberId::new("00032")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_election_has_single_winner() {
    let coordinator = CoordinatorRegister::new();
    let barrier = Arc::new(Barrier::new(16));

    let mut tasks = Vec::new();
    for seq in 1..=16 {
        let coordinator = coordinator.clone();
        let barrier = Arc::clone(&barrier);
        tasks.push(tokio::spawn(async move {
            let id = MemberId::from_sequence(seq);
            barrier.wait().await;
            coordinator.elect_if_absent(&id).then_some(id)
        }));
    }

    let mut winners = Vec::new();
    for task in tasks {
        if let Some(id) = task.await.unwrap() {
            winners.push(id);
        }
    }

    assert_eq!(winners.len(), 1);
    assert_eq!(coordinator.current(), winners.pop());
}

#[tokio::test]
async fn test_vacate_only_by_holder() {
    let coordinator = CoordinatorRegister::new();
    let a = MemberId::new("00001");
    let b = MemberId::new("00002");

    assert!(coordinator.elect_if_absent(&a));
    assert!(!coordinator.vacate(&b));
    assert_eq!(coordinator.current(), Some(a.clone()));

    coordinator.reassign(b.clone());
    assert!(!coordinator.vacate(&a));
    assert!(coordinator.vacate(&b));
    assert_eq!(coordinator.current(), None);

    // Empty register accepts a new election
    assert!(coordinator.elect_if_absent(&a));
}

#[tokio::test]
async fn test_subscriber_sees_succession() {
    let coordinator = CoordinatorRegister::new();
    let mut changes = coordinator.subscribe();

    coordinator.elect_if_absent(&MemberId::new("00001"));
    changes.changed().await.unwrap();
    assert_eq!(*changes.borrow_and_update(), Some(MemberId::new("00001")));

    coordinator.reassign(MemberId::new("00002"));
    changes.changed().await.unwrap();
    assert_eq!(*changes.borrow_and_update(), Some(MemberId::new("00002")));
}
