//! Volumes and snapshots owned by a test account.

mod common;

use std::time::Duration;

use rigger_api::commands::{delete_action, CreateSnapshot, CreateVolume, UploadVolume, Volume};
use rigger_lifecycle::{CascadePolicy, Deleter, Outcome, WaitConfig};
use rigger_testing::{names, TestScope};

fn quick_wait() -> WaitConfig {
    WaitConfig::fixed(Duration::from_millis(5), Duration::from_secs(5))
}

#[tokio::test]
async fn test_uploaded_volume_becomes_usable() {
    let w = common::world().await;
    let mut scope = TestScope::new("upload", CascadePolicy::default());
    let account = w.account(&mut scope).await;

    let volume = scope
        .create(
            &w.client,
            &UploadVolume::new(
                names::unique_name("upload"),
                "http://images.example.org/data.qcow2",
                "QCOW2",
                &w.fixtures.zone_id,
            )
            .owned_by(&account),
        )
        .await
        .unwrap();
    assert_eq!(volume.state, "NotUploaded");

    let ready = w
        .client
        .wait_for_volume_state(&volume.id, "Uploaded", &quick_wait())
        .await
        .unwrap();
    assert_eq!(ready.id, volume.id);
    assert_eq!(ready.account.as_deref(), Some(account.name.as_str()));

    let report = scope.teardown(&w.client).await.unwrap();
    assert_eq!(report.count(Outcome::Deleted), 2);
}

#[tokio::test]
async fn test_attached_volume_must_be_detached_first() {
    let w = common::world().await;
    let mut scope = TestScope::new("attach", CascadePolicy::Strict);

    let account = w.account(&mut scope).await;
    let network = w.network(&mut scope, &account).await;
    let vm = w.vm(&mut scope, &account, &network).await;
    let volume = scope
        .create(
            &w.client,
            &CreateVolume::new(
                names::unique_name("data"),
                &w.fixtures.disk_offering_id,
                &w.fixtures.zone_id,
            )
            .owned_by(&account)
            .size_gb(5),
        )
        .await
        .unwrap();
    assert!(!volume.is_attached());

    let attached = w.client.attach_volume(&volume.id, &vm.id).await.unwrap();
    assert!(attached.is_attached());
    assert_eq!(attached.virtual_machine_id.as_ref(), Some(&vm.id));

    let target = volume.id.to_ref();
    let err = w
        .client
        .delete(&target, &delete_action(target.kind, &target.id))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("not attached to any VM"));
    assert!(w.cloud.exists(volume.id.as_str()));

    let detached = w.client.detach_volume(&volume.id).await.unwrap();
    assert!(!detached.is_attached());

    let report = scope.teardown(&w.client).await.unwrap();
    assert_eq!(report.count(Outcome::Deleted), 4);
    assert_eq!(
        w.cloud.delete_calls().last().map(String::as_str),
        Some(account.id.as_str())
    );
}

#[tokio::test]
async fn test_snapshot_is_removed_before_its_volume() {
    let w = common::world().await;
    let mut scope = TestScope::new("snapshot", CascadePolicy::default());
    let account = w.account(&mut scope).await;

    let volume: Volume = scope
        .create(
            &w.client,
            &CreateVolume::new(
                names::unique_name("data"),
                &w.fixtures.disk_offering_id,
                &w.fixtures.zone_id,
            )
            .owned_by(&account),
        )
        .await
        .unwrap();
    let snapshot = scope
        .create(&w.client, &CreateSnapshot::of(&volume.id))
        .await
        .unwrap();
    assert_eq!(snapshot.volume_id.as_ref(), Some(&volume.id));
    assert_eq!(snapshot.state.as_deref(), Some("BackedUp"));

    scope.teardown(&w.client).await.unwrap();

    assert_eq!(
        w.cloud.delete_calls(),
        vec![
            snapshot.id.as_str().to_string(),
            volume.id.as_str().to_string(),
            account.id.as_str().to_string(),
        ]
    );
}
