//! Parent deletes that take tracked children with them.

mod common;

use rigger_api::commands::{delete_action, CreateAccount, CreateDomain, CreateNetwork};
use rigger_api::Created;
use rigger_id::ResourceRef;
use rigger_lifecycle::{CascadePolicy, Deleter, Outcome};
use rigger_testing::{names, TestScope};
use rstest::rstest;

/// Account renamed mid-test and re-registered, so it is now the newest
/// handle and is deleted before the network and VM recorded under it.
#[rstest]
#[case::strict(CascadePolicy::Strict, 2, 3)]
#[case::tolerate(CascadePolicy::TolerateNotFound, 0, 3)]
#[case::track_parents(CascadePolicy::TrackParents, 0, 1)]
#[tokio::test]
async fn test_reregistered_parent_cascades(
    #[case] policy: CascadePolicy,
    #[case] expected_failures: usize,
    #[case] expected_delete_calls: usize,
) {
    let w = common::world().await;
    let mut scope = TestScope::new(format!("cascade-{policy}"), policy);

    let account = w.account(&mut scope).await;
    let parent = account.id.to_ref();
    let f = &w.fixtures;
    let network = scope
        .create_under(
            &w.client,
            &CreateNetwork::new("tier", &f.network_offering_id, &f.zone_id)
                .owned_by(&account),
            &parent,
        )
        .await
        .unwrap();
    let vm = scope
        .create_under(&w.client, &w.vm_spec(&account, &network), &parent)
        .await
        .unwrap();

    let renamed = w
        .client
        .rename_account(&account, &names::unique_name("renamed"))
        .await
        .unwrap();
    scope.forget(account.id.as_remote()).unwrap();
    let handle = Created::new(renamed.clone(), serde_json::to_value(&renamed).unwrap())
        .unwrap()
        .handle;
    scope.track(handle).unwrap();

    let report = match scope.teardown(&w.client).await {
        Ok(report) => report,
        Err(e) => e.report,
    };

    assert_eq!(report.failed_count(), expected_failures);
    assert_eq!(report.entries[0].reference, parent);
    assert_eq!(report.entries[0].outcome, Outcome::Deleted);
    assert_eq!(w.cloud.delete_calls().len(), expected_delete_calls);
    assert!(!w.cloud.exists(vm.id.as_str()));
    assert!(!w.cloud.exists(network.id.as_str()));

    if policy != CascadePolicy::Strict {
        assert_eq!(report.count(Outcome::OrphanedByCascade), 2);
    }
}

#[tokio::test]
async fn test_domain_deleted_by_test_leaves_orphans() {
    let w = common::world().await;
    let mut scope = TestScope::new("domain", CascadePolicy::TolerateNotFound);

    let domain = scope
        .create(&w.client, &CreateDomain::new(names::unique_name("dom")))
        .await
        .unwrap();
    let account = scope
        .create(
            &w.client,
            &CreateAccount::user(names::unique_name("member"), names::random_password())
                .in_domain(&domain.id),
        )
        .await
        .unwrap();
    assert_eq!(account.domain_id, domain.id);

    // The scenario under test removes the whole domain itself.
    let target: ResourceRef = domain.id.to_ref();
    let action = delete_action(target.kind, &target.id);
    w.client.delete(&target, &action).await.unwrap();
    assert!(!w.cloud.exists(account.id.as_str()));

    let report = scope.teardown(&w.client).await.unwrap();
    assert_eq!(report.count(Outcome::OrphanedByCascade), 2);
    assert!(report.is_clean());
}

#[tokio::test]
async fn test_resource_removed_behind_our_back() {
    let w = common::world().await;
    let mut scope = TestScope::new("vanished", CascadePolicy::Strict);
    let account = w.account(&mut scope).await;
    let network = w.network(&mut scope, &account).await;

    assert!(w.cloud.remove_behind_back(network.id.as_str()));

    let err = scope.teardown(&w.client).await.unwrap_err();
    let failed: Vec<_> = err.report.failed().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].reference, network.id.to_ref());
    assert!(failed[0].error.as_deref().unwrap().contains("not found"));
}
