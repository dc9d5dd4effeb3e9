//! Account, network and VM lifecycles torn down through a scope.
//!
//! ## Running
//!
//! ```bash
//! cargo test -p rigger-e2e --test lifecycle
//! ```

mod common;

use std::time::Duration;

use rigger_api::{Created, ListQuery};
use rigger_api::commands::VirtualMachine;
use rigger_id::ResourceKind;
use rigger_lifecycle::{CascadePolicy, Outcome, RegistryError, WaitConfig};
use rigger_testing::TestScope;

#[tokio::test]
async fn test_account_network_vm_torn_down_newest_first() {
    let w = common::world().await;
    let mut scope = TestScope::new("lifecycle", CascadePolicy::Strict);

    let account = w.account(&mut scope).await;
    let network = w.network(&mut scope, &account).await;
    let vm = w.vm(&mut scope, &account, &network).await;
    assert!(vm.is_running());
    assert_eq!(vm.nics[0].network_id, network.id);

    let stopped = w.client.stop_vm(&vm.id, false).await.unwrap();
    assert_eq!(stopped.state, "Stopped");
    let running = w.client.start_vm(&vm.id).await.unwrap();
    assert!(running.is_running());

    let report = scope.teardown(&w.client).await.unwrap();

    assert_eq!(report.count(Outcome::Deleted), 3);
    assert_eq!(
        w.cloud.delete_calls(),
        vec![
            vm.id.as_str().to_string(),
            network.id.as_str().to_string(),
            account.id.as_str().to_string(),
        ]
    );
    assert_eq!(w.cloud.count(ResourceKind::VirtualMachine), 0);
    assert_eq!(w.cloud.count(ResourceKind::Network), 0);
}

#[tokio::test]
async fn test_every_handle_is_attempted_when_some_fail() {
    let w = common::world().await;
    let mut scope = TestScope::new("partial", CascadePolicy::TolerateNotFound);

    let account = w.account(&mut scope).await;
    let network = w.network(&mut scope, &account).await;
    let vm = w.vm(&mut scope, &account, &network).await;
    w.cloud.fail_delete(vm.id.as_str(), "hypervisor unreachable");

    let err = scope.teardown(&w.client).await.unwrap_err();
    let report = &err.report;

    assert_eq!(report.len(), 3);
    assert_eq!(report.failed_count(), 2);
    let failed: Vec<String> = err.failed_ids().iter().map(|id| id.to_string()).collect();
    assert_eq!(
        failed,
        vec![vm.id.as_str().to_string(), network.id.as_str().to_string()]
    );
    assert_eq!(report.entries[2].outcome, Outcome::Deleted);

    let summary = report.failure_summary();
    assert!(summary.starts_with("Warning: Exception during cleanup of 'partial'"));
    assert!(summary.contains("2 of 3 resources failed to delete"));
    assert!(summary.contains("hypervisor unreachable"));
    assert!(summary.contains("active virtual machines"));

    assert!(scope.is_empty());
    assert!(!w.cloud.exists(account.id.as_str()));
}

#[tokio::test]
async fn test_second_teardown_is_a_no_op() {
    let w = common::world().await;
    let mut scope = TestScope::new("twice", CascadePolicy::default());
    w.account(&mut scope).await;

    scope.teardown(&w.client).await.unwrap();
    let calls = w.cloud.calls().len();

    let report = scope.teardown(&w.client).await.unwrap();
    assert!(report.is_empty());
    assert_eq!(w.cloud.calls().len(), calls);
}

#[tokio::test]
async fn test_duplicate_registration_is_rejected() {
    let w = common::world().await;
    let mut scope = TestScope::new("dupes", CascadePolicy::default());
    let account = w.account(&mut scope).await;

    let again = Created::new(account.clone(), serde_json::to_value(&account).unwrap()).unwrap();
    let err = scope.track(again.handle).unwrap_err();

    assert!(matches!(err, RegistryError::Duplicate { .. }));
    assert_eq!(scope.len(), 1);

    let report = scope.teardown(&w.client).await.unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(w.cloud.delete_calls().len(), 1);
}

#[tokio::test]
async fn test_slow_jobs_are_followed_to_completion() {
    let w = common::world().await;
    w.cloud.set_job_polls(3);
    let mut scope = TestScope::new("slow-jobs", CascadePolicy::default());

    let account = w.account(&mut scope).await;
    let network = w.network(&mut scope, &account).await;
    let vm = w.vm(&mut scope, &account, &network).await;

    let polls = w
        .cloud
        .calls()
        .iter()
        .filter(|c| c.command == "queryAsyncJobResult")
        .count();
    assert_eq!(polls, 4);
    assert!(w.cloud.exists(vm.id.as_str()));

    scope.teardown(&w.client).await.unwrap();
    assert!(!w.cloud.exists(account.id.as_str()));
}

#[tokio::test]
async fn test_wait_for_state_times_out() {
    let w = common::world().await;
    let mut scope = TestScope::new("wait", CascadePolicy::default());
    let account = w.account(&mut scope).await;
    let network = w.network(&mut scope, &account).await;

    let vm: VirtualMachine = scope
        .create(&w.client, &w.vm_spec(&account, &network).stopped())
        .await
        .unwrap();
    assert_eq!(vm.state, "Stopped");

    let quick = WaitConfig::fixed(Duration::from_millis(5), Duration::from_millis(50));
    let err = w
        .client
        .wait_for_vm_state(&vm.id, "Running", &quick)
        .await
        .unwrap_err();
    assert!(err.is_timeout());

    let listed: Vec<VirtualMachine> = w
        .client
        .list(&ListQuery::new().account(&account.name, account.domain_id.as_str()))
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);

    scope.teardown(&w.client).await.unwrap();
}
