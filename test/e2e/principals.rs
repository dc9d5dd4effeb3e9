//! Acting as a regular user while the admin scope owns teardown.

mod common;

use rigger_api::commands::{
    CreateAccount, CreateNetwork, CreateSshKeyPair, SshKeyPair, VirtualMachine,
};
use rigger_api::{ListQuery, RemoteResource};
use rigger_lifecycle::CascadePolicy;
use rigger_testing::{names, Suite, TestScope};

#[tokio::test]
async fn test_user_created_resources_are_cleaned_by_admin() {
    let w = common::world().await;
    let mut suite = Suite::for_environment(
        "principals",
        &w.cloud.environment(CascadePolicy::TolerateNotFound),
    )
    .unwrap();

    let account = suite
        .create_shared(&CreateAccount::user(
            names::unique_name("tenant"),
            names::random_password(),
        ))
        .await
        .unwrap();
    let admin = suite.client().clone();
    let principal = admin.principal_for(&account).await.unwrap();
    let user = admin.acting_as(&principal);

    assert_eq!(admin.principal().api_key(), w.cloud.admin().api_key());
    assert_ne!(user.principal().api_key(), admin.principal().api_key());

    let mut case = suite.begin_test("test_user_keys");
    let key_pair: SshKeyPair = case
        .create(&user, &CreateSshKeyPair::new(names::unique_name("kp")))
        .await
        .unwrap();
    let network = case
        .create(
            &user,
            &CreateNetwork::new(
                "user-net",
                &w.fixtures.network_offering_id,
                &w.fixtures.zone_id,
            ),
        )
        .await
        .unwrap();

    assert_eq!(key_pair.account.as_deref(), Some(account.name.as_str()));
    assert_eq!(network.account.as_deref(), Some(account.name.as_str()));
    assert!(key_pair.private_key.is_some());

    // Requests carried the user's key, not the admin's.
    let create_calls: Vec<_> = w
        .cloud
        .calls()
        .into_iter()
        .filter(|c| c.command == "createSSHKeyPair" || c.command == "createNetwork")
        .collect();
    assert_eq!(create_calls.len(), 2);
    assert!(create_calls
        .iter()
        .all(|c| c.api_key == user.principal().api_key()));

    let cleanup = suite.finish_test(case).await;
    assert!(cleanup.is_clean());
    assert!(!w.cloud.exists(key_pair.remote_id().unwrap().as_str()));
    assert!(!w.cloud.exists(network.id.as_str()));

    let summary = suite.finish().await;
    assert!(summary.is_clean());
    assert!(!w.cloud.exists(account.id.as_str()));
}

#[tokio::test]
async fn test_user_sees_only_own_resources() {
    let w = common::world().await;
    let mut scope = TestScope::new("visibility", CascadePolicy::default());

    let alice = w.account(&mut scope).await;
    let bob = w.account(&mut scope).await;
    let alice_net = w.network(&mut scope, &alice).await;
    let bob_net = w.network(&mut scope, &bob).await;
    w.vm(&mut scope, &alice, &alice_net).await;
    w.vm(&mut scope, &bob, &bob_net).await;

    let as_alice = w
        .client
        .acting_as(&w.client.principal_for(&alice).await.unwrap());
    let visible: Vec<VirtualMachine> = as_alice.list(&ListQuery::new()).await.unwrap();

    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].account.as_deref(), Some(alice.name.as_str()));

    let all: Vec<VirtualMachine> = w.client.list(&ListQuery::new().list_all()).await.unwrap();
    assert_eq!(all.len(), 2);

    scope.teardown(&w.client).await.unwrap();
}

#[tokio::test]
async fn test_disabled_account_can_be_enabled_again() {
    let w = common::world().await;
    let mut scope = TestScope::new("disable", CascadePolicy::default());
    let account = w.account(&mut scope).await;

    let locked = w.client.disable_account(&account.id, true).await.unwrap();
    assert_eq!(locked.state.as_deref(), Some("locked"));

    let enabled = w.client.enable_account(&account.id).await.unwrap();
    assert_eq!(enabled.state.as_deref(), Some("enabled"));

    scope.teardown(&w.client).await.unwrap();
}
