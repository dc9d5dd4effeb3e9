//! Public IPs, NAT and rules layered on an account network.

mod common;

use rigger_api::commands::{
    AssociateIpAddress, CreateFirewallRule, CreatePortForwardingRule, CreateSecurityGroup,
    IngressRule, PublicIpAddress,
};
use rigger_lifecycle::{CascadePolicy, Outcome};
use rigger_testing::{names, TestScope};

#[tokio::test]
async fn test_static_nat_while_vm_starts() {
    let w = common::world().await;
    let mut scope = TestScope::new("static-nat", CascadePolicy::Strict);

    let account = w.account(&mut scope).await;
    let network = w.network(&mut scope, &account).await;
    let vm = scope
        .create(&w.client, &w.vm_spec(&account, &network).stopped())
        .await
        .unwrap();
    assert_eq!(vm.state, "Stopped");
    let ip = scope
        .create(&w.client, &AssociateIpAddress::for_network(&network.id))
        .await
        .unwrap();
    assert!(!ip.is_static_nat);

    let starting = {
        let client = w.client.clone();
        let vm = vm.id.clone();
        tokio::spawn(async move { client.start_vm(&vm).await })
    };
    w.client.enable_static_nat(&ip.id, &vm.id, None).await.unwrap();
    let started = starting.await.unwrap().unwrap();
    assert_eq!(started.state, "Running");

    let current: PublicIpAddress = w.client.find(ip.id.as_str()).await.unwrap().unwrap();
    assert!(current.is_static_nat);
    assert_eq!(current.virtual_machine_id.as_ref(), Some(&vm.id));

    let again = w.client.enable_static_nat(&ip.id, &vm.id, None).await.unwrap_err();
    assert!(again.to_string().contains("already assigned"));

    w.client.disable_static_nat(&ip.id).await.unwrap();

    let report = scope.teardown(&w.client).await.unwrap();
    assert_eq!(report.count(Outcome::Deleted), 4);
    assert_eq!(w.cloud.delete_calls()[0], ip.id.as_str());
}

#[tokio::test]
async fn test_rules_are_removed_before_their_address() {
    let w = common::world().await;
    let mut scope = TestScope::new("rules", CascadePolicy::default());

    let account = w.account(&mut scope).await;
    let network = w.network(&mut scope, &account).await;
    let vm = w.vm(&mut scope, &account, &network).await;
    let ip = scope
        .create(&w.client, &AssociateIpAddress::for_network(&network.id))
        .await
        .unwrap();
    let firewall = scope
        .create(&w.client, &CreateFirewallRule::tcp(&ip.id, 22))
        .await
        .unwrap();
    let forward = scope
        .create(&w.client, &CreatePortForwardingRule::tcp(&ip.id, &vm.id, 2222, 22))
        .await
        .unwrap();

    assert_eq!(firewall.start_port, Some(22));
    assert_eq!(firewall.cidr_list.as_deref(), Some("0.0.0.0/0"));
    assert_eq!(forward.public_port, Some(2222));

    scope.teardown(&w.client).await.unwrap();

    let deletes = w.cloud.delete_calls();
    assert_eq!(
        &deletes[..3],
        &[
            forward.id.as_str().to_string(),
            firewall.id.as_str().to_string(),
            ip.id.as_str().to_string(),
        ]
    );
}

#[tokio::test]
async fn test_security_group_ingress() {
    let w = common::world().await;
    let mut scope = TestScope::new("security-group", CascadePolicy::default());
    let account = w.account(&mut scope).await;

    let group = scope
        .create(
            &w.client,
            &CreateSecurityGroup::new(names::unique_name("sg")).owned_by(&account),
        )
        .await
        .unwrap();
    assert!(group.ingress_rules.is_empty());

    let group = w
        .client
        .authorize_ingress(&group.id, &IngressRule::tcp(22, "10.0.0.0/8"))
        .await
        .unwrap();
    assert_eq!(group.ingress_rules.len(), 1);
    assert_eq!(group.ingress_rules[0].start_port, Some(22));
    assert_eq!(group.ingress_rules[0].cidr.as_deref(), Some("10.0.0.0/8"));

    scope.teardown(&w.client).await.unwrap();
    assert!(!w.cloud.exists(group.id.as_str()));
}
