//! Shared setup for scenario tests.

#![allow(dead_code)]

use rigger_api::commands::{
    Account, CreateAccount, CreateNetwork, DeployVirtualMachine, Network, VirtualMachine,
};
use rigger_api::Client;
use rigger_testing::fake::{FakeCloud, Fixtures};
use rigger_testing::{init_tracing, names, TestScope};

pub struct World {
    pub cloud: FakeCloud,
    pub client: Client,
    pub fixtures: Fixtures,
}

pub async fn world() -> World {
    init_tracing();
    let cloud = FakeCloud::start().await.expect("fake cloud starts");
    let client = cloud.client().expect("client builds");
    let fixtures = cloud.fixtures().clone();
    World {
        cloud,
        client,
        fixtures,
    }
}

impl World {
    pub async fn account(&self, scope: &mut TestScope) -> Account {
        scope
            .create(
                &self.client,
                &CreateAccount::user(names::unique_name("user"), names::random_password()),
            )
            .await
            .expect("account created")
    }

    pub async fn network(&self, scope: &mut TestScope, owner: &Account) -> Network {
        let f = &self.fixtures;
        scope
            .create(
                &self.client,
                &CreateNetwork::new(names::unique_name("net"), &f.network_offering_id, &f.zone_id)
                    .owned_by(owner),
            )
            .await
            .expect("network created")
    }

    pub fn vm_spec(&self, owner: &Account, network: &Network) -> DeployVirtualMachine {
        let f = &self.fixtures;
        DeployVirtualMachine::new(&f.service_offering_id, &f.template_id, &f.zone_id)
            .owned_by(owner)
            .network(&network.id)
            .display_name(names::unique_name("vm"))
    }

    pub async fn vm(
        &self,
        scope: &mut TestScope,
        owner: &Account,
        network: &Network,
    ) -> VirtualMachine {
        scope
            .create(&self.client, &self.vm_spec(owner, network))
            .await
            .expect("vm deployed")
    }
}
