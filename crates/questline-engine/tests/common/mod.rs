// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Engine test harness wired to in-process mock adapters.

#![allow(dead_code)]

use std::sync::Arc;

use questline_bus::{EngineEvent, EventBus};
use questline_config::model::QuestlineConfig;
use questline_core::types::MICRO_PER_TOKEN;
use questline_core::{AppIdentity, ClarityValue, RewardProfile, WalletAddress};
use questline_engine::{ContractRegistry, EngineAdapters, RewardsEngine, Session};
use questline_test_utils::{FixedClock, MemoryProfileStore, MockChain, MockWallet, TEST_ADDRESS};
use tokio::sync::broadcast;

pub const NOW: &str = "2024-01-02T00:00:01Z";

pub struct Harness {
    pub engine: RewardsEngine,
    pub wallet: Arc<MockWallet>,
    pub chain: Arc<MockChain>,
    pub store: Arc<MemoryProfileStore>,
    pub clock: Arc<FixedClock>,
    pub registry: ContractRegistry,
    pub address: WalletAddress,
}

pub struct HarnessBuilder {
    config: QuestlineConfig,
    signed_in: bool,
    profile: Option<RewardProfile>,
    now: &'static str,
}

impl Harness {
    pub fn builder() -> HarnessBuilder {
        HarnessBuilder {
            config: QuestlineConfig::default(),
            signed_in: true,
            profile: None,
            now: NOW,
        }
    }

    pub async fn new() -> Self {
        Self::builder().build().await
    }

    fn principal(&self) -> ClarityValue {
        ClarityValue::principal(&self.address.0).unwrap()
    }

    /// Sets the on-chain completion flag of a mission.
    pub async fn chain_mission(&self, id: u32, done: bool) {
        let key = ClarityValue::tuple([
            ("user", self.principal()),
            ("mission-id", ClarityValue::UInt(u128::from(id))),
        ]);
        let value = if done {
            ClarityValue::OptionalSome(Box::new(ClarityValue::Bool(true)))
        } else {
            ClarityValue::OptionalNone
        };
        self.chain
            .set_map_entry(&self.registry.rewards, "user-missions", &key, value)
            .await;
    }

    /// Sets the on-chain ownership flag of a badge.
    pub async fn chain_badge(&self, name: &str, owned: bool) {
        self.chain
            .set_read_only(
                &self.registry.badges,
                "has-badge",
                &[self.principal(), ClarityValue::StringAscii(name.into())],
                ClarityValue::ResponseOk(Box::new(ClarityValue::Bool(owned))),
            )
            .await;
    }

    /// Sets the on-chain POIN balance in whole tokens.
    pub async fn chain_poin(&self, tokens: u128) {
        self.chain
            .set_read_only(
                &self.registry.token_poin,
                "get-balance",
                &[self.principal()],
                ClarityValue::ResponseOk(Box::new(ClarityValue::UInt(tokens * MICRO_PER_TOKEN))),
            )
            .await;
    }
}

impl HarnessBuilder {
    pub fn configure(mut self, edit: impl FnOnce(&mut QuestlineConfig)) -> Self {
        edit(&mut self.config);
        self
    }

    pub fn signed_out(mut self) -> Self {
        self.signed_in = false;
        self
    }

    /// Seeds the stored profile loaded at start.
    pub fn with_profile(mut self, edit: impl FnOnce(&mut RewardProfile)) -> Self {
        let mut profile = RewardProfile::new(WalletAddress(TEST_ADDRESS.into()));
        edit(&mut profile);
        self.profile = Some(profile);
        self
    }

    pub fn at(mut self, now: &'static str) -> Self {
        self.now = now;
        self
    }

    pub async fn build(self) -> Harness {
        let wallet = Arc::new(if self.signed_in {
            MockWallet::signed_in(TEST_ADDRESS)
        } else {
            MockWallet::new()
        });
        let chain = Arc::new(MockChain::new());
        let store = Arc::new(MemoryProfileStore::new());
        if let Some(profile) = self.profile {
            store.insert(profile).await;
        }
        let clock = Arc::new(FixedClock::at(self.now));

        let app = AppIdentity {
            name: self.config.app.name.clone(),
            icon_url: self.config.app.icon_url.clone(),
        };
        let session = Session::init(app, wallet.clone()).await.unwrap();
        let engine = RewardsEngine::new(
            &self.config,
            session,
            EngineAdapters {
                tx_status: chain.clone(),
                chain: chain.clone(),
                store: store.clone(),
                clock: clock.clone(),
            },
            EventBus::default(),
        );
        engine.start().await.unwrap();

        Harness {
            engine,
            wallet,
            chain,
            store,
            clock,
            registry: ContractRegistry::new(&self.config.contracts),
            address: WalletAddress(TEST_ADDRESS.into()),
        }
    }
}

/// Every event currently buffered in `rx`.
pub fn drain(rx: &mut broadcast::Receiver<questline_bus::BusEvent>) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event.event);
    }
    events
}
