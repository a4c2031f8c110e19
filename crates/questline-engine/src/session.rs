// SPDX-FileCopyrightText: 2026 Questline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wallet session handle.
//!
//! The session is built once with [`Session::init`] and injected into the
//! engine. It mirrors the wallet's sign-in state into a `watch` channel so
//! the presentation layer can render it without touching the wallet.
//!
//! A [`QuestlineError::SessionCorrupted`] from the wallet means the stored
//! session cannot be trusted: the session signs out and reports the error so
//! callers can wipe whatever they derived from it.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use questline_core::{
    AppIdentity, QuestlineError, SignInOutcome, SignInStatus, WalletAdapter, WalletAddress,
};

/// Projection of the wallet's sign-in state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub status: SignInStatus,
    pub address: Option<WalletAddress>,
}

impl SessionState {
    fn signed_out() -> Self {
        Self {
            status: SignInStatus::SignedOut,
            address: None,
        }
    }

    fn from_address(address: Option<WalletAddress>) -> Self {
        match address {
            Some(address) => Self {
                status: SignInStatus::SignedIn,
                address: Some(address),
            },
            None => Self::signed_out(),
        }
    }
}

pub struct Session {
    app: AppIdentity,
    wallet: Arc<dyn WalletAdapter>,
    state: watch::Sender<SessionState>,
}

impl Session {
    /// Creates the session and restores whatever the wallet already holds.
    /// A corrupted stored session is wiped and the handle starts signed out.
    pub async fn init(
        app: AppIdentity,
        wallet: Arc<dyn WalletAdapter>,
    ) -> Result<Self, QuestlineError> {
        let (state, _rx) = watch::channel(SessionState::signed_out());
        let session = Self { app, wallet, state };
        match session.refresh().await {
            Ok(address) => {
                debug!(signed_in = address.is_some(), "session restored");
            }
            Err(QuestlineError::SessionCorrupted(reason)) => {
                warn!(%reason, "discarded corrupted wallet session");
            }
            Err(e) => return Err(e),
        }
        Ok(session)
    }

    /// Prompts the wallet for sign-in. A dismissed prompt leaves the session
    /// signed out and is not an error.
    pub async fn connect(&self) -> Result<SignInOutcome, QuestlineError> {
        self.state.send_replace(SessionState {
            status: SignInStatus::Pending,
            address: None,
        });
        match self.wallet.sign_in(&self.app).await {
            Ok(SignInOutcome::SignedIn(address)) => {
                info!(address = %address, "wallet connected");
                self.state
                    .send_replace(SessionState::from_address(Some(address.clone())));
                Ok(SignInOutcome::SignedIn(address))
            }
            Ok(SignInOutcome::Cancelled) => {
                debug!("sign-in prompt dismissed");
                self.state.send_replace(SessionState::signed_out());
                Ok(SignInOutcome::Cancelled)
            }
            Err(QuestlineError::SessionCorrupted(reason)) => {
                Err(self.wipe(reason).await)
            }
            Err(e) => {
                self.state.send_replace(SessionState::signed_out());
                Err(e)
            }
        }
    }

    /// Re-reads the wallet session and updates the projection.
    pub async fn refresh(&self) -> Result<Option<WalletAddress>, QuestlineError> {
        match self.wallet.address().await {
            Ok(address) => {
                self.state
                    .send_replace(SessionState::from_address(address.clone()));
                Ok(address)
            }
            Err(QuestlineError::SessionCorrupted(reason)) => Err(self.wipe(reason).await),
            Err(e) => Err(e),
        }
    }

    /// Signs out of the wallet and clears the projection.
    pub async fn teardown(&self) -> Result<(), QuestlineError> {
        self.state.send_replace(SessionState::signed_out());
        self.wallet.sign_out().await?;
        info!("wallet session closed");
        Ok(())
    }

    /// Clears a corrupted session and returns the error to surface.
    pub(crate) async fn wipe(&self, reason: String) -> QuestlineError {
        warn!(%reason, "wallet session corrupted, signing out");
        self.state.send_replace(SessionState::signed_out());
        if let Err(e) = self.wallet.sign_out().await {
            warn!(error = %e, "sign-out after session corruption failed");
        }
        QuestlineError::SessionCorrupted(reason)
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn address(&self) -> Option<WalletAddress> {
        self.state.borrow().address.clone()
    }

    pub fn require_address(&self) -> Result<WalletAddress, QuestlineError> {
        self.address().ok_or(QuestlineError::NotAuthenticated)
    }

    pub fn app(&self) -> &AppIdentity {
        &self.app
    }

    pub fn wallet(&self) -> &Arc<dyn WalletAdapter> {
        &self.wallet
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use questline_test_utils::{MockWallet, TEST_ADDRESS};

    fn app() -> AppIdentity {
        AppIdentity {
            name: "Questline".into(),
            icon_url: None,
        }
    }

    #[tokio::test]
    async fn init_restores_existing_session() {
        let wallet = Arc::new(MockWallet::signed_in(TEST_ADDRESS));
        let session = Session::init(app(), wallet).await.unwrap();
        assert_eq!(session.state().status, SignInStatus::SignedIn);
        assert_eq!(session.require_address().unwrap().0, TEST_ADDRESS);
    }

    #[tokio::test]
    async fn init_wipes_corrupted_session() {
        let wallet = Arc::new(MockWallet::signed_in(TEST_ADDRESS));
        wallet.corrupt_session();
        let session = Session::init(app(), wallet.clone()).await.unwrap();
        assert_eq!(session.state().status, SignInStatus::SignedOut);
        assert_eq!(wallet.address().await.unwrap(), None, "provider state cleared");
    }

    #[tokio::test]
    async fn cancelled_sign_in_stays_signed_out() {
        let wallet = Arc::new(MockWallet::new());
        wallet.push_sign_in(SignInOutcome::Cancelled).await;
        let session = Session::init(app(), wallet).await.unwrap();
        assert_eq!(session.connect().await.unwrap(), SignInOutcome::Cancelled);
        assert!(matches!(
            session.require_address(),
            Err(QuestlineError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn connect_then_teardown() {
        let wallet = Arc::new(MockWallet::new());
        wallet
            .push_sign_in(SignInOutcome::SignedIn(WalletAddress(TEST_ADDRESS.into())))
            .await;
        let session = Session::init(app(), wallet.clone()).await.unwrap();
        let mut rx = session.subscribe();

        session.connect().await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().status, SignInStatus::SignedIn);

        session.teardown().await.unwrap();
        assert_eq!(session.address(), None);
        assert!(!wallet.is_signed_in().await.unwrap());
    }
}
