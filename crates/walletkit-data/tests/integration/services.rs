use std::sync::Arc;
use std::time::Duration;

use walletkit_cache::{CacheError, SessionSignals};
use walletkit_data::Config;
use walletkit_data::services::{
    BalanceService, SupportedPairsService, UnspentOutputRepository, WalletServices,
};
use walletkit_test::{self as test, MockWallet};

fn mock() -> Arc<MockWallet> {
    Arc::new(MockWallet::new())
}

#[tokio::test]
async fn test_concurrent_balance_reads_hit_api_once() {
    test::setup();
    let api = mock();
    let signals = SessionSignals::new();
    let service = BalanceService::new(Duration::from_secs(30), api.clone(), api.clone(), &signals);

    let res = futures::join!(service.balance(), service.balance(), service.balance());
    let balance = res.0.unwrap();
    assert_eq!(res.1.unwrap(), balance);
    assert_eq!(res.2.unwrap(), balance);
    assert_eq!(api.balance.calls(), 1);
    assert_eq!(api.xpubs.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_unspent_outputs_refresh_after_interval() {
    test::setup();
    let api = mock();
    let signals = SessionSignals::new();
    let repo =
        UnspentOutputRepository::new(Duration::from_secs(10), api.clone(), api.clone(), &signals);

    let initial = repo.unspent_outputs().await.unwrap();
    assert_eq!(initial.total_value(), 218_000);

    tokio::time::advance(Duration::from_secs(5)).await;
    assert_eq!(repo.unspent_outputs().await.unwrap(), initial);
    assert_eq!(api.unspent.calls(), 1);

    tokio::time::advance(Duration::from_secs(6)).await;
    repo.unspent_outputs().await.unwrap();
    assert_eq!(api.unspent.calls(), 2);
}

#[tokio::test]
async fn test_login_refreshes_balance_eagerly() {
    test::setup();
    let api = mock();
    let signals = SessionSignals::new();
    let service =
        BalanceService::new(Duration::from_secs(3600), api.clone(), api.clone(), &signals);

    service.balance().await.unwrap();
    assert_eq!(api.balance.calls(), 1);

    signals.logged_in();
    test::settle().await;
    assert_eq!(api.balance.calls(), 2);
}

#[tokio::test]
async fn test_logout_flushes_supported_pairs() {
    test::setup();
    let api = mock();
    let signals = SessionSignals::new();
    let service = SupportedPairsService::new(api.clone(), api.clone(), &signals);

    assert!(!service.pairs().await.unwrap().is_empty());
    assert_eq!(api.pairs.calls(), 1);

    // The cached pairs survive ordinary re-reads...
    service.pairs().await.unwrap();
    assert_eq!(api.pairs.calls(), 1);

    // ...but not the end of the session.
    signals.logged_out();
    test::settle().await;
    service.pairs().await.unwrap();
    assert_eq!(api.pairs.calls(), 2);
}

#[tokio::test]
async fn test_failed_refresh_keeps_last_balance() {
    test::setup();
    let api = mock();
    let signals = SessionSignals::new();
    let service =
        BalanceService::new(Duration::from_secs(3600), api.clone(), api.clone(), &signals);

    let balance = service.balance().await.unwrap();

    api.balance
        .set(Err(CacheError::Transport("api is down".into())));
    assert!(service.fetch_balance().await.is_err());

    // The last good balance is still served.
    assert_eq!(service.balance().await.unwrap(), balance);
}

#[tokio::test]
async fn test_observers_replay_last_known_balance() {
    test::setup();
    let api = mock();
    let signals = SessionSignals::new();
    let service =
        BalanceService::new(Duration::from_secs(3600), api.clone(), api.clone(), &signals);

    service.balance().await.unwrap();

    let mut updates = service.observe();
    assert_eq!(updates.next().await, Some(test::sample_balance()));
}

#[tokio::test]
async fn test_wallet_services_wire_from_one_config() {
    test::setup();
    let api = mock();
    let signals = SessionSignals::new();
    let services = WalletServices::new(
        &Config::default(),
        api.clone(),
        api.clone(),
        api.clone(),
        &signals,
    );

    services.balance.balance().await.unwrap();
    services.unspent_outputs.unspent_outputs().await.unwrap();
    let pairs = services.supported_pairs.pairs().await.unwrap();
    assert_eq!(pairs.pairs.len(), 2);
    assert_eq!(api.fiat.calls(), 1);
}
