//! Concurrent generation and validation against one shared service.

use std::sync::Arc;
use vouch_csrf::{CsrfConfig, CsrfTokenService};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_generate_and_validate() {
    let service = Arc::new(CsrfTokenService::new(CsrfConfig::default()).unwrap());

    let mut handles = Vec::new();
    for task in 0..32 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            let session = format!("session-{}", task % 8);
            let other = format!("session-{}", (task + 1) % 8);
            let mut tokens = Vec::new();
            for _ in 0..25 {
                let token = service.generate_token(&session).unwrap();
                assert!(service.validate_token(&token, &session));
                assert!(!service.validate_token(&token, &other));
                tokens.push(token);
            }
            tokens
        }));
    }

    let mut all = Vec::new();
    for handle in handles {
        all.extend(handle.await.unwrap());
    }

    let stats = service.stats();
    assert_eq!(stats.total_tokens, 32 * 25);
    assert_eq!(stats.valid_tokens, 32 * 25);

    all.sort();
    all.dedup();
    assert_eq!(all.len(), 32 * 25);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_invalidate_succeeds_once() {
    let service = Arc::new(CsrfTokenService::new(CsrfConfig::default()).unwrap());
    let token = service.generate_token("session").unwrap();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let service = Arc::clone(&service);
        let token = token.clone();
        handles.push(tokio::spawn(async move { service.invalidate_token(&token) }));
    }

    let mut removed = 0;
    for handle in handles {
        if handle.await.unwrap() {
            removed += 1;
        }
    }
    assert_eq!(removed, 1);
    assert!(!service.validate_token(&token, "session"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_rotation_during_validation_never_panics() {
    let service = Arc::new(CsrfTokenService::new(CsrfConfig::default()).unwrap());

    let rotator = {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            for _ in 0..50 {
                service.rotate_secret();
                tokio::task::yield_now().await;
            }
        })
    };

    let mut handles = Vec::new();
    for task in 0..8 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            let session = format!("s{task}");
            for _ in 0..50 {
                let token = service.generate_token(&session).unwrap();
                // A rotation may land between the two calls; a wrong session never passes.
                let _ = service.validate_token(&token, &session);
                assert!(!service.validate_token(&token, "intruder"));
                tokio::task::yield_now().await;
            }
        }));
    }

    rotator.await.unwrap();
    for handle in handles {
        handle.await.unwrap();
    }
}
