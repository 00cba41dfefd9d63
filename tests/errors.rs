//! Error propagation: failing inputs and handlers leave the cache alone and
//! reach the caller unmodified.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use memo_flow::{Input, LoadError, LoadResultExt, Loader};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("user {0} not found")]
struct NotFound(u32);

// ============================================================================
// Failing inputs
// ============================================================================

#[tokio::test]
async fn test_failing_input_skips_rest() {
    static LATER_CALLS: AtomicU32 = AtomicU32::new(0);
    static HANDLER_CALLS: AtomicU32 = AtomicU32::new(0);

    let loader = Loader::new(
        (
            Input::try_sync(|id: &u32| -> Result<u32, LoadError> {
                if *id == 0 {
                    return Err(NotFound(*id).into());
                }
                Ok(*id)
            }),
            Input::sync(|_: &u32| {
                LATER_CALLS.fetch_add(1, Ordering::SeqCst);
                "limit"
            }),
        ),
        |id: u32, limit: &'static str| async move {
            HANDLER_CALLS.fetch_add(1, Ordering::SeqCst);
            Ok::<_, LoadError>(format!("{id}/{limit}"))
        },
    );

    let err = loader.load(&0).await.unwrap_err();
    assert!(err.is::<NotFound>());
    assert_eq!(err.to_string(), "user 0 not found");
    // Neither the later input nor the handler ran.
    assert_eq!(LATER_CALLS.load(Ordering::SeqCst), 0);
    assert_eq!(HANDLER_CALLS.load(Ordering::SeqCst), 0);

    // A good id works afterwards.
    let ok = loader.load(&7).await.unwrap();
    assert_eq!(*ok.value, "7/limit");
}

#[tokio::test]
async fn test_error_identity_preserved() {
    let original = LoadError::msg("db down");
    let seed = original.clone();
    let loader = Loader::new(
        (Input::try_sync(move |_: &u32| -> Result<u32, LoadError> {
            Err(seed.clone())
        }),),
        |_n: u32| async move { Ok::<_, LoadError>(0u32) },
    );

    let err = loader.load(&1).await.unwrap_err();
    // The very same error value, not a rewrap.
    assert!(err.ptr_eq(&original));
}

#[tokio::test]
async fn test_nested_error_passes_through_unchanged() {
    let original = LoadError::msg("storage offline");
    let seed = original.clone();
    let child = Arc::new(Loader::new(
        (Input::try_sync(move |_: &u32| -> Result<u32, LoadError> {
            Err(seed.clone())
        }),),
        |n: u32| async move { Ok::<_, LoadError>(n) },
    ));
    let parent = Loader::new(
        (Input::from_async(child.clone()),),
        |n: Arc<u32>| async move { Ok::<_, LoadError>(*n) },
    );

    // Two loader levels, same error allocation at the top.
    let err = parent.load(&1).await.unwrap_err();
    assert!(err.ptr_eq(&original));
    assert!(Arc::ptr_eq(err.as_arc(), original.as_arc()));
}

#[tokio::test]
async fn test_question_mark_conversion() {
    let loader = Loader::new(
        (Input::try_sync(|s: &String| -> Result<u32, LoadError> {
            Ok(s.parse::<u32>()?)
        }),),
        |n: u32| async move { Ok::<_, LoadError>(n + 1) },
    );

    assert_eq!(*loader.load(&"41".to_string()).await.unwrap().value, 42);

    let err = loader.load(&"nope".to_string()).await.unwrap_err();
    assert!(err.is::<std::num::ParseIntError>());
    assert!(err.to_string().contains("invalid digit"));
}

// ============================================================================
// Failing handlers
// ============================================================================

#[tokio::test]
async fn test_handler_error_keeps_previous_result() {
    static FAIL: AtomicBool = AtomicBool::new(false);
    static HANDLER_CALLS: AtomicU32 = AtomicU32::new(0);

    let loader = Loader::new(
        (Input::sync(|n: &u32| *n),),
        |n: u32| async move {
            HANDLER_CALLS.fetch_add(1, Ordering::SeqCst);
            if FAIL.load(Ordering::SeqCst) {
                return Err(LoadError::msg("flaky"));
            }
            Ok(n * 10)
        },
    );

    let first = loader.load(&1).await.unwrap();
    assert_eq!(*first.value, 10);

    // A failing recompute must not clobber the stored pair.
    FAIL.store(true, Ordering::SeqCst);
    let err = loader.load(&2).await.unwrap_err();
    assert_eq!(err.to_string(), "flaky");
    assert_eq!(HANDLER_CALLS.load(Ordering::SeqCst), 2);

    // Back on the old arguments: still a hit on the old result.
    FAIL.store(false, Ordering::SeqCst);
    let again = loader.load(&1).await.unwrap();
    assert!(again.cached);
    assert!(Arc::ptr_eq(&first.value, &again.value));
    assert_eq!(HANDLER_CALLS.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_child_handler_error_reaches_outer_caller() {
    let child = Arc::new(Loader::new(
        (Input::sync(|n: &u32| *n),),
        |n: u32| async move {
            if n == 13 {
                return Err(NotFound(n).into());
            }
            Ok::<_, LoadError>(n)
        },
    ));
    let parent = Loader::new(
        (Input::from_async(child.clone()),),
        |n: Arc<u32>| async move { Ok::<_, LoadError>(*n * 2) },
    );

    assert_eq!(*parent.load(&6).await.unwrap().value, 12);

    let err = parent.load(&13).await.unwrap_err();
    assert!(err.is::<NotFound>());

    // The failed recompute did not poison either slot.
    let recovered = parent.load(&6).await.unwrap();
    assert_eq!(*recovered.value, 12);
    assert!(recovered.cached);
}

// ============================================================================
// Typed downcasting
// ============================================================================

#[tokio::test]
async fn test_downcast_typed_error() {
    let loader = Loader::new(
        (Input::try_sync(|id: &u32| -> Result<u32, LoadError> {
            if *id == 0 {
                return Err(NotFound(*id).into());
            }
            Ok(*id)
        }),),
        |id: u32| async move { Ok::<_, LoadError>(id) },
    );

    let typed = match loader.load(&0).await.downcast_err::<NotFound>() {
        Ok(Err(typed)) => typed,
        other => panic!("Expected NotFound, got {:?}", other.map(|_| ())),
    };
    assert_eq!(typed.0, 0);
    assert_eq!(typed.to_string(), "user 0 not found");

    // Other error types stay in the outer Err.
    let err = loader
        .load(&0)
        .await
        .downcast_err::<std::io::Error>()
        .unwrap_err();
    assert!(err.is::<NotFound>());

    // Successes pass through untouched.
    let ok = loader.load(&1).await.downcast_err::<NotFound>();
    assert!(matches!(ok, Ok(Ok(_))));
}
