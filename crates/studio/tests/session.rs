//! Surface controller behaviour against a mock webhook and in-memory
//! storage.

mod common;

use std::time::Duration;

use assert_matches::assert_matches;
use axum::http::StatusCode;
use common::World;
use seedream_client::{GenerationError, ShareOutcome};
use seedream_core::{ArtifactKind, CoreError, Dimension, GenerationRequest, Quality, Style};
use seedream_studio::{FlowState, GenerationSession, SessionError};

fn request(prompt: &str) -> GenerationRequest {
    GenerationRequest::new(prompt, Style::Anime, Dimension::Portrait16x9, Quality::FourK)
}

/// Wait until `session`'s history holds `images` images.
async fn wait_for_images(session: &GenerationSession, images: usize) {
    let mut rx = session.history().subscribe();
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|s| s.images.len() == images))
        .await
        .expect("history did not sync in time")
        .unwrap();
}

// ---------------------------------------------------------------------------
// Image flow
// ---------------------------------------------------------------------------

#[tokio::test]
async fn successful_generation_completes_flow_and_persists() {
    let world = World::new().await;
    let session = world.mount().await;

    let image = session.generate_image(&request("  a koi pond  ")).await.unwrap();

    assert_eq!(image.prompt, "a koi pond");
    let state = session.state();
    assert_eq!(
        state.image,
        FlowState::Completed {
            artifact_id: image.id.clone()
        }
    );
    assert_eq!(state.error, None);
    assert_eq!(session.snapshot().images, vec![image]);
}

#[tokio::test]
async fn blank_prompt_is_rejected_before_any_request() {
    let world = World::new().await;
    let session = world.mount().await;

    let err = session.generate_image(&request("   ")).await.unwrap_err();

    assert_matches!(err, SessionError::Core(CoreError::Validation(_)));
    assert_eq!(world.mock.image_calls(), 0);
    let state = session.state();
    assert_eq!(state.image, FlowState::Idle);
    assert!(state.error.is_some());
}

#[tokio::test]
async fn failure_sets_banner_and_keeps_history() {
    let world = World::new().await;
    let session = world.mount().await;
    session.generate_image(&request("first")).await.unwrap();

    world.mock.fail_images(StatusCode::BAD_GATEWAY);
    let err = session.generate_image(&request("second")).await.unwrap_err();

    let message = "Webhook request failed: 502 - upstream exploded";
    assert_eq!(err.to_string(), message);
    let state = session.state();
    assert_eq!(
        state.image,
        FlowState::Failed {
            message: message.into()
        }
    );
    assert_eq!(state.error.as_deref(), Some(message));
    assert_eq!(session.snapshot().images.len(), 1);

    session.clear_error();
    assert_eq!(session.state().error, None);
}

#[tokio::test]
async fn next_attempt_clears_previous_error() {
    let world = World::new().await;
    let session = world.mount().await;

    world.mock.fail_images(StatusCode::INTERNAL_SERVER_ERROR);
    session.generate_image(&request("x")).await.unwrap_err();
    assert!(session.state().error.is_some());

    world.mock.recover();
    session.retry_last().await.unwrap();

    assert_eq!(session.state().error, None);
    assert_eq!(world.mock.image_calls(), 2);
}

#[tokio::test]
async fn overlapping_image_request_is_busy() {
    let world = World::new().await;
    let session = world.mount().await;
    let gate = world.mock.hold();

    let slow = request("slow");
    let (first, second) = tokio::join!(session.generate_image(&slow), async {
        let mut rx = session.subscribe_state();
        rx.wait_for(|s| s.image.is_requesting()).await.unwrap();
        let second = session.generate_image(&request("impatient")).await;
        gate.notify_one();
        second
    });

    assert!(first.is_ok());
    assert_matches!(second, Err(SessionError::Busy(ArtifactKind::Image)));
    assert_eq!(world.mock.image_calls(), 1);
    assert_eq!(session.snapshot().images.len(), 1);
}

#[tokio::test]
async fn abandoned_generation_does_not_leave_surface_busy() {
    let world = World::new().await;
    let session = world.mount().await;
    world.mock.hold();

    let abandoned = tokio::time::timeout(
        Duration::from_millis(200),
        session.generate_image(&request("never mind")),
    )
    .await;

    assert!(abandoned.is_err());
    assert_eq!(session.state().image, FlowState::Idle);

    world.mock.release();
    let image = session.generate_image(&request("again")).await.unwrap();
    assert_eq!(
        session.state().image,
        FlowState::Completed {
            artifact_id: image.id.clone()
        }
    );
}

#[tokio::test]
async fn retry_image_reuses_options() {
    let world = World::new().await;
    let session = world.mount().await;
    let original = session.generate_image(&request("tide pools")).await.unwrap();

    let retried = session.retry_image(&original.id).await.unwrap();

    assert_ne!(retried.id, original.id);
    assert_eq!(retried.to_request(), original.to_request());
    let images = session.snapshot().images;
    assert_eq!(images[0].id, retried.id);
    assert_eq!(images[1].id, original.id);
}

#[tokio::test]
async fn retry_last_without_history_is_validation_error() {
    let world = World::new().await;
    let session = world.mount().await;

    assert_matches!(
        session.retry_last().await,
        Err(SessionError::Core(CoreError::Validation(_)))
    );
    assert_eq!(world.mock.image_calls(), 0);
}

// ---------------------------------------------------------------------------
// Video flow
// ---------------------------------------------------------------------------

#[tokio::test]
async fn video_flow_appends_video_for_image() {
    let world = World::new().await;
    let session = world.mount().await;
    let image = session.generate_image(&request("waves")).await.unwrap();

    let video = session.generate_video(&image.id).await.unwrap();

    assert_eq!(video.image_id, image.id);
    assert_eq!(video.image_url, image.url);
    assert_eq!(
        session.state().video,
        FlowState::Completed {
            artifact_id: video.id.clone()
        }
    );
    let snapshot = session.snapshot();
    assert_eq!(snapshot.videos, vec![video.clone()]);
    assert_eq!(snapshot.videos_for_image(&image.id).count(), 1);
}

#[tokio::test]
async fn video_for_unknown_image_is_not_found() {
    let world = World::new().await;
    let session = world.mount().await;

    let err = session.generate_video("img_1_unknown00").await.unwrap_err();

    assert_matches!(
        err,
        SessionError::Generation(GenerationError::NotFound {
            kind: ArtifactKind::Image,
            ..
        })
    );
    assert_eq!(world.mock.video_calls(), 0);
    assert_eq!(session.state().video, FlowState::Idle);
    assert_eq!(session.state().error.as_deref(), Some("Image not found"));
}

// ---------------------------------------------------------------------------
// Cross-surface behaviour
// ---------------------------------------------------------------------------

#[tokio::test]
async fn other_surface_sees_new_image() {
    let world = World::new().await;
    let generator = world.mount().await;
    let gallery = world.mount().await;
    assert_ne!(generator.surface(), gallery.surface());

    let image = generator.generate_image(&request("aurora")).await.unwrap();

    wait_for_images(&gallery, 1).await;
    assert_eq!(gallery.snapshot().images[0].id, image.id);
}

#[tokio::test]
async fn other_surface_can_share_synced_image() {
    let world = World::new().await;
    let generator = world.mount().await;
    let gallery = world.mount().await;

    let image = generator.generate_image(&request("fireflies")).await.unwrap();
    wait_for_images(&gallery, 1).await;

    tokio::time::timeout(Duration::from_secs(5), async {
        while !gallery
            .client()
            .generated_images()
            .await
            .iter()
            .any(|known| known.id == image.id)
        {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("gallery client never learned the image");

    let outcome = gallery.share(&image.id).await.unwrap();

    assert_eq!(outcome, ShareOutcome::CopiedToClipboard);
    assert_eq!(*world.host.clipboard.lock().unwrap(), vec![image.url]);
}

#[tokio::test]
async fn new_surface_can_share_earlier_artifacts() {
    let world = World::new().await;
    let image = {
        let first = world.mount().await;
        first.generate_image(&request("lanterns")).await.unwrap()
    };

    let later = world.mount().await;
    let outcome = later.share(&image.id).await.unwrap();

    assert_eq!(outcome, ShareOutcome::CopiedToClipboard);
    assert_eq!(*world.host.clipboard.lock().unwrap(), vec![image.url]);
}

#[tokio::test]
async fn unknown_id_prefix_is_rejected() {
    let world = World::new().await;
    let session = world.mount().await;

    assert_matches!(
        session.download("doc_1_whatever0").await,
        Err(SessionError::Core(CoreError::Validation(_)))
    );
    assert!(session.state().error.is_some());
}
