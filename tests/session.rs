//! Play-session state machine scenarios driven through test doubles.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{FakePlayer, RecordingSpeaker, ScriptedResolver};
use voxpi::hw::{CancelSwitch, HwInterface, SoftInput};
use voxpi::player::PlayerEvent;
use voxpi::session::{Outcome, PlaySessionCoordinator};

const BUTTON: u8 = 23;

struct Rig {
    resolver: Arc<ScriptedResolver>,
    player: Arc<FakePlayer>,
    speaker: Arc<RecordingSpeaker>,
    button: Arc<SoftInput>,
    coordinator: Arc<PlaySessionCoordinator>,
}

fn rig(resolver: Arc<ScriptedResolver>) -> Rig {
    let player = FakePlayer::new();
    let speaker = RecordingSpeaker::new();
    let button = Arc::new(SoftInput::new());
    let hw = Arc::new(HwInterface::new(button.clone()));
    let cancel = CancelSwitch::new(hw, BUTTON);
    let coordinator = PlaySessionCoordinator::new(
        resolver.clone(),
        player.clone(),
        speaker.clone(),
        Some(&cancel),
    );
    Rig {
        resolver,
        player,
        speaker,
        button,
        coordinator,
    }
}

#[tokio::test]
async fn empty_query_fails_without_any_network_or_player_call() {
    let rig = rig(ScriptedResolver::hit("Anything", "http://x"));

    for query in ["", "   ", "\t"] {
        assert_eq!(rig.coordinator.run(query).await, Outcome::Failed);
    }

    assert_eq!(rig.resolver.search_count(), 0);
    assert_eq!(rig.player.start_count(), 0);
    assert_eq!(
        rig.speaker.lines(),
        vec!["Please specify a song"; 3],
        "one prompt per rejected query"
    );
}

#[tokio::test]
async fn zero_candidates_report_failed_to_find_with_the_query() {
    let rig = rig(ScriptedResolver::empty());

    assert_eq!(rig.coordinator.run("daylight").await, Outcome::Failed);
    assert_eq!(rig.speaker.lines(), vec!["Failed to find daylight"]);
    assert_eq!(rig.player.start_count(), 0);
}

#[tokio::test]
async fn resolver_failure_report_is_spoken_verbatim() {
    let rig = rig(ScriptedResolver::failing("Didn't find any stations"));

    assert_eq!(rig.coordinator.run("jazz").await, Outcome::Failed);
    assert_eq!(rig.speaker.lines(), vec!["Didn't find any stations"]);
    assert_eq!(rig.player.start_count(), 0);
}

#[tokio::test]
async fn completed_session_speaks_now_playing_and_nothing_else() {
    let rig = rig(ScriptedResolver::hit(
        "Daylight_Official_Video",
        "http://example.test/audio",
    ));

    let coordinator = rig.coordinator.clone();
    let session = tokio::spawn(async move { coordinator.run("daylight").await });

    rig.player.wait_until_started().await;
    rig.player.fire(PlayerEvent::EndReached);

    assert_eq!(session.await.unwrap(), Outcome::Completed);
    assert_eq!(rig.speaker.lines(), vec!["Now playing Daylight Official Video"]);
    assert_eq!(rig.player.stop_count(), 0);
}

#[tokio::test]
async fn player_fault_is_reported_as_cant_play() {
    let rig = rig(ScriptedResolver::hit("Some_Song", "http://example.test/audio"));

    let coordinator = rig.coordinator.clone();
    let session = tokio::spawn(async move { coordinator.run("some song").await });

    rig.player.wait_until_started().await;
    rig.player.fire(PlayerEvent::PlaybackError);

    assert_eq!(session.await.unwrap(), Outcome::Failed);
    assert_eq!(
        rig.speaker.lines(),
        vec!["Now playing Some Song", "Can't play Some Song"]
    );
}

#[tokio::test]
async fn button_press_cancels_and_stops_the_player() {
    let rig = rig(ScriptedResolver::hit("Some_Song", "http://example.test/audio"));

    let coordinator = rig.coordinator.clone();
    let session = tokio::spawn(async move { coordinator.run("some song").await });

    rig.player.wait_until_started().await;
    rig.button.pulse(BUTTON);

    assert_eq!(session.await.unwrap(), Outcome::Cancelled);
    assert!(rig.player.stop_count() >= 1, "stop() must be invoked on cancel");
    // No completion or failure speech after the cancel
    assert_eq!(rig.speaker.lines(), vec!["Now playing Some Song"]);
}

#[tokio::test]
async fn racing_end_and_cancel_settle_exactly_one_outcome() {
    for _ in 0..25 {
        let rig = rig(ScriptedResolver::hit("Some_Song", "http://example.test/audio"));

        let coordinator = rig.coordinator.clone();
        let session = tokio::spawn(async move { coordinator.run("some song").await });

        rig.player.wait_until_started().await;

        let button = rig.button.clone();
        let racer = std::thread::spawn(move || button.pulse(BUTTON));
        rig.player.fire(PlayerEvent::EndReached);
        racer.join().unwrap();

        let outcome = session.await.unwrap();
        assert!(
            matches!(outcome, Outcome::Completed | Outcome::Cancelled),
            "loser callback must not turn the session into a failure"
        );
        // Playing is never re-entered and no failure sentence is spoken
        assert_eq!(rig.player.start_count(), 1);
        assert_eq!(rig.speaker.lines(), vec!["Now playing Some Song"]);
    }
}

#[tokio::test]
async fn second_command_during_playback_is_rejected() {
    let rig = rig(ScriptedResolver::hit("Some_Song", "http://example.test/audio"));

    let coordinator = rig.coordinator.clone();
    let session = tokio::spawn(async move { coordinator.run("some song").await });
    rig.player.wait_until_started().await;

    // Session is live: a second run must fail fast without searching again
    assert_eq!(rig.coordinator.run("another song").await, Outcome::Failed);
    assert_eq!(rig.resolver.search_count(), 1);
    assert_eq!(rig.player.start_count(), 1);

    rig.player.fire(PlayerEvent::EndReached);
    assert_eq!(session.await.unwrap(), Outcome::Completed);

    // The guard is released: a fresh session can start afterwards
    let coordinator = rig.coordinator.clone();
    let session = tokio::spawn(async move { coordinator.run("some song").await });
    tokio::time::timeout(Duration::from_secs(2), async {
        while rig.player.start_count() < 2 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("second session never started");
    rig.player.fire(PlayerEvent::EndReached);
    assert_eq!(session.await.unwrap(), Outcome::Completed);
}

#[tokio::test]
async fn press_with_no_live_session_is_ignored() {
    let rig = rig(ScriptedResolver::hit("Some_Song", "http://example.test/audio"));

    rig.button.pulse(BUTTON);

    // A later session is unaffected by the stray press
    let coordinator = rig.coordinator.clone();
    let session = tokio::spawn(async move { coordinator.run("some song").await });
    rig.player.wait_until_started().await;
    rig.player.fire(PlayerEvent::EndReached);
    assert_eq!(session.await.unwrap(), Outcome::Completed);
}
