//! Event source behavior over an in-memory pipe.
//!
//! Covers chunked escape sequences, bracketed paste, resize priority and
//! timed waits that must not lose input.
//!
//! Run with: cargo test --test event_source

use std::time::Duration;

use spark_tui_input::input::keymap::map_ctrl_letter_key;
use spark_tui_input::io::{PipeFeed, pipe};
use spark_tui_input::{
    Event, EventSource, InputConfig, InputError, InputReader, KeyCode, KeyEvent, Modifier, runtime,
};

// =============================================================================
// HELPERS
// =============================================================================

fn config() -> InputConfig {
    InputConfig::new()
        .with_poll_interval(Duration::from_millis(1))
        .with_read_timeout(Duration::from_millis(50))
        .with_escape_timeout(Duration::from_millis(200))
}

fn setup() -> (PipeFeed, EventSource) {
    let (feed, source) = pipe();
    let config = config();
    let reader = InputReader::with_options(source, config.read_chunk, config.poll_interval);
    (feed, EventSource::from_reader(reader).with_config(config))
}

fn key(code: KeyCode) -> Event {
    Event::Key(KeyEvent::bare(code))
}

// =============================================================================
// DECODING THROUGH THE SOURCE
// =============================================================================

#[test]
fn arrow_split_across_two_chunks_is_one_event() {
    let (feed, mut source) = setup();
    runtime::block_on(async {
        feed.write(b"\x1b[");
        assert_eq!(source.poll_key_async().await.unwrap(), None);

        feed.write(b"A");
        assert_eq!(source.wait_for_key_async().await.unwrap(), key(KeyCode::ArrowUp));
        assert_eq!(source.poll_key_async().await.unwrap(), None);
    })
    .unwrap();
}

#[test]
fn bracketed_paste_is_one_event() {
    let (feed, mut source) = setup();
    runtime::block_on(async {
        feed.write(b"\x1b[200~Hello\nWorld\x1b[201~");
        assert_eq!(
            source.wait_for_key_async().await.unwrap(),
            Event::Paste("Hello\nWorld".to_string())
        );
        assert_eq!(source.poll_key_async().await.unwrap(), None);
    })
    .unwrap();
}

#[test]
fn paste_split_byte_by_byte() {
    let (feed, mut source) = setup();
    runtime::block_on(async {
        for byte in b"\x1b[200~a\x1b[Bb\x1b[201~" {
            feed.write([*byte]);
            if let Some(event) = source.poll_key_async().await.unwrap() {
                assert_eq!(event, Event::Paste("a\x1b[Bb".to_string()));
                return;
            }
        }
        panic!("paste never completed");
    })
    .unwrap();
}

#[test]
fn ctrl_c_is_quit_and_ctrl_a_is_a_key() {
    assert_eq!(map_ctrl_letter_key(0x03), None);
    assert_eq!(
        map_ctrl_letter_key(0x01),
        Some(KeyEvent::char('a').with_modifiers(Modifier::CTRL))
    );

    let (feed, mut source) = setup();
    runtime::block_on(async {
        feed.write([0x01, 0x03]);
        assert_eq!(
            source.wait_for_key_async().await.unwrap(),
            Event::Key(KeyEvent::char('a').with_modifiers(Modifier::CTRL))
        );
        assert_eq!(source.wait_for_key_async().await.unwrap(), Event::Quit);
    })
    .unwrap();
}

#[test]
fn modified_arrow() {
    let (feed, mut source) = setup();
    runtime::block_on(async {
        feed.write(b"\x1b[1;5C");
        assert_eq!(
            source.wait_for_key_async().await.unwrap(),
            Event::Key(KeyEvent::bare(KeyCode::ArrowRight).with_modifiers(Modifier::CTRL))
        );
    })
    .unwrap();
}

// =============================================================================
// RESIZE PRIORITY
// =============================================================================

#[test]
fn resize_wins_over_pending_key() {
    let (feed, mut source) = setup();
    runtime::block_on(async {
        feed.write(b"k");
        source.resize_flag().set();

        let first = source.wait_for_multiple_events_async().await.unwrap();
        assert!(first.is_resize(), "expected resize first, got {first:?}");
        assert!(!source.resize_flag().is_set());

        let second = source.wait_for_multiple_events_async().await.unwrap();
        assert_eq!(second, Event::Key(KeyEvent::char('k')));
    })
    .unwrap();
}

#[test]
fn resize_wins_over_already_decoded_key() {
    let (feed, mut source) = setup();
    runtime::block_on(async {
        feed.write(b"xy");
        assert_eq!(source.poll_key_async().await.unwrap(), Some(Event::Key(KeyEvent::char('x'))));
        assert_eq!(source.pending_events(), 1);

        source.resize_flag().set();
        assert!(source.wait_for_multiple_events_async().await.unwrap().is_resize());
        assert_eq!(
            source.wait_for_multiple_events_async().await.unwrap(),
            Event::Key(KeyEvent::char('y'))
        );
    })
    .unwrap();
}

#[test]
fn resize_is_consumed_exactly_once() {
    let (_feed, mut source) = setup();
    runtime::block_on(async {
        source.resize_flag().set();
        assert!(source.check_resize_async().await.is_some());
        assert!(source.check_resize_async().await.is_none());
    })
    .unwrap();
}

#[test]
fn shared_flag_reaches_the_source() {
    let (_feed, source) = setup();
    let flag = spark_tui_input::ResizeFlag::new();
    let mut source = source.with_resize_flag(flag.clone());
    flag.set();
    let event = runtime::block_on(source.check_resize_async()).unwrap();
    assert!(matches!(event, Some(Event::Resize(cols, rows)) if cols > 0 && rows > 0));
}

// =============================================================================
// TIMEOUTS
// =============================================================================

#[test]
fn timeout_is_distinct_and_loses_nothing() {
    let (feed, mut source) = setup();
    runtime::block_on(async {
        // Half a sequence arrives, then the timer wins.
        feed.write(b"\x1b[");
        let lost = source.wait_for_key_timeout_async(Duration::from_millis(20)).await;
        assert!(matches!(lost, Err(InputError::Timeout(_))));

        feed.write(b"B");
        assert_eq!(
            source.wait_for_key_timeout_async(Duration::from_millis(500)).await.unwrap(),
            key(KeyCode::ArrowDown)
        );
    })
    .unwrap();
}

#[test]
fn racing_wait_for_any_key_against_a_timer() {
    let (feed, mut source) = setup();
    runtime::block_on(async {
        let lost = runtime::timeout(Duration::from_millis(15), source.wait_for_any_key_async()).await;
        assert!(lost.is_err());

        feed.write(b"q");
        assert_eq!(
            source.wait_for_any_key_async().await.unwrap(),
            Event::Key(KeyEvent::char('q'))
        );
    })
    .unwrap();
}

#[test]
fn timed_out_any_key_wait_keeps_paste() {
    let (feed, mut source) = setup();
    feed.write(b"\x1b[200~data\x1b[201~");
    runtime::block_on(async {
        let lost = runtime::timeout(Duration::from_millis(15), source.wait_for_any_key_async()).await;
        assert!(lost.is_err());
        assert_eq!(source.read_key_async().await.unwrap(), Event::Paste("data".to_string()));
    })
    .unwrap();
}

#[test]
fn poll_events_with_unbounded_timeout() {
    let (feed, mut source) = setup();
    feed.write(b"k");
    runtime::block_on(async {
        assert!(source.poll_events_async(Duration::MAX).await.unwrap());
        assert_eq!(source.read_key_async().await.unwrap(), Event::Key(KeyEvent::char('k')));
    })
    .unwrap();
}

#[test]
fn read_key_is_bounded() {
    let (_feed, mut source) = setup();
    let event = runtime::block_on(source.read_key_async()).unwrap().unwrap();
    assert_eq!(event, Event::Unknown);
}

#[test]
fn poll_events_reports_resize() {
    let (_feed, mut source) = setup();
    runtime::block_on(async {
        assert!(!source.poll_events_async(Duration::ZERO).await.unwrap());
        source.resize_flag().set();
        assert!(source.poll_events_async(Duration::ZERO).await.unwrap());
        // Reporting does not consume.
        assert!(source.resize_flag().is_set());
    })
    .unwrap();
}

#[test]
fn independent_sources_do_not_share_decoder_state() {
    let (feed_a, mut a) = setup();
    let (feed_b, mut b) = setup();
    runtime::block_on(async {
        feed_a.write(b"\x1b[");
        feed_b.write(b"A");
        assert_eq!(a.poll_key_async().await.unwrap(), None);
        assert_eq!(b.poll_key_async().await.unwrap(), Some(Event::Key(KeyEvent::char('A'))));

        feed_a.write(b"D");
        assert_eq!(a.poll_key_async().await.unwrap(), Some(key(KeyCode::ArrowLeft)));
    })
    .unwrap();
}
