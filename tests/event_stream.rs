//! Event stream lifecycle: start/stop idempotence, handler-driven stop,
//! delivery order, restart.
//!
//! Run with: cargo test --test event_stream

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use spark_tui_input::io::{PipeFeed, pipe};
use spark_tui_input::{
    Event, EventSource, EventStream, InputConfig, InputReader, KeyCode, KeyEvent, runtime,
};

fn setup() -> (PipeFeed, EventSource) {
    let (feed, source) = pipe();
    let config = InputConfig::new()
        .with_poll_interval(Duration::from_millis(1))
        .with_stream_tick(Duration::from_millis(5));
    let reader = InputReader::with_options(source, config.read_chunk, config.poll_interval);
    (feed, EventSource::from_reader(reader).with_config(config))
}

/// Poll `done` until it holds or two seconds pass.
async fn wait_until(mut done: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if done() {
            return true;
        }
        runtime::sleep(Duration::from_millis(2)).await;
    }
    done()
}

#[test]
fn null_handler_streams_start_and_stop() {
    runtime::block_on(async {
        let mut streams: Vec<(PipeFeed, EventStream)> = (0..6)
            .map(|_| {
                let (feed, source) = setup();
                (feed, EventStream::new(source, None))
            })
            .collect();

        for round in 0..2 {
            for (feed, stream) in &mut streams {
                stream.start_async().await.unwrap();
                feed.write(format!("{round}"));
            }
            runtime::sleep(Duration::from_millis(10)).await;
            for (_, stream) in &mut streams {
                assert!(stream.is_running());
                stream.stop_async().await.unwrap();
                stream.stop_async().await.unwrap();
            }
        }

        assert!(streams.iter().all(|(_, stream)| !stream.is_running()));
    })
    .unwrap();
}

#[test]
fn handler_false_stops_the_loop() {
    let (feed, source) = setup();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_handler = Arc::clone(&seen);
    let mut stream = EventStream::with_handler(source, move |event| {
        let stop = event == Event::Key(KeyEvent::char('q'));
        seen_handler.lock().unwrap().push(event);
        !stop
    });

    runtime::block_on(async {
        stream.start_async().await.unwrap();
        feed.write(b"abq");
        assert!(wait_until(|| !stream.is_running()).await);

        // Anything after the stop key is never delivered.
        feed.write(b"z");
        runtime::sleep(Duration::from_millis(20)).await;
        stream.stop_async().await.unwrap();
    })
    .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![
            Event::Key(KeyEvent::char('a')),
            Event::Key(KeyEvent::char('b')),
            Event::Key(KeyEvent::char('q')),
        ]
    );
}

#[test]
fn events_arrive_in_order_with_resize_first() {
    let (feed, source) = setup();
    let flag = source.resize_flag().clone();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_handler = Arc::clone(&seen);
    let mut stream = EventStream::with_handler(source, move |event| {
        seen_handler.lock().unwrap().push(event);
        true
    });

    runtime::block_on(async {
        feed.write(b"1\x1b[A2");
        flag.set();
        stream.start_async().await.unwrap();
        assert!(wait_until(|| seen.lock().unwrap().len() >= 4).await);
        stream.stop_async().await.unwrap();
    })
    .unwrap();

    let seen = seen.lock().unwrap();
    assert!(seen[0].is_resize(), "resize must come first: {seen:?}");
    assert_eq!(
        seen[1..],
        [
            Event::Key(KeyEvent::char('1')),
            Event::Key(KeyEvent::bare(KeyCode::ArrowUp)),
            Event::Key(KeyEvent::char('2')),
        ]
    );
}

#[test]
fn restart_after_handler_stop() {
    let (feed, source) = setup();
    let count = Arc::new(Mutex::new(0usize));
    let count_handler = Arc::clone(&count);
    let mut stream = EventStream::with_handler(source, move |_| {
        *count_handler.lock().unwrap() += 1;
        false
    });

    runtime::block_on(async {
        stream.start_async().await.unwrap();
        feed.write(b"x");
        assert!(wait_until(|| !stream.is_running()).await);

        stream.start_async().await.unwrap();
        assert!(stream.is_running());
        feed.write(b"y");
        assert!(wait_until(|| !stream.is_running()).await);
        stream.stop_async().await.unwrap();
    })
    .unwrap();

    assert_eq!(*count.lock().unwrap(), 2);
}

#[test]
fn stop_from_another_task() {
    let (_feed, source) = setup();
    let mut stream = EventStream::new(source, None);
    let handle = stream.stop_handle();

    runtime::block_on(async {
        stream.start_async().await.unwrap();
        let stopper = runtime::spawn(async move {
            runtime::sleep(Duration::from_millis(10)).await;
            handle.request_stop();
        });
        stopper.join().await.unwrap();
        assert!(!stream.is_running());
        stream.stop_async().await.unwrap();
    })
    .unwrap();
}
